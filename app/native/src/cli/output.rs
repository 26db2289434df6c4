//! CLI output formatting utilities.
//!
//! - JSON syntax highlighting
//! - Cell helpers for tables

use std::fmt::Write;

use colored::Colorize;

const INDENT: &str = "  ";

/// Prints JSON with syntax highlighting.
///
/// Keys are cyan, strings green, numbers yellow, booleans and null magenta.
pub fn print_highlighted_json(value: &serde_json::Value) { println!("{}", highlight_json(value)); }

/// Renders pretty-printed JSON with ANSI colors.
#[must_use]
pub fn highlight_json(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &serde_json::Value, depth: usize) {
    use serde_json::Value;

    match value {
        Value::Null => push_colored(out, "null".magenta()),
        Value::Bool(b) => push_colored(out, b.to_string().magenta()),
        Value::Number(n) => push_colored(out, n.to_string().yellow()),
        Value::String(s) => push_colored(out, quote(s).green()),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                separator(out, i, depth + 1);
                write_value(out, item, depth + 1);
            }
            newline(out, depth);
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                separator(out, i, depth + 1);
                push_colored(out, quote(key).cyan());
                out.push_str(": ");
                write_value(out, item, depth + 1);
            }
            newline(out, depth);
            out.push('}');
        }
    }
}

fn separator(out: &mut String, index: usize, depth: usize) {
    if index > 0 {
        out.push(',');
    }
    newline(out, depth);
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    out.push_str(&INDENT.repeat(depth));
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

fn push_colored(out: &mut String, text: colored::ColoredString) {
    let _ = write!(out, "{text}");
}

/// Truncates a string to a maximum number of characters, adding an ellipsis if needed.
///
/// Counts characters, not bytes.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Formats a boolean as a colored check mark.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value { "✓".green().to_string() } else { "✗".red().to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_json_layout() {
        colored::control::set_override(false);
        let value = serde_json::json!({ "kind": "clock", "ordinal": 2, "config": null, "tags": [] });
        let rendered = highlight_json(&value);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, value);
        assert!(rendered.contains("\n  \"kind\": \"clock\""));
    }

    #[test]
    fn test_highlight_json_escapes_strings() {
        colored::control::set_override(false);
        let value = serde_json::json!(["say \"hi\""]);
        assert_eq!(highlight_json(&value), "[\n  \"say \\\"hi\\\"\"\n]");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello w…");
        assert_eq!(truncate("hello", 1), "…");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("héllo wörld", 6), "héllo…");
    }

    #[test]
    fn test_format_bool() {
        assert!(format_bool(true).contains('✓'));
        assert!(format_bool(false).contains('✗'));
    }
}
