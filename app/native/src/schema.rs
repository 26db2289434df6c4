//! JSON Schema generation for the configuration file.
//!
//! Editors that understand JSON Schema can validate `config.jsonc` by pointing
//! its `$schema` key at the output of `shelf schema`.

use schemars::schema_for;

use crate::config::ShelfConfig;

/// Returns the configuration schema as a JSON value.
#[must_use]
pub fn generate_schema() -> serde_json::Value {
    let schema = schema_for!(ShelfConfig);
    serde_json::to_value(&schema).unwrap_or_default()
}

/// Returns the configuration schema as pretty-printed JSON.
#[must_use]
pub fn print_schema() -> String {
    serde_json::to_string_pretty(&generate_schema()).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_describes_sections() {
        let schema = generate_schema();
        let properties = schema.get("properties").expect("schema has properties");
        for section in ["panel", "taskbar", "adapter", "persistence", "session"] {
            assert!(properties.get(section).is_some(), "missing section {section}");
        }
    }

    #[test]
    fn test_schema_is_valid_json() {
        let output = print_schema();
        assert!(serde_json::from_str::<serde_json::Value>(&output).is_ok());
    }
}
