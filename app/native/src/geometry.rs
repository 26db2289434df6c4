//! Pixel geometry shared by the layout engine and the window manager adapter.
//!
//! Panels live on pixel boundaries, so all geometry here is integral.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Rect
// ============================================================================

/// A rectangle with position and size in screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Create a zero-sized rectangle at origin.
    #[must_use]
    pub const fn zero() -> Self { Self::new(0, 0, 0, 0) }

    /// Check if this rectangle has a positive area.
    #[must_use]
    pub const fn is_valid(&self) -> bool { self.width > 0 && self.height > 0 }

    /// Right edge (exclusive).
    #[must_use]
    pub const fn right(&self) -> i32 { self.x + self.width }

    /// Bottom edge (exclusive).
    #[must_use]
    pub const fn bottom(&self) -> i32 { self.y + self.height }

    /// Check if this rectangle contains a point.
    #[must_use]
    pub const fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Extent of the rectangle along the given orientation's long axis.
    #[must_use]
    pub const fn length_along(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

impl std::str::FromStr for Rect {
    type Err = String;

    /// Parses `WxH` or `WxH+X+Y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid geometry '{s}'. Expected WIDTHxHEIGHT[+X+Y].");
        let mut parts = s.trim().split('+');
        let size = parts.next().ok_or_else(invalid)?;
        let (width, height) = size.split_once(['x', 'X']).ok_or_else(invalid)?;
        let number = |part: Option<&str>| -> Result<i32, String> {
            part.map_or(Ok(0), |p| p.trim().parse().map_err(|_| invalid()))
        };
        let x = number(parts.next())?;
        let y = number(parts.next())?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        let rect = Self::new(
            x,
            y,
            width.trim().parse().map_err(|_| invalid())?,
            height.trim().parse().map_err(|_| invalid())?,
        );
        if rect.is_valid() { Ok(rect) } else { Err(invalid()) }
    }
}

// ============================================================================
// Edge / Orientation / Alignment
// ============================================================================

/// Screen edge a panel is attached to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

impl Edge {
    /// Returns the edge name as a static lowercase string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Orientation of a panel attached to this edge.
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        match self {
            Self::Top | Self::Bottom => Orientation::Horizontal,
            Self::Left | Self::Right => Orientation::Vertical,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl std::str::FromStr for Edge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(format!("Invalid edge '{s}'. Expected top, bottom, left or right.")),
        }
    }
}

/// Direction of a panel's long axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Placement of a panel that does not span its whole edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Start,
    #[default]
    Center,
    End,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(10, 20, 100, 50);
        assert_eq!(rect.right(), 110);
        assert_eq!(rect.bottom(), 70);
        assert!(rect.contains_point(10, 20));
        assert!(!rect.contains_point(110, 20));
    }

    #[test]
    fn test_rect_is_valid() {
        assert!(Rect::new(0, 0, 1, 1).is_valid());
        assert!(!Rect::new(0, 0, 0, 10).is_valid());
        assert!(!Rect::zero().is_valid());
    }

    #[test]
    fn test_edge_orientation() {
        assert_eq!(Edge::Top.orientation(), Orientation::Horizontal);
        assert_eq!(Edge::Bottom.orientation(), Orientation::Horizontal);
        assert_eq!(Edge::Left.orientation(), Orientation::Vertical);
        assert_eq!(Edge::Right.orientation(), Orientation::Vertical);
    }

    #[test]
    fn test_edge_from_str() {
        assert_eq!("TOP".parse::<Edge>().unwrap(), Edge::Top);
        assert!("middle".parse::<Edge>().is_err());
    }

    #[test]
    fn test_length_along() {
        let rect = Rect::new(0, 0, 1920, 32);
        assert_eq!(rect.length_along(Orientation::Horizontal), 1920);
        assert_eq!(rect.length_along(Orientation::Vertical), 32);
    }

    #[test]
    fn test_rect_from_str() {
        assert_eq!("1920x1080".parse::<Rect>().unwrap(), Rect::new(0, 0, 1920, 1080));
        assert_eq!("800x600+1920+0".parse::<Rect>().unwrap(), Rect::new(1920, 0, 800, 600));
        assert!("0x600".parse::<Rect>().is_err());
        assert!("wide".parse::<Rect>().is_err());
    }

    #[test]
    fn test_rect_display() {
        assert_eq!(Rect::new(5, 6, 100, 30).to_string(), "100x30+5+6");
    }
}
