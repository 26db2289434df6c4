//! State module for window tracking.
//!
//! This module contains:
//! - Core types (`Window`, `WindowAttributes`, `AttributeDelta`, etc.)
//! - The `WindowDirectory` owning the authoritative window table

mod directory;
mod types;

pub use directory::{ApplyOutcome, BatchReport, DirectorySnapshot, WindowDirectory};
pub use types::{
    AttributeDelta, Desktop, DesktopInfo, Layer, MaximizeAxis, Revision, Window, WindowAttributes,
    WindowId, WindowState,
};
