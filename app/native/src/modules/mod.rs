//! Feature modules for Shelf.
//!
//! - [`windows`] - Window manager adapter interface and the window directory
//! - [`taskbar`] - Grouping, presentation and actions of the taskbar
//! - [`panel`] - Plugin host, layout engine and the panel actor

pub mod panel;
pub mod taskbar;
pub mod windows;
