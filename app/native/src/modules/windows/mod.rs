//! Window tracking.
//!
//! Window manager notifications flow through a [`WindowManagerAdapter`] into
//! the [`WindowDirectory`], which the panel controller owns and mutates one
//! batch at a time.
//!
//! ```text
//! window manager ──► WindowManagerAdapter ──► EventBatch ──► WindowDirectory
//!        ▲                                                      │
//!        └──────────── WmRequest (fire-and-forget) ◄── taskbar ◄┘
//! ```

pub mod adapter;
pub mod state;

pub use adapter::{
    AdapterError, AdapterEvent, EventBatch, EventStream, WindowManagerAdapter, WindowRecord,
    WmRequest,
};
pub use state::{
    ApplyOutcome, AttributeDelta, BatchReport, Desktop, DesktopInfo, DirectorySnapshot, Layer,
    MaximizeAxis, Revision, Window, WindowAttributes, WindowDirectory, WindowId, WindowState,
};
