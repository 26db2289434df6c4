//! Window manager adapter interface.
//!
//! The panel core never speaks a concrete window-manager protocol. A platform
//! backend implements [`WindowManagerAdapter`] and normalizes whatever it
//! receives into [`AdapterEvent`] batches.
//!
//! # Delivery guarantees expected by the core
//!
//! None. Batches may be reordered or duplicated; the directory discards any
//! event whose revision is not newer than the last applied one for that window.
//! When the stream ends the core treats the adapter as unavailable and calls
//! [`WindowManagerAdapter::subscribe`] again with backoff.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use super::state::{
    AttributeDelta, Desktop, DesktopInfo, Layer, MaximizeAxis, Revision, WindowAttributes, WindowId,
};
use crate::geometry::{Edge, Rect};

// ============================================================================
// Events
// ============================================================================

/// A window lifecycle or attribute notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum AdapterEvent {
    /// A window appeared.
    CreateWindow {
        window_id: WindowId,
        revision: Revision,
        attributes: WindowAttributes,
    },

    /// A window was closed.
    DestroyWindow { window_id: WindowId, revision: Revision },

    /// One or more attributes of a window changed.
    AttributeChanged {
        window_id: WindowId,
        revision: Revision,
        delta: AttributeDelta,
    },

    /// A window moved to another virtual desktop.
    DesktopChanged {
        window_id: WindowId,
        revision: Revision,
        desktop: Desktop,
    },

    /// The desktop count or the active desktop changed.
    DesktopsChanged(DesktopInfo),
}

impl AdapterEvent {
    /// Returns the window this event is about, if any.
    #[must_use]
    pub const fn window_id(&self) -> Option<WindowId> {
        match self {
            Self::CreateWindow { window_id, .. }
            | Self::DestroyWindow { window_id, .. }
            | Self::AttributeChanged { window_id, .. }
            | Self::DesktopChanged { window_id, .. } => Some(*window_id),
            Self::DesktopsChanged(_) => None,
        }
    }

    /// Returns a human-readable name for this event type.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateWindow { .. } => "CreateWindow",
            Self::DestroyWindow { .. } => "DestroyWindow",
            Self::AttributeChanged { .. } => "AttributeChanged",
            Self::DesktopChanged { .. } => "DesktopChanged",
            Self::DesktopsChanged(_) => "DesktopsChanged",
        }
    }
}

/// A batch of events produced by one notification from the window manager.
pub type EventBatch = Vec<AdapterEvent>;

/// Lazy, unbounded stream of event batches. Ends when the connection drops.
pub type EventStream = BoxStream<'static, EventBatch>;

/// Window attributes fetched on demand, tagged with their revision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub revision: Revision,
    pub attributes: WindowAttributes,
}

// ============================================================================
// Requests
// ============================================================================

/// Fire-and-forget action requests sent to the window manager.
///
/// Confirmation, if any, arrives later as an [`AdapterEvent`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "kebab-case")]
pub enum WmRequest {
    Activate { window_id: WindowId },
    SetMinimized { window_id: WindowId, minimized: bool },
    SetMaximized { window_id: WindowId, axis: MaximizeAxis },
    SetShaded { window_id: WindowId, shaded: bool },
    SetLayer { window_id: WindowId, layer: Layer },
    MoveToDesktop { window_id: WindowId, desktop: Desktop },
    Close { window_id: WindowId },

    /// Minimize (or restore) every window to reveal the desktop.
    ShowDesktop { show: bool },

    /// Reserve `thickness` pixels along `edge`. A thickness of 0 releases it.
    ReserveScreenStrut { edge: Edge, thickness: u32, rect: Rect },
}

impl WmRequest {
    /// Returns the target window, if the request is about one.
    #[must_use]
    pub const fn window_id(&self) -> Option<WindowId> {
        match self {
            Self::Activate { window_id }
            | Self::SetMinimized { window_id, .. }
            | Self::SetMaximized { window_id, .. }
            | Self::SetShaded { window_id, .. }
            | Self::SetLayer { window_id, .. }
            | Self::MoveToDesktop { window_id, .. }
            | Self::Close { window_id } => Some(*window_id),
            Self::ShowDesktop { .. } | Self::ReserveScreenStrut { .. } => None,
        }
    }

    /// Whether `attrs` show the state this request asked for.
    ///
    /// `Close` is confirmed by the window disappearing, never by attributes.
    #[must_use]
    pub fn is_confirmed_by(&self, attrs: &WindowAttributes) -> bool {
        match self {
            Self::Activate { .. } => attrs.active,
            Self::SetMinimized { minimized, .. } => attrs.minimized == *minimized,
            Self::SetMaximized { axis, .. } => attrs.maximize_axis() == *axis,
            Self::SetShaded { shaded, .. } => attrs.shaded == *shaded,
            Self::SetLayer { layer, .. } => attrs.layer == *layer,
            Self::MoveToDesktop { desktop, .. } => attrs.desktop == *desktop,
            Self::Close { .. } | Self::ShowDesktop { .. } | Self::ReserveScreenStrut { .. } => false,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors reported by a window manager adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The window manager connection is lost.
    #[error("Window manager unavailable: {0}")]
    Unavailable(String),

    /// The queried window does not exist (anymore).
    #[error("Window {0} not found")]
    NotFound(WindowId),
}

// ============================================================================
// Adapter Trait
// ============================================================================

/// Consumed interface of the window manager.
///
/// Implementations must be cheap to call from the controller task: queries are
/// expected to answer from a local cache or a fast round-trip, and `request`
/// must never wait for the window manager to act.
pub trait WindowManagerAdapter: Send + Sync {
    /// Opens a new event subscription.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unavailable`] if the window manager cannot be reached.
    fn subscribe(&self) -> Result<EventStream, AdapterError>;

    /// Fetches the current attributes of one window.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NotFound`] if the window is gone, or
    /// [`AdapterError::Unavailable`] if the connection is down.
    fn window_attributes(&self, window_id: WindowId) -> Result<WindowRecord, AdapterError>;

    /// Fetches the virtual desktop count and the active desktop.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unavailable`] if the connection is down.
    fn desktop_info(&self) -> Result<DesktopInfo, AdapterError>;

    /// Lists every top-level window currently known to the window manager.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unavailable`] if the connection is down.
    fn list_windows(&self) -> Result<Vec<WindowId>, AdapterError>;

    /// Sends an action request without waiting for confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unavailable`] if the request could not be queued.
    fn request(&self, request: WmRequest) -> Result<(), AdapterError>;
}
