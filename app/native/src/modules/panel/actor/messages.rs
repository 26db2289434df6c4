//! Message types for the panel actor.
//!
//! All communication with the panel actor happens through messages:
//! - `PanelMessage` - events and commands sent to the actor
//! - `PanelQuery` - requests for state data (with response channel)
//! - `QueryResult` - responses from queries
//! - `PanelNotification` - broadcast to every subscriber after changes

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::config::ShelfConfig;
use crate::error::ShelfError;
use crate::geometry::Rect;
use crate::modules::panel::layout::PanelLayout;
use crate::modules::panel::registry::{MutationOutcome, PluginRecord, RegistryMutation};
use crate::modules::taskbar::{TaskbarInput, TaskbarView};
use crate::modules::windows::{DesktopInfo, DirectorySnapshot, EventBatch, WindowId, WindowRecord};

/// Reply channel of a request that can fail.
pub type Responder<T> = oneshot::Sender<Result<T, ShelfError>>;

// ============================================================================
// Panel Messages
// ============================================================================

/// Messages sent to the panel actor.
#[derive(Debug)]
pub enum PanelMessage {
    // ════════════════════════════════════════════════════════════════════════
    // Window manager (from the adapter pump)
    // ════════════════════════════════════════════════════════════════════════
    /// A batch of window manager events, applied atomically.
    WindowEvents(EventBatch),

    /// A (re)connection completed; the snapshot replaces the directory contents.
    AdapterConnected {
        windows: Vec<WindowRecord>,
        desktops: DesktopInfo,
    },

    /// The connection was lost or could not be opened.
    AdapterDisconnected { reason: String },

    /// Answer to a single-window lookup. `None` means the window is gone.
    WindowResolved {
        window_id: WindowId,
        record: Option<WindowRecord>,
    },

    // ════════════════════════════════════════════════════════════════════════
    // Environment
    // ════════════════════════════════════════════════════════════════════════
    /// Geometry of the panel's screen changed.
    ScreenChanged { screen: Rect },

    /// The configuration file was reloaded.
    ConfigChanged(Box<ShelfConfig>),

    /// Pointer entered the panel or its hidden trigger strip.
    PointerEntered,

    /// Pointer left the panel.
    PointerLeft,

    // ════════════════════════════════════════════════════════════════════════
    // User commands (from renderers and the CLI)
    // ════════════════════════════════════════════════════════════════════════
    /// Click, wheel or menu action on the taskbar.
    TaskbarInput(TaskbarInput),

    /// Named command for one plugin instance.
    PluginCommand {
        id: Uuid,
        command: String,
        respond_to: Responder<()>,
    },

    /// Change the plugin list.
    Mutate {
        mutation: RegistryMutation,
        respond_to: Responder<MutationOutcome>,
    },

    /// Query state.
    Query {
        query: PanelQuery,
        respond_to: oneshot::Sender<QueryResult>,
    },

    /// Stop the actor.
    Shutdown,
}

impl PanelMessage {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::WindowEvents(_) => "WindowEvents",
            Self::AdapterConnected { .. } => "AdapterConnected",
            Self::AdapterDisconnected { .. } => "AdapterDisconnected",
            Self::WindowResolved { .. } => "WindowResolved",
            Self::ScreenChanged { .. } => "ScreenChanged",
            Self::ConfigChanged(_) => "ConfigChanged",
            Self::PointerEntered => "PointerEntered",
            Self::PointerLeft => "PointerLeft",
            Self::TaskbarInput(_) => "TaskbarInput",
            Self::PluginCommand { .. } => "PluginCommand",
            Self::Mutate { .. } => "Mutate",
            Self::Query { .. } => "Query",
            Self::Shutdown => "Shutdown",
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Queries for panel state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelQuery {
    /// Plugin list in ordinal order.
    Plugins,
    /// Current layout.
    Layout,
    /// Current taskbar view, if a taskbar is on the panel.
    TaskbarView,
    /// Known windows in creation order.
    Windows,
    /// Virtual desktop info.
    Desktops,
    /// Window manager connection state.
    AdapterState,
}

/// Results from panel queries.
#[derive(Debug, Clone)]
pub enum QueryResult {
    Plugins(Vec<PluginRecord>),
    Layout(Arc<PanelLayout>),
    TaskbarView(Option<Arc<TaskbarView>>),
    Windows(DirectorySnapshot),
    Desktops(DesktopInfo),
    AdapterState(AdapterState),
}

// ============================================================================
// Notifications
// ============================================================================

/// State of the window manager connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterState {
    /// No connection has been established yet.
    #[default]
    Connecting,
    Connected,
    /// The connection was lost; views show last-known data and requests are dropped.
    Degraded,
}

impl AdapterState {
    /// Whether requests can be sent.
    #[must_use]
    pub const fn is_connected(self) -> bool { matches!(self, Self::Connected) }
}

/// Broadcast after state changes.
#[derive(Debug, Clone)]
pub enum PanelNotification {
    LayoutChanged(Arc<PanelLayout>),
    TaskbarChanged(Arc<TaskbarView>),
    AdapterStateChanged(AdapterState),
    PluginsChanged(Vec<PluginRecord>),
    /// A non-fatal problem the user should hear about.
    Warning(String),
}

impl PanelNotification {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LayoutChanged(_) => "LayoutChanged",
            Self::TaskbarChanged(_) => "TaskbarChanged",
            Self::AdapterStateChanged(_) => "AdapterStateChanged",
            Self::PluginsChanged(_) => "PluginsChanged",
            Self::Warning(_) => "Warning",
        }
    }
}
