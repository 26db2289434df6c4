//! Panel: plugin host, layout engine and controller.
//!
//! The panel controller is an actor. It owns the window directory, the plugin
//! registry, the live plugin instances and the layout, and processes window
//! manager events, configuration changes, screen changes and user requests
//! one message at a time.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ adapter pump (connection.rs)  config watcher   CLI / UI      │
//! └───────────────┬──────────────────────┬─────────────┬─────────┘
//!                 │ PanelMessage         │             │
//!                 ▼                      ▼             ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ PanelActor ── handlers ──► PanelState                        │
//! │   WindowDirectory · PluginRegistry · plugins · AutoHide      │
//! └───────────────┬──────────────────────────────────────────────┘
//!                 │ Arc snapshots (eyeball) + PanelNotification
//!                 ▼
//!            renderers
//! ```

pub mod actor;
pub mod autohide;
pub mod layout;
pub mod plugin;
pub mod plugins;
pub mod registry;
pub mod services;
pub mod state;
pub mod store;

pub use actor::{
    ActorError, AdapterState, PanelActor, PanelHandle, PanelMessage, PanelNotification,
    PanelOptions, PanelQuery, QueryResult,
};
pub use autohide::{AutoHide, AutoHidePhase};
pub use layout::{
    PanelLayout, PanelSettings, PluginSlot, SlotInput, SlotVisibility, Strut, compute_layout,
    panel_rect,
};
pub use plugin::{BoxedPlugin, HostContext, Plugin, PluginError, SizeHint};
pub use plugins::{Cardinality, PluginKind, default_plugin_set};
pub use registry::{
    Direction, MutationOutcome, PluginRecord, PluginRegistry, RegistryError, RegistryMutation,
};
pub use services::{
    RecordingServices, ServiceCall, ServiceError, SessionAction, SessionServices, SharedServices,
};
pub use state::PanelState;
pub use store::{JsonFileStore, MemoryStore, PluginStore, StoreError, open_store};
