//! Handler modules for the panel actor.
//!
//! Each module contains the handlers for one category of messages:
//! - `windows` - Window manager events, connection changes, taskbar input
//! - `plugins` - Registry mutations, write retries, plugin commands
//! - `layout` - Screen and configuration changes, pointer, timers

pub mod layout;
pub mod plugins;
pub mod windows;

pub use layout::{
    on_config_changed, on_pointer_entered, on_pointer_left, on_screen_changed, on_tick,
};
pub use plugins::{on_mutate, on_plugin_command, on_retry_writes};
pub use windows::{
    on_adapter_connected, on_adapter_disconnected, on_taskbar_input, on_window_events,
    on_window_resolved,
};
