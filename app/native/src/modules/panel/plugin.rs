//! Plugin interface.
//!
//! Panel widgets are heterogeneous; the host only knows them through the
//! [`Plugin`] trait. Capabilities beyond the lifecycle (the taskbar's window
//! view) are reached through explicit accessors, never by downcasting.

use serde::Serialize;
use uuid::Uuid;

use super::services::{ServiceError, SharedServices};
use crate::geometry::{Edge, Orientation, Rect};
use crate::modules::taskbar::TaskbarPlugin;
use crate::modules::windows::WmRequest;

/// Size requested by a plugin along the panel's long axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SizeHint {
    /// Below this the plugin is useless and gets hidden.
    pub minimum: i32,

    /// Size the plugin gets when space allows.
    pub preferred: i32,

    /// Absorbs leftover space.
    pub expandable: bool,
}

impl SizeHint {
    /// A fixed-size hint.
    #[must_use]
    pub const fn fixed(size: i32) -> Self {
        Self {
            minimum: size,
            preferred: size,
            expandable: false,
        }
    }

    /// An expandable hint with the given minimum.
    #[must_use]
    pub const fn expandable(minimum: i32) -> Self {
        Self {
            minimum,
            preferred: minimum,
            expandable: true,
        }
    }
}

/// Everything a plugin learns about its host at init time.
#[derive(Clone)]
pub struct HostContext {
    pub instance_id: Uuid,
    pub edge: Edge,
    pub thickness: i32,
    pub icon_size: i32,
    pub services: SharedServices,
}

impl HostContext {
    /// Orientation of the panel's long axis.
    #[must_use]
    pub const fn orientation(&self) -> Orientation { self.edge.orientation() }
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("instance_id", &self.instance_id)
            .field("edge", &self.edge)
            .field("thickness", &self.thickness)
            .field("icon_size", &self.icon_size)
            .finish_non_exhaustive()
    }
}

/// Errors reported by plugins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    /// The type name is not in the catalog.
    #[error("Unknown plugin type '{0}'")]
    UnknownType(String),

    /// The configuration blob does not fit the plugin.
    #[error("Invalid configuration for {kind}: {message}")]
    InvalidConfig { kind: String, message: String },

    /// The plugin does not understand the command.
    #[error("Plugin {kind} does not support command '{command}'")]
    UnsupportedCommand { kind: String, command: String },

    /// A session service failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl PluginError {
    pub(crate) fn invalid_config(kind: &str, err: &serde_json::Error) -> Self {
        Self::InvalidConfig {
            kind: kind.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn unsupported(kind: &str, command: &str) -> Self {
        Self::UnsupportedCommand {
            kind: kind.to_string(),
            command: command.to_string(),
        }
    }
}

/// A panel widget hosted by the controller.
///
/// Lifecycle: `init` once, `configure` at least once, `resize` whenever the
/// layout changes, `destroy` once before being dropped.
pub trait Plugin: Send {
    /// Catalog name of the plugin type.
    fn kind(&self) -> &'static str;

    /// Receive the host context.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin cannot run with this host.
    fn init(&mut self, host: &HostContext) -> Result<(), PluginError>;

    /// Apply a per-instance configuration blob.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidConfig`] if the blob does not parse.
    fn configure(&mut self, config: &serde_json::Value) -> Result<(), PluginError>;

    /// Receive the slot assigned by the layout engine.
    fn resize(&mut self, rect: Rect);

    /// Release resources.
    fn destroy(&mut self) {}

    /// Size along the panel's long axis.
    fn size_hint(&self) -> SizeHint;

    /// Run a named command, such as a menu entry.
    ///
    /// Returns window manager requests to send, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::UnsupportedCommand`] unless overridden.
    fn command(&mut self, command: &str) -> Result<Vec<WmRequest>, PluginError> {
        Err(PluginError::unsupported(self.kind(), command))
    }

    /// The taskbar capability, if this plugin is the taskbar.
    fn as_taskbar(&self) -> Option<&TaskbarPlugin> { None }

    /// Mutable taskbar capability.
    fn as_taskbar_mut(&mut self) -> Option<&mut TaskbarPlugin> { None }
}

/// Plugins are hosted as trait objects.
pub type BoxedPlugin = Box<dyn Plugin>;

/// Parse a configuration blob, treating `null` as an empty object.
///
/// # Errors
///
/// Returns [`PluginError::InvalidConfig`] if the blob does not parse.
pub fn parse_config<T>(kind: &str, config: &serde_json::Value) -> Result<T, PluginError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(config.clone()).map_err(|err| PluginError::invalid_config(kind, &err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, serde::Deserialize, PartialEq, Eq)]
    #[serde(default)]
    struct Sample {
        width: i32,
    }

    #[test]
    fn test_parse_config_null_is_default() {
        let parsed: Sample = parse_config("sample", &serde_json::Value::Null).unwrap();
        assert_eq!(parsed, Sample::default());
    }

    #[test]
    fn test_parse_config_error() {
        let err = parse_config::<Sample>("sample", &serde_json::json!({ "width": "wide" }))
            .unwrap_err();
        assert!(matches!(err, PluginError::InvalidConfig { .. }));
        assert!(err.to_string().starts_with("Invalid configuration for sample"));
    }

    #[test]
    fn test_size_hints() {
        assert_eq!(SizeHint::fixed(20), SizeHint {
            minimum: 20,
            preferred: 20,
            expandable: false,
        });
        assert!(SizeHint::expandable(0).expandable);
    }
}
