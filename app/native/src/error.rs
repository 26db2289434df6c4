//! Error types for Shelf.
//!
//! Module-level errors (`RegistryError`, `StoreError`, `PluginError`,
//! `AdapterError`, `ActorError`, `ConfigError`) converge here. The enum is
//! serializable so replies can be handed to renderers and printed by the CLI
//! as structured data.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::modules::panel::{ActorError, PluginError, RegistryError, StoreError};
use crate::modules::windows::AdapterError;

/// Errors surfaced by the panel and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum ShelfError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// A second instance of a single-instance plugin was requested.
    #[error("{0}")]
    DuplicateSingleton(String),
    /// No plugin with the given id or type.
    #[error("{0}")]
    PluginNotFound(String),
    /// The panel refuses changes to its plugin list.
    #[error("{0}")]
    PanelLocked(String),
    /// A plugin rejected its configuration or a command.
    #[error("Plugin error: {0}")]
    PluginError(String),
    /// The plugin list could not be written.
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    /// The window manager cannot be reached.
    #[error("{0}")]
    AdapterUnavailable(String),
    /// The panel actor is gone or did not answer.
    #[error("Panel error: {0}")]
    ActorError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<RegistryError> for ShelfError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match err {
            RegistryError::DuplicateSingleton(_) => Self::DuplicateSingleton(message),
            RegistryError::UnknownType(_) | RegistryError::NotFound(_) => {
                Self::PluginNotFound(message)
            }
            RegistryError::Locked => Self::PanelLocked(message),
            RegistryError::Persistence(_) | RegistryError::Superseded => {
                Self::PersistenceError(message)
            }
        }
    }
}

impl From<StoreError> for ShelfError {
    fn from(err: StoreError) -> Self { Self::PersistenceError(err.to_string()) }
}

impl From<PluginError> for ShelfError {
    fn from(err: PluginError) -> Self {
        match err {
            PluginError::UnknownType(_) => Self::PluginNotFound(err.to_string()),
            _ => Self::PluginError(err.to_string()),
        }
    }
}

impl From<AdapterError> for ShelfError {
    fn from(err: AdapterError) -> Self { Self::AdapterUnavailable(err.to_string()) }
}

impl From<ActorError> for ShelfError {
    fn from(err: ActorError) -> Self { Self::ActorError(err.to_string()) }
}

impl From<ConfigError> for ShelfError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<std::io::Error> for ShelfError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for ShelfError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<String> for ShelfError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for ShelfError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}
