//! Session services shared by plugins.
//!
//! Power, session and launcher actions are provided by one capability object
//! injected into every plugin through its [`HostContext`](super::plugin::HostContext).

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Power and session actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionAction {
    Logout,
    LockScreen,
    SwitchUser,
    Suspend,
    Hibernate,
    Reboot,
    Shutdown,
}

impl SessionAction {
    /// All actions in menu order.
    pub const ALL: [Self; 7] = [
        Self::LockScreen,
        Self::SwitchUser,
        Self::Logout,
        Self::Suspend,
        Self::Hibernate,
        Self::Reboot,
        Self::Shutdown,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Logout => "logout",
            Self::LockScreen => "lock-screen",
            Self::SwitchUser => "switch-user",
            Self::Suspend => "suspend",
            Self::Hibernate => "hibernate",
            Self::Reboot => "reboot",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl std::str::FromStr for SessionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("Unknown session action '{s}'"))
    }
}

/// Errors from session services.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// No command is configured for the action.
    #[error("'{0}' is not available")]
    Unavailable(String),

    /// The command could not be started.
    #[error("Failed to run '{command}': {message}")]
    Spawn { command: String, message: String },
}

/// Capability interface for session-level side effects.
pub trait SessionServices: Send + Sync {
    /// Perform a power or session action.
    ///
    /// # Errors
    ///
    /// Returns an error if the action is unavailable or fails to start.
    fn session_action(&self, action: SessionAction) -> Result<(), ServiceError>;

    /// Turn night mode on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if night mode is unavailable or fails to start.
    fn set_night_mode(&self, enabled: bool) -> Result<(), ServiceError>;

    /// Launch an application command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails to start.
    fn launch(&self, command: &str) -> Result<(), ServiceError>;
}

/// Shared handle to the session services.
pub type SharedServices = Arc<dyn SessionServices>;

/// A call recorded by [`RecordingServices`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceCall {
    Session(SessionAction),
    NightMode(bool),
    Launch(String),
}

/// Services that only record calls. Used offline and in tests.
#[derive(Debug, Default)]
pub struct RecordingServices {
    calls: Mutex<Vec<ServiceCall>>,
}

impl RecordingServices {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ServiceCall> { self.calls.lock().clone() }
}

impl SessionServices for RecordingServices {
    fn session_action(&self, action: SessionAction) -> Result<(), ServiceError> {
        self.calls.lock().push(ServiceCall::Session(action));
        Ok(())
    }

    fn set_night_mode(&self, enabled: bool) -> Result<(), ServiceError> {
        self.calls.lock().push(ServiceCall::NightMode(enabled));
        Ok(())
    }

    fn launch(&self, command: &str) -> Result<(), ServiceError> {
        self.calls.lock().push(ServiceCall::Launch(command.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_action_round_trips_names() {
        for action in SessionAction::ALL {
            assert_eq!(action.as_str().parse::<SessionAction>().unwrap(), action);
        }
        assert!("dance".parse::<SessionAction>().is_err());
    }

    #[test]
    fn test_recording_services() {
        let services = RecordingServices::new();
        services.session_action(SessionAction::Reboot).unwrap();
        services.launch("firefox").unwrap();
        assert_eq!(services.calls(), vec![
            ServiceCall::Session(SessionAction::Reboot),
            ServiceCall::Launch("firefox".to_string()),
        ]);
    }
}
