//! Session services backed by shell commands from the configuration.

use std::process::{Command, Stdio};

use crate::config::SessionConfig;
use crate::modules::panel::{ServiceError, SessionAction, SessionServices};

/// Runs the configured command for each action through `sh -c`.
///
/// Commands are started in the background; the panel never waits for them.
#[derive(Debug, Clone, Default)]
pub struct CommandSessionServices {
    config: SessionConfig,
}

impl CommandSessionServices {
    #[must_use]
    pub const fn new(config: SessionConfig) -> Self { Self { config } }

    fn command_for(&self, action: SessionAction) -> &str {
        match action {
            SessionAction::Logout => &self.config.logout,
            SessionAction::LockScreen => &self.config.lock_screen,
            SessionAction::SwitchUser => &self.config.switch_user,
            SessionAction::Suspend => &self.config.suspend,
            SessionAction::Hibernate => &self.config.hibernate,
            SessionAction::Reboot => &self.config.reboot,
            SessionAction::Shutdown => &self.config.shutdown,
        }
    }

    fn run(name: &str, command: &str) -> Result<(), ServiceError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(ServiceError::Unavailable(name.to_string()));
        }

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|err| ServiceError::Spawn {
                command: command.to_string(),
                message: err.to_string(),
            })?;
        tracing::debug!(action = name, command, pid = child.id(), "started session command");

        // Reap the child so it does not linger as a zombie.
        let name = name.to_string();
        let spawned = std::thread::Builder::new().name("shelf-session-command".to_string()).spawn(
            move || match child.wait() {
                Ok(status) if !status.success() => {
                    tracing::warn!(action = %name, %status, "session command failed");
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(action = %name, error = %err, "failed to wait for session command"),
            },
        );
        if let Err(err) = spawned {
            tracing::debug!(error = %err, "failed to spawn reaper thread");
        }
        Ok(())
    }
}

impl SessionServices for CommandSessionServices {
    fn session_action(&self, action: SessionAction) -> Result<(), ServiceError> {
        Self::run(action.as_str(), self.command_for(action))
    }

    fn set_night_mode(&self, enabled: bool) -> Result<(), ServiceError> {
        if enabled {
            Self::run("night-mode-on", &self.config.night_mode_on)
        } else {
            Self::run("night-mode-off", &self.config.night_mode_off)
        }
    }

    fn launch(&self, command: &str) -> Result<(), ServiceError> { Self::run("launch", command) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_action_is_unavailable() {
        let services = CommandSessionServices::default();
        assert_eq!(
            services.session_action(SessionAction::Reboot),
            Err(ServiceError::Unavailable("reboot".to_string()))
        );
        assert!(matches!(services.set_night_mode(true), Err(ServiceError::Unavailable(_))));
    }

    #[test]
    fn test_configured_action_runs() {
        let services = CommandSessionServices::new(SessionConfig {
            lock_screen: "true".to_string(),
            ..Default::default()
        });
        assert!(services.session_action(SessionAction::LockScreen).is_ok());
    }

    #[test]
    fn test_blank_launch_is_rejected() {
        let services = CommandSessionServices::default();
        assert!(services.launch("   ").is_err());
    }
}
