//! Configuration file watcher for hot-reloading.
//!
//! Watches the configuration file and hands every successfully parsed new
//! version to a callback. The panel controller applies it in place; nothing is
//! restarted.

use std::path::PathBuf;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use super::{ShelfConfig, load_config_from_path};

/// Debounce duration for config file changes.
/// Some editors trigger multiple events per save (write to temp, rename, etc.).
const CONFIG_DEBOUNCE_MS: u64 = 200;

/// Handle keeping a config watcher thread alive.
///
/// Dropping the handle stops the watcher.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher").finish_non_exhaustive()
    }
}

/// Starts watching the configuration file for changes.
///
/// Events are debounced: `on_change` runs once the file has been quiet for
/// [`CONFIG_DEBOUNCE_MS`]. Files that fail to parse are logged and skipped.
///
/// Returns `None` if the watcher could not be created.
pub fn watch_config_file<F>(config_path: PathBuf, on_change: F) -> Option<ConfigWatcher>
where
    F: Fn(ShelfConfig) + Send + 'static,
{
    let config_filename =
        config_path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();

    let (tx, rx) = std::sync::mpsc::channel();

    let mut watcher: RecommendedWatcher = match notify::recommended_watcher(tx) {
        Ok(w) => w,
        Err(err) => {
            tracing::warn!(error = %err, "failed to create config watcher");
            return None;
        }
    };

    // Watch the parent directory to catch file replacements
    // (some editors save by writing to a temp file then renaming)
    let watch_path = config_path.parent().unwrap_or(&config_path).to_path_buf();
    if let Err(err) = watcher.watch(&watch_path, RecursiveMode::NonRecursive) {
        tracing::warn!(error = %err, path = %watch_path.display(), "failed to watch config file");
        return None;
    }

    std::thread::Builder::new()
        .name("shelf-config-watcher".to_string())
        .spawn(move || {
            let debounce = Duration::from_millis(CONFIG_DEBOUNCE_MS);
            let mut deadline: Option<Instant> = None;

            loop {
                let received = match deadline {
                    Some(at) => rx.recv_timeout(at.saturating_duration_since(Instant::now())),
                    None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                };

                match received {
                    Ok(Ok(event)) => {
                        let affects_config = event
                            .paths
                            .iter()
                            .any(|p| p.file_name().is_some_and(|name| name == config_filename));
                        if affects_config {
                            deadline = Some(Instant::now() + debounce);
                        }
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(error = %err, "config watch error");
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        deadline = None;
                        match load_config_from_path(&config_path) {
                            Ok((config, _)) => {
                                tracing::info!(path = %config_path.display(), "configuration reloaded");
                                on_change(config);
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "ignoring invalid configuration change");
                            }
                        }
                    }
                    // Channel closed, watcher dropped
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })
        .ok()?;

    Some(ConfigWatcher { _watcher: watcher })
}
