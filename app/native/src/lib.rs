//! Shelf - A desktop panel core.
//!
//! This library provides the panel daemon and the CLI. The panel hosts an
//! ordered list of plugins, lays them out along one screen edge, and tracks
//! windows through a [`WindowManagerAdapter`](modules::windows::WindowManagerAdapter)
//! to drive its taskbar.

// Core modules
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod schema;

// Panel modules
pub mod modules;
pub mod platform;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use crate::error::ShelfError;
use crate::geometry::Rect;
use crate::modules::panel::{
    PanelActor, PanelHandle, PanelMessage, PanelNotification, PanelOptions, PluginRegistry,
    open_store,
};
use crate::modules::windows::{DesktopInfo, WindowAttributes};
use crate::platform::{CommandSessionServices, InMemoryWindowManager};

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Geometry of the panel's screen.
    pub screen: Rect,
    /// Open a few sample windows on the in-memory window manager.
    pub demo: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            screen: Rect::new(0, 0, 1920, 1080),
            demo: false,
        }
    }
}

/// Runs the panel until interrupted.
///
/// # Errors
///
/// Returns an error if the plugin store cannot be read or the runtime cannot
/// be started.
pub fn run(options: &RunOptions) -> Result<(), ShelfError> {
    let config = config::init().clone();
    let registry = PluginRegistry::open(open_store(&config.persistence))?;
    tracing::info!(plugins = registry.len(), screen = %options.screen, "starting panel");

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(async move {
        let desktops = DesktopInfo { count: 4, active: 0 };
        let adapter = Arc::new(InMemoryWindowManager::new(desktops).with_auto_confirm(true));
        if options.demo {
            open_demo_windows(&adapter);
        }

        let handle = PanelActor::spawn(PanelOptions {
            services: Arc::new(CommandSessionServices::new(config.session.clone())),
            config,
            registry,
            adapter,
            screen: options.screen,
        });

        let watcher = config::get_config_path().and_then(|path| {
            let handle = handle.clone();
            config::watch_config_file(path.clone(), move |config| {
                if let Err(err) = handle.send(PanelMessage::ConfigChanged(Box::new(config))) {
                    tracing::warn!(error = %err, "failed to deliver configuration change");
                }
            })
        });

        tokio::spawn(log_notifications(handle.clone()));

        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for interrupt");
        }
        tracing::info!("shutting down");
        drop(watcher);
        let _ = handle.shutdown().await;
        Ok(())
    })
}

fn open_demo_windows(adapter: &InMemoryWindowManager) {
    for (title, class) in [
        ("Terminal", "xterm"),
        ("Terminal", "xterm"),
        ("Mozilla Firefox", "firefox"),
        ("notes.txt - Editor", "gedit"),
    ] {
        adapter.open_window(WindowAttributes::new(title, class));
    }
}

async fn log_notifications(handle: PanelHandle) {
    let mut notifications = handle.notifications();
    loop {
        match notifications.recv().await {
            Ok(PanelNotification::Warning(message)) => tracing::warn!("{message}"),
            Ok(PanelNotification::AdapterStateChanged(state)) => {
                tracing::info!(?state, "window manager connection changed");
            }
            Ok(PanelNotification::LayoutChanged(layout)) => {
                tracing::debug!(panel = %layout.panel, slots = layout.slots.len(), "layout changed");
            }
            Ok(notification) => tracing::trace!(notification = notification.name(), "notification"),
            Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "notification log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
