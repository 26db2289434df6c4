//! Panel actor.
//!
//! The panel actor owns all panel state and processes messages sequentially,
//! so window events, configuration changes, screen changes and registry
//! mutations never interleave.
//!
//! # Panic Recovery
//!
//! If a message handler panics, the panic is caught and logged and the actor
//! keeps processing subsequent messages. A bad event from the window manager
//! must not take the whole panel down.

mod connection;
mod handle;
pub mod handlers;
mod messages;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

pub use connection::Backoff;
pub use handle::{ActorError, PanelHandle, Published};
pub use messages::{
    AdapterState, PanelMessage, PanelNotification, PanelQuery, QueryResult, Responder,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::registry::PluginRegistry;
use super::services::SharedServices;
use super::state::PanelState;
use crate::config::ShelfConfig;
use crate::geometry::Rect;
use crate::modules::windows::{AdapterError, WindowManagerAdapter};

/// Channel buffer size for the panel actor.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Current time on the runtime clock, so paused test time applies.
fn now() -> Instant { tokio::time::Instant::now().into_std() }

/// Everything the actor needs to start.
pub struct PanelOptions {
    pub config: ShelfConfig,
    pub registry: PluginRegistry,
    pub services: SharedServices,
    pub adapter: Arc<dyn WindowManagerAdapter>,
    /// Geometry of the panel's screen.
    pub screen: Rect,
}

/// The actor that owns all panel state.
pub struct PanelActor {
    state: PanelState,
    receiver: mpsc::Receiver<PanelMessage>,
    adapter: Arc<dyn WindowManagerAdapter>,
}

impl PanelActor {
    /// Spawn the actor and its adapter pump on the current tokio runtime.
    #[must_use]
    pub fn spawn(options: PanelOptions) -> PanelHandle {
        tracing::debug!("spawning panel actor");
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let state = PanelState::new(
            options.config,
            options.registry,
            options.services,
            options.screen,
            now(),
        );
        let handle = PanelHandle::new(sender.clone(), state.published());
        let connection = connection::spawn_connection(
            Arc::clone(&options.adapter),
            sender.downgrade(),
            state.config().adapter.clone(),
        );

        let actor = Self {
            state,
            receiver,
            adapter: options.adapter,
        };
        tokio::spawn(actor.run(connection));

        handle
    }

    /// Run the message loop until shutdown or until every handle is dropped.
    async fn run(mut self, connection: JoinHandle<()>) {
        tracing::trace!("panel actor message loop starting");

        loop {
            let msg = match self.state.next_deadline(now()) {
                Some(deadline) => {
                    let deadline = tokio::time::Instant::from_std(deadline);
                    tokio::select! {
                        msg = self.receiver.recv() => msg,
                        () = tokio::time::sleep_until(deadline) => {
                            handlers::on_tick(&mut self.state, now());
                            self.flush();
                            continue;
                        }
                    }
                }
                None => self.receiver.recv().await,
            };

            let Some(msg) = msg else {
                tracing::debug!("panel actor channel closed, exiting");
                break;
            };
            if matches!(msg, PanelMessage::Shutdown) {
                tracing::debug!("panel actor received shutdown message");
                break;
            }

            let msg_name = msg.name();
            let result = catch_unwind(AssertUnwindSafe(|| self.handle_message(msg)));
            if let Err(panic_info) = result {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(message = msg_name, panic = %panic_msg, "panel actor recovered from panic");
            }
            self.flush();
        }

        connection.abort();
        self.state.destroy_plugins();
    }

    fn handle_message(&mut self, msg: PanelMessage) {
        let now = now();
        let state = &mut self.state;

        match msg {
            PanelMessage::WindowEvents(batch) => handlers::on_window_events(state, &batch, now),
            PanelMessage::AdapterConnected { windows, desktops } => {
                handlers::on_adapter_connected(state, windows, desktops, now);
            }
            PanelMessage::AdapterDisconnected { reason } => {
                handlers::on_adapter_disconnected(state, &reason, now);
            }
            PanelMessage::WindowResolved { window_id, record } => {
                handlers::on_window_resolved(state, window_id, record, now);
            }
            PanelMessage::ScreenChanged { screen } => {
                handlers::on_screen_changed(state, screen, now);
            }
            PanelMessage::ConfigChanged(config) => {
                handlers::on_config_changed(state, *config, now);
            }
            PanelMessage::PointerEntered => handlers::on_pointer_entered(state, now),
            PanelMessage::PointerLeft => handlers::on_pointer_left(state, now),
            PanelMessage::TaskbarInput(input) => handlers::on_taskbar_input(state, &input, now),
            PanelMessage::PluginCommand {
                id,
                command,
                respond_to,
            } => {
                let _ = respond_to.send(handlers::on_plugin_command(state, id, &command, now));
            }
            PanelMessage::Mutate {
                mutation,
                respond_to,
            } => {
                let _ = respond_to.send(handlers::on_mutate(state, mutation, now));
            }
            PanelMessage::Query { query, respond_to } => {
                let _ = respond_to.send(Self::handle_query(state, &query));
            }
            PanelMessage::Shutdown => {}
        }
    }

    fn handle_query(state: &PanelState, query: &PanelQuery) -> QueryResult {
        match query {
            PanelQuery::Plugins => QueryResult::Plugins(state.registry().records().to_vec()),
            PanelQuery::Layout => QueryResult::Layout(state.layout()),
            PanelQuery::TaskbarView => {
                QueryResult::TaskbarView(state.taskbar().map(|taskbar| taskbar.view()))
            }
            PanelQuery::Windows => QueryResult::Windows(state.directory().snapshot()),
            PanelQuery::Desktops => QueryResult::Desktops(state.directory().desktops()),
            PanelQuery::AdapterState => QueryResult::AdapterState(state.adapter_state()),
        }
    }

    /// Resolve queued window lookups, then send queued requests.
    fn flush(&mut self) {
        for window_id in self.state.take_lookups() {
            let record = match self.adapter.window_attributes(window_id) {
                Ok(record) => Some(record),
                Err(AdapterError::NotFound(_)) => None,
                Err(err) => {
                    tracing::debug!(window_id = %window_id, error = %err, "window lookup failed");
                    continue;
                }
            };
            handlers::on_window_resolved(&mut self.state, window_id, record, now());
        }

        for request in self.state.take_outbox() {
            if let Err(err) = self.adapter.request(request) {
                tracing::warn!(error = %err, "window manager request failed");
            }
        }
    }
}
