//! Handle for communicating with the panel actor.
//!
//! The `PanelHandle` provides a cloneable interface for sending messages to
//! the panel actor, querying it, and subscribing to its published state.

use std::sync::Arc;
use std::time::Duration;

use eyeball::{SharedObservable, Subscriber};
use tokio::sync::{broadcast, mpsc, oneshot};
use uuid::Uuid;

use super::messages::{
    AdapterState, PanelMessage, PanelNotification, PanelQuery, QueryResult, Responder,
};
use crate::error::ShelfError;
use crate::modules::panel::layout::PanelLayout;
use crate::modules::panel::plugins::PluginKind;
use crate::modules::panel::registry::{Direction, MutationOutcome, PluginRecord, RegistryMutation};
use crate::modules::taskbar::{TaskbarInput, TaskbarView};
use crate::modules::windows::{DesktopInfo, DirectorySnapshot};

/// Error types for actor communication.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// Failed to send message to actor.
    #[error("Failed to send message to actor: channel closed")]
    SendFailed,

    /// Failed to receive response from actor.
    #[error("Failed to receive response from actor: channel closed")]
    ReceiveFailed,

    /// Query timed out.
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// The actor answered with a result of another kind.
    #[error("Unexpected query result")]
    UnexpectedResult,
}

/// Snapshots published by the actor.
#[derive(Clone)]
pub struct Published {
    pub layout: SharedObservable<Arc<PanelLayout>>,
    pub taskbar: SharedObservable<Arc<TaskbarView>>,
    pub notifications: broadcast::Sender<PanelNotification>,
}

/// Handle for communicating with the panel actor.
///
/// This handle is cheap to clone and can be shared across threads.
#[derive(Clone)]
pub struct PanelHandle {
    sender: mpsc::Sender<PanelMessage>,
    published: Published,
}

impl PanelHandle {
    pub(crate) const fn new(sender: mpsc::Sender<PanelMessage>, published: Published) -> Self {
        Self { sender, published }
    }

    // ========================================================================
    // Fire-and-forget sending
    // ========================================================================

    /// Send a message to the actor without waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed or full.
    pub fn send(&self, msg: PanelMessage) -> Result<(), ActorError> {
        self.sender.try_send(msg).map_err(|_| ActorError::SendFailed)
    }

    /// Send a message to the actor and wait for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub async fn send_async(&self, msg: PanelMessage) -> Result<(), ActorError> {
        self.sender.send(msg).await.map_err(|_| ActorError::SendFailed)
    }

    /// Whether the actor has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.sender.is_closed() }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Subscribe to notifications.
    #[must_use]
    pub fn notifications(&self) -> broadcast::Receiver<PanelNotification> {
        self.published.notifications.subscribe()
    }

    /// Subscribe to layout snapshots.
    #[must_use]
    pub fn subscribe_layout(&self) -> Subscriber<Arc<PanelLayout>> {
        self.published.layout.subscribe()
    }

    /// Subscribe to taskbar views.
    #[must_use]
    pub fn subscribe_taskbar(&self) -> Subscriber<Arc<TaskbarView>> {
        self.published.taskbar.subscribe()
    }

    /// Latest published layout.
    #[must_use]
    pub fn current_layout(&self) -> Arc<PanelLayout> { self.published.layout.get() }

    /// Latest published taskbar view.
    #[must_use]
    pub fn current_taskbar(&self) -> Arc<TaskbarView> { self.published.taskbar.get() }

    // ========================================================================
    // Query methods
    // ========================================================================

    /// Execute a query and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed, or
    /// [`ActorError::ReceiveFailed`] if the response channel is closed.
    pub async fn query(&self, query: PanelQuery) -> Result<QueryResult, ActorError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PanelMessage::Query { query, respond_to: tx })
            .await
            .map_err(|_| ActorError::SendFailed)?;
        rx.await.map_err(|_| ActorError::ReceiveFailed)
    }

    /// Execute a query with a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::Timeout`] if the query doesn't complete in time,
    /// or any error from [`Self::query`].
    pub async fn query_timeout(
        &self,
        query: PanelQuery,
        timeout: Duration,
    ) -> Result<QueryResult, ActorError> {
        tokio::time::timeout(timeout, self.query(query))
            .await
            .map_err(|_| ActorError::Timeout(timeout))?
    }

    /// Plugin list in ordinal order.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn plugins(&self) -> Result<Vec<PluginRecord>, ActorError> {
        match self.query(PanelQuery::Plugins).await? {
            QueryResult::Plugins(records) => Ok(records),
            _ => Err(ActorError::UnexpectedResult),
        }
    }

    /// Current layout.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn layout(&self) -> Result<Arc<PanelLayout>, ActorError> {
        match self.query(PanelQuery::Layout).await? {
            QueryResult::Layout(layout) => Ok(layout),
            _ => Err(ActorError::UnexpectedResult),
        }
    }

    /// Current taskbar view, if a taskbar is on the panel.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn taskbar_view(&self) -> Result<Option<Arc<TaskbarView>>, ActorError> {
        match self.query(PanelQuery::TaskbarView).await? {
            QueryResult::TaskbarView(view) => Ok(view),
            _ => Err(ActorError::UnexpectedResult),
        }
    }

    /// Known windows in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn windows(&self) -> Result<DirectorySnapshot, ActorError> {
        match self.query(PanelQuery::Windows).await? {
            QueryResult::Windows(windows) => Ok(windows),
            _ => Err(ActorError::UnexpectedResult),
        }
    }

    /// Virtual desktop info.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn desktops(&self) -> Result<DesktopInfo, ActorError> {
        match self.query(PanelQuery::Desktops).await? {
            QueryResult::Desktops(desktops) => Ok(desktops),
            _ => Err(ActorError::UnexpectedResult),
        }
    }

    /// Window manager connection state.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn adapter_state(&self) -> Result<AdapterState, ActorError> {
        match self.query(PanelQuery::AdapterState).await? {
            QueryResult::AdapterState(state) => Ok(state),
            _ => Err(ActorError::UnexpectedResult),
        }
    }

    // ========================================================================
    // Requests with replies
    // ========================================================================

    async fn request<T>(
        &self,
        build: impl FnOnce(Responder<T>) -> PanelMessage,
    ) -> Result<T, ShelfError> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(build(tx)).await.map_err(|_| ActorError::SendFailed)?;
        rx.await.map_err(|_| ActorError::ReceiveFailed)?
    }

    /// Apply a registry mutation.
    ///
    /// # Errors
    ///
    /// Returns the registry error, or an error if communication fails.
    pub async fn mutate(&self, mutation: RegistryMutation) -> Result<MutationOutcome, ShelfError> {
        self.request(|respond_to| PanelMessage::Mutate { mutation, respond_to }).await
    }

    /// Add a plugin. Returns the new instance id.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::DuplicateSingleton`] for a second single-instance
    /// plugin, or any other registry error.
    pub async fn add_plugin(
        &self,
        kind: PluginKind,
        position: Option<usize>,
        config: serde_json::Value,
    ) -> Result<Uuid, ShelfError> {
        let mutation = RegistryMutation::add(kind, position, config);
        let id = mutation.id();
        self.mutate(mutation).await?;
        Ok(id)
    }

    /// Remove a plugin.
    ///
    /// # Errors
    ///
    /// Returns the registry error, or an error if communication fails.
    pub async fn remove_plugin(&self, id: Uuid) -> Result<MutationOutcome, ShelfError> {
        self.mutate(RegistryMutation::Remove { id }).await
    }

    /// Move a plugin one step.
    ///
    /// # Errors
    ///
    /// Returns the registry error, or an error if communication fails.
    pub async fn move_plugin(
        &self,
        id: Uuid,
        direction: Direction,
    ) -> Result<MutationOutcome, ShelfError> {
        self.mutate(RegistryMutation::Move { id, direction }).await
    }

    /// Replace a plugin's configuration.
    ///
    /// # Errors
    ///
    /// Returns the registry or plugin error, or an error if communication fails.
    pub async fn reconfigure_plugin(
        &self,
        id: Uuid,
        config: serde_json::Value,
    ) -> Result<MutationOutcome, ShelfError> {
        self.mutate(RegistryMutation::Reconfigure { id, config }).await
    }

    /// Run a named plugin command.
    ///
    /// # Errors
    ///
    /// Returns the plugin error, or an error if communication fails.
    pub async fn plugin_command(&self, id: Uuid, command: &str) -> Result<(), ShelfError> {
        let command = command.to_string();
        self.request(|respond_to| PanelMessage::PluginCommand {
            id,
            command,
            respond_to,
        })
        .await
    }

    /// Deliver taskbar input.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub async fn taskbar_input(&self, input: TaskbarInput) -> Result<(), ActorError> {
        self.send_async(PanelMessage::TaskbarInput(input)).await
    }

    /// Stop the actor.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the actor already stopped.
    pub async fn shutdown(&self) -> Result<(), ActorError> {
        self.send_async(PanelMessage::Shutdown).await
    }
}
