//! Window manager connection pump.
//!
//! Subscribes to the adapter, snapshots every window, then forwards event
//! batches to the actor until the stream ends. Subscribing happens before the
//! snapshot so nothing created in between is missed; events older than the
//! snapshot are dropped by revision in the directory.
//!
//! The pump only holds a weak sender, so it never keeps the actor alive.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::messages::PanelMessage;
use crate::config::AdapterConfig;
use crate::modules::windows::{
    AdapterError, DesktopInfo, EventStream, WindowManagerAdapter, WindowRecord,
};

/// Exponential reconnect delay.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    #[must_use]
    pub fn new(config: &AdapterConfig) -> Self {
        let min = Duration::from_millis(config.reconnect_min_ms.max(1));
        let max = Duration::from_millis(config.reconnect_max_ms).max(min);
        Self { min, max, current: min }
    }

    /// Delay before the next attempt; doubles up to the maximum.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub const fn reset(&mut self) { self.current = self.min; }
}

/// Everything needed to start from a consistent view.
struct Snapshot {
    stream: EventStream,
    windows: Vec<WindowRecord>,
    desktops: DesktopInfo,
}

fn connect(adapter: &dyn WindowManagerAdapter) -> Result<Snapshot, AdapterError> {
    let stream = adapter.subscribe()?;
    let desktops = adapter.desktop_info()?;
    let mut windows = Vec::new();
    for id in adapter.list_windows()? {
        match adapter.window_attributes(id) {
            Ok(record) => windows.push(record),
            // Closed between listing and querying.
            Err(AdapterError::NotFound(_)) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(Snapshot {
        stream,
        windows,
        desktops,
    })
}

/// Deliver a message. Returns `false` once the actor is gone.
async fn deliver(actor: &mpsc::WeakSender<PanelMessage>, msg: PanelMessage) -> bool {
    let Some(sender) = actor.upgrade() else {
        return false;
    };
    sender.send(msg).await.is_ok()
}

/// Spawn the pump. It stops when the actor goes away.
pub fn spawn_connection(
    adapter: Arc<dyn WindowManagerAdapter>,
    actor: mpsc::WeakSender<PanelMessage>,
    config: AdapterConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run(adapter.as_ref(), &actor, &config).await;
        tracing::debug!("adapter pump stopped");
    })
}

async fn run(
    adapter: &dyn WindowManagerAdapter,
    actor: &mpsc::WeakSender<PanelMessage>,
    config: &AdapterConfig,
) {
    let mut backoff = Backoff::new(config);

    loop {
        let reason = match connect(adapter) {
            Ok(Snapshot {
                mut stream,
                windows,
                desktops,
            }) => {
                backoff.reset();
                tracing::debug!(windows = windows.len(), "adapter snapshot taken");
                if !deliver(actor, PanelMessage::AdapterConnected { windows, desktops }).await {
                    return;
                }
                while let Some(batch) = stream.next().await {
                    if !batch.is_empty() && !deliver(actor, PanelMessage::WindowEvents(batch)).await
                    {
                        return;
                    }
                }
                "event stream ended".to_string()
            }
            Err(err) => err.to_string(),
        };

        if !deliver(actor, PanelMessage::AdapterDisconnected { reason }).await {
            return;
        }

        let delay = backoff.next_delay();
        tracing::debug!(?delay, "reconnecting to window manager");
        tokio::time::sleep(delay).await;
    }
}
