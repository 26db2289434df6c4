//! Plugin registry and plugin command handlers.

use std::time::Instant;

use uuid::Uuid;

use crate::error::ShelfError;
use crate::modules::panel::actor::PanelNotification;
use crate::modules::panel::registry::{MutationOutcome, RegistryError, RegistryMutation};
use crate::modules::panel::state::{PanelState, PendingWrite};

/// Apply a registry mutation.
///
/// Configuration blobs are validated on a scratch instance before anything is
/// written. A failed write leaves the registry and the live plugins untouched
/// and queues the planned list for retry. A later change to the list discards
/// the queued write, so repeating a failed mutation never applies it twice.
pub fn on_mutate(
    state: &mut PanelState,
    mutation: RegistryMutation,
    now: Instant,
) -> Result<MutationOutcome, ShelfError> {
    validate(state, &mutation)?;

    match state.registry.apply(&mutation) {
        Ok(outcome) => {
            if outcome == MutationOutcome::Changed {
                after_change(state, &mutation, now);
            }
            Ok(outcome)
        }
        Err(RegistryError::Persistence(err)) => {
            tracing::warn!(error = %err, id = %mutation.id(), "plugin list not saved, will retry");
            if let Ok(Some(candidate)) = state.registry.plan(&mutation) {
                let write = PendingWrite {
                    mutation,
                    base: state.registry.records().to_vec(),
                    candidate,
                    attempts: 0,
                    due: now,
                };
                queue_retry(state, write, now);
            }
            Err(RegistryError::Persistence(err).into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Retry writes whose delay has passed.
pub fn on_retry_writes(state: &mut PanelState, now: Instant) {
    while let Some(write) = state.pending_writes.front() {
        if write.due > now {
            break;
        }
        let Some(mut write) = state.pending_writes.pop_front() else {
            break;
        };
        write.attempts += 1;
        let attempts = write.attempts;

        match state.registry.commit(&write.base, write.candidate.clone()) {
            Ok(_) => {
                tracing::info!(id = %write.mutation.id(), attempts, "plugin list saved after retry");
                after_change(state, &write.mutation, now);
            }
            Err(RegistryError::Persistence(err)) => {
                if attempts >= state.config.persistence.write_retries {
                    tracing::error!(error = %err, attempts, "giving up on saving plugin list");
                    state.notify(PanelNotification::Warning(format!(
                        "Plugin list could not be saved after {attempts} attempts: {err}"
                    )));
                } else {
                    queue_retry(state, write, now);
                }
            }
            Err(RegistryError::Superseded) => {
                tracing::info!(id = %write.mutation.id(), "plugin list changed, dropping queued change");
                state.notify(PanelNotification::Warning(
                    "An unsaved plugin change was discarded because the plugin list changed".to_string(),
                ));
            }
            Err(err) => {
                tracing::debug!(error = %err, id = %write.mutation.id(), "dropping queued plugin change");
            }
        }
    }
}

fn queue_retry(state: &mut PanelState, mut write: PendingWrite, now: Instant) {
    if state.config.persistence.write_retries == 0 {
        state.notify(PanelNotification::Warning(
            "Plugin list could not be saved".to_string(),
        ));
        return;
    }
    write.due = now + state.retry_delay();
    state.pending_writes.push_back(write);
}

/// Reject configurations the plugin would not accept.
fn validate(state: &PanelState, mutation: &RegistryMutation) -> Result<(), ShelfError> {
    let (id, kind, config) = match mutation {
        RegistryMutation::Add { id, kind, config, .. } => (*id, kind.as_str(), config),
        RegistryMutation::Reconfigure { id, config } => {
            let Some(record) = state.registry.get(*id) else {
                return Ok(());
            };
            if !state.is_instantiated(*id) {
                // Unknown stored type; keep the blob as given.
                return Ok(());
            }
            (*id, record.kind.as_str(), config)
        }
        RegistryMutation::Remove { .. } | RegistryMutation::Move { .. } => return Ok(()),
    };

    let mut scratch = state.instantiate(id, kind, config)?;
    scratch.destroy();
    Ok(())
}

fn after_change(state: &mut PanelState, mutation: &RegistryMutation, now: Instant) {
    if let RegistryMutation::Reconfigure { id, config } = mutation
        && let Some(plugin) = state.plugins.get_mut(id)
        && let Err(err) = plugin.configure(config)
    {
        tracing::warn!(id = %id, error = %err, "plugin rejected its new configuration");
    }
    state.sync_plugins();
    state.refresh_taskbar(now);
    state.relayout(now);
    state.notify(PanelNotification::PluginsChanged(state.registry.records().to_vec()));
}

/// Run a named command on one plugin.
pub fn on_plugin_command(
    state: &mut PanelState,
    id: Uuid,
    command: &str,
    now: Instant,
) -> Result<(), ShelfError> {
    let Some(plugin) = state.plugins.get_mut(&id) else {
        return Err(RegistryError::NotFound(id).into());
    };
    tracing::debug!(id = %id, kind = plugin.kind(), command, "plugin command");
    let requests = plugin.command(command)?;
    state.send_requests(requests);
    state.relayout(now);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ShelfConfig;
    use crate::modules::panel::plugins::PluginKind;
    use crate::modules::panel::registry::{Direction, PluginRegistry};
    use crate::modules::panel::services::{RecordingServices, ServiceCall};
    use crate::modules::panel::state::tests::{SCREEN, test_state};
    use crate::modules::panel::store::{MemoryStore, PluginStore, StoreError};
    use crate::modules::panel::actor::AdapterState;
    use crate::modules::windows::WmRequest;

    /// Store whose failures can be switched on from the test.
    #[derive(Clone, Default)]
    struct FlakyStore {
        inner: Arc<parking_lot::Mutex<(MemoryStore, usize)>>,
    }

    impl FlakyStore {
        fn fail_next(&self, count: usize) { self.inner.lock().1 = count; }

        fn saves(&self) -> usize { self.inner.lock().0.save_count() }
    }

    impl PluginStore for FlakyStore {
        fn load(&self) -> Result<Option<Vec<crate::modules::panel::PluginRecord>>, StoreError> {
            self.inner.lock().0.load()
        }

        fn save(&mut self, records: &[crate::modules::panel::PluginRecord]) -> Result<(), StoreError> {
            let mut guard = self.inner.lock();
            if guard.1 > 0 {
                guard.1 -= 1;
                return Err(StoreError::Simulated);
            }
            guard.0.save(records)
        }
    }

    fn flaky_state(retries: u32, now: Instant) -> (PanelState, FlakyStore) {
        let store = FlakyStore::default();
        let registry = PluginRegistry::open(Box::new(store.clone())).unwrap();
        let mut config = ShelfConfig::default();
        config.persistence.write_retries = retries;
        config.persistence.retry_delay_ms = 100;
        let state =
            PanelState::new(config, registry, Arc::new(RecordingServices::new()), SCREEN, now);
        (state, store)
    }

    #[test]
    fn test_add_instantiates_and_relayouts() {
        let now = Instant::now();
        let mut state = test_state(ShelfConfig::default(), now);
        let mutation = RegistryMutation::add(PluginKind::Clock, Some(0), serde_json::Value::Null);
        let id = mutation.id();

        assert_eq!(on_mutate(&mut state, mutation, now).unwrap(), MutationOutcome::Changed);
        assert!(state.is_instantiated(id));
        assert_eq!(state.layout.slots[0].id, id);
    }

    #[test]
    fn test_duplicate_singleton_leaves_registry_unchanged() {
        let now = Instant::now();
        let mut state = test_state(ShelfConfig::default(), now);
        let before = state.registry.records().to_vec();

        let err = on_mutate(
            &mut state,
            RegistryMutation::add(PluginKind::Taskbar, None, serde_json::Value::Null),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, ShelfError::DuplicateSingleton(_)));
        assert_eq!(state.registry.records(), before.as_slice());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_saving() {
        let now = Instant::now();
        let mut state = test_state(ShelfConfig::default(), now);
        let clock = state.registry.records().iter().find(|r| r.kind == "clock").unwrap().id;

        let err = on_mutate(
            &mut state,
            RegistryMutation::Reconfigure {
                id: clock,
                config: serde_json::json!({ "format": 42 }),
            },
            now,
        )
        .unwrap_err();
        assert!(matches!(err, ShelfError::PluginError(_)));
        assert_eq!(state.registry.get(clock).unwrap().config, serde_json::Value::Null);
    }

    #[test]
    fn test_remove_destroys_instance() {
        let now = Instant::now();
        let mut state = test_state(ShelfConfig::default(), now);
        let spacer = state.registry.records().iter().find(|r| r.kind == "spacer").unwrap().id;

        on_mutate(&mut state, RegistryMutation::Remove { id: spacer }, now).unwrap();
        assert!(!state.is_instantiated(spacer));
        assert!(state.layout.slot(spacer).is_none());
        assert_eq!(state.layout.slots.len(), 5);
    }

    #[test]
    fn test_move_at_boundary_is_noop() {
        let now = Instant::now();
        let mut state = test_state(ShelfConfig::default(), now);
        let first = state.registry.records()[0].id;
        let outcome = on_mutate(
            &mut state,
            RegistryMutation::Move {
                id: first,
                direction: Direction::Up,
            },
            now,
        )
        .unwrap();
        assert_eq!(outcome, MutationOutcome::Unchanged);
    }

    #[test]
    fn test_failed_write_is_retried() {
        let now = Instant::now();
        let (mut state, store) = flaky_state(3, now);
        let saves = store.saves();
        store.fail_next(1);

        let mutation = RegistryMutation::add(PluginKind::Clock, None, serde_json::Value::Null);
        let id = mutation.id();
        let err = on_mutate(&mut state, mutation, now).unwrap_err();
        assert!(matches!(err, ShelfError::PersistenceError(_)));
        assert!(state.registry.get(id).is_none());
        assert_eq!(state.next_deadline(now), Some(now + std::time::Duration::from_millis(100)));

        on_retry_writes(&mut state, now + std::time::Duration::from_millis(100));
        assert!(state.registry.get(id).is_some());
        assert!(state.is_instantiated(id));
        assert_eq!(store.saves(), saves + 1);
        assert!(state.pending_writes.is_empty());
    }

    #[test]
    fn test_repeated_move_after_failed_write_applies_once() {
        let now = Instant::now();
        let (mut state, store) = flaky_state(3, now);
        let mut notifications = state.published().notifications.subscribe();
        let clock = state.registry.records().iter().find(|r| r.kind == "clock").unwrap().id;
        let last = state.registry.len() - 1;
        assert_eq!(state.registry.get(clock).unwrap().ordinal, last);

        let up = RegistryMutation::Move {
            id: clock,
            direction: Direction::Up,
        };
        store.fail_next(1);
        let err = on_mutate(&mut state, up.clone(), now).unwrap_err();
        assert!(matches!(err, ShelfError::PersistenceError(_)));
        assert_eq!(state.pending_writes.len(), 1);

        // The caller repeats the move and this time it is saved.
        on_mutate(&mut state, up, now).unwrap();
        assert_eq!(state.registry.get(clock).unwrap().ordinal, last - 1);

        on_retry_writes(&mut state, now + std::time::Duration::from_millis(100));
        assert!(state.pending_writes.is_empty());
        assert_eq!(state.registry.get(clock).unwrap().ordinal, last - 1);

        let mut warned = false;
        while let Ok(notification) = notifications.try_recv() {
            warned |= matches!(notification, PanelNotification::Warning(_));
        }
        assert!(warned);
    }

    #[test]
    fn test_repeated_add_after_failed_write_adds_once() {
        let now = Instant::now();
        let (mut state, store) = flaky_state(3, now);
        let before = state.registry.len();

        store.fail_next(1);
        let first = RegistryMutation::add(PluginKind::Clock, None, serde_json::Value::Null);
        let first_id = first.id();
        on_mutate(&mut state, first, now).unwrap_err();
        let second = RegistryMutation::add(PluginKind::Clock, None, serde_json::Value::Null);
        on_mutate(&mut state, second, now).unwrap();

        on_retry_writes(&mut state, now + std::time::Duration::from_millis(100));
        assert_eq!(state.registry.len(), before + 1);
        assert!(state.registry.get(first_id).is_none());
    }

    #[test]
    fn test_exhausted_retries_warn() {
        let now = Instant::now();
        let (mut state, store) = flaky_state(2, now);
        let mut notifications = state.published().notifications.subscribe();
        store.fail_next(10);

        let spacer = state.registry.records().iter().find(|r| r.kind == "spacer").unwrap().id;
        on_mutate(&mut state, RegistryMutation::Remove { id: spacer }, now).unwrap_err();

        let later = now + std::time::Duration::from_secs(1);
        on_retry_writes(&mut state, later);
        on_retry_writes(&mut state, later + std::time::Duration::from_secs(1));
        assert!(state.pending_writes.is_empty());
        // The in-memory list stays authoritative.
        assert!(state.registry.get(spacer).is_some());

        let mut warned = false;
        while let Ok(notification) = notifications.try_recv() {
            warned |= matches!(notification, PanelNotification::Warning(_));
        }
        assert!(warned);
    }

    #[test]
    fn test_plugin_command_routes_requests() {
        let now = Instant::now();
        let mut state = test_state(ShelfConfig::default(), now);
        state.adapter_state = AdapterState::Connected;
        let id = state
            .registry
            .add(PluginKind::ShowDesktop, None, serde_json::Value::Null)
            .unwrap();
        state.sync_plugins();
        state.take_outbox();

        on_plugin_command(&mut state, id, "toggle", now).unwrap();
        assert!(state.take_outbox().contains(&WmRequest::ShowDesktop { show: true }));

        assert!(on_plugin_command(&mut state, Uuid::now_v7(), "toggle", now).is_err());
    }

    #[test]
    fn test_session_command_uses_services() {
        let now = Instant::now();
        let services = Arc::new(RecordingServices::new());
        let registry = PluginRegistry::open(Box::new(MemoryStore::new())).unwrap();
        let mut state =
            PanelState::new(ShelfConfig::default(), registry, services.clone(), SCREEN, now);
        let menu = state.registry.records().iter().find(|r| r.kind == "startmenu").unwrap().id;

        on_plugin_command(&mut state, menu, "lock-screen", now).unwrap();
        assert_eq!(services.calls(), vec![ServiceCall::Session(
            crate::modules::panel::SessionAction::LockScreen
        )]);
    }
}
