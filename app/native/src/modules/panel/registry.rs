//! Plugin registry.
//!
//! Holds the ordered list of plugin instances. Every mutation is computed on a
//! copy, persisted through the [`PluginStore`], and swapped in only after the
//! store accepted it. Observers therefore see either the old list or the new
//! one, and ordinals are always `0..N` without gaps.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plugins::{Cardinality, PluginKind};
use super::store::{PluginStore, StoreError};

/// A persisted plugin instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub id: Uuid,

    /// Catalog type name.
    #[serde(rename = "type")]
    pub kind: String,

    pub ordinal: usize,

    /// Opaque per-instance configuration.
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Direction of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards ordinal 0 (left/top).
    Up,
    /// Towards the last ordinal (right/bottom).
    Down,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" | "left" => Ok(Self::Up),
            "down" | "right" => Ok(Self::Down),
            _ => Err(format!("Invalid direction '{s}'. Expected up or down.")),
        }
    }
}

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Plugin type '{0}' allows a single instance and one already exists")]
    DuplicateSingleton(String),

    #[error("Unknown plugin type '{0}'")]
    UnknownType(String),

    #[error("No plugin with id {0}")]
    NotFound(Uuid),

    #[error("The panel is locked")]
    Locked,

    /// The store rejected the new list; the previous list is still in effect.
    #[error("Failed to persist plugin list: {0}")]
    Persistence(#[from] StoreError),

    /// The list changed after this write was planned.
    #[error("The plugin list changed before the write could be saved")]
    Superseded,
}

/// A registry mutation, kept whole so it can be retried after a failed write.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryMutation {
    Add {
        id: Uuid,
        kind: PluginKind,
        /// Target ordinal; clamped to the list length. `None` appends.
        position: Option<usize>,
        config: serde_json::Value,
    },
    Remove {
        id: Uuid,
    },
    Move {
        id: Uuid,
        direction: Direction,
    },
    Reconfigure {
        id: Uuid,
        config: serde_json::Value,
    },
}

impl RegistryMutation {
    /// Build an add mutation with a fresh instance id.
    #[must_use]
    pub fn add(kind: PluginKind, position: Option<usize>, config: serde_json::Value) -> Self {
        Self::Add {
            id: Uuid::now_v7(),
            kind,
            position,
            config,
        }
    }

    /// Instance the mutation is about.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Add { id, .. }
            | Self::Remove { id }
            | Self::Move { id, .. }
            | Self::Reconfigure { id, .. } => *id,
        }
    }
}

/// Result of an applied mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The list changed and was persisted.
    Changed,
    /// Nothing to do (move at a boundary).
    Unchanged,
}

/// Ordered set of plugin instances.
pub struct PluginRegistry {
    records: Vec<PluginRecord>,
    store: Box<dyn PluginStore>,
    locked: bool,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("records", &self.records)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

impl PluginRegistry {
    /// Open the registry from a store.
    ///
    /// A store with nothing saved yields the default plugin set, which is
    /// saved immediately. Duplicate singletons and duplicate ids found in the
    /// store are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn open(store: Box<dyn PluginStore>) -> Result<Self, RegistryError> {
        let loaded = store.load()?;
        let mut registry = Self {
            records: Vec::new(),
            store,
            locked: false,
        };

        match loaded {
            Some(mut records) => {
                records.sort_by_key(|r| r.ordinal);
                registry.records = sanitize(records);
                renumber(&mut registry.records);
            }
            None => {
                registry.records = super::plugins::default_plugin_set()
                    .into_iter()
                    .enumerate()
                    .map(|(ordinal, (kind, config))| PluginRecord {
                        id: Uuid::now_v7(),
                        kind: kind.as_str().to_string(),
                        ordinal,
                        config,
                    })
                    .collect();
                if let Err(err) = registry.store.save(&registry.records) {
                    tracing::warn!(error = %err, "failed to save default plugin list");
                }
            }
        }

        Ok(registry)
    }

    /// Records in ordinal order.
    #[must_use]
    pub fn records(&self) -> &[PluginRecord] { &self.records }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&PluginRecord> { self.records.iter().find(|r| r.id == id) }

    #[must_use]
    pub fn len(&self) -> usize { self.records.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    #[must_use]
    pub const fn is_locked(&self) -> bool { self.locked }

    /// Lock or unlock user mutations.
    pub fn set_locked(&mut self, locked: bool) { self.locked = locked; }

    /// Add a plugin at `position` (appended when `None`). Returns the new id.
    ///
    /// # Errors
    ///
    /// See [`PluginRegistry::apply`].
    pub fn add(
        &mut self,
        kind: PluginKind,
        position: Option<usize>,
        config: serde_json::Value,
    ) -> Result<Uuid, RegistryError> {
        let mutation = RegistryMutation::add(kind, position, config);
        let id = mutation.id();
        self.apply(&mutation)?;
        Ok(id)
    }

    /// Remove a plugin.
    ///
    /// # Errors
    ///
    /// See [`PluginRegistry::apply`].
    pub fn remove(&mut self, id: Uuid) -> Result<MutationOutcome, RegistryError> {
        self.apply(&RegistryMutation::Remove { id })
    }

    /// Swap a plugin with its neighbour. A no-op at either end.
    ///
    /// # Errors
    ///
    /// See [`PluginRegistry::apply`].
    pub fn move_plugin(&mut self, id: Uuid, direction: Direction) -> Result<MutationOutcome, RegistryError> {
        self.apply(&RegistryMutation::Move { id, direction })
    }

    /// Replace a plugin's configuration blob.
    ///
    /// # Errors
    ///
    /// See [`PluginRegistry::apply`].
    pub fn reconfigure(
        &mut self,
        id: Uuid,
        config: serde_json::Value,
    ) -> Result<MutationOutcome, RegistryError> {
        self.apply(&RegistryMutation::Reconfigure { id, config })
    }

    /// Apply a mutation atomically.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Locked`] while locked
    /// - [`RegistryError::DuplicateSingleton`] for a second single-instance plugin
    /// - [`RegistryError::NotFound`] for an unknown id
    /// - [`RegistryError::Persistence`] if the store rejected the new list; the
    ///   registry is unchanged
    pub fn apply(&mut self, mutation: &RegistryMutation) -> Result<MutationOutcome, RegistryError> {
        if self.locked {
            return Err(RegistryError::Locked);
        }

        let Some(candidate) = self.plan(mutation)? else {
            return Ok(MutationOutcome::Unchanged);
        };

        self.store.save(&candidate)?;
        self.records = candidate;
        Ok(MutationOutcome::Changed)
    }

    /// Save a list planned against `base`, provided the registry still holds `base`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Locked`] while locked
    /// - [`RegistryError::Superseded`] if the list changed since `base`
    /// - [`RegistryError::Persistence`] if the store rejected the list
    pub fn commit(
        &mut self,
        base: &[PluginRecord],
        candidate: Vec<PluginRecord>,
    ) -> Result<MutationOutcome, RegistryError> {
        if self.locked {
            return Err(RegistryError::Locked);
        }
        if self.records != base {
            return Err(RegistryError::Superseded);
        }
        self.store.save(&candidate)?;
        self.records = candidate;
        Ok(MutationOutcome::Changed)
    }

    /// Compute the list a mutation would produce. `None` means no change.
    ///
    /// # Errors
    ///
    /// Same as [`PluginRegistry::apply`], minus persistence.
    pub fn plan(&self, mutation: &RegistryMutation) -> Result<Option<Vec<PluginRecord>>, RegistryError> {
        let mut candidate = self.records.clone();

        match mutation {
            RegistryMutation::Add {
                id,
                kind,
                position,
                config,
            } => {
                if candidate.iter().any(|r| r.id == *id) {
                    // Already applied by an earlier attempt.
                    return Ok(None);
                }
                if kind.cardinality() == Cardinality::Single
                    && candidate.iter().any(|r| r.kind == kind.as_str())
                {
                    return Err(RegistryError::DuplicateSingleton(kind.as_str().to_string()));
                }
                let at = position.unwrap_or(candidate.len()).min(candidate.len());
                candidate.insert(at, PluginRecord {
                    id: *id,
                    kind: kind.as_str().to_string(),
                    ordinal: at,
                    config: config.clone(),
                });
            }
            RegistryMutation::Remove { id } => {
                let idx = self.index_of(*id)?;
                candidate.remove(idx);
            }
            RegistryMutation::Move { id, direction } => {
                let idx = self.index_of(*id)?;
                let target = match direction {
                    Direction::Up if idx > 0 => idx - 1,
                    Direction::Down if idx + 1 < candidate.len() => idx + 1,
                    _ => return Ok(None),
                };
                candidate.swap(idx, target);
            }
            RegistryMutation::Reconfigure { id, config } => {
                let idx = self.index_of(*id)?;
                if candidate[idx].config == *config {
                    return Ok(None);
                }
                candidate[idx].config = config.clone();
            }
        }

        renumber(&mut candidate);
        Ok(Some(candidate))
    }

    fn index_of(&self, id: Uuid) -> Result<usize, RegistryError> {
        self.records.iter().position(|r| r.id == id).ok_or(RegistryError::NotFound(id))
    }
}

/// Assign dense ordinals in list order.
fn renumber(records: &mut [PluginRecord]) {
    for (ordinal, record) in records.iter_mut().enumerate() {
        record.ordinal = ordinal;
    }
}

/// Drop duplicate ids and extra instances of single-instance types.
fn sanitize(records: Vec<PluginRecord>) -> Vec<PluginRecord> {
    let mut seen_ids = std::collections::HashSet::new();
    let mut seen_singletons = std::collections::HashSet::new();

    records
        .into_iter()
        .filter(|record| {
            if !seen_ids.insert(record.id) {
                tracing::warn!(id = %record.id, "dropping duplicate plugin id");
                return false;
            }
            if let Ok(kind) = record.kind.parse::<PluginKind>()
                && kind.cardinality() == Cardinality::Single
                && !seen_singletons.insert(kind)
            {
                tracing::warn!(kind = %kind, "dropping extra instance of single-instance plugin");
                return false;
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::panel::store::MemoryStore;

    fn empty_registry() -> PluginRegistry {
        PluginRegistry::open(Box::new(MemoryStore::with_records(Vec::new()))).unwrap()
    }

    fn assert_dense(registry: &PluginRegistry) {
        let ordinals: Vec<usize> = registry.records().iter().map(|r| r.ordinal).collect();
        let expected: Vec<usize> = (0..registry.len()).collect();
        assert_eq!(ordinals, expected);
    }

    fn kinds(registry: &PluginRegistry) -> Vec<&str> {
        registry.records().iter().map(|r| r.kind.as_str()).collect()
    }

    #[test]
    fn test_empty_store_gets_default_set() {
        let registry = PluginRegistry::open(Box::new(MemoryStore::new())).unwrap();
        assert_eq!(kinds(&registry), vec![
            "startmenu",
            "quicklaunch",
            "taskbar",
            "spacer",
            "nightmode",
            "clock"
        ]);
        assert_dense(&registry);
    }

    #[test]
    fn test_add_at_position() {
        let mut registry = empty_registry();
        registry.add(PluginKind::Clock, None, serde_json::Value::Null).unwrap();
        registry.add(PluginKind::Spacer, None, serde_json::Value::Null).unwrap();
        registry.add(PluginKind::Taskbar, Some(1), serde_json::Value::Null).unwrap();
        assert_eq!(kinds(&registry), vec!["clock", "taskbar", "spacer"]);
        assert_dense(&registry);
    }

    #[test]
    fn test_duplicate_singleton_rejected() {
        let mut registry = empty_registry();
        registry.add(PluginKind::NightMode, None, serde_json::Value::Null).unwrap();
        let before = registry.records().to_vec();

        let err = registry.add(PluginKind::NightMode, None, serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateSingleton(ref k) if k == "nightmode"));
        assert_eq!(registry.records(), before.as_slice());

        // Multiple-instance types are fine.
        registry.add(PluginKind::Spacer, None, serde_json::Value::Null).unwrap();
        registry.add(PluginKind::Spacer, None, serde_json::Value::Null).unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_ordinals_stay_dense() {
        let mut registry = empty_registry();
        let mut ids = Vec::new();
        for kind in [PluginKind::Clock, PluginKind::Spacer, PluginKind::Spacer, PluginKind::Taskbar] {
            ids.push(registry.add(kind, Some(0), serde_json::Value::Null).unwrap());
            assert_dense(&registry);
        }
        registry.remove(ids[1]).unwrap();
        assert_dense(&registry);
        registry.move_plugin(ids[0], Direction::Up).unwrap();
        assert_dense(&registry);
        registry.add(PluginKind::Clock, Some(99), serde_json::Value::Null).unwrap();
        assert_dense(&registry);
        registry.remove(ids[3]).unwrap();
        assert_dense(&registry);
        registry.move_plugin(ids[2], Direction::Down).unwrap();
        assert_dense(&registry);
    }

    #[test]
    fn test_move_at_boundaries_is_noop() {
        let mut registry = empty_registry();
        let first = registry.add(PluginKind::Clock, None, serde_json::Value::Null).unwrap();
        let last = registry.add(PluginKind::Spacer, None, serde_json::Value::Null).unwrap();
        let before = registry.records().to_vec();

        assert_eq!(registry.move_plugin(first, Direction::Up).unwrap(), MutationOutcome::Unchanged);
        assert_eq!(registry.move_plugin(last, Direction::Down).unwrap(), MutationOutcome::Unchanged);
        assert_eq!(registry.records(), before.as_slice());

        assert_eq!(registry.move_plugin(first, Direction::Down).unwrap(), MutationOutcome::Changed);
        assert_eq!(kinds(&registry), vec!["spacer", "clock"]);
    }

    #[test]
    fn test_failed_write_leaves_registry_untouched() {
        let mut store = MemoryStore::with_records(Vec::new());
        store.fail_next_writes(1);
        let mut registry = PluginRegistry::open(Box::new(store)).unwrap();

        let err = registry.add(PluginKind::Clock, None, serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, RegistryError::Persistence(_)));
        assert!(registry.is_empty());

        registry.add(PluginKind::Clock, None, serde_json::Value::Null).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_retried_add_is_idempotent() {
        let mut registry = empty_registry();
        let mutation = RegistryMutation::add(PluginKind::Clock, None, serde_json::Value::Null);
        assert_eq!(registry.apply(&mutation).unwrap(), MutationOutcome::Changed);
        assert_eq!(registry.apply(&mutation).unwrap(), MutationOutcome::Unchanged);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_locked_registry_refuses_mutations() {
        let mut registry = empty_registry();
        registry.set_locked(true);
        assert!(matches!(
            registry.add(PluginKind::Clock, None, serde_json::Value::Null),
            Err(RegistryError::Locked)
        ));
    }

    #[test]
    fn test_reconfigure_and_not_found() {
        let mut registry = empty_registry();
        let id = registry.add(PluginKind::Clock, None, serde_json::Value::Null).unwrap();
        let config = serde_json::json!({ "format": "%H:%M:%S" });
        assert_eq!(registry.reconfigure(id, config.clone()).unwrap(), MutationOutcome::Changed);
        assert_eq!(registry.reconfigure(id, config.clone()).unwrap(), MutationOutcome::Unchanged);
        assert_eq!(registry.get(id).unwrap().config, config);

        let missing = Uuid::now_v7();
        assert!(matches!(registry.remove(missing), Err(RegistryError::NotFound(m)) if m == missing));
    }

    #[test]
    fn test_open_sanitizes_stored_list() {
        let taskbar = PluginRecord {
            id: Uuid::now_v7(),
            kind: "taskbar".to_string(),
            ordinal: 7,
            config: serde_json::Value::Null,
        };
        let second_taskbar = PluginRecord {
            id: Uuid::now_v7(),
            ordinal: 9,
            ..taskbar.clone()
        };
        let unknown = PluginRecord {
            id: Uuid::now_v7(),
            kind: "weather".to_string(),
            ordinal: 3,
            config: serde_json::Value::Null,
        };
        let store = MemoryStore::with_records(vec![taskbar, second_taskbar, unknown]);
        let registry = PluginRegistry::open(Box::new(store)).unwrap();

        // Unknown types are kept so they survive a round trip.
        assert_eq!(kinds(&registry), vec!["weather", "taskbar"]);
        assert_dense(&registry);
    }
}
