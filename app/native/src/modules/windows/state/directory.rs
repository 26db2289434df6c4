//! The window directory: authoritative table of known windows.
//!
//! The directory is owned by the panel controller task and mutated only there,
//! one notification batch at a time. Readers receive cloned snapshots, so no
//! partially applied batch is ever observable outside the owner.
//!
//! Every applied update records its revision per window. Destroyed windows keep
//! a tombstone revision so a late duplicate of an older `CreateWindow` cannot
//! resurrect them. Only the most recent [`MAX_TOMBSTONES`] are kept.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use super::types::{AttributeDelta, DesktopInfo, Revision, Window, WindowAttributes, WindowId};
use crate::modules::windows::adapter::{AdapterEvent, WindowRecord};

/// Destroyed windows whose revision is remembered.
pub const MAX_TOMBSTONES: usize = 1024;

/// Outcome of applying a single update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new window record was created.
    Created,
    /// An existing record was updated.
    Updated,
    /// A record was removed.
    Removed,
    /// The update was not newer than the last applied one and was dropped.
    Stale,
    /// The update referred to a window the directory does not know.
    Unknown,
    /// The update matched the current state.
    Unchanged,
}

/// Summary of a batch application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub stale: usize,
    pub unknown: usize,
    pub desktops_changed: bool,
}

impl BatchReport {
    /// Whether anything visible changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.created > 0 || self.updated > 0 || self.removed > 0 || self.desktops_changed
    }

    fn record(&mut self, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Created => self.created += 1,
            ApplyOutcome::Updated => self.updated += 1,
            ApplyOutcome::Removed => self.removed += 1,
            ApplyOutcome::Stale => self.stale += 1,
            ApplyOutcome::Unknown => self.unknown += 1,
            ApplyOutcome::Unchanged => {}
        }
    }
}

/// Immutable, creation-ordered copy of the directory contents.
pub type DirectorySnapshot = Arc<[Window]>;

/// Authoritative in-memory window table.
#[derive(Debug, Default)]
pub struct WindowDirectory {
    /// Live windows by id.
    windows: HashMap<WindowId, Window>,

    /// Creation order: sequence -> id.
    order: BTreeMap<u64, WindowId>,

    /// Last applied revision per window, including destroyed ones.
    revisions: HashMap<WindowId, Revision>,

    /// Destroyed ids in burial order, oldest first.
    tombstones: VecDeque<WindowId>,

    /// Current virtual desktop summary.
    desktops: DesktopInfo,

    next_sequence: u64,
}

impl WindowDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Number of live windows.
    #[must_use]
    pub fn len(&self) -> usize { self.windows.len() }

    /// Whether no windows are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.windows.is_empty() }

    /// Get a window by id.
    #[must_use]
    pub fn get(&self, id: WindowId) -> Option<&Window> { self.windows.get(&id) }

    /// Whether a window is tracked.
    #[must_use]
    pub fn contains(&self, id: WindowId) -> bool { self.windows.contains_key(&id) }

    /// Iterate over all windows in creation order.
    pub fn get_all(&self) -> impl Iterator<Item = &Window> + '_ {
        self.order.values().filter_map(|id| self.windows.get(id))
    }

    /// Ids of all live windows in creation order.
    #[must_use]
    pub fn ids(&self) -> Vec<WindowId> { self.order.values().copied().collect() }

    /// Clone the current contents into an immutable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> DirectorySnapshot { self.get_all().cloned().collect() }

    /// Current virtual desktop summary.
    #[must_use]
    pub const fn desktops(&self) -> DesktopInfo { self.desktops }

    /// Last applied revision for a window, live or destroyed.
    #[must_use]
    pub fn last_revision(&self, id: WindowId) -> Option<Revision> {
        self.revisions.get(&id).copied()
    }

    /// Number of destroyed windows whose revision is still remembered.
    #[must_use]
    pub fn tombstone_count(&self) -> usize { self.tombstones.len() }

    fn is_stale(&self, id: WindowId, revision: Revision) -> bool {
        self.revisions.get(&id).is_some_and(|&last| revision <= last)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Merge `delta` into the window, creating it if it does not exist.
    pub fn upsert(
        &mut self,
        id: WindowId,
        revision: Revision,
        delta: &AttributeDelta,
    ) -> ApplyOutcome {
        if self.is_stale(id, revision) {
            tracing::trace!(window_id = %id, revision, "discarding stale window update");
            return ApplyOutcome::Stale;
        }
        self.revisions.insert(id, revision);

        if let Some(window) = self.windows.get_mut(&id) {
            delta.apply_to(&mut window.attributes);
            window.revision = revision;
            return ApplyOutcome::Updated;
        }

        let mut attributes = WindowAttributes::default();
        delta.apply_to(&mut attributes);
        self.insert_new(id, revision, attributes);
        ApplyOutcome::Created
    }

    /// Update an existing window only. Unknown windows are left alone.
    ///
    /// Attribute notifications for windows the directory never saw are not
    /// enough to build a record; the reconnect reconciliation picks them up.
    pub fn update(&mut self, id: WindowId, revision: Revision, delta: &AttributeDelta) -> ApplyOutcome {
        if self.is_stale(id, revision) {
            return ApplyOutcome::Stale;
        }
        if !self.windows.contains_key(&id) {
            tracing::debug!(window_id = %id, "attribute change for unknown window");
            return ApplyOutcome::Unknown;
        }
        self.upsert(id, revision, delta)
    }

    /// Replace (or create) a window with a full attribute set.
    pub fn replace(
        &mut self,
        id: WindowId,
        revision: Revision,
        attributes: WindowAttributes,
    ) -> ApplyOutcome {
        if self.is_stale(id, revision) {
            return ApplyOutcome::Stale;
        }
        self.revisions.insert(id, revision);

        if let Some(window) = self.windows.get_mut(&id) {
            window.attributes = attributes;
            window.revision = revision;
            return ApplyOutcome::Updated;
        }

        self.insert_new(id, revision, attributes);
        ApplyOutcome::Created
    }

    /// Remove a window.
    pub fn remove(&mut self, id: WindowId, revision: Revision) -> ApplyOutcome {
        if self.is_stale(id, revision) {
            return ApplyOutcome::Stale;
        }
        self.revisions.insert(id, revision);
        let outcome = self.remove_entry(id).map_or(ApplyOutcome::Unknown, |_| ApplyOutcome::Removed);
        self.bury(id);
        outcome
    }

    /// Remove a window regardless of revision, keeping its last revision as tombstone.
    ///
    /// Used when a reconnect query reports the window as gone.
    pub fn forget(&mut self, id: WindowId) -> Option<Window> {
        let window = self.remove_entry(id)?;
        self.bury(id);
        Some(window)
    }

    /// Set the virtual desktop summary.
    pub fn set_desktops(&mut self, desktops: DesktopInfo) -> bool {
        if self.desktops == desktops {
            return false;
        }
        self.desktops = desktops;
        true
    }

    /// Apply one adapter event.
    pub fn apply(&mut self, event: &AdapterEvent) -> ApplyOutcome {
        match event {
            AdapterEvent::CreateWindow { window_id, revision, attributes } => {
                self.replace(*window_id, *revision, attributes.clone())
            }
            AdapterEvent::DestroyWindow { window_id, revision } => {
                self.remove(*window_id, *revision)
            }
            AdapterEvent::AttributeChanged { window_id, revision, delta } => {
                self.update(*window_id, *revision, delta)
            }
            AdapterEvent::DesktopChanged { window_id, revision, desktop } => {
                let delta = AttributeDelta {
                    desktop: Some(*desktop),
                    ..Default::default()
                };
                self.update(*window_id, *revision, &delta)
            }
            AdapterEvent::DesktopsChanged(info) => {
                if self.set_desktops(*info) {
                    ApplyOutcome::Updated
                } else {
                    ApplyOutcome::Unchanged
                }
            }
        }
    }

    /// Apply a whole notification batch.
    pub fn apply_batch<'a>(&mut self, events: impl IntoIterator<Item = &'a AdapterEvent>) -> BatchReport {
        let mut report = BatchReport::default();
        for event in events {
            if let AdapterEvent::DesktopsChanged(info) = event {
                report.desktops_changed |= self.set_desktops(*info);
                continue;
            }
            report.record(self.apply(event));
        }
        report
    }

    /// Reconcile one window with a fresh query result.
    ///
    /// `None` means the window manager no longer knows the window.
    pub fn reconcile(&mut self, id: WindowId, record: Option<WindowRecord>) -> ApplyOutcome {
        match record {
            Some(record) => {
                let outcome = self.replace(record.id, record.revision, record.attributes);
                if outcome == ApplyOutcome::Stale && !self.contains(id) {
                    // Destroyed locally with a newer revision than the query saw.
                    return ApplyOutcome::Unknown;
                }
                outcome
            }
            None => self.forget(id).map_or(ApplyOutcome::Unknown, |_| ApplyOutcome::Removed),
        }
    }

    /// Drop tombstones of windows that are neither live nor in `known`.
    pub fn prune_tombstones(&mut self, known: &HashSet<WindowId>) {
        let windows = &self.windows;
        self.revisions.retain(|id, _| windows.contains_key(id) || known.contains(id));
        let revisions = &self.revisions;
        self.tombstones
            .retain(|id| revisions.contains_key(id) && !windows.contains_key(id));
    }

    /// Remember a destroyed window, forgetting the oldest tombstone past the cap.
    fn bury(&mut self, id: WindowId) {
        if self.tombstones.contains(&id) {
            return;
        }
        self.tombstones.push_back(id);
        while self.tombstones.len() > MAX_TOMBSTONES {
            let Some(oldest) = self.tombstones.pop_front() else {
                break;
            };
            if !self.windows.contains_key(&oldest) {
                self.revisions.remove(&oldest);
            }
        }
    }

    fn insert_new(&mut self, id: WindowId, revision: Revision, attributes: WindowAttributes) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.order.insert(sequence, id);
        self.windows.insert(id, Window {
            id,
            revision,
            sequence,
            attributes,
        });
    }

    fn remove_entry(&mut self, id: WindowId) -> Option<Window> {
        let window = self.windows.remove(&id)?;
        self.order.remove(&window.sequence);
        Some(window)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::windows::state::{Desktop, MaximizeAxis};

    fn create(id: u64, revision: Revision, class: &str) -> AdapterEvent {
        AdapterEvent::CreateWindow {
            window_id: WindowId(id),
            revision,
            attributes: WindowAttributes::new(format!("Window {id}"), class),
        }
    }

    fn destroy(id: u64, revision: Revision) -> AdapterEvent {
        AdapterEvent::DestroyWindow {
            window_id: WindowId(id),
            revision,
        }
    }

    fn minimize(id: u64, revision: Revision, minimized: bool) -> AdapterEvent {
        AdapterEvent::AttributeChanged {
            window_id: WindowId(id),
            revision,
            delta: AttributeDelta {
                minimized: Some(minimized),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_size_tracks_live_windows() {
        let mut dir = WindowDirectory::new();
        let events = [
            create(1, 1, "a"),
            create(2, 1, "b"),
            create(3, 1, "c"),
            destroy(2, 2),
            create(4, 1, "d"),
            destroy(1, 2),
            destroy(9, 1),
        ];

        let mut live = std::collections::HashSet::new();
        for event in &events {
            dir.apply(event);
            match event {
                AdapterEvent::CreateWindow { window_id, .. } => {
                    live.insert(*window_id);
                }
                AdapterEvent::DestroyWindow { window_id, .. } => {
                    live.remove(window_id);
                }
                _ => {}
            }
            assert_eq!(dir.len(), live.len());
        }
        assert_eq!(dir.ids(), vec![WindowId(3), WindowId(4)]);
    }

    #[test]
    fn test_stale_revision_is_noop() {
        let mut dir = WindowDirectory::new();
        dir.apply(&create(1, 5, "term"));
        assert_eq!(dir.apply(&minimize(1, 6, true)), ApplyOutcome::Updated);

        let before = dir.snapshot();
        assert_eq!(dir.apply(&minimize(1, 6, false)), ApplyOutcome::Stale);
        assert_eq!(dir.apply(&minimize(1, 3, false)), ApplyOutcome::Stale);
        assert_eq!(dir.snapshot(), before);
        assert!(dir.get(WindowId(1)).unwrap().attributes.minimized);
    }

    #[test]
    fn test_duplicate_create_is_noop() {
        let mut dir = WindowDirectory::new();
        dir.apply(&create(1, 1, "term"));
        assert_eq!(dir.apply(&create(1, 1, "term")), ApplyOutcome::Stale);
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_late_create_does_not_resurrect_destroyed_window() {
        let mut dir = WindowDirectory::new();
        dir.apply(&create(1, 1, "term"));
        dir.apply(&destroy(1, 4));
        assert_eq!(dir.apply(&create(1, 2, "term")), ApplyOutcome::Stale);
        assert!(dir.is_empty());
    }

    #[test]
    fn test_out_of_order_destroy_before_create() {
        let mut dir = WindowDirectory::new();
        assert_eq!(dir.apply(&destroy(1, 2)), ApplyOutcome::Unknown);
        assert_eq!(dir.apply(&create(1, 1, "term")), ApplyOutcome::Stale);
        assert!(dir.is_empty());
    }

    #[test]
    fn test_update_keeps_creation_order() {
        let mut dir = WindowDirectory::new();
        dir.apply(&create(10, 1, "a"));
        dir.apply(&create(5, 1, "b"));
        dir.apply(&minimize(10, 2, true));
        assert_eq!(dir.ids(), vec![WindowId(10), WindowId(5)]);
    }

    #[test]
    fn test_attribute_change_for_unknown_window() {
        let mut dir = WindowDirectory::new();
        assert_eq!(dir.apply(&minimize(3, 1, true)), ApplyOutcome::Unknown);
        assert!(dir.is_empty());
    }

    #[test]
    fn test_upsert_creates_missing_window() {
        let mut dir = WindowDirectory::new();
        let delta = AttributeDelta {
            class: Some("mail".to_string()),
            maximized: Some(MaximizeAxis::Both),
            ..Default::default()
        };
        assert_eq!(dir.upsert(WindowId(2), 1, &delta), ApplyOutcome::Created);
        let window = dir.get(WindowId(2)).unwrap();
        assert_eq!(window.class(), "mail");
        assert!(window.attributes.maximized_vertical);
    }

    #[test]
    fn test_desktop_changed_moves_window() {
        let mut dir = WindowDirectory::new();
        dir.apply(&create(1, 1, "term"));
        dir.apply(&AdapterEvent::DesktopChanged {
            window_id: WindowId(1),
            revision: 2,
            desktop: Desktop::Index(3),
        });
        assert_eq!(dir.get(WindowId(1)).unwrap().attributes.desktop, Desktop::Index(3));
    }

    #[test]
    fn test_batch_report() {
        let mut dir = WindowDirectory::new();
        let batch = vec![
            create(1, 1, "a"),
            create(2, 1, "a"),
            minimize(1, 2, true),
            minimize(1, 2, true),
            destroy(2, 2),
            AdapterEvent::DesktopsChanged(DesktopInfo { count: 4, active: 1 }),
        ];
        let report = dir.apply_batch(&batch);
        assert_eq!(report.created, 2);
        assert_eq!(report.updated, 1);
        assert_eq!(report.stale, 1);
        assert_eq!(report.removed, 1);
        assert!(report.desktops_changed);
        assert!(report.changed());
        assert_eq!(dir.desktops(), DesktopInfo { count: 4, active: 1 });
    }

    #[test]
    fn test_reconcile_updates_and_forgets() {
        let mut dir = WindowDirectory::new();
        dir.apply(&create(1, 1, "a"));
        dir.apply(&create(2, 1, "b"));

        let mut changed = WindowAttributes::new("Renamed", "a");
        changed.minimized = true;
        let outcome = dir.reconcile(WindowId(1), Some(WindowRecord {
            id: WindowId(1),
            revision: 4,
            attributes: changed,
        }));
        assert_eq!(outcome, ApplyOutcome::Updated);
        assert_eq!(dir.reconcile(WindowId(2), None), ApplyOutcome::Removed);

        assert_eq!(dir.len(), 1);
        assert_eq!(dir.get(WindowId(1)).unwrap().attributes.title, "Renamed");
        // Tombstone survives the forced removal.
        assert_eq!(dir.last_revision(WindowId(2)), Some(1));
    }

    #[test]
    fn test_prune_tombstones() {
        let mut dir = WindowDirectory::new();
        dir.apply(&create(1, 1, "a"));
        dir.apply(&destroy(1, 2));
        dir.apply(&create(2, 1, "b"));
        dir.prune_tombstones(&HashSet::new());
        assert_eq!(dir.last_revision(WindowId(1)), None);
        assert_eq!(dir.last_revision(WindowId(2)), Some(1));
        assert_eq!(dir.tombstone_count(), 0);
    }

    #[test]
    fn test_tombstones_stay_bounded_without_reconnect() {
        let mut dir = WindowDirectory::new();
        let total = MAX_TOMBSTONES as u64 * 4;
        for id in 1..=total {
            dir.apply(&create(id, 1, "term"));
            dir.apply(&destroy(id, 2));
        }
        assert!(dir.is_empty());
        assert_eq!(dir.tombstone_count(), MAX_TOMBSTONES);
        assert_eq!(dir.revisions.len(), MAX_TOMBSTONES);

        // Recent tombstones still reject late duplicates.
        assert_eq!(dir.apply(&create(total, 1, "term")), ApplyOutcome::Stale);
        // The oldest ones were forgotten.
        assert_eq!(dir.last_revision(WindowId(1)), None);
    }

    #[test]
    fn test_unchanged_desktops_is_not_stale() {
        let mut dir = WindowDirectory::new();
        let info = DesktopInfo { count: 2, active: 1 };
        assert_eq!(dir.apply(&AdapterEvent::DesktopsChanged(info)), ApplyOutcome::Updated);
        assert_eq!(dir.apply(&AdapterEvent::DesktopsChanged(info)), ApplyOutcome::Unchanged);
    }
}
