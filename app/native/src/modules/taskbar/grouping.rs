//! Grouping engine.
//!
//! Buckets windows by application class in a single pass. A bucket becomes a
//! group only when it holds at least two windows; groups are derived data and
//! are recomputed from scratch after every directory change.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::modules::windows::{Window, WindowId};

/// Inline capacity for group members; most applications have few windows.
pub const GROUP_INLINE_CAP: usize = 4;

/// Member list of a group, oldest first.
pub type GroupMembers = SmallVec<[WindowId; GROUP_INLINE_CAP]>;

/// A cluster of windows sharing an application class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub class: String,

    /// Members in order of first addition.
    pub members: GroupMembers,

    /// First icon reported by any member.
    pub icon: Option<String>,
}

impl Group {
    /// Synthetic title summarizing the member count.
    #[must_use]
    pub fn title(&self) -> String { format!("{} ({})", self.class, self.members.len()) }

    /// The oldest member, which positions the group in the display list.
    #[must_use]
    pub fn anchor(&self) -> Option<WindowId> { self.members.first().copied() }
}

/// Result of a grouping pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grouping {
    /// Groups ordered by their oldest member.
    groups: Vec<Group>,

    /// Window -> index into `groups`.
    membership: HashMap<WindowId, usize>,
}

impl Grouping {
    /// All groups, oldest first.
    #[must_use]
    pub fn groups(&self) -> &[Group] { &self.groups }

    /// Group a window belongs to, if any.
    #[must_use]
    pub fn group_of(&self, id: WindowId) -> Option<&Group> {
        self.membership.get(&id).and_then(|&idx| self.groups.get(idx))
    }

    /// Group by class.
    #[must_use]
    pub fn by_class(&self, class: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.class == class)
    }

    /// Whether a window is part of a group.
    #[must_use]
    pub fn is_grouped(&self, id: WindowId) -> bool { self.membership.contains_key(&id) }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize { self.groups.len() }

    /// Whether there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.groups.is_empty() }
}

/// Computes groups from windows given in creation order.
///
/// Windows flagged skip-taskbar are ignored. Runs in O(n).
pub fn compute_groups<'a, I>(windows: I, enabled: bool) -> Grouping
where
    I: IntoIterator<Item = &'a Window>,
{
    if !enabled {
        return Grouping::default();
    }

    let mut buckets: Vec<Group> = Vec::new();
    let mut by_class: HashMap<&'a str, usize> = HashMap::new();

    for window in windows {
        if window.skips_taskbar() {
            continue;
        }
        let idx = *by_class.entry(window.class()).or_insert_with(|| {
            buckets.push(Group {
                class: window.class().to_string(),
                members: SmallVec::new(),
                icon: None,
            });
            buckets.len() - 1
        });
        let bucket = &mut buckets[idx];
        bucket.members.push(window.id);
        if bucket.icon.is_none() {
            bucket.icon.clone_from(&window.attributes.icon);
        }
    }

    let groups: Vec<Group> = buckets.into_iter().filter(|g| g.members.len() >= 2).collect();
    let membership = groups
        .iter()
        .enumerate()
        .flat_map(|(idx, g)| g.members.iter().map(move |&id| (id, idx)))
        .collect();

    Grouping { groups, membership }
}
