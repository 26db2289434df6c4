//! Taskbar presenter.
//!
//! Turns the window directory and the grouping output into the ordered list of
//! display entries handed to the renderer. Every recomputation produces a new
//! immutable [`TaskbarView`]; renderers never see a view being built.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use super::grouping::{Grouping, compute_groups};
use super::pending::PendingOverlay;
use crate::config::TaskbarConfig;
use crate::modules::windows::{DesktopInfo, Layer, Window, WindowDirectory, WindowId, WindowState};

// ============================================================================
// Filter / Context
// ============================================================================

/// Which windows the taskbar shows. Each flag is independent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskbarFilter {
    pub current_desktop_only: bool,
    pub current_screen_only: bool,
    pub minimized_only: bool,
}

impl From<&TaskbarConfig> for TaskbarFilter {
    fn from(config: &TaskbarConfig) -> Self {
        Self {
            current_desktop_only: config.current_desktop_only,
            current_screen_only: config.current_screen_only,
            minimized_only: config.minimized_only,
        }
    }
}

/// Environment a view is computed for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresenterContext {
    pub desktops: DesktopInfo,

    /// Screen the panel lives on.
    pub screen: u32,

    /// The window manager connection is down; the view shows last-known data.
    pub stale: bool,
}

impl TaskbarFilter {
    /// Whether a window passes the filter.
    #[must_use]
    pub const fn accepts(&self, window: &Window, ctx: &PresenterContext) -> bool {
        let attrs = &window.attributes;
        if attrs.skip_taskbar {
            return false;
        }
        if self.current_desktop_only && !attrs.desktop.is_on(ctx.desktops.active) {
            return false;
        }
        if self.current_screen_only && attrs.screen != ctx.screen {
            return false;
        }
        if self.minimized_only && !attrs.minimized {
            return false;
        }
        true
    }
}

// ============================================================================
// View
// ============================================================================

/// One taskbar button for a single window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEntry {
    pub window_id: WindowId,
    pub title: String,
    pub class: String,
    pub icon: Option<String>,

    /// Confirmed display state.
    pub state: WindowState,
    pub layer: Layer,
    pub active: bool,

    /// A request is in flight; show the pressed affordance.
    pub pressed: bool,
}

impl WindowEntry {
    fn new(window: &Window, pending: &PendingOverlay) -> Self {
        let attrs = &window.attributes;
        Self {
            window_id: window.id,
            title: attrs.title.clone(),
            class: attrs.class.clone(),
            icon: attrs.icon.clone(),
            state: window.display_state(),
            layer: attrs.layer,
            active: attrs.active,
            pressed: pending.is_pending(window.id),
        }
    }
}

/// One taskbar button standing for several windows of the same application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEntry {
    pub class: String,
    pub title: String,
    pub icon: Option<String>,

    /// Members in order of first addition.
    pub members: Vec<WindowEntry>,

    /// The member popup is open.
    pub expanded: bool,
}

impl GroupEntry {
    /// Whether any member has focus.
    #[must_use]
    pub fn active(&self) -> bool { self.members.iter().any(|m| m.active) }
}

/// An element of the taskbar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DisplayEntry {
    Window(WindowEntry),
    Group(GroupEntry),
}

impl DisplayEntry {
    /// Windows represented by this entry, in display order.
    pub fn window_ids(&self) -> impl Iterator<Item = WindowId> + '_ {
        let (single, members) = match self {
            Self::Window(entry) => (Some(entry.window_id), None),
            Self::Group(group) => (None, Some(group.members.iter().map(|m| m.window_id))),
        };
        single.into_iter().chain(members.into_iter().flatten())
    }
}

/// Immutable snapshot of the taskbar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskbarView {
    pub entries: Vec<DisplayEntry>,

    /// Last-known data while the window manager is unreachable.
    pub stale: bool,

    pub desktops: DesktopInfo,
}

impl TaskbarView {
    /// All shown windows in display order, group members included.
    ///
    /// This is the order the mouse wheel cycles through.
    #[must_use]
    pub fn cycle_order(&self) -> Vec<WindowId> {
        self.entries.iter().flat_map(DisplayEntry::window_ids).collect()
    }

    /// Find the entry for a window, searching inside groups.
    #[must_use]
    pub fn find_window(&self, id: WindowId) -> Option<&WindowEntry> {
        self.entries.iter().find_map(|entry| match entry {
            DisplayEntry::Window(w) if w.window_id == id => Some(w),
            DisplayEntry::Window(_) => None,
            DisplayEntry::Group(g) => g.members.iter().find(|m| m.window_id == id),
        })
    }

    /// Find a group entry by class.
    #[must_use]
    pub fn find_group(&self, class: &str) -> Option<&GroupEntry> {
        self.entries.iter().find_map(|entry| match entry {
            DisplayEntry::Group(g) if g.class == class => Some(g),
            _ => None,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

// ============================================================================
// Presenter
// ============================================================================

/// Builds taskbar views and owns the presentation-only state.
#[derive(Debug)]
pub struct TaskbarPresenter {
    filter: TaskbarFilter,
    grouping_enabled: bool,

    /// Classes whose group popup is open.
    expanded: HashSet<String>,

    pending: PendingOverlay,

    view: Arc<TaskbarView>,
}

impl TaskbarPresenter {
    #[must_use]
    pub fn new(config: &TaskbarConfig) -> Self {
        Self {
            filter: TaskbarFilter::from(config),
            grouping_enabled: config.grouping,
            expanded: HashSet::new(),
            pending: PendingOverlay::new(),
            view: Arc::default(),
        }
    }

    /// Apply new filter and grouping settings. The next `present` uses them.
    pub fn set_config(&mut self, config: &TaskbarConfig) {
        self.filter = TaskbarFilter::from(config);
        self.grouping_enabled = config.grouping;
    }

    /// Most recent view.
    #[must_use]
    pub fn view(&self) -> Arc<TaskbarView> { Arc::clone(&self.view) }

    pub fn pending(&self) -> &PendingOverlay { &self.pending }

    pub fn pending_mut(&mut self) -> &mut PendingOverlay { &mut self.pending }

    /// Open or close the popup of a group.
    pub fn toggle_expanded(&mut self, class: &str) -> bool {
        if self.expanded.remove(class) {
            false
        } else {
            self.expanded.insert(class.to_string());
            true
        }
    }

    /// Whether the popup of a group is open.
    #[must_use]
    pub fn is_expanded(&self, class: &str) -> bool { self.expanded.contains(class) }

    /// Recompute the view from the directory.
    ///
    /// Entries follow window creation order. A group sits where its oldest
    /// visible member would be.
    pub fn present(&mut self, directory: &WindowDirectory, ctx: &PresenterContext) -> Arc<TaskbarView> {
        let visible: Vec<&Window> =
            directory.get_all().filter(|w| self.filter.accepts(w, ctx)).collect();
        let grouping = compute_groups(visible.iter().copied(), self.grouping_enabled);

        // Dissolved groups forget their popup state.
        self.expanded.retain(|class| grouping.by_class(class).is_some());

        let entries = self.build_entries(directory, &visible, &grouping);
        self.view = Arc::new(TaskbarView {
            entries,
            stale: ctx.stale,
            desktops: ctx.desktops,
        });
        Arc::clone(&self.view)
    }

    fn build_entries(
        &self,
        directory: &WindowDirectory,
        visible: &[&Window],
        grouping: &Grouping,
    ) -> Vec<DisplayEntry> {
        let mut entries = Vec::with_capacity(visible.len());
        for window in visible {
            match grouping.group_of(window.id) {
                None => entries.push(DisplayEntry::Window(WindowEntry::new(window, &self.pending))),
                Some(group) if group.anchor() == Some(window.id) => {
                    let members = group
                        .members
                        .iter()
                        .filter_map(|id| directory.get(*id))
                        .map(|w| WindowEntry::new(w, &self.pending))
                        .collect();
                    entries.push(DisplayEntry::Group(GroupEntry {
                        class: group.class.clone(),
                        title: group.title(),
                        icon: group.icon.clone(),
                        members,
                        expanded: self.expanded.contains(&group.class),
                    }));
                }
                Some(_) => {}
            }
        }
        entries
    }
}
