//! Taskbar: window tracking view, grouping and user actions.
//!
//! ```text
//! WindowDirectory ──► compute_groups ──► TaskbarPresenter ──► Arc<TaskbarView>
//!                                              ▲
//! TaskbarInput ──► plan_input ──► WmRequest ───┴── PendingOverlay ("pressed")
//! ```

pub mod actions;
pub mod grouping;
pub mod pending;
pub mod plugin;
pub mod presenter;

pub use actions::{ActionPlan, EntryTarget, MouseButton, TaskbarInput, WindowAction, plan_input};
pub use grouping::{Group, Grouping, compute_groups};
pub use pending::{PendingOverlay, PendingRequest};
pub use plugin::{TASKBAR_KIND, TaskbarPlugin};
pub use presenter::{
    DisplayEntry, GroupEntry, PresenterContext, TaskbarFilter, TaskbarPresenter, TaskbarView,
    WindowEntry,
};
