//! Provisional "pressed" overlay for taskbar entries.
//!
//! A click sends a request to the window manager and records it here. The
//! entry shows a pressed affordance until an update newer than the one seen
//! at click time reports the requested state, the window goes away, or the
//! overlay times out. Unrelated updates leave it in place. The confirmed state
//! shown by the presenter never comes from this overlay.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::modules::windows::{Revision, WindowDirectory, WindowId, WmRequest};

/// A request waiting for confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request: WmRequest,

    /// Window revision when the request was sent.
    pub base_revision: Revision,

    pub since: Instant,
}

/// Pending requests keyed by window.
#[derive(Debug, Default)]
pub struct PendingOverlay {
    entries: HashMap<WindowId, PendingRequest>,
}

impl PendingOverlay {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Record a request for `window_id`. A newer request replaces an older one.
    pub fn insert(&mut self, window_id: WindowId, request: WmRequest, base_revision: Revision, now: Instant) {
        self.entries.insert(window_id, PendingRequest {
            request,
            base_revision,
            since: now,
        });
    }

    /// Pending request for a window.
    #[must_use]
    pub fn get(&self, window_id: WindowId) -> Option<&PendingRequest> { self.entries.get(&window_id) }

    /// Whether a window has a pending request.
    #[must_use]
    pub fn is_pending(&self, window_id: WindowId) -> bool { self.entries.contains_key(&window_id) }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Drop entries that were confirmed, whose window is gone, or that expired.
    ///
    /// Returns `true` if anything was removed.
    pub fn reconcile(&mut self, directory: &WindowDirectory, now: Instant, timeout: Duration) -> bool {
        let before = self.entries.len();
        self.entries.retain(|id, pending| {
            let Some(window) = directory.get(*id) else {
                return false;
            };
            let confirmed = window.revision > pending.base_revision
                && pending.request.is_confirmed_by(&window.attributes);
            !confirmed && now.saturating_duration_since(pending.since) < timeout
        });
        before != self.entries.len()
    }

    /// Earliest instant at which an entry expires.
    #[must_use]
    pub fn next_deadline(&self, timeout: Duration) -> Option<Instant> {
        self.entries.values().map(|p| p.since + timeout).min()
    }

    /// Drop every entry.
    pub fn clear(&mut self) { self.entries.clear(); }
}
