//! Auto-hide state machine.
//!
//! ```text
//!            pointer left + delay          duration
//!   Shown ─────────────────────────► Hiding ─────────► Hidden
//!     ▲                                 │                 │
//!     │ duration                        │ pointer entered │ pointer entered
//!     └──────────────────────────── Showing ◄─────────────┘
//! ```
//!
//! Time is passed in explicitly so the controller can drive the machine from
//! its own clock and tests can use fixed instants. With zero delay and zero
//! duration every transition happens in the call that triggers it.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::AutoHideConfig;

/// Interval between animation frames while hiding or showing.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoHidePhase {
    #[default]
    Shown,
    Hiding,
    Hidden,
    Showing,
}

#[derive(Debug, Clone)]
pub struct AutoHide {
    enabled: bool,
    delay: Duration,
    duration: Duration,
    phase: AutoHidePhase,
    /// Start of the current animation.
    since: Instant,
    /// Pending start of a hide after the pointer left.
    hide_at: Option<Instant>,
    pointer_inside: bool,
}

impl AutoHide {
    #[must_use]
    pub fn new(config: &AutoHideConfig, now: Instant) -> Self {
        Self {
            enabled: config.enabled,
            delay: Duration::from_millis(config.delay_ms),
            duration: Duration::from_millis(config.duration_ms),
            phase: AutoHidePhase::Shown,
            since: now,
            hide_at: None,
            pointer_inside: false,
        }
    }

    /// Apply new settings. Returns whether the phase changed.
    ///
    /// Disabling auto-hide shows the panel at once. Enabling it with the
    /// pointer outside schedules a hide.
    pub fn set_config(&mut self, config: &AutoHideConfig, now: Instant) -> bool {
        let was_enabled = self.enabled;
        self.enabled = config.enabled;
        self.delay = Duration::from_millis(config.delay_ms);
        self.duration = Duration::from_millis(config.duration_ms);

        if !self.enabled {
            self.hide_at = None;
            return self.enter(AutoHidePhase::Shown, now);
        }
        if !was_enabled && !self.pointer_inside {
            self.hide_at = Some(now + self.delay);
            return self.tick(now);
        }
        false
    }

    #[must_use]
    pub const fn phase(&self) -> AutoHidePhase { self.phase }

    #[must_use]
    pub const fn is_enabled(&self) -> bool { self.enabled }

    #[must_use]
    pub const fn is_animating(&self) -> bool {
        matches!(self.phase, AutoHidePhase::Hiding | AutoHidePhase::Showing)
    }

    /// The pointer entered the panel (or its hidden trigger strip).
    pub fn pointer_entered(&mut self, now: Instant) -> bool {
        self.pointer_inside = true;
        self.hide_at = None;
        match self.phase {
            AutoHidePhase::Shown | AutoHidePhase::Showing => false,
            AutoHidePhase::Hidden => {
                self.enter(AutoHidePhase::Showing, now);
                self.tick(now);
                true
            }
            AutoHidePhase::Hiding => {
                // Reverse from the current position.
                let elapsed = now.saturating_duration_since(self.since).min(self.duration);
                self.enter(AutoHidePhase::Showing, now);
                self.since = now.checked_sub(self.duration - elapsed).unwrap_or(now);
                self.tick(now);
                true
            }
        }
    }

    /// The pointer left the panel.
    pub fn pointer_left(&mut self, now: Instant) -> bool {
        self.pointer_inside = false;
        if !self.enabled || matches!(self.phase, AutoHidePhase::Hiding | AutoHidePhase::Hidden) {
            return false;
        }
        self.hide_at = Some(now + self.delay);
        self.tick(now)
    }

    /// Advance timers. Returns whether the phase changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        if let Some(at) = self.hide_at
            && now >= at
        {
            self.hide_at = None;
            match self.phase {
                AutoHidePhase::Shown => changed |= self.enter(AutoHidePhase::Hiding, now),
                AutoHidePhase::Showing => {
                    let elapsed = now.saturating_duration_since(self.since).min(self.duration);
                    changed |= self.enter(AutoHidePhase::Hiding, now);
                    self.since = now.checked_sub(self.duration - elapsed).unwrap_or(now);
                }
                AutoHidePhase::Hiding | AutoHidePhase::Hidden => {}
            }
        }

        if self.is_animating() && now.saturating_duration_since(self.since) >= self.duration {
            let next = match self.phase {
                AutoHidePhase::Hiding => AutoHidePhase::Hidden,
                _ => AutoHidePhase::Shown,
            };
            changed |= self.enter(next, now);
        }

        changed
    }

    /// Next instant at which [`Self::tick`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.is_animating() {
            return Some(self.since + self.duration);
        }
        self.hide_at
    }

    /// Fraction of the panel on screen, from 0.0 (hidden) to 1.0 (shown).
    #[must_use]
    pub fn reveal(&self, now: Instant) -> f64 {
        let progress = || {
            if self.duration.is_zero() {
                return 1.0;
            }
            let elapsed = now.saturating_duration_since(self.since).min(self.duration);
            elapsed.as_secs_f64() / self.duration.as_secs_f64()
        };
        match self.phase {
            AutoHidePhase::Shown => 1.0,
            AutoHidePhase::Hidden => 0.0,
            AutoHidePhase::Hiding => 1.0 - progress(),
            AutoHidePhase::Showing => progress(),
        }
    }

    /// Pixels of a panel of `thickness` currently on screen, never less than `margin`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // reveal is within [0, 1]
    pub fn visible_thickness(&self, now: Instant, thickness: i32, margin: i32) -> i32 {
        let margin = margin.clamp(0, thickness.max(0));
        let travel = f64::from(thickness - margin);
        margin + (travel * self.reveal(now)).round() as i32
    }

    fn enter(&mut self, phase: AutoHidePhase, now: Instant) -> bool {
        if self.phase == phase {
            return false;
        }
        tracing::debug!(from = ?self.phase, to = ?phase, "auto-hide transition");
        self.phase = phase;
        self.since = now;
        true
    }
}
