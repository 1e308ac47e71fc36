//! Completion debouncing
//!
//! Analysis runs on every frame, and a completion condition usually stays true
//! for many consecutive frames. [`CompletionDebouncer`] turns that level signal
//! into a single event per session, and [`Cooldown`] bounds how often any event
//! can fire in wall-clock time. Time is always passed in, never read here.

use chrono::{DateTime, Duration, Utc};

/// Default minimum time between two completion events
pub const DEFAULT_COMPLETION_COOLDOWN_SECS: f64 = 2.0;

/// Fires at most once per window
#[derive(Debug, Clone)]
pub struct Cooldown {
    window: Duration,
    last_fired: Option<DateTime<Utc>>,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: None,
        }
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self::new(Duration::milliseconds((secs.max(0.0) * 1000.0).round() as i64))
    }

    /// Fire if the window has elapsed since the last firing
    pub fn try_fire(&mut self, now: DateTime<Utc>) -> bool {
        match self.last_fired {
            Some(last) if now - last < self.window => false,
            _ => {
                self.last_fired = Some(now);
                true
            }
        }
    }

    pub fn last_fired(&self) -> Option<DateTime<Utc>> {
        self.last_fired
    }
}

/// Exactly-once completion latch guarded by a [`Cooldown`]
#[derive(Debug, Clone)]
pub struct CompletionDebouncer {
    cooldown: Cooldown,
    triggered: bool,
}

impl Default for CompletionDebouncer {
    fn default() -> Self {
        Self::new(Cooldown::from_secs_f64(DEFAULT_COMPLETION_COOLDOWN_SECS))
    }
}

impl CompletionDebouncer {
    pub fn new(cooldown: Cooldown) -> Self {
        Self {
            cooldown,
            triggered: false,
        }
    }

    /// Returns `true` only on the frame where completion fires
    pub fn check(&mut self, condition_met: bool, now: DateTime<Utc>) -> bool {
        if !condition_met || self.triggered {
            return false;
        }
        if self.cooldown.try_fire(now) {
            self.triggered = true;
            return true;
        }
        false
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Re-arm the latch. The cooldown keeps its history, so a reset cannot be
    /// used to fire twice inside one window.
    pub fn reset(&mut self) {
        self.triggered = false;
    }
}
