//! Repetition and hold state machines
//!
//! Rep-based exercises share one three-stage cycle,
//! `ready → extended → flexed → extended (+1 rep)`, parameterised per exercise by
//! angle thresholds. Flexion always means the tracked angle decreases. Each
//! exercise keeps its own phase enum and maps onto the shared stages through
//! [`CyclePhase`].
//!
//! The hold-based exercise instead accumulates wall-clock time while form is
//! correct and drops back to zero on the first incorrect frame.

use crate::types::{CurlPhase, LegRaisePhase, PlankPhase, PushupPhase, RowPhase, SquatPhase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exercise-independent stage of a rep cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ready,
    Extended,
    Flexed,
}

/// Angle thresholds driving a rep cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepThresholds {
    /// Ready → Extended once the angle rises above this
    pub extend_above: f64,
    /// Extended → Flexed once the angle falls below this
    pub flex_below: f64,
    /// Flexed → Extended (rep counted) once the angle rises above this
    pub return_above: f64,
}

/// What a single frame did to the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    EnteredExtended,
    EnteredFlexed,
    RepCompleted,
}

/// Per-exercise phase enums that follow the shared rep cycle
pub trait CyclePhase: Copy {
    fn stage(self) -> Stage;
    fn from_stage(stage: Stage) -> Self;
}

/// Advance a rep cycle by one observed angle.
///
/// A rep is counted only on the flexed → extended transition, so oscillating
/// inside the flexed range never over-counts.
pub fn advance_cycle<P: CyclePhase>(phase: P, angle: f64, thresholds: &RepThresholds) -> (P, Transition) {
    let (stage, transition) = match phase.stage() {
        Stage::Ready if angle > thresholds.extend_above => (Stage::Extended, Transition::EnteredExtended),
        Stage::Extended if angle < thresholds.flex_below => (Stage::Flexed, Transition::EnteredFlexed),
        Stage::Flexed if angle > thresholds.return_above => (Stage::Extended, Transition::RepCompleted),
        stage => (stage, Transition::None),
    };
    (P::from_stage(stage), transition)
}

impl CyclePhase for PushupPhase {
    fn stage(self) -> Stage {
        match self {
            PushupPhase::Ready => Stage::Ready,
            PushupPhase::Up => Stage::Extended,
            PushupPhase::Down => Stage::Flexed,
        }
    }

    fn from_stage(stage: Stage) -> Self {
        match stage {
            Stage::Ready => PushupPhase::Ready,
            Stage::Extended => PushupPhase::Up,
            Stage::Flexed => PushupPhase::Down,
        }
    }
}

// Squats start standing, so the ready stage collapses into standing
impl CyclePhase for SquatPhase {
    fn stage(self) -> Stage {
        match self {
            SquatPhase::Standing => Stage::Extended,
            SquatPhase::Down => Stage::Flexed,
        }
    }

    fn from_stage(stage: Stage) -> Self {
        match stage {
            Stage::Ready | Stage::Extended => SquatPhase::Standing,
            Stage::Flexed => SquatPhase::Down,
        }
    }
}

impl CyclePhase for LegRaisePhase {
    fn stage(self) -> Stage {
        match self {
            LegRaisePhase::Ready => Stage::Ready,
            LegRaisePhase::Down => Stage::Extended,
            LegRaisePhase::Up => Stage::Flexed,
        }
    }

    fn from_stage(stage: Stage) -> Self {
        match stage {
            Stage::Ready => LegRaisePhase::Ready,
            Stage::Extended => LegRaisePhase::Down,
            Stage::Flexed => LegRaisePhase::Up,
        }
    }
}

impl CyclePhase for CurlPhase {
    fn stage(self) -> Stage {
        match self {
            CurlPhase::Ready => Stage::Ready,
            CurlPhase::Extended => Stage::Extended,
            CurlPhase::Flexed => Stage::Flexed,
        }
    }

    fn from_stage(stage: Stage) -> Self {
        match stage {
            Stage::Ready => CurlPhase::Ready,
            Stage::Extended => CurlPhase::Extended,
            Stage::Flexed => CurlPhase::Flexed,
        }
    }
}

impl CyclePhase for RowPhase {
    fn stage(self) -> Stage {
        match self {
            RowPhase::Ready => Stage::Ready,
            RowPhase::Down => Stage::Extended,
            RowPhase::Up => Stage::Flexed,
        }
    }

    fn from_stage(stage: Stage) -> Self {
        match stage {
            Stage::Ready => RowPhase::Ready,
            Stage::Extended => RowPhase::Down,
            Stage::Flexed => RowPhase::Up,
        }
    }
}

/// Monotonic repetition counter (only [`RepCounter::reset`] lowers it)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepCounter {
    count: u32,
}

impl RepCounter {
    pub fn increment(&mut self) -> u32 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Result of feeding one frame to the hold timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldUpdate {
    pub phase: PlankPhase,
    /// Current continuous hold in seconds (0 when not holding)
    pub hold_secs: f64,
    /// Set when a running hold was broken by this frame, with its length
    pub broken_after: Option<f64>,
    pub started: bool,
}

/// Wall-clock hold tracker. No partial credit: broken form clears the timer.
#[derive(Debug, Clone, Default)]
pub struct HoldTimer {
    started_at: Option<DateTime<Utc>>,
}

impl HoldTimer {
    pub fn update(&mut self, is_correct: bool, now: DateTime<Utc>) -> HoldUpdate {
        if !is_correct {
            let broken_after = self.started_at.take().map(|start| seconds_between(start, now));
            return HoldUpdate {
                phase: PlankPhase::Ready,
                hold_secs: 0.0,
                broken_after,
                started: false,
            };
        }

        let started = self.started_at.is_none();
        let start = *self.started_at.get_or_insert(now);
        HoldUpdate {
            phase: PlankPhase::Holding,
            hold_secs: seconds_between(start, now),
            broken_after: None,
            started,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn reset(&mut self) {
        self.started_at = None;
    }
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    ((end - start).num_milliseconds() as f64 / 1000.0).max(0.0)
}
