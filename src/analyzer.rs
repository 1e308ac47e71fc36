//! Per-session analysis pipeline
//!
//! [`ExerciseAnalyzer`] owns everything one session mutates: the smoother and
//! velocity guard state, the exercise phase, the rep counter or hold timer, the
//! completion latch and the form history. Each frame runs
//! smoothing → rule evaluation → velocity guard → phase/hold update →
//! completion check, synchronously.

use crate::config::AnalyzerConfig;
use crate::counter::{HoldTimer, RepCounter, Transition};
use crate::debounce::{CompletionDebouncer, Cooldown};
use crate::error::AnalysisError;
use crate::exercises::{rules_for, ExerciseRules, SetupGuide};
use crate::history::FormHistory;
use crate::smoother::{LandmarkSmoother, VelocityGuard, VelocityRejection};
use crate::types::{CountingMode, ExerciseKind, ExercisePhase, FormFeedback, FormHistoryEntry, FormSummary, PoseFrame};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Appended to the feedback of the frame that completes the set
pub const COMPLETION_MESSAGE: &str = "목표를 달성했습니다! 수고하셨습니다";

/// Sole feedback message of a frame dropped by the velocity guard
pub const TOO_FAST_MESSAGE: &str = "움직임이 너무 빠릅니다. 천천히 움직여주세요";

/// What the session is working toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Reps(u32),
    Seconds(u32),
}

impl Target {
    /// Pick the target matching the exercise's counting mode, falling back to the
    /// configured default. Zero or negative targets are rejected.
    pub fn resolve(
        kind: ExerciseKind,
        target_reps: Option<i64>,
        target_time: Option<i64>,
        config: &AnalyzerConfig,
    ) -> Result<Self, AnalysisError> {
        match kind.counting_mode() {
            CountingMode::Reps => {
                let reps = positive("targetReps", target_reps, config.default_target_reps)?;
                Ok(Target::Reps(reps))
            }
            CountingMode::Hold => {
                let secs = positive("targetTime", target_time, config.default_target_seconds)?;
                Ok(Target::Seconds(secs))
            }
        }
    }

    pub fn reps(&self) -> Option<u32> {
        match self {
            Target::Reps(n) => Some(*n),
            Target::Seconds(_) => None,
        }
    }

    pub fn seconds(&self) -> Option<u32> {
        match self {
            Target::Seconds(n) => Some(*n),
            Target::Reps(_) => None,
        }
    }
}

fn positive(field: &str, value: Option<i64>, default: u32) -> Result<u32, AnalysisError> {
    match value {
        None => Ok(default),
        Some(v) if v > 0 => u32::try_from(v)
            .map_err(|_| AnalysisError::InvalidTarget(format!("{field} is too large: {v}"))),
        Some(v) => Err(AnalysisError::InvalidTarget(format!(
            "{field} must be greater than zero, got {v}"
        ))),
    }
}

/// Result of one analysed frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub feedback: FormFeedback,
    pub rep_count: u32,
    /// Current continuous hold in seconds (always 0 for rep-based exercises)
    pub hold_time: f64,
    /// True only on the frame where completion fires
    pub is_complete: bool,
    pub phase: ExercisePhase,
    /// History entry closed by this frame, if any
    pub recorded: Option<FormHistoryEntry>,
}

/// Outcome of feeding one frame to the analyzer
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Analyzed(FrameReport),
    /// Dropped by the velocity guard; no state other than the guard's angle
    /// cache was touched. `report` carries the unchanged counters.
    Dropped {
        rejection: VelocityRejection,
        report: FrameReport,
    },
}

/// Stateful analysis of one exercise for one session
#[derive(Debug)]
pub struct ExerciseAnalyzer {
    kind: ExerciseKind,
    rules: &'static dyn ExerciseRules,
    target: Target,
    phase: ExercisePhase,
    reps: RepCounter,
    hold: HoldTimer,
    hold_time: f64,
    hold_attempts: u32,
    // The running hold already produced its history entry on completion
    hold_recorded: bool,
    history: FormHistory,
    smoother: LandmarkSmoother,
    guard: VelocityGuard,
    debouncer: CompletionDebouncer,
}

impl ExerciseAnalyzer {
    pub fn new(kind: ExerciseKind, target: Target, config: &AnalyzerConfig) -> Self {
        Self {
            kind,
            rules: rules_for(kind),
            target,
            phase: ExercisePhase::initial(kind),
            reps: RepCounter::default(),
            hold: HoldTimer::default(),
            hold_time: 0.0,
            hold_attempts: 0,
            hold_recorded: false,
            history: FormHistory::new(config.history_limit),
            smoother: LandmarkSmoother::new(config.smoothing_factor),
            guard: VelocityGuard::new(config.velocity_threshold_deg),
            debouncer: CompletionDebouncer::new(Cooldown::from_secs_f64(config.completion_cooldown_secs)),
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn setup_guide(&self) -> SetupGuide {
        self.rules.setup_guide()
    }

    pub fn phase(&self) -> ExercisePhase {
        self.phase
    }

    pub fn rep_count(&self) -> u32 {
        self.reps.count()
    }

    pub fn hold_time(&self) -> f64 {
        self.hold_time
    }

    pub fn history(&self) -> &FormHistory {
        &self.history
    }

    pub fn completion_triggered(&self) -> bool {
        self.debouncer.is_triggered()
    }

    /// Run one analysis cycle over a validated frame
    pub fn process(&mut self, frame: &PoseFrame, now: DateTime<Utc>) -> FrameOutcome {
        let smoothed = self.smoother.smooth(frame);
        let evaluation = self.rules.evaluate(&smoothed);

        if evaluation.position_ok {
            if let Err(rejection) = self
                .guard
                .check_all(&evaluation.feedback.angle_data, self.rules.guarded_angles())
            {
                debug!(
                    exercise = self.kind.as_str(),
                    angle = %rejection.angle,
                    delta = rejection.delta,
                    "frame dropped: movement too fast"
                );
                let mut feedback = FormFeedback::rejected(TOO_FAST_MESSAGE, evaluation.feedback.confidence);
                feedback.angle_data = evaluation.feedback.angle_data;
                round_angles(&mut feedback);
                return FrameOutcome::Dropped {
                    rejection,
                    report: FrameReport {
                        feedback,
                        rep_count: self.reps.count(),
                        hold_time: self.hold_time,
                        is_complete: false,
                        phase: self.phase,
                        recorded: None,
                    },
                };
            }
        }
        self.smoother.accept(smoothed);

        let mut feedback = evaluation.feedback;
        let recorded = match self.kind.counting_mode() {
            CountingMode::Reps if evaluation.position_ok => self.advance_reps(&mut feedback, now),
            // Gross position failures leave rep state untouched
            CountingMode::Reps => None,
            CountingMode::Hold => self.advance_hold(&mut feedback, now),
        };

        let condition_met = match self.target {
            Target::Reps(n) => self.reps.count() >= n,
            Target::Seconds(secs) => self.hold_time >= f64::from(secs),
        };
        let is_complete = self.debouncer.check(condition_met, now);
        let recorded = if is_complete {
            info!(
                exercise = self.kind.as_str(),
                reps = self.reps.count(),
                hold_secs = self.hold_time,
                "set completed"
            );
            feedback.messages.push(COMPLETION_MESSAGE.to_string());
            match self.kind.counting_mode() {
                CountingMode::Hold => {
                    self.hold_recorded = true;
                    Some(self.record_hold_attempt(now))
                }
                CountingMode::Reps => recorded,
            }
        } else {
            recorded
        };

        round_angles(&mut feedback);

        FrameOutcome::Analyzed(FrameReport {
            feedback,
            rep_count: self.reps.count(),
            hold_time: self.hold_time,
            is_complete,
            phase: self.phase,
            recorded,
        })
    }

    fn advance_reps(&mut self, feedback: &mut FormFeedback, now: DateTime<Utc>) -> Option<FormHistoryEntry> {
        self.history.observe(feedback);

        let step = self.rules.advance_phase(self.phase, &feedback.angle_data);
        if step.phase != self.phase {
            debug!(
                exercise = self.kind.as_str(),
                from = self.phase.label(),
                to = step.phase.label(),
                "phase transition"
            );
        }
        self.phase = step.phase;

        if step.transition != Transition::RepCompleted {
            return None;
        }
        let count = self.reps.increment();
        let entry = self.history.record(count, now);
        info!(
            exercise = self.kind.as_str(),
            reps = count,
            quality = entry.quality_score,
            "rep counted"
        );
        feedback.messages.push(self.rules.rep_message(count));
        Some(entry)
    }

    fn advance_hold(&mut self, feedback: &mut FormFeedback, now: DateTime<Utc>) -> Option<FormHistoryEntry> {
        let update = self.hold.update(feedback.is_correct, now);
        self.phase = ExercisePhase::Plank(update.phase);
        self.hold_time = update.hold_secs;
        self.history.observe(feedback);

        if update.started {
            debug!(exercise = self.kind.as_str(), "hold started");
            feedback.messages.push(self.rules.rep_message(0));
        }
        let secs = update.broken_after?;
        debug!(exercise = self.kind.as_str(), held_secs = secs, "hold broken");
        if std::mem::take(&mut self.hold_recorded) {
            self.history.discard_pending();
            return None;
        }
        Some(self.record_hold_attempt(now))
    }

    fn record_hold_attempt(&mut self, now: DateTime<Utc>) -> FormHistoryEntry {
        self.hold_attempts = self.hold_attempts.saturating_add(1);
        self.history.record(self.hold_attempts, now)
    }

    /// Zero counters and timers and re-arm completion; the exercise and target
    /// are kept
    pub fn reset(&mut self) {
        self.phase = ExercisePhase::initial(self.kind);
        self.reps.reset();
        self.hold.reset();
        self.hold_time = 0.0;
        self.hold_attempts = 0;
        self.hold_recorded = false;
        self.history.clear();
        self.smoother.reset();
        self.guard.reset();
        self.debouncer.reset();
    }

    pub fn summary(&self) -> FormSummary {
        self.history
            .summary(self.kind.korean_name(), self.reps.count(), self.hold_time)
    }
}

fn round_angles(feedback: &mut FormFeedback) {
    for value in feedback.angle_data.values_mut() {
        *value = (*value * 10.0).round() / 10.0;
    }
}
