//! Exercise rule sets
//!
//! Every supported exercise implements [`ExerciseRules`]: a gross position check,
//! joint-angle computation, threshold-based form checks and a phase step. Rule
//! sets are stateless unit structs, so one static instance per exercise is shared
//! read-only by every session. The instance is chosen once at `init` through
//! [`rules_for`].

pub mod dumbbell_curl;
pub mod leg_raise;
pub mod one_arm_row;
pub mod plank;
pub mod pushup;
pub mod squat;

pub use dumbbell_curl::DumbbellCurlRules;
pub use leg_raise::LegRaiseRules;
pub use one_arm_row::OneArmRowRules;
pub use plank::PlankRules;
pub use pushup::PushupRules;
pub use squat::SquatRules;

use crate::counter::Transition;
use crate::types::{AngleData, ExerciseKind, ExercisePhase, FormFeedback, PoseFrame};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Camera placement and starting-posture instructions sent on `init`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupGuide {
    pub camera_guide: String,
    pub pose_guide: String,
}

/// Soft-score parameters: `max(floor, 1 - step * messageCount)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityWeights {
    pub step: f64,
    pub floor: f64,
}

impl QualityWeights {
    pub fn score(&self, message_count: usize) -> f64 {
        if message_count == 0 {
            return 1.0;
        }
        (1.0 - self.step * message_count as f64).max(self.floor)
    }
}

/// Outcome of the stateless part of a frame's evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub feedback: FormFeedback,
    /// False when the gross position check failed and no angles were computed
    pub position_ok: bool,
}

/// Outcome of advancing the exercise phase by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseStep {
    pub phase: ExercisePhase,
    pub transition: Transition,
}

/// Biomechanical rules for one exercise
pub trait ExerciseRules: Send + Sync {
    fn kind(&self) -> ExerciseKind;

    /// Landmarks whose visibility makes up the feedback confidence
    fn key_landmarks(&self) -> &'static [usize];

    /// Angle keys watched by the velocity guard
    fn guarded_angles(&self) -> &'static [&'static str];

    fn quality_weights(&self) -> QualityWeights;

    fn setup_guide(&self) -> SetupGuide;

    /// Gross body-position check; `Err` carries the corrective message
    fn validate_position(&self, frame: &PoseFrame) -> Result<(), String>;

    fn compute_angles(&self, frame: &PoseFrame) -> AngleData;

    /// Threshold checks; every returned message is one violation
    fn check_form(&self, frame: &PoseFrame, angles: &AngleData) -> Vec<String>;

    /// Advance the phase from the computed angles. Hold-based exercises are driven
    /// by the hold timer instead and return the phase unchanged.
    fn advance_phase(&self, phase: ExercisePhase, angles: &AngleData) -> PhaseStep;

    /// Positive reinforcement after a counted rep
    fn rep_message(&self, rep_count: u32) -> String {
        format!("좋아요! {} {}회 완료", self.kind().korean_name(), rep_count)
    }

    /// Run the stateless evaluation steps: position, angles, checks, quality
    fn evaluate(&self, frame: &PoseFrame) -> Evaluation {
        let confidence = frame.mean_visibility(self.key_landmarks());

        if let Err(message) = self.validate_position(frame) {
            return Evaluation {
                feedback: FormFeedback::rejected(message, confidence),
                position_ok: false,
            };
        }

        let angle_data = self.compute_angles(frame);
        let messages = self.check_form(frame, &angle_data);
        let rep_quality = self.quality_weights().score(messages.len());

        Evaluation {
            feedback: FormFeedback {
                is_correct: messages.is_empty(),
                messages,
                angle_data,
                confidence,
                rep_quality,
            },
            position_ok: true,
        }
    }
}

impl fmt::Debug for dyn ExerciseRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExerciseRules({})", self.kind().as_str())
    }
}

static PUSHUP: PushupRules = PushupRules;
static SQUAT: SquatRules = SquatRules;
static LEG_RAISE: LegRaiseRules = LegRaiseRules;
static DUMBBELL_CURL: DumbbellCurlRules = DumbbellCurlRules;
static ONE_ARM_ROW: OneArmRowRules = OneArmRowRules;
static PLANK: PlankRules = PlankRules;

/// Shared rule set for an exercise
pub fn rules_for(kind: ExerciseKind) -> &'static dyn ExerciseRules {
    match kind {
        ExerciseKind::Pushup => &PUSHUP,
        ExerciseKind::Squat => &SQUAT,
        ExerciseKind::LegRaise => &LEG_RAISE,
        ExerciseKind::DumbbellCurl => &DUMBBELL_CURL,
        ExerciseKind::OneArmRow => &ONE_ARM_ROW,
        ExerciseKind::Plank => &PLANK,
    }
}

/// Which arm a unilateral exercise is currently tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveArm {
    Left,
    Right,
    Both,
}

/// One side's reading for the active-arm heuristic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmReading {
    pub elbow_angle: f64,
    /// The exercise-specific "this arm is working" condition
    pub working: bool,
}

/// Pick the working arm.
///
/// Precedence: both working → `Both`; exactly one working → that side; neither →
/// the more flexed elbow, with ties going to the left arm.
pub fn select_active_arm(left: ArmReading, right: ArmReading) -> ActiveArm {
    match (left.working, right.working) {
        (true, true) => ActiveArm::Both,
        (true, false) => ActiveArm::Left,
        (false, true) => ActiveArm::Right,
        (false, false) if right.elbow_angle < left.elbow_angle => ActiveArm::Right,
        (false, false) => ActiveArm::Left,
    }
}

impl ActiveArm {
    /// Elbow angle tracked for the selected arm (mean of both for `Both`)
    pub fn tracked_angle(&self, left: f64, right: f64) -> f64 {
        match self {
            ActiveArm::Left => left,
            ActiveArm::Right => right,
            ActiveArm::Both => (left + right) / 2.0,
        }
    }

    /// Numeric code stored alongside the angle data (-1 left, 0 both, 1 right)
    pub fn code(&self) -> f64 {
        match self {
            ActiveArm::Left => -1.0,
            ActiveArm::Both => 0.0,
            ActiveArm::Right => 1.0,
        }
    }
}

/// Read an angle the rule set itself inserted
pub(crate) fn angle_of(angles: &AngleData, key: &str) -> f64 {
    angles.get(key).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(elbow_angle: f64, working: bool) -> ArmReading {
        ArmReading {
            elbow_angle,
            working,
        }
    }

    #[test]
    fn test_quality_weights() {
        let weights = QualityWeights {
            step: 0.15,
            floor: 0.3,
        };
        assert_eq!(weights.score(0), 1.0);
        assert!((weights.score(1) - 0.85).abs() < 1e-9);
        assert!((weights.score(2) - 0.7).abs() < 1e-9);
        assert_eq!(weights.score(10), 0.3);
    }

    #[test]
    fn test_active_arm_both_working() {
        let arm = select_active_arm(reading(50.0, true), reading(55.0, true));
        assert_eq!(arm, ActiveArm::Both);
        assert_eq!(arm.tracked_angle(50.0, 60.0), 55.0);
    }

    #[test]
    fn test_active_arm_single_working_beats_flexion() {
        // The working side wins even when the other elbow is more flexed
        let arm = select_active_arm(reading(120.0, false), reading(130.0, true));
        assert_eq!(arm, ActiveArm::Right);
        let arm = select_active_arm(reading(130.0, true), reading(40.0, false));
        assert_eq!(arm, ActiveArm::Left);
    }

    #[test]
    fn test_active_arm_neither_uses_more_flexed() {
        assert_eq!(
            select_active_arm(reading(170.0, false), reading(150.0, false)),
            ActiveArm::Right
        );
        assert_eq!(
            select_active_arm(reading(150.0, false), reading(170.0, false)),
            ActiveArm::Left
        );
    }

    #[test]
    fn test_active_arm_tie_goes_left() {
        assert_eq!(
            select_active_arm(reading(160.0, false), reading(160.0, false)),
            ActiveArm::Left
        );
    }

    #[test]
    fn test_rules_lookup_matches_kind() {
        for kind in ExerciseKind::ALL {
            assert_eq!(rules_for(kind).kind(), kind);
            assert!(!rules_for(kind).guarded_angles().is_empty());
        }
    }
}
