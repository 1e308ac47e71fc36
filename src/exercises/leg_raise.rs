//! Leg raise rules
//!
//! Lying supine, the hip angle (shoulder-hip-knee) opens to ~180° with the legs
//! flat (down) and closes as they are raised (up).

use super::{angle_of, ExerciseRules, PhaseStep, QualityWeights, SetupGuide};
use crate::counter::{advance_cycle, RepThresholds, Transition};
use crate::geometry::{angle, inclination_from_horizontal, midpoint};
use crate::types::{landmark as lm, AngleData, ExerciseKind, ExercisePhase, PoseFrame};

pub const THRESHOLDS: RepThresholds = RepThresholds {
    extend_above: 160.0,
    flex_below: 110.0,
    return_above: 155.0,
};

const MAX_SUPINE_INCLINATION_DEG: f64 = 30.0;
const MAX_TORSO_LIFT_DEG: f64 = 15.0;
const MIN_KNEE_EXTENSION_DEG: f64 = 150.0;
const MAX_LEG_ASYMMETRY_DEG: f64 = 20.0;

const KEY_LANDMARKS: &[usize] = &[
    lm::LEFT_SHOULDER,
    lm::RIGHT_SHOULDER,
    lm::LEFT_HIP,
    lm::RIGHT_HIP,
    lm::LEFT_KNEE,
    lm::RIGHT_KNEE,
    lm::LEFT_ANKLE,
    lm::RIGHT_ANKLE,
];

pub struct LegRaiseRules;

impl ExerciseRules for LegRaiseRules {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::LegRaise
    }

    fn key_landmarks(&self) -> &'static [usize] {
        KEY_LANDMARKS
    }

    fn guarded_angles(&self) -> &'static [&'static str] {
        &["hip"]
    }

    fn quality_weights(&self) -> QualityWeights {
        QualityWeights {
            step: 0.1,
            floor: 0.4,
        }
    }

    fn setup_guide(&self) -> SetupGuide {
        SetupGuide {
            camera_guide: "카메라를 바닥 높이에 두고 누운 몸의 옆모습이 전부 보이게 해주세요".to_string(),
            pose_guide: "바닥에 등을 대고 누워 두 다리를 모아 곧게 편 다음 손은 엉덩이 옆에 두세요".to_string(),
        }
    }

    fn validate_position(&self, frame: &PoseFrame) -> Result<(), String> {
        let shoulders = midpoint(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
        let hips = midpoint(frame.get(lm::LEFT_HIP), frame.get(lm::RIGHT_HIP));
        if inclination_from_horizontal(&shoulders, &hips) > MAX_SUPINE_INCLINATION_DEG {
            return Err("바닥에 등을 대고 누워주세요".to_string());
        }
        Ok(())
    }

    fn compute_angles(&self, frame: &PoseFrame) -> AngleData {
        let left_hip = angle(
            frame.get(lm::LEFT_SHOULDER),
            frame.get(lm::LEFT_HIP),
            frame.get(lm::LEFT_KNEE),
        );
        let right_hip = angle(
            frame.get(lm::RIGHT_SHOULDER),
            frame.get(lm::RIGHT_HIP),
            frame.get(lm::RIGHT_KNEE),
        );
        let left_knee = angle(
            frame.get(lm::LEFT_HIP),
            frame.get(lm::LEFT_KNEE),
            frame.get(lm::LEFT_ANKLE),
        );
        let right_knee = angle(
            frame.get(lm::RIGHT_HIP),
            frame.get(lm::RIGHT_KNEE),
            frame.get(lm::RIGHT_ANKLE),
        );
        let shoulders = midpoint(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
        let hips = midpoint(frame.get(lm::LEFT_HIP), frame.get(lm::RIGHT_HIP));

        let mut angles = AngleData::new();
        angles.insert("left_hip".to_string(), left_hip);
        angles.insert("right_hip".to_string(), right_hip);
        angles.insert("hip".to_string(), (left_hip + right_hip) / 2.0);
        angles.insert("knee".to_string(), (left_knee + right_knee) / 2.0);
        angles.insert("torso_lift".to_string(), inclination_from_horizontal(&shoulders, &hips));
        angles
    }

    fn check_form(&self, _frame: &PoseFrame, angles: &AngleData) -> Vec<String> {
        let mut messages = Vec::new();

        if angle_of(angles, "knee") < MIN_KNEE_EXTENSION_DEG {
            messages.push("무릎이 굽혀졌습니다. 다리를 곧게 펴주세요".to_string());
        }
        if (angle_of(angles, "left_hip") - angle_of(angles, "right_hip")).abs() > MAX_LEG_ASYMMETRY_DEG {
            messages.push("두 다리를 모아서 함께 올려주세요".to_string());
        }
        if angle_of(angles, "torso_lift") > MAX_TORSO_LIFT_DEG {
            messages.push("상체가 들리고 있습니다. 등과 허리를 바닥에 붙여주세요".to_string());
        }

        messages
    }

    fn advance_phase(&self, phase: ExercisePhase, angles: &AngleData) -> PhaseStep {
        match phase {
            ExercisePhase::LegRaise(current) => {
                let (next, transition) = advance_cycle(current, angle_of(angles, "hip"), &THRESHOLDS);
                PhaseStep {
                    phase: ExercisePhase::LegRaise(next),
                    transition,
                }
            }
            other => PhaseStep {
                phase: other,
                transition: Transition::None,
            },
        }
    }
}
