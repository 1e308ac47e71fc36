//! One-arm dumbbell row rules
//!
//! The torso is hinged forward with one arm braced. The rowing arm is picked with
//! [`select_active_arm`]: an arm is working when its elbow is bent past 120° while
//! the wrist still hangs below the shoulder.

use super::{angle_of, select_active_arm, ArmReading, ExerciseRules, PhaseStep, QualityWeights, SetupGuide};
use crate::counter::{advance_cycle, RepThresholds, Transition};
use crate::geometry::{angle, inclination_from_horizontal, inclination_from_vertical, midpoint};
use crate::types::{landmark as lm, AngleData, ExerciseKind, ExercisePhase, PoseFrame};

pub const THRESHOLDS: RepThresholds = RepThresholds {
    extend_above: 150.0,
    flex_below: 90.0,
    return_above: 140.0,
};

/// Minimum forward hinge (torso from vertical) to count as a row position
const MIN_HINGE_DEG: f64 = 20.0;
/// Back angle from horizontal above which the torso is too upright
const MAX_BACK_ANGLE_DEG: f64 = 45.0;
/// Elbow pulled above the shoulder by more than this (normalised y)
const MAX_ELBOW_HEIGHT: f64 = 0.05;
const MAX_SHOULDER_TILT: f64 = 0.08;
const WORKING_ELBOW_DEG: f64 = 120.0;

const KEY_LANDMARKS: &[usize] = &[
    lm::LEFT_SHOULDER,
    lm::RIGHT_SHOULDER,
    lm::LEFT_ELBOW,
    lm::RIGHT_ELBOW,
    lm::LEFT_WRIST,
    lm::RIGHT_WRIST,
    lm::LEFT_HIP,
    lm::RIGHT_HIP,
];

pub struct OneArmRowRules;

impl OneArmRowRules {
    fn arm_reading(frame: &PoseFrame, elbow_angle: f64, shoulder: usize, wrist: usize) -> ArmReading {
        ArmReading {
            elbow_angle,
            working: elbow_angle < WORKING_ELBOW_DEG && frame.get(wrist).y > frame.get(shoulder).y,
        }
    }
}

impl ExerciseRules for OneArmRowRules {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::OneArmRow
    }

    fn key_landmarks(&self) -> &'static [usize] {
        KEY_LANDMARKS
    }

    fn guarded_angles(&self) -> &'static [&'static str] {
        &["left_elbow", "right_elbow"]
    }

    fn quality_weights(&self) -> QualityWeights {
        QualityWeights {
            step: 0.1,
            floor: 0.5,
        }
    }

    fn setup_guide(&self) -> SetupGuide {
        SetupGuide {
            camera_guide: "카메라를 허리 높이에 두고 숙인 몸의 옆모습이 보이게 해주세요".to_string(),
            pose_guide: "한 손과 한쪽 무릎을 벤치에 대고 등을 평평하게 편 채 반대 손으로 덤벨을 아래로 늘어뜨리세요".to_string(),
        }
    }

    fn validate_position(&self, frame: &PoseFrame) -> Result<(), String> {
        let shoulders = midpoint(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
        let hips = midpoint(frame.get(lm::LEFT_HIP), frame.get(lm::RIGHT_HIP));
        if inclination_from_vertical(&shoulders, &hips) < MIN_HINGE_DEG {
            return Err("허리를 숙여 상체를 앞으로 기울여주세요".to_string());
        }
        Ok(())
    }

    fn compute_angles(&self, frame: &PoseFrame) -> AngleData {
        let left_elbow = angle(
            frame.get(lm::LEFT_SHOULDER),
            frame.get(lm::LEFT_ELBOW),
            frame.get(lm::LEFT_WRIST),
        );
        let right_elbow = angle(
            frame.get(lm::RIGHT_SHOULDER),
            frame.get(lm::RIGHT_ELBOW),
            frame.get(lm::RIGHT_WRIST),
        );
        let active = select_active_arm(
            Self::arm_reading(frame, left_elbow, lm::LEFT_SHOULDER, lm::LEFT_WRIST),
            Self::arm_reading(frame, right_elbow, lm::RIGHT_SHOULDER, lm::RIGHT_WRIST),
        );

        let left_shoulder = frame.get(lm::LEFT_SHOULDER);
        let right_shoulder = frame.get(lm::RIGHT_SHOULDER);
        let shoulders = midpoint(left_shoulder, right_shoulder);
        let hips = midpoint(frame.get(lm::LEFT_HIP), frame.get(lm::RIGHT_HIP));
        let elbow_height = active.tracked_angle(
            left_shoulder.y - frame.get(lm::LEFT_ELBOW).y,
            right_shoulder.y - frame.get(lm::RIGHT_ELBOW).y,
        );

        let mut angles = AngleData::new();
        angles.insert("left_elbow".to_string(), left_elbow);
        angles.insert("right_elbow".to_string(), right_elbow);
        angles.insert("active_elbow".to_string(), active.tracked_angle(left_elbow, right_elbow));
        angles.insert("active_arm".to_string(), active.code());
        angles.insert("back_angle".to_string(), inclination_from_horizontal(&shoulders, &hips));
        angles.insert("elbow_height".to_string(), elbow_height);
        angles.insert("shoulder_tilt".to_string(), (left_shoulder.y - right_shoulder.y).abs());
        angles
    }

    fn check_form(&self, _frame: &PoseFrame, angles: &AngleData) -> Vec<String> {
        let mut messages = Vec::new();

        if angle_of(angles, "back_angle") > MAX_BACK_ANGLE_DEG {
            messages.push("상체가 너무 세워졌습니다. 등을 바닥과 평행에 가깝게 숙여주세요".to_string());
        }
        if angle_of(angles, "elbow_height") > MAX_ELBOW_HEIGHT {
            messages.push("팔꿈치를 너무 높이 당겼습니다. 옆구리 높이까지만 당겨주세요".to_string());
        }
        if angle_of(angles, "shoulder_tilt") > MAX_SHOULDER_TILT {
            messages.push("몸통이 돌아가고 있습니다. 어깨를 수평으로 유지하세요".to_string());
        }

        messages
    }

    fn advance_phase(&self, phase: ExercisePhase, angles: &AngleData) -> PhaseStep {
        match phase {
            ExercisePhase::OneArmRow(current) => {
                let (next, transition) =
                    advance_cycle(current, angle_of(angles, "active_elbow"), &THRESHOLDS);
                PhaseStep {
                    phase: ExercisePhase::OneArmRow(next),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::ActiveArm;
    use crate::testing::{curl_pose, row_pose};
    use crate::types::RowPhase;

    #[test]
    fn test_rowing_arm_selected() {
        let angles = OneArmRowRules.compute_angles(&row_pose(80.0));
        assert_eq!(angles["active_arm"], ActiveArm::Left.code());
        assert!((angles["active_elbow"] - 80.0).abs() < 0.5);
        assert!((angles["right_elbow"] - 180.0).abs() < 0.5);
    }

    #[test]
    fn test_good_row_is_correct() {
        let eval = OneArmRowRules.evaluate(&row_pose(80.0));
        assert!(eval.position_ok);
        assert!(eval.feedback.is_correct, "{:?}", eval.feedback.messages);
    }

    #[test]
    fn test_elbow_pulled_too_high() {
        let eval = OneArmRowRules.evaluate(&row_pose(60.0));
        assert!(!eval.feedback.is_correct);
        assert!(eval.feedback.messages[0].contains("너무 높이"));
        assert!((eval.feedback.rep_quality - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_upright_rejected() {
        let eval = OneArmRowRules.evaluate(&curl_pose(170.0, 170.0));
        assert!(!eval.position_ok);
    }

    #[test]
    fn test_row_cycle() {
        let mut phase = ExercisePhase::OneArmRow(RowPhase::Ready);
        let mut reps = 0;
        for left in [170.0, 120.0, 80.0, 120.0, 160.0] {
            let angles = OneArmRowRules.compute_angles(&row_pose(left));
            let step = OneArmRowRules.advance_phase(phase, &angles);
            if step.transition == Transition::RepCompleted {
                reps += 1;
            }
            phase = step.phase;
        }
        assert_eq!(reps, 1);
        assert_eq!(phase, ExercisePhase::OneArmRow(RowPhase::Down));
    }
}
