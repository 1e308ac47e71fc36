//! Dumbbell curl rules
//!
//! Curls may be done one arm at a time, so both elbows are measured and the
//! working arm is picked with [`select_active_arm`]. An arm is working when its
//! elbow is bent past 90° with the wrist raised above the elbow.

use super::{angle_of, select_active_arm, ArmReading, ExerciseRules, PhaseStep, QualityWeights, SetupGuide};
use crate::counter::{advance_cycle, RepThresholds, Transition};
use crate::geometry::{angle, inclination_from_vertical, midpoint};
use crate::types::{landmark as lm, AngleData, ExerciseKind, ExercisePhase, PoseFrame};

pub const THRESHOLDS: RepThresholds = RepThresholds {
    extend_above: 150.0,
    flex_below: 60.0,
    return_above: 140.0,
};

const MAX_TORSO_INCLINATION_DEG: f64 = 30.0;
const MAX_TORSO_SWING_DEG: f64 = 10.0;
/// Upper arm drifting forward/outward from the torso (hip-shoulder-elbow)
const MAX_UPPER_ARM_DRIFT_DEG: f64 = 30.0;
const WORKING_ELBOW_DEG: f64 = 90.0;

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

pub struct DumbbellCurlRules;

impl DumbbellCurlRules {
    fn arm_reading(frame: &PoseFrame, elbow_angle: f64, elbow: usize, wrist: usize) -> ArmReading {
        ArmReading {
            elbow_angle,
            working: elbow_angle < WORKING_ELBOW_DEG && frame.get(wrist).y < frame.get(elbow).y,
        }
    }
}

impl ExerciseRules for DumbbellCurlRules {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::DumbbellCurl
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
            camera_guide: "카메라를 가슴 높이 정면에 두고 머리부터 무릎까지 보이게 해주세요".to_string(),
            pose_guide: "덤벨을 들고 바로 선 채 팔을 몸통 옆에 붙이고 손바닥이 앞을 향하게 하세요".to_string(),
        }
    }

    fn validate_position(&self, frame: &PoseFrame) -> Result<(), String> {
        let shoulders = midpoint(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
        let hips = midpoint(frame.get(lm::LEFT_HIP), frame.get(lm::RIGHT_HIP));
        if hips.y <= shoulders.y || inclination_from_vertical(&shoulders, &hips) > MAX_TORSO_INCLINATION_DEG {
            return Err("상체를 곧게 세우고 바로 서주세요".to_string());
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
        let left_upper_arm = angle(
            frame.get(lm::LEFT_HIP),
            frame.get(lm::LEFT_SHOULDER),
            frame.get(lm::LEFT_ELBOW),
        );
        let right_upper_arm = angle(
            frame.get(lm::RIGHT_HIP),
            frame.get(lm::RIGHT_SHOULDER),
            frame.get(lm::RIGHT_ELBOW),
        );

        let active = select_active_arm(
            Self::arm_reading(frame, left_elbow, lm::LEFT_ELBOW, lm::LEFT_WRIST),
            Self::arm_reading(frame, right_elbow, lm::RIGHT_ELBOW, lm::RIGHT_WRIST),
        );
        let shoulders = midpoint(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
        let hips = midpoint(frame.get(lm::LEFT_HIP), frame.get(lm::RIGHT_HIP));

        let mut angles = AngleData::new();
        angles.insert("left_elbow".to_string(), left_elbow);
        angles.insert("right_elbow".to_string(), right_elbow);
        angles.insert("active_elbow".to_string(), active.tracked_angle(left_elbow, right_elbow));
        angles.insert("active_arm".to_string(), active.code());
        angles.insert(
            "upper_arm_drift".to_string(),
            active.tracked_angle(left_upper_arm, right_upper_arm),
        );
        angles.insert("torso_lean".to_string(), inclination_from_vertical(&shoulders, &hips));
        angles
    }

    fn check_form(&self, _frame: &PoseFrame, angles: &AngleData) -> Vec<String> {
        let mut messages = Vec::new();

        if angle_of(angles, "upper_arm_drift") > MAX_UPPER_ARM_DRIFT_DEG {
            messages.push("팔꿈치가 앞으로 나갔습니다. 팔꿈치를 옆구리에 고정하세요".to_string());
        }
        if angle_of(angles, "torso_lean") > MAX_TORSO_SWING_DEG {
            messages.push("몸이 흔들리고 있습니다. 반동 없이 팔 힘으로만 올려주세요".to_string());
        }

        messages
    }

    fn advance_phase(&self, phase: ExercisePhase, angles: &AngleData) -> PhaseStep {
        match phase {
            ExercisePhase::DumbbellCurl(current) => {
                let (next, transition) =
                    advance_cycle(current, angle_of(angles, "active_elbow"), &THRESHOLDS);
                PhaseStep {
                    phase: ExercisePhase::DumbbellCurl(next),
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
    use crate::testing::{curl_pose, plank_pose};
    use crate::types::CurlPhase;

    #[test]
    fn test_arm_angles_and_active_side() {
        let angles = DumbbellCurlRules.compute_angles(&curl_pose(50.0, 175.0));
        assert!((angles["left_elbow"] - 50.0).abs() < 0.5);
        assert!((angles["right_elbow"] - 175.0).abs() < 0.5);
        assert_eq!(angles["active_arm"], ActiveArm::Left.code());
        assert!((angles["active_elbow"] - 50.0).abs() < 0.5);
    }

    #[test]
    fn test_both_arms_curling() {
        let angles = DumbbellCurlRules.compute_angles(&curl_pose(50.0, 70.0));
        assert_eq!(angles["active_arm"], ActiveArm::Both.code());
        assert!((angles["active_elbow"] - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_neither_curling_picks_more_flexed() {
        let angles = DumbbellCurlRules.compute_angles(&curl_pose(170.0, 120.0));
        assert_eq!(angles["active_arm"], ActiveArm::Right.code());
    }

    #[test]
    fn test_upright_curl_is_correct() {
        let eval = DumbbellCurlRules.evaluate(&curl_pose(60.0, 175.0));
        assert!(eval.feedback.is_correct, "{:?}", eval.feedback.messages);
        assert!(eval.feedback.confidence > 0.9);
    }

    #[test]
    fn test_lying_rejected() {
        let eval = DumbbellCurlRules.evaluate(&plank_pose(0.5));
        assert!(!eval.position_ok);
        assert_eq!(eval.feedback.messages.len(), 1);
    }

    #[test]
    fn test_curl_rep_sequence() {
        let mut phase = ExercisePhase::DumbbellCurl(CurlPhase::Ready);
        let mut reps = 0;
        for left in [170.0, 155.0, 50.0, 150.0] {
            let angles = DumbbellCurlRules.compute_angles(&curl_pose(left, 178.0));
            let step = DumbbellCurlRules.advance_phase(phase, &angles);
            if step.transition == Transition::RepCompleted {
                reps += 1;
            }
            phase = step.phase;
        }
        assert_eq!(reps, 1);
    }
}
