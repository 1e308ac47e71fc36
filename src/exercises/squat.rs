//! Squat rules

use super::{angle_of, ExerciseRules, PhaseStep, QualityWeights, SetupGuide};
use crate::counter::{advance_cycle, RepThresholds, Transition};
use crate::geometry::{angle, distance, inclination_from_vertical, midpoint};
use crate::types::{landmark as lm, AngleData, ExerciseKind, ExercisePhase, PoseFrame};

pub const THRESHOLDS: RepThresholds = RepThresholds {
    extend_above: 160.0,
    flex_below: 100.0,
    return_above: 160.0,
};

const MAX_TORSO_INCLINATION_DEG: f64 = 60.0;
const MAX_TORSO_LEAN_DEG: f64 = 45.0;
/// Knee ahead of the toes, as a fraction of thigh length
const MAX_KNEE_FORWARD_RATIO: f64 = 0.12;
/// Knee width over ankle width; lower means the knees cave in
const MIN_KNEE_TRACKING_RATIO: f64 = 0.8;
const MIN_FRONTAL_ANKLE_WIDTH: f64 = 0.05;
/// Knee-forward and tracking checks only apply once the knees bend this far
const DESCENT_KNEE_DEG: f64 = 140.0;

const KEY_LANDMARKS: &[usize] = &[
    lm::LEFT_SHOULDER,
    lm::RIGHT_SHOULDER,
    lm::LEFT_HIP,
    lm::RIGHT_HIP,
    lm::LEFT_KNEE,
    lm::RIGHT_KNEE,
    lm::LEFT_ANKLE,
    lm::RIGHT_ANKLE,
    lm::LEFT_FOOT_INDEX,
    lm::RIGHT_FOOT_INDEX,
];

pub struct SquatRules;

impl ExerciseRules for SquatRules {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Squat
    }

    fn key_landmarks(&self) -> &'static [usize] {
        KEY_LANDMARKS
    }

    fn guarded_angles(&self) -> &'static [&'static str] {
        &["knee"]
    }

    fn quality_weights(&self) -> QualityWeights {
        QualityWeights {
            step: 0.15,
            floor: 0.3,
        }
    }

    fn setup_guide(&self) -> SetupGuide {
        SetupGuide {
            camera_guide: "카메라를 허리 높이에 두고 몸의 옆모습이 머리부터 발끝까지 보이게 해주세요".to_string(),
            pose_guide: "발을 어깨너비로 벌리고 발끝은 살짝 바깥을 향하게 선 다음 가슴을 펴고 시작하세요".to_string(),
        }
    }

    fn validate_position(&self, frame: &PoseFrame) -> Result<(), String> {
        let shoulders = midpoint(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
        let hips = midpoint(frame.get(lm::LEFT_HIP), frame.get(lm::RIGHT_HIP));
        let ankles = midpoint(frame.get(lm::LEFT_ANKLE), frame.get(lm::RIGHT_ANKLE));

        if ankles.y <= hips.y || inclination_from_vertical(&shoulders, &hips) > MAX_TORSO_INCLINATION_DEG {
            return Err("바로 서서 전신이 화면에 보이게 해주세요".to_string());
        }
        Ok(())
    }

    fn compute_angles(&self, frame: &PoseFrame) -> AngleData {
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
        let knees = midpoint(frame.get(lm::LEFT_KNEE), frame.get(lm::RIGHT_KNEE));
        let heels = midpoint(frame.get(lm::LEFT_HEEL), frame.get(lm::RIGHT_HEEL));
        let toes = midpoint(frame.get(lm::LEFT_FOOT_INDEX), frame.get(lm::RIGHT_FOOT_INDEX));

        let mut angles = AngleData::new();
        angles.insert("left_knee".to_string(), left_knee);
        angles.insert("right_knee".to_string(), right_knee);
        angles.insert("knee".to_string(), (left_knee + right_knee) / 2.0);
        angles.insert("hip".to_string(), angle(&shoulders, &hips, &knees));
        angles.insert("torso_lean".to_string(), inclination_from_vertical(&shoulders, &hips));

        // Facing direction from heel to toe; knee-forward is measured along it
        let facing = if toes.x >= heels.x { 1.0 } else { -1.0 };
        let thigh = distance(&hips, &knees);
        if thigh > f64::EPSILON {
            angles.insert("knee_forward_ratio".to_string(), (knees.x - toes.x) * facing / thigh);
        }

        let ankle_width = distance(frame.get(lm::LEFT_ANKLE), frame.get(lm::RIGHT_ANKLE));
        if ankle_width > MIN_FRONTAL_ANKLE_WIDTH {
            let knee_width = distance(frame.get(lm::LEFT_KNEE), frame.get(lm::RIGHT_KNEE));
            angles.insert("knee_tracking_ratio".to_string(), knee_width / ankle_width);
        }
        angles
    }

    fn check_form(&self, _frame: &PoseFrame, angles: &AngleData) -> Vec<String> {
        let mut messages = Vec::new();
        let descending = angle_of(angles, "knee") < DESCENT_KNEE_DEG;

        if descending {
            if let Some(&forward) = angles.get("knee_forward_ratio") {
                if forward > MAX_KNEE_FORWARD_RATIO {
                    messages.push("무릎이 발끝을 넘어갔습니다. 엉덩이를 뒤로 빼며 앉으세요".to_string());
                }
            }
            if let Some(&tracking) = angles.get("knee_tracking_ratio") {
                if tracking < MIN_KNEE_TRACKING_RATIO {
                    messages.push("무릎이 안쪽으로 모이고 있습니다. 무릎을 발끝 방향으로 밀어주세요".to_string());
                }
            }
        }

        if angle_of(angles, "torso_lean") > MAX_TORSO_LEAN_DEG {
            messages.push("상체가 너무 숙여졌습니다. 가슴을 펴고 시선은 정면을 보세요".to_string());
        }

        messages
    }

    fn advance_phase(&self, phase: ExercisePhase, angles: &AngleData) -> PhaseStep {
        match phase {
            ExercisePhase::Squat(current) => {
                let (next, transition) = advance_cycle(current, angle_of(angles, "knee"), &THRESHOLDS);
                PhaseStep {
                    phase: ExercisePhase::Squat(next),
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
    use crate::testing::{plank_pose, squat_pose};
    use crate::types::SquatPhase;

    #[test]
    fn test_standing_is_correct() {
        let eval = SquatRules.evaluate(&squat_pose(178.0, 0.3));
        assert!(eval.position_ok);
        assert!(eval.feedback.is_correct, "{:?}", eval.feedback.messages);
        assert!((eval.feedback.angle_data["knee"] - 178.0).abs() < 0.5);
    }

    #[test]
    fn test_good_depth_is_correct() {
        let eval = SquatRules.evaluate(&squat_pose(90.0, 0.3));
        assert!(eval.feedback.is_correct, "{:?}", eval.feedback.messages);
    }

    #[test]
    fn test_knees_past_toes() {
        let eval = SquatRules.evaluate(&squat_pose(90.0, 0.6));
        assert!(!eval.feedback.is_correct);
        assert!(eval
            .feedback
            .messages
            .iter()
            .any(|m| m.contains("발끝을 넘어갔습니다")));
    }

    #[test]
    fn test_lying_down_rejected() {
        let eval = SquatRules.evaluate(&plank_pose(0.5));
        assert!(!eval.position_ok);
    }

    #[test]
    fn test_squat_rep_counted_on_stand_up() {
        let mut phase = ExercisePhase::Squat(SquatPhase::Standing);
        let mut transitions = Vec::new();
        for knee in [175.0, 130.0, 95.0, 130.0, 170.0] {
            let angles = SquatRules.compute_angles(&squat_pose(knee, 0.3));
            let step = SquatRules.advance_phase(phase, &angles);
            transitions.push(step.transition);
            phase = step.phase;
        }
        assert_eq!(
            transitions,
            vec![
                Transition::None,
                Transition::None,
                Transition::EnteredFlexed,
                Transition::None,
                Transition::RepCompleted,
            ]
        );
    }
}
