//! Plank rules
//!
//! Plank is hold-based: the rule set only judges form, and the analyzer's hold
//! timer turns consecutive correct frames into hold time.

use super::{angle_of, ExerciseRules, PhaseStep, QualityWeights, SetupGuide};
use crate::counter::Transition;
use crate::geometry::{angle, distance, inclination_from_horizontal, midpoint, offset_from_line};
use crate::types::{landmark as lm, AngleData, ExerciseKind, ExercisePhase, PoseFrame};

const MAX_BODY_INCLINATION_DEG: f64 = 35.0;
const MAX_ALIGNMENT_DEVIATION_DEG: f64 = 15.0;
/// Nose below the shoulders by more than this (normalised y)
const MAX_HEAD_DROP: f64 = 0.08;
/// Horizontal shoulder-elbow offset as a fraction of torso length
const MAX_SHOULDER_OFFSET_RATIO: f64 = 0.35;

const KEY_LANDMARKS: &[usize] = &[
    lm::NOSE,
    lm::LEFT_SHOULDER,
    lm::RIGHT_SHOULDER,
    lm::LEFT_ELBOW,
    lm::RIGHT_ELBOW,
    lm::LEFT_HIP,
    lm::RIGHT_HIP,
    lm::LEFT_ANKLE,
    lm::RIGHT_ANKLE,
];

pub struct PlankRules;

impl ExerciseRules for PlankRules {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Plank
    }

    fn key_landmarks(&self) -> &'static [usize] {
        KEY_LANDMARKS
    }

    fn guarded_angles(&self) -> &'static [&'static str] {
        &["body_alignment"]
    }

    fn quality_weights(&self) -> QualityWeights {
        QualityWeights {
            step: 0.15,
            floor: 0.2,
        }
    }

    fn setup_guide(&self) -> SetupGuide {
        SetupGuide {
            camera_guide: "카메라를 바닥 높이 옆쪽에 두고 머리부터 발끝까지 모두 보이게 해주세요".to_string(),
            pose_guide: "팔꿈치를 어깨 바로 아래에 두고 엎드려 머리부터 발뒤꿈치까지 일직선을 유지하세요".to_string(),
        }
    }

    fn validate_position(&self, frame: &PoseFrame) -> Result<(), String> {
        let shoulders = midpoint(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
        let ankles = midpoint(frame.get(lm::LEFT_ANKLE), frame.get(lm::RIGHT_ANKLE));
        if inclination_from_horizontal(&shoulders, &ankles) > MAX_BODY_INCLINATION_DEG {
            return Err("엎드려서 플랭크 자세를 잡아주세요".to_string());
        }
        Ok(())
    }

    fn compute_angles(&self, frame: &PoseFrame) -> AngleData {
        let shoulders = midpoint(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
        let elbows = midpoint(frame.get(lm::LEFT_ELBOW), frame.get(lm::RIGHT_ELBOW));
        let hips = midpoint(frame.get(lm::LEFT_HIP), frame.get(lm::RIGHT_HIP));
        let ankles = midpoint(frame.get(lm::LEFT_ANKLE), frame.get(lm::RIGHT_ANKLE));

        let mut angles = AngleData::new();
        angles.insert("body_alignment".to_string(), angle(&shoulders, &hips, &ankles));
        angles.insert("hip_offset".to_string(), offset_from_line(&shoulders, &ankles, &hips));
        angles.insert("head_drop".to_string(), frame.get(lm::NOSE).y - shoulders.y);

        let torso = distance(&shoulders, &hips);
        if torso > f64::EPSILON {
            angles.insert(
                "shoulder_offset_ratio".to_string(),
                (shoulders.x - elbows.x).abs() / torso,
            );
        }
        angles
    }

    fn check_form(&self, _frame: &PoseFrame, angles: &AngleData) -> Vec<String> {
        let mut messages = Vec::new();

        if (180.0 - angle_of(angles, "body_alignment")) > MAX_ALIGNMENT_DEVIATION_DEG {
            if angle_of(angles, "hip_offset") > 0.0 {
                messages.push("허리가 처졌습니다. 복부와 엉덩이에 힘을 주세요".to_string());
            } else {
                messages.push("엉덩이가 너무 높습니다. 몸을 일직선으로 낮춰주세요".to_string());
            }
        }
        if angle_of(angles, "head_drop") > MAX_HEAD_DROP {
            messages.push("고개가 떨어졌습니다. 시선은 바닥을 보되 목을 곧게 유지하세요".to_string());
        }
        if angle_of(angles, "shoulder_offset_ratio") > MAX_SHOULDER_OFFSET_RATIO {
            messages.push("어깨를 팔꿈치 바로 위에 두세요".to_string());
        }

        messages
    }

    fn advance_phase(&self, phase: ExercisePhase, _angles: &AngleData) -> PhaseStep {
        PhaseStep {
            phase,
            transition: Transition::None,
        }
    }

    fn rep_message(&self, _rep_count: u32) -> String {
        "좋아요! 자세를 유지하세요".to_string()
    }
}
