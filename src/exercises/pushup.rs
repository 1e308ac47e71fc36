//! Pushup rules
//!
//! Tracks the mean elbow angle (up = extended, down = flexed) and checks the
//! shoulder-hip-ankle line. Width ratios are only meaningful when the camera sees
//! the shoulders apart, so they are skipped in a pure side view.

use super::{angle_of, ExerciseRules, PhaseStep, QualityWeights, SetupGuide};
use crate::counter::{advance_cycle, RepThresholds, Transition};
use crate::geometry::{angle, distance, inclination_from_horizontal, midpoint, offset_from_line};
use crate::types::{landmark as lm, AngleData, ExerciseKind, ExercisePhase, PoseFrame};

pub const THRESHOLDS: RepThresholds = RepThresholds {
    extend_above: 160.0,
    flex_below: 90.0,
    return_above: 150.0,
};

/// Maximum body-line inclination from horizontal for a pushup position
const MAX_BODY_INCLINATION_DEG: f64 = 45.0;
/// Allowed deviation of the shoulder-hip-ankle angle from a straight line
const MAX_ALIGNMENT_DEVIATION_DEG: f64 = 20.0;
/// Below this shoulder width (normalised) the view is treated as side-on
const MIN_FRONTAL_SHOULDER_WIDTH: f64 = 0.05;
const MAX_ELBOW_FLARE_RATIO: f64 = 1.6;
const MIN_HAND_WIDTH_RATIO: f64 = 0.8;
const MAX_HAND_WIDTH_RATIO: f64 = 2.2;

const KEY_LANDMARKS: &[usize] = &[
    lm::LEFT_SHOULDER,
    lm::RIGHT_SHOULDER,
    lm::LEFT_ELBOW,
    lm::RIGHT_ELBOW,
    lm::LEFT_WRIST,
    lm::RIGHT_WRIST,
    lm::LEFT_HIP,
    lm::RIGHT_HIP,
    lm::LEFT_ANKLE,
    lm::RIGHT_ANKLE,
];

pub struct PushupRules;

impl ExerciseRules for PushupRules {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Pushup
    }

    fn key_landmarks(&self) -> &'static [usize] {
        KEY_LANDMARKS
    }

    fn guarded_angles(&self) -> &'static [&'static str] {
        &["elbow"]
    }

    fn quality_weights(&self) -> QualityWeights {
        QualityWeights {
            step: 0.15,
            floor: 0.3,
        }
    }

    fn setup_guide(&self) -> SetupGuide {
        SetupGuide {
            camera_guide: "카메라를 몸 옆쪽 바닥 높이에 두고 머리부터 발끝까지 모두 보이게 해주세요".to_string(),
            pose_guide: "손을 어깨 바로 아래에 두고 팔을 편 상태에서 머리부터 발뒤꿈치까지 일직선을 만드세요".to_string(),
        }
    }

    fn validate_position(&self, frame: &PoseFrame) -> Result<(), String> {
        let shoulders = midpoint(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
        let ankles = midpoint(frame.get(lm::LEFT_ANKLE), frame.get(lm::RIGHT_ANKLE));
        if inclination_from_horizontal(&shoulders, &ankles) > MAX_BODY_INCLINATION_DEG {
            return Err("몸을 바닥과 수평에 가깝게 하고 푸시업 자세를 잡아주세요".to_string());
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
        let shoulders = midpoint(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
        let hips = midpoint(frame.get(lm::LEFT_HIP), frame.get(lm::RIGHT_HIP));
        let ankles = midpoint(frame.get(lm::LEFT_ANKLE), frame.get(lm::RIGHT_ANKLE));

        let mut angles = AngleData::new();
        angles.insert("left_elbow".to_string(), left_elbow);
        angles.insert("right_elbow".to_string(), right_elbow);
        angles.insert("elbow".to_string(), (left_elbow + right_elbow) / 2.0);
        angles.insert("body_alignment".to_string(), angle(&shoulders, &hips, &ankles));

        let shoulder_width = distance(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
        if shoulder_width > MIN_FRONTAL_SHOULDER_WIDTH {
            let elbow_width = distance(frame.get(lm::LEFT_ELBOW), frame.get(lm::RIGHT_ELBOW));
            let hand_width = distance(frame.get(lm::LEFT_WRIST), frame.get(lm::RIGHT_WRIST));
            angles.insert("elbow_flare_ratio".to_string(), elbow_width / shoulder_width);
            angles.insert("hand_width_ratio".to_string(), hand_width / shoulder_width);
        }
        angles
    }

    fn check_form(&self, frame: &PoseFrame, angles: &AngleData) -> Vec<String> {
        let mut messages = Vec::new();

        let alignment = angle_of(angles, "body_alignment");
        if (180.0 - alignment) > MAX_ALIGNMENT_DEVIATION_DEG {
            let shoulders = midpoint(frame.get(lm::LEFT_SHOULDER), frame.get(lm::RIGHT_SHOULDER));
            let hips = midpoint(frame.get(lm::LEFT_HIP), frame.get(lm::RIGHT_HIP));
            let ankles = midpoint(frame.get(lm::LEFT_ANKLE), frame.get(lm::RIGHT_ANKLE));
            if offset_from_line(&shoulders, &ankles, &hips) > 0.0 {
                messages.push("엉덩이가 처졌습니다. 복부에 힘을 주고 몸을 일직선으로 유지하세요".to_string());
            } else {
                messages.push("엉덩이가 너무 높습니다. 엉덩이를 낮춰 몸을 일직선으로 만드세요".to_string());
            }
        }

        if let Some(&flare) = angles.get("elbow_flare_ratio") {
            if flare > MAX_ELBOW_FLARE_RATIO && angle_of(angles, "elbow") < THRESHOLDS.extend_above {
                messages.push("팔꿈치가 너무 벌어졌습니다. 몸통 쪽으로 모아주세요".to_string());
            }
        }

        if let Some(&hands) = angles.get("hand_width_ratio") {
            if hands < MIN_HAND_WIDTH_RATIO {
                messages.push("손 간격이 너무 좁습니다. 어깨너비보다 조금 넓게 짚어주세요".to_string());
            } else if hands > MAX_HAND_WIDTH_RATIO {
                messages.push("손 간격이 너무 넓습니다. 어깨너비보다 조금 넓은 정도로 좁혀주세요".to_string());
            }
        }

        messages
    }

    fn advance_phase(&self, phase: ExercisePhase, angles: &AngleData) -> PhaseStep {
        match phase {
            ExercisePhase::Pushup(current) => {
                let (next, transition) = advance_cycle(current, angle_of(angles, "elbow"), &THRESHOLDS);
                PhaseStep {
                    phase: ExercisePhase::Pushup(next),
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
