//! Core types for the posture analysis engine
//!
//! This module defines the data that flows through each stage of a frame's
//! analysis: the incoming pose frame, the exercise catalogue and phase spaces,
//! and the per-frame feedback and per-rep history produced for the client.

use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of landmarks in one pose frame
pub const LANDMARK_COUNT: usize = 33;

/// Anatomical landmark indices of the 33-point pose model
pub mod landmark {
    pub const NOSE: usize = 0;
    pub const LEFT_EAR: usize = 7;
    pub const RIGHT_EAR: usize = 8;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
    pub const LEFT_HEEL: usize = 29;
    pub const RIGHT_HEEL: usize = 30;
    pub const LEFT_FOOT_INDEX: usize = 31;
    pub const RIGHT_FOOT_INDEX: usize = 32;
}

fn default_visibility() -> f64 {
    1.0
}

/// A single tracked body-joint coordinate (image-normalised, y pointing down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Detection confidence (0-1)
    #[serde(default = "default_visibility")]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }
}

/// A validated 33-point pose frame
#[derive(Debug, Clone, PartialEq)]
pub struct PoseFrame {
    landmarks: Vec<Landmark>,
}

impl PoseFrame {
    /// Validate and wrap raw landmarks. Anything but exactly 33 entries is rejected.
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self, AnalysisError> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(AnalysisError::InvalidFrame {
                expected: LANDMARK_COUNT,
                actual: landmarks.len(),
            });
        }
        Ok(Self { landmarks })
    }

    /// Landmark at an index from [`landmark`]
    pub fn get(&self, index: usize) -> &Landmark {
        &self.landmarks[index]
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Mean visibility over a set of landmark indices
    pub fn mean_visibility(&self, indices: &[usize]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        let sum: f64 = indices.iter().map(|&i| self.get(i).visibility).sum();
        (sum / indices.len() as f64).clamp(0.0, 1.0)
    }
}

/// How progress toward the target is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingMode {
    /// Counted in repetitions
    Reps,
    /// Measured in seconds of continuous correct hold
    Hold,
}

/// Supported exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Pushup,
    Squat,
    LegRaise,
    DumbbellCurl,
    OneArmRow,
    Plank,
}

impl ExerciseKind {
    /// Every supported exercise, in catalogue order
    pub const ALL: [ExerciseKind; 6] = [
        ExerciseKind::Pushup,
        ExerciseKind::Squat,
        ExerciseKind::LegRaise,
        ExerciseKind::DumbbellCurl,
        ExerciseKind::OneArmRow,
        ExerciseKind::Plank,
    ];

    /// Korean display name used on the wire
    pub fn korean_name(&self) -> &'static str {
        match self {
            ExerciseKind::Pushup => "푸시업",
            ExerciseKind::Squat => "스쿼트",
            ExerciseKind::LegRaise => "레그레이즈",
            ExerciseKind::DumbbellCurl => "덤벨컬",
            ExerciseKind::OneArmRow => "원암덤벨로우",
            ExerciseKind::Plank => "플랭크",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Pushup => "pushup",
            ExerciseKind::Squat => "squat",
            ExerciseKind::LegRaise => "leg_raise",
            ExerciseKind::DumbbellCurl => "dumbbell_curl",
            ExerciseKind::OneArmRow => "one_arm_row",
            ExerciseKind::Plank => "plank",
        }
    }

    /// Look up an exercise by its exact Korean name
    pub fn from_korean_name(name: &str) -> Result<Self, AnalysisError> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.korean_name() == name)
            .ok_or_else(|| AnalysisError::UnsupportedExercise(name.to_string()))
    }

    /// Korean names of every supported exercise
    pub fn supported_names() -> Vec<String> {
        Self::ALL
            .iter()
            .map(|kind| kind.korean_name().to_string())
            .collect()
    }

    pub fn counting_mode(&self) -> CountingMode {
        match self {
            ExerciseKind::Plank => CountingMode::Hold,
            _ => CountingMode::Reps,
        }
    }

    pub fn is_time_based(&self) -> bool {
        self.counting_mode() == CountingMode::Hold
    }
}

/// Pushup phases (elbow extended = up)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushupPhase {
    Ready,
    Up,
    Down,
}

/// Squat phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquatPhase {
    Standing,
    Down,
}

/// Leg raise phases (legs flat = down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegRaisePhase {
    Ready,
    Down,
    Up,
}

/// Dumbbell curl phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurlPhase {
    Ready,
    Extended,
    Flexed,
}

/// One-arm row phases (arm hanging = down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPhase {
    Ready,
    Down,
    Up,
}

/// Plank phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlankPhase {
    Ready,
    Holding,
}

/// Phase of the exercise currently being tracked, tagged by exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "exercise", content = "phase", rename_all = "snake_case")]
pub enum ExercisePhase {
    Pushup(PushupPhase),
    Squat(SquatPhase),
    LegRaise(LegRaisePhase),
    DumbbellCurl(CurlPhase),
    OneArmRow(RowPhase),
    Plank(PlankPhase),
}

impl ExercisePhase {
    /// Phase a freshly initialised (or reset) session starts in
    pub fn initial(kind: ExerciseKind) -> Self {
        match kind {
            ExerciseKind::Pushup => ExercisePhase::Pushup(PushupPhase::Ready),
            ExerciseKind::Squat => ExercisePhase::Squat(SquatPhase::Standing),
            ExerciseKind::LegRaise => ExercisePhase::LegRaise(LegRaisePhase::Ready),
            ExerciseKind::DumbbellCurl => ExercisePhase::DumbbellCurl(CurlPhase::Ready),
            ExerciseKind::OneArmRow => ExercisePhase::OneArmRow(RowPhase::Ready),
            ExerciseKind::Plank => ExercisePhase::Plank(PlankPhase::Ready),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExercisePhase::Pushup(PushupPhase::Ready)
            | ExercisePhase::LegRaise(LegRaisePhase::Ready)
            | ExercisePhase::DumbbellCurl(CurlPhase::Ready)
            | ExercisePhase::OneArmRow(RowPhase::Ready)
            | ExercisePhase::Plank(PlankPhase::Ready) => "ready",
            ExercisePhase::Pushup(PushupPhase::Up)
            | ExercisePhase::LegRaise(LegRaisePhase::Up)
            | ExercisePhase::OneArmRow(RowPhase::Up) => "up",
            ExercisePhase::Pushup(PushupPhase::Down)
            | ExercisePhase::Squat(SquatPhase::Down)
            | ExercisePhase::LegRaise(LegRaisePhase::Down)
            | ExercisePhase::OneArmRow(RowPhase::Down) => "down",
            ExercisePhase::Squat(SquatPhase::Standing) => "standing",
            ExercisePhase::DumbbellCurl(CurlPhase::Extended) => "extended",
            ExercisePhase::DumbbellCurl(CurlPhase::Flexed) => "flexed",
            ExercisePhase::Plank(PlankPhase::Holding) => "holding",
        }
    }
}

/// Named joint angles (degrees) and ratios computed for one frame
pub type AngleData = BTreeMap<String, f64>;

/// Per-frame verdict on the observed posture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFeedback {
    pub is_correct: bool,
    pub messages: Vec<String>,
    pub angle_data: AngleData,
    /// Mean visibility of the landmarks the rule set relies on (0-1)
    pub confidence: f64,
    /// Soft quality score (0-1)
    pub rep_quality: f64,
}

impl FormFeedback {
    /// Feedback for a frame rejected before form checks (wrong body position or
    /// movement too fast)
    pub fn rejected(message: impl Into<String>, confidence: f64) -> Self {
        Self {
            is_correct: false,
            messages: vec![message.into()],
            angle_data: AngleData::new(),
            confidence,
            rep_quality: 0.0,
        }
    }
}

/// One entry of the rolling form history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormHistoryEntry {
    /// Rep number (1-based) or hold attempt number for hold-based exercises
    pub rep_index: u32,
    pub quality_score: f64,
    pub error_messages: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Session-level digest of the form history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub exercise: String,
    pub rep_count: u32,
    pub hold_time: f64,
    pub average_quality: Option<f64>,
    pub total_entries: usize,
    /// Most frequent corrective messages, most frequent first
    pub common_errors: Vec<String>,
}
