//! JSON message protocol
//!
//! Every message is a JSON object with a `type` discriminator. Field names are
//! camelCase on the wire.

use crate::error::AnalysisError;
use crate::types::{ExerciseKind, FormFeedback, FormSummary, Landmark};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client → server messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Select the exercise and target, resetting all counters
    Init {
        /// Korean exercise name
        exercise: String,
        #[serde(rename = "targetReps", default, skip_serializing_if = "Option::is_none")]
        target_reps: Option<i64>,
        #[serde(rename = "targetTime", default, skip_serializing_if = "Option::is_none")]
        target_time: Option<i64>,
    },
    /// One pose frame
    Landmarks {
        landmarks: Vec<Landmark>,
        /// Capture time of the frame; the receive time is used when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    /// Zero counters and timers, keeping the exercise
    Reset,
    /// Request the session's form summary
    Summary,
}

impl ClientMessage {
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Server → client messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    InitSuccess {
        exercise: String,
        /// Rep target, or null for the hold-based exercise
        #[serde(rename = "targetReps")]
        target_reps: Option<u32>,
        /// Hold target in seconds, or null for rep-based exercises
        #[serde(rename = "targetTime")]
        target_time: Option<u32>,
        #[serde(rename = "isTimeBased")]
        is_time_based: bool,
        #[serde(rename = "cameraGuide")]
        camera_guide: String,
        #[serde(rename = "poseGuide")]
        pose_guide: String,
    },
    Feedback {
        feedback: FormFeedback,
        #[serde(rename = "repCount")]
        rep_count: u32,
        #[serde(rename = "holdTime")]
        hold_time: f64,
        #[serde(rename = "isComplete")]
        is_complete: bool,
    },
    Status {
        message: String,
    },
    Error {
        message: String,
        /// Machine-readable code from [`AnalysisError::code`]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(
            rename = "supportedExercises",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        supported_exercises: Option<Vec<String>>,
    },
    Summary {
        summary: FormSummary,
    },
}

impl ServerMessage {
    pub fn status(message: impl Into<String>) -> Self {
        ServerMessage::Status {
            message: message.into(),
        }
    }

    /// Error reply for a failed request. Errors about exercise selection carry
    /// the list of supported exercise names.
    pub fn error(err: &AnalysisError) -> Self {
        let supported_exercises = match err {
            AnalysisError::UnsupportedExercise(_) | AnalysisError::NotInitialized => {
                Some(ExerciseKind::supported_names())
            }
            _ => None,
        };
        ServerMessage::Error {
            message: err.to_string(),
            code: Some(err.code().to_string()),
            supported_exercises,
        }
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AngleData;
    use serde_json::json;

    #[test]
    fn test_parse_init() {
        let msg = ClientMessage::from_json(r#"{"type":"init","exercise":"덤벨컬","targetReps":12}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Init {
                exercise: "덤벨컬".to_string(),
                target_reps: Some(12),
                target_time: None,
            }
        );
    }

    #[test]
    fn test_parse_landmarks_with_timestamp() {
        let msg = ClientMessage::from_json(
            r#"{"type":"landmarks","landmarks":[{"x":0.1,"y":0.2,"z":0.0,"visibility":0.9}],"timestamp":"2024-01-15T10:00:00Z"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Landmarks { landmarks, timestamp } => {
                assert_eq!(landmarks.len(), 1);
                assert!(timestamp.is_some());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_parse_unit_messages() {
        assert_eq!(ClientMessage::from_json(r#"{"type":"reset"}"#).unwrap(), ClientMessage::Reset);
        assert_eq!(ClientMessage::from_json(r#"{"type":"summary"}"#).unwrap(), ClientMessage::Summary);
        assert!(ClientMessage::from_json(r#"{"type":"dance"}"#).is_err());
    }

    #[test]
    fn test_feedback_wire_format() {
        let msg = ServerMessage::Feedback {
            feedback: FormFeedback {
                is_correct: true,
                messages: vec![],
                angle_data: AngleData::from([("knee".to_string(), 172.5)]),
                confidence: 0.9,
                rep_quality: 1.0,
            },
            rep_count: 3,
            hold_time: 0.0,
            is_complete: false,
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "feedback");
        assert_eq!(value["repCount"], 3);
        assert_eq!(value["isComplete"], false);
        assert_eq!(value["feedback"]["angleData"]["knee"], 172.5);
    }

    #[test]
    fn test_init_success_wire_format() {
        let msg = ServerMessage::InitSuccess {
            exercise: "플랭크".to_string(),
            target_reps: None,
            target_time: Some(30),
            is_time_based: true,
            camera_guide: "c".to_string(),
            pose_guide: "p".to_string(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "init_success",
                "exercise": "플랭크",
                "targetReps": null,
                "targetTime": 30,
                "isTimeBased": true,
                "cameraGuide": "c",
                "poseGuide": "p"
            })
        );
    }

    #[test]
    fn test_unsupported_exercise_error_lists_names() {
        let msg = ServerMessage::error(&AnalysisError::UnsupportedExercise("없는운동".to_string()));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["code"], "UNSUPPORTED_EXERCISE");
        assert_eq!(value["supportedExercises"].as_array().unwrap().len(), 6);

        let msg = ServerMessage::error(&AnalysisError::InvalidFrame {
            expected: 33,
            actual: 32,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("supportedExercises").is_none());
    }
}
