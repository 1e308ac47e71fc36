//! Shared fixtures for the integration tests: synthetic 33-point poses and
//! message builders.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use posture_coach::types::{landmark as lm, Landmark, LANDMARK_COUNT};
use posture_coach::{AnalyzerConfig, ClientMessage, ServerMessage, Session};
use std::sync::Arc;

const UPPER_ARM: f64 = 0.15;
const FOREARM: f64 = 0.14;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 2, 6, 30, 0).unwrap()
}

pub fn at_millis(ms: i64) -> DateTime<Utc> {
    t0() + Duration::milliseconds(ms)
}

/// Session with the default analyzer configuration
pub fn default_session() -> Session {
    Session::new(Arc::new(AnalyzerConfig::default()))
}

/// Session without landmark smoothing, so synthetic angles reach the rules as-is
pub fn unsmoothed_session() -> Session {
    Session::new(Arc::new(AnalyzerConfig {
        smoothing_factor: 0.0,
        ..Default::default()
    }))
}

fn point(x: f64, y: f64) -> Landmark {
    Landmark::new(x, y, 0.0, 0.95)
}

fn skeleton() -> Vec<Landmark> {
    vec![point(0.5, 0.5); LANDMARK_COUNT]
}

/// Upright frontal pose curling with the given elbow angles
pub fn curl_frame(left_deg: f64, right_deg: f64) -> Vec<Landmark> {
    let mut s = skeleton();
    s[lm::NOSE] = point(0.5, 0.15);
    s[lm::LEFT_HIP] = point(0.46, 0.55);
    s[lm::RIGHT_HIP] = point(0.54, 0.55);
    s[lm::LEFT_KNEE] = point(0.46, 0.75);
    s[lm::RIGHT_KNEE] = point(0.54, 0.75);
    s[lm::LEFT_ANKLE] = point(0.46, 0.95);
    s[lm::RIGHT_ANKLE] = point(0.54, 0.95);

    for (shoulder_x, deg, shoulder, elbow, wrist) in [
        (0.45, left_deg, lm::LEFT_SHOULDER, lm::LEFT_ELBOW, lm::LEFT_WRIST),
        (0.55, right_deg, lm::RIGHT_SHOULDER, lm::RIGHT_ELBOW, lm::RIGHT_WRIST),
    ] {
        let (ex, ey) = (shoulder_x, 0.3 + UPPER_ARM);
        let theta = f64::to_radians(deg);
        s[shoulder] = point(shoulder_x, 0.3);
        s[elbow] = point(ex, ey);
        s[wrist] = point(ex + FOREARM * theta.sin(), ey - FOREARM * theta.cos());
    }
    s
}

/// Side-view forearm plank; a `hip_y` of 0.5 is a straight body line
pub fn plank_frame(hip_y: f64) -> Vec<Landmark> {
    let mut s = skeleton();
    s[lm::NOSE] = point(0.22, 0.5);
    for (left, right, x, y) in [
        (lm::LEFT_SHOULDER, lm::RIGHT_SHOULDER, 0.3, 0.5),
        (lm::LEFT_ELBOW, lm::RIGHT_ELBOW, 0.3, 0.62),
        (lm::LEFT_WRIST, lm::RIGHT_WRIST, 0.4, 0.62),
        (lm::LEFT_HIP, lm::RIGHT_HIP, 0.55, hip_y),
        (lm::LEFT_KNEE, lm::RIGHT_KNEE, 0.7, 0.5),
        (lm::LEFT_ANKLE, lm::RIGHT_ANKLE, 0.85, 0.5),
    ] {
        s[left] = point(x, y);
        s[right] = point(x, y);
    }
    s
}

/// Left-arm curl sweep: 170° down to 50° and back up to 150° in 10° steps,
/// each angle repeated `hold` times
pub fn curl_sweep(hold: usize) -> Vec<f64> {
    let down = (5..=17).rev().map(|i| f64::from(i) * 10.0);
    let up = (6..=15).map(|i| f64::from(i) * 10.0);
    down.chain(up)
        .flat_map(|angle| std::iter::repeat(angle).take(hold))
        .collect()
}

pub fn init(exercise: &str, target_reps: Option<i64>, target_time: Option<i64>) -> ClientMessage {
    ClientMessage::Init {
        exercise: exercise.to_string(),
        target_reps,
        target_time,
    }
}

pub fn frame(landmarks: Vec<Landmark>) -> ClientMessage {
    ClientMessage::Landmarks {
        landmarks,
        timestamp: None,
    }
}

pub fn frame_at(landmarks: Vec<Landmark>, timestamp: DateTime<Utc>) -> ClientMessage {
    ClientMessage::Landmarks {
        landmarks,
        timestamp: Some(timestamp),
    }
}

/// Feedback fields of a reply, if it is one
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub is_correct: bool,
    pub rep_count: u32,
    pub hold_time: f64,
    pub is_complete: bool,
    pub messages: Vec<String>,
}

pub fn feedback_of(reply: &ServerMessage) -> Option<Feedback> {
    match reply {
        ServerMessage::Feedback {
            feedback,
            rep_count,
            hold_time,
            is_complete,
        } => Some(Feedback {
            is_correct: feedback.is_correct,
            rep_count: *rep_count,
            hold_time: *hold_time,
            is_complete: *is_complete,
            messages: feedback.messages.clone(),
        }),
        _ => None,
    }
}

/// Every feedback produced by replies
pub fn feedbacks(replies: &[ServerMessage]) -> Vec<Feedback> {
    replies.iter().filter_map(feedback_of).collect()
}
