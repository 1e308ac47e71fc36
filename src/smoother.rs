//! Landmark smoothing and velocity guarding
//!
//! The smoother is an exponential moving average applied independently to each
//! coordinate of each landmark. It suppresses per-frame jitter from the upstream
//! pose model. The velocity guard drops single frames whose tracked angles jump
//! implausibly between consecutive frames (detector glitches).

use crate::types::{AngleData, Landmark, PoseFrame};
use std::collections::HashMap;

/// Default EMA weight of the previous smoothed value
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.7;

/// Default maximum single-frame angle change (degrees)
pub const DEFAULT_VELOCITY_THRESHOLD_DEG: f64 = 30.0;

/// Exponential moving-average filter over whole pose frames
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    alpha: f64,
    previous: Option<PoseFrame>,
}

impl Default for LandmarkSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_FACTOR)
    }
}

impl LandmarkSmoother {
    /// Create a smoother; `alpha` is the weight of the previous value
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            previous: None,
        }
    }

    /// Smooth a frame against the last accepted state without mutating it.
    ///
    /// `smoothed = α·previous + (1-α)·current`. The first frame passes through.
    pub fn smooth(&self, frame: &PoseFrame) -> PoseFrame {
        let Some(previous) = &self.previous else {
            return frame.clone();
        };

        let alpha = self.alpha;
        let landmarks: Vec<Landmark> = previous
            .landmarks()
            .iter()
            .zip(frame.landmarks())
            .map(|(prev, curr)| Landmark {
                x: alpha * prev.x + (1.0 - alpha) * curr.x,
                y: alpha * prev.y + (1.0 - alpha) * curr.y,
                z: alpha * prev.z + (1.0 - alpha) * curr.z,
                visibility: curr.visibility,
            })
            .collect();

        // Both inputs hold exactly 33 landmarks, so the zip does too
        PoseFrame::new(landmarks).unwrap_or_else(|_| frame.clone())
    }

    /// Make `smoothed` the state the next frame is blended against
    pub fn accept(&mut self, smoothed: PoseFrame) {
        self.previous = Some(smoothed);
    }

    /// Smooth and accept in one step
    pub fn update(&mut self, frame: &PoseFrame) -> PoseFrame {
        let smoothed = self.smooth(frame);
        self.accept(smoothed.clone());
        smoothed
    }

    /// Last accepted smoothed frame
    pub fn last(&self) -> Option<&PoseFrame> {
        self.previous.as_ref()
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// A tracked angle that moved too far in a single frame
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityRejection {
    pub angle: String,
    pub delta: f64,
}

/// Rejects frames whose tracked angles jump more than a threshold between
/// consecutive frames.
///
/// The cache is always refreshed with the latest angles, rejected or not, so only
/// single-frame jumps are caught and sustained motion is never locked out.
#[derive(Debug, Clone)]
pub struct VelocityGuard {
    threshold_deg: f64,
    previous: HashMap<String, f64>,
}

impl Default for VelocityGuard {
    fn default() -> Self {
        Self::new(DEFAULT_VELOCITY_THRESHOLD_DEG)
    }
}

impl VelocityGuard {
    pub fn new(threshold_deg: f64) -> Self {
        Self {
            threshold_deg,
            previous: HashMap::new(),
        }
    }

    /// Compare one named angle against its previous value
    pub fn check(&mut self, key: &str, angle: f64) -> Result<(), VelocityRejection> {
        let previous = self.previous.insert(key.to_string(), angle);
        match previous {
            Some(prev) if (angle - prev).abs() > self.threshold_deg => Err(VelocityRejection {
                angle: key.to_string(),
                delta: (angle - prev).abs(),
            }),
            _ => Ok(()),
        }
    }

    /// Check every key present in `angles`; all of them are cached either way.
    /// Returns the first rejection in key order.
    pub fn check_all(&mut self, angles: &AngleData, keys: &[&str]) -> Result<(), VelocityRejection> {
        let mut rejection = None;
        for key in keys {
            if let Some(&value) = angles.get(*key) {
                if let Err(err) = self.check(key, value) {
                    rejection.get_or_insert(err);
                }
            }
        }
        match rejection {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn previous(&self, key: &str) -> Option<f64> {
        self.previous.get(key).copied()
    }

    pub fn reset(&mut self) {
        self.previous.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LANDMARK_COUNT;

    fn uniform_frame(x: f64, y: f64) -> PoseFrame {
        PoseFrame::new(vec![Landmark::new(x, y, 0.0, 0.9); LANDMARK_COUNT]).unwrap()
    }

    #[test]
    fn test_first_frame_passes_through() {
        let smoother = LandmarkSmoother::default();
        let frame = uniform_frame(0.4, 0.6);
        assert_eq!(smoother.smooth(&frame), frame);
    }

    #[test]
    fn test_ema_blend() {
        let mut smoother = LandmarkSmoother::new(0.7);
        smoother.update(&uniform_frame(0.0, 0.0));
        let smoothed = smoother.update(&uniform_frame(1.0, 0.5));

        let lm = smoothed.get(0);
        assert!((lm.x - 0.3).abs() < 1e-9);
        assert!((lm.y - 0.15).abs() < 1e-9);
        assert_eq!(lm.visibility, 0.9);
    }

    #[test]
    fn test_smooth_does_not_mutate() {
        let mut smoother = LandmarkSmoother::new(0.5);
        smoother.update(&uniform_frame(0.0, 0.0));
        let _ = smoother.smooth(&uniform_frame(1.0, 1.0));
        assert_eq!(smoother.last().unwrap().get(5).x, 0.0);
    }

    #[test]
    fn test_zero_alpha_is_passthrough() {
        let mut smoother = LandmarkSmoother::new(0.0);
        smoother.update(&uniform_frame(0.2, 0.2));
        let smoothed = smoother.update(&uniform_frame(0.8, 0.8));
        assert!((smoothed.get(0).x - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_guard_rejects_single_jump() {
        let mut guard = VelocityGuard::new(30.0);
        assert!(guard.check("elbow", 170.0).is_ok());
        assert!(guard.check("elbow", 150.0).is_ok());

        let rejection = guard.check("elbow", 100.0).unwrap_err();
        assert_eq!(rejection.angle, "elbow");
        assert!((rejection.delta - 50.0).abs() < 1e-9);

        // Compared against the rejected value, not the stale one
        assert!(guard.check("elbow", 90.0).is_ok());
    }

    #[test]
    fn test_velocity_guard_caches_all_keys() {
        let mut guard = VelocityGuard::new(30.0);
        let mut angles = AngleData::new();
        angles.insert("left_elbow".to_string(), 170.0);
        angles.insert("right_elbow".to_string(), 170.0);
        assert!(guard.check_all(&angles, &["left_elbow", "right_elbow"]).is_ok());

        angles.insert("left_elbow".to_string(), 100.0);
        angles.insert("right_elbow".to_string(), 165.0);
        let rejection = guard
            .check_all(&angles, &["left_elbow", "right_elbow"])
            .unwrap_err();
        assert_eq!(rejection.angle, "left_elbow");
        assert_eq!(guard.previous("right_elbow"), Some(165.0));
        assert_eq!(guard.previous("left_elbow"), Some(100.0));
    }

    #[test]
    fn test_velocity_guard_reset() {
        let mut guard = VelocityGuard::default();
        guard.check("knee", 170.0).unwrap();
        guard.reset();
        assert!(guard.check("knee", 60.0).is_ok());
    }
}
