//! Synthetic pose builders for unit tests
//!
//! Poses are drawn in image coordinates (y down) from a side view with the
//! subject facing +x unless noted otherwise.

use crate::types::{landmark as lm, Landmark, PoseFrame, LANDMARK_COUNT};

const LIMB: f64 = 0.15;

fn p(x: f64, y: f64) -> Landmark {
    Landmark::new(x, y, 0.0, 0.95)
}

/// Mutable 33-point skeleton with every landmark visible
pub struct Skeleton {
    points: Vec<Landmark>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self {
            points: vec![p(0.5, 0.5); LANDMARK_COUNT],
        }
    }

    pub fn set(&mut self, index: usize, x: f64, y: f64) -> &mut Self {
        self.points[index] = p(x, y);
        self
    }

    pub fn pair(&mut self, left: usize, right: usize, x: f64, y: f64) -> &mut Self {
        self.set(left, x, y).set(right, x, y)
    }

    pub fn build(&self) -> PoseFrame {
        PoseFrame::new(self.points.clone()).unwrap()
    }
}

/// Upright standing body shared by the curl pose (frontal view)
fn upright() -> Skeleton {
    let mut s = Skeleton::new();
    s.set(lm::NOSE, 0.5, 0.15)
        .set(lm::LEFT_SHOULDER, 0.45, 0.3)
        .set(lm::RIGHT_SHOULDER, 0.55, 0.3)
        .set(lm::LEFT_HIP, 0.46, 0.55)
        .set(lm::RIGHT_HIP, 0.54, 0.55)
        .set(lm::LEFT_KNEE, 0.46, 0.75)
        .set(lm::RIGHT_KNEE, 0.54, 0.75)
        .set(lm::LEFT_ANKLE, 0.46, 0.95)
        .set(lm::RIGHT_ANKLE, 0.54, 0.95);
    s
}

/// Arm hanging from the shoulder with the forearm raised to `elbow_deg`
fn curl_arm(s: &mut Skeleton, shoulder: (f64, f64), elbow: usize, wrist: usize, elbow_deg: f64) {
    let (sx, sy) = shoulder;
    let (ex, ey) = (sx, sy + LIMB);
    let theta = elbow_deg.to_radians();
    s.set(elbow, ex, ey)
        .set(wrist, ex + 0.14 * theta.sin(), ey - 0.14 * theta.cos());
}

/// Standing curl with the given elbow angles
pub fn curl_pose(left_deg: f64, right_deg: f64) -> PoseFrame {
    let mut s = upright();
    curl_arm(&mut s, (0.45, 0.3), lm::LEFT_ELBOW, lm::LEFT_WRIST, left_deg);
    curl_arm(&mut s, (0.55, 0.3), lm::RIGHT_ELBOW, lm::RIGHT_WRIST, right_deg);
    s.build()
}

/// Forearm plank; `hip_y` of 0.5 is a straight body line
pub fn plank_pose(hip_y: f64) -> PoseFrame {
    let mut s = Skeleton::new();
    s.set(lm::NOSE, 0.22, 0.5)
        .pair(lm::LEFT_EAR, lm::RIGHT_EAR, 0.25, 0.49)
        .pair(lm::LEFT_SHOULDER, lm::RIGHT_SHOULDER, 0.3, 0.5)
        .pair(lm::LEFT_ELBOW, lm::RIGHT_ELBOW, 0.3, 0.62)
        .pair(lm::LEFT_WRIST, lm::RIGHT_WRIST, 0.4, 0.62)
        .pair(lm::LEFT_HIP, lm::RIGHT_HIP, 0.55, hip_y)
        .pair(lm::LEFT_KNEE, lm::RIGHT_KNEE, 0.7, 0.5)
        .pair(lm::LEFT_ANKLE, lm::RIGHT_ANKLE, 0.85, 0.5)
        .pair(lm::LEFT_HEEL, lm::RIGHT_HEEL, 0.87, 0.49)
        .pair(lm::LEFT_FOOT_INDEX, lm::RIGHT_FOOT_INDEX, 0.86, 0.53);
    s.build()
}

/// Pushup with hands under the shoulders; `hip_drop` offsets the hip from the
/// straight shoulder-ankle line (positive sags)
pub fn pushup_pose(elbow_deg: f64, hip_drop: f64) -> PoseFrame {
    let (wx, wy) = (0.3, 0.75);
    let theta = elbow_deg.to_radians();
    let d = (2.0 * LIMB * LIMB * (1.0 - theta.cos())).sqrt();
    let h = (LIMB * LIMB - (d / 2.0).powi(2)).max(0.0).sqrt();
    let (sx, sy) = (wx, wy - d);
    let (ex, ey) = (wx + h, wy - d / 2.0);
    let (ax, ay) = (0.9, 0.72);
    let (hx, hy) = (sx + 0.45 * (ax - sx), sy + 0.45 * (ay - sy) + hip_drop);

    let mut s = Skeleton::new();
    s.set(lm::NOSE, sx - 0.06, sy)
        .pair(lm::LEFT_SHOULDER, lm::RIGHT_SHOULDER, sx, sy)
        .pair(lm::LEFT_ELBOW, lm::RIGHT_ELBOW, ex, ey)
        .pair(lm::LEFT_WRIST, lm::RIGHT_WRIST, wx, wy)
        .pair(lm::LEFT_HIP, lm::RIGHT_HIP, hx, hy)
        .pair(lm::LEFT_KNEE, lm::RIGHT_KNEE, (hx + ax) / 2.0, (hy + ay) / 2.0)
        .pair(lm::LEFT_ANKLE, lm::RIGHT_ANKLE, ax, ay);
    s.build()
}

/// Side-view squat. `shin_share` is the fraction of knee flexion taken by the
/// shin's forward tilt (0.3 keeps the knees behind the toes).
pub fn squat_pose(knee_deg: f64, shin_share: f64) -> PoseFrame {
    let flex = 180.0 - knee_deg;
    let shin = (flex * shin_share).to_radians();
    let thigh = (flex * (1.0 - shin_share)).to_radians();
    let lean = (flex * 0.3).to_radians();

    let (ax, ay) = (0.5, 0.9);
    let (kx, ky) = (ax + 0.2 * shin.sin(), ay - 0.2 * shin.cos());
    let (hx, hy) = (kx - 0.2 * thigh.sin(), ky - 0.2 * thigh.cos());
    let (sx, sy) = (hx + 0.25 * lean.sin(), hy - 0.25 * lean.cos());

    let mut s = Skeleton::new();
    s.set(lm::NOSE, sx + 0.03, sy - 0.08)
        .pair(lm::LEFT_SHOULDER, lm::RIGHT_SHOULDER, sx, sy)
        .pair(lm::LEFT_ELBOW, lm::RIGHT_ELBOW, sx + 0.05, sy + 0.1)
        .pair(lm::LEFT_WRIST, lm::RIGHT_WRIST, sx + 0.15, sy + 0.1)
        .pair(lm::LEFT_HIP, lm::RIGHT_HIP, hx, hy)
        .pair(lm::LEFT_KNEE, lm::RIGHT_KNEE, kx, ky)
        .pair(lm::LEFT_ANKLE, lm::RIGHT_ANKLE, ax, ay)
        .pair(lm::LEFT_HEEL, lm::RIGHT_HEEL, 0.47, 0.92)
        .pair(lm::LEFT_FOOT_INDEX, lm::RIGHT_FOOT_INDEX, 0.58, 0.92);
    s.build()
}

/// Lying supine, head toward -x, legs raised so the hip angle is `hip_deg`
pub fn leg_raise_pose(hip_deg: f64, knee_bend_deg: f64) -> PoseFrame {
    let (hx, hy) = (0.55, 0.7);
    let alpha = (180.0 - hip_deg).to_radians();
    let (kx, ky) = (hx + 0.2 * alpha.cos(), hy - 0.2 * alpha.sin());
    // Shin continues past the knee, bent further up by `knee_bend_deg`
    let beta = alpha + knee_bend_deg.to_radians();
    let (ax, ay) = (kx + 0.2 * beta.cos(), ky - 0.2 * beta.sin());

    let mut s = Skeleton::new();
    s.set(lm::NOSE, 0.18, 0.68)
        .pair(lm::LEFT_SHOULDER, lm::RIGHT_SHOULDER, 0.25, 0.7)
        .pair(lm::LEFT_ELBOW, lm::RIGHT_ELBOW, 0.35, 0.72)
        .pair(lm::LEFT_WRIST, lm::RIGHT_WRIST, 0.45, 0.72)
        .pair(lm::LEFT_HIP, lm::RIGHT_HIP, hx, hy)
        .pair(lm::LEFT_KNEE, lm::RIGHT_KNEE, kx, ky)
        .pair(lm::LEFT_ANKLE, lm::RIGHT_ANKLE, ax, ay);
    s.build()
}

/// Bent-over row: right arm braced straight down, left arm rowing to `left_deg`
pub fn row_pose(left_deg: f64) -> PoseFrame {
    let (sx, sy) = (0.35, 0.4);
    let beta = (180.0 - left_deg).to_radians();
    let (ex, ey) = (sx + LIMB * beta.sin(), sy + LIMB * beta.cos());

    let mut s = Skeleton::new();
    s.set(lm::NOSE, 0.25, 0.38)
        .pair(lm::LEFT_SHOULDER, lm::RIGHT_SHOULDER, sx, sy)
        .set(lm::LEFT_ELBOW, ex, ey)
        .set(lm::LEFT_WRIST, ex, ey + LIMB)
        .set(lm::RIGHT_ELBOW, sx, sy + LIMB)
        .set(lm::RIGHT_WRIST, sx, sy + 2.0 * LIMB)
        .pair(lm::LEFT_HIP, lm::RIGHT_HIP, 0.6, 0.5)
        .pair(lm::LEFT_KNEE, lm::RIGHT_KNEE, 0.58, 0.7)
        .pair(lm::LEFT_ANKLE, lm::RIGHT_ANKLE, 0.6, 0.9);
    s.build()
}
