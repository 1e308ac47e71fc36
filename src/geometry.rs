//! Geometry primitives over pose landmarks
//!
//! Angles are in degrees. The planar variants use image x/y only, which is what
//! the rule sets rely on since the depth estimate of single-camera pose models is
//! much noisier than the image-plane coordinates.

use crate::types::Landmark;

const EPSILON: f64 = 1e-9;

/// Angle at vertex `b` formed by the rays `b→a` and `b→c`, in `[0, 180]`.
///
/// Degenerate input (a ray of zero length) yields `0.0`.
pub fn angle(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    angle_between([a.x - b.x, a.y - b.y, 0.0], [c.x - b.x, c.y - b.y, 0.0])
}

/// Same as [`angle`] but using all three coordinates
pub fn angle_3d(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    angle_between(
        [a.x - b.x, a.y - b.y, a.z - b.z],
        [c.x - b.x, c.y - b.y, c.z - b.z],
    )
}

fn angle_between(u: [f64; 3], v: [f64; 3]) -> f64 {
    let dot = u[0] * v[0] + u[1] * v[1] + u[2] * v[2];
    let norm_u = (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]).sqrt();
    let norm_v = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if norm_u < EPSILON || norm_v < EPSILON {
        return 0.0;
    }
    // Clamp before acos: floating drift can push collinear cosines past ±1
    let cosine = (dot / (norm_u * norm_v)).clamp(-1.0, 1.0);
    cosine.acos().to_degrees()
}

/// Planar Euclidean distance
pub fn distance(a: &Landmark, b: &Landmark) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Euclidean distance using all three coordinates
pub fn distance_3d(a: &Landmark, b: &Landmark) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2) + (a.z - b.z).powi(2)).sqrt()
}

/// Midpoint of two landmarks; visibility is the lower of the two
pub fn midpoint(a: &Landmark, b: &Landmark) -> Landmark {
    Landmark {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
        z: (a.z + b.z) / 2.0,
        visibility: a.visibility.min(b.visibility),
    }
}

/// Angle of the segment `a→b` from the vertical axis, in `[0, 90]`
pub fn inclination_from_vertical(a: &Landmark, b: &Landmark) -> f64 {
    let dx = (b.x - a.x).abs();
    let dy = (b.y - a.y).abs();
    if dx < EPSILON && dy < EPSILON {
        return 0.0;
    }
    dx.atan2(dy).to_degrees()
}

/// Angle of the segment `a→b` from the horizontal axis, in `[0, 90]`
pub fn inclination_from_horizontal(a: &Landmark, b: &Landmark) -> f64 {
    let dx = (b.x - a.x).abs();
    let dy = (b.y - a.y).abs();
    if dx < EPSILON && dy < EPSILON {
        return 0.0;
    }
    dy.atan2(dx).to_degrees()
}

/// Signed vertical offset of `p` from the line through `a` and `b`, evaluated at
/// `p.x`. Positive means `p` lies below the line in image space.
pub fn offset_from_line(a: &Landmark, b: &Landmark, p: &Landmark) -> f64 {
    let dx = b.x - a.x;
    if dx.abs() < EPSILON {
        return 0.0;
    }
    let t = (p.x - a.x) / dx;
    let line_y = a.y + t * (b.y - a.y);
    p.y - line_y
}
