//! Uniform Catmull-Rom evaluation over four control points.

use glam::Vec2;
use warren_core::Waypoint;

pub(crate) fn to_vec(point: Waypoint) -> Vec2 {
    Vec2::new(point.x, point.y)
}

pub(crate) fn to_waypoint(point: Vec2) -> Waypoint {
    Waypoint::new(point.x, point.y)
}

/// Point at parameter `t` on the curve between `p1` and `p2`.
pub(crate) fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// Length of the curve between `p1` and `p2`, measured as a polyline of `samples` chords.
pub(crate) fn arc_length(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, samples: u32) -> f32 {
    let samples = samples.max(1);
    let mut previous = p1;
    let mut total = 0.0;
    for step in 1..=samples {
        let point = catmull_rom(p0, p1, p2, p3, step as f32 / samples as f32);
        total += previous.distance(point);
        previous = point;
    }
    total
}
