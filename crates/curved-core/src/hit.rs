//! Hit testing: pointer position → curve points, tangent handles, curves.
//!
//! All tests work in curve (data) space. Tolerances arrive as per-axis
//! extents because a square pixel tolerance maps to a rectangle in data
//! space whenever the screen scale is not uniform.

use crate::curve::{Curve, SplinePoint};
use kurbo::{Point, Vec2};

/// Per-axis box test: `true` when `candidate` lies within `extents` of
/// `position` on both axes.
pub fn hit_position(position: Point, candidate: Point, extents: Vec2) -> bool {
    let delta = position - candidate;
    delta.x.abs() <= extents.x && delta.y.abs() <= extents.y
}

/// Test `position` against both tangent handles of `point`.
///
/// Handles are drawn `tangent_length` pixels away from the point, so the
/// tangent is normalized in screen space (via `screen_scale`, pixels per
/// data unit) and converted back to data space before testing.
pub fn hit_tangent(
    position: Point,
    point: &SplinePoint,
    extents: Vec2,
    screen_scale: Vec2,
    tangent_length: f64,
) -> bool {
    let screen = Vec2::new(point.tx * screen_scale.x, point.ty * screen_scale.y);
    let length = screen.hypot();
    if length == 0.0 || screen_scale.x == 0.0 || screen_scale.y == 0.0 {
        return false;
    }
    let screen = screen * (tangent_length / length);
    let tangent = Vec2::new(screen.x / screen_scale.x, screen.y / screen_scale.y);
    let origin = point.position();
    hit_position(position, origin + tangent, extents)
        || hit_position(position, origin - tangent, extents)
}

/// Collect every `(curve_index, point_index)` whose point lies inside the
/// axis-aligned box `[min, max]` (inclusive).
pub fn find_points(curves: &[Curve], min: Point, max: Point) -> Vec<(usize, usize)> {
    let mut result = Vec::new();
    for (i, curve) in curves.iter().enumerate() {
        for (j, p) in curve.points().iter().enumerate() {
            if min.x <= p.x && p.x <= max.x && min.y <= p.y && p.y <= max.y {
                result.push((i, j));
            }
        }
    }
    result
}

/// Find the curve passing closest to `origin` within the box `[min, max]`.
///
/// Each curve is approximated by the straight segment between its values at
/// `min.x` and `max.x`; `origin` is projected onto that segment and the curve
/// counts as hit when the projection lies within `extents` of `origin`.
/// Among hit curves the one with the smallest residual distance wins.
///
/// NOTE: only valid for small boxes. Over a wide box a strongly bent curve
/// departs from its chord and may be missed or misjudged.
pub fn find_closest_curve(
    curves: &[Curve],
    min: Point,
    max: Point,
    origin: Point,
    extents: Vec2,
) -> Option<usize> {
    let mut closest: Option<(usize, f64)> = None;
    for (i, curve) in curves.iter().enumerate() {
        let p0 = Point::new(min.x, curve.evaluate(min.x));
        let p1 = Point::new(max.x, curve.evaluate(max.x));
        let delta = p1 - p0;
        let length = delta.hypot();
        let projected = if length > 0.0 {
            let dir = delta / length;
            let t = (origin - p0).dot(dir).clamp(0.0, length);
            p0 + dir * t
        } else {
            p0
        };
        if !hit_position(origin, projected, extents) {
            continue;
        }
        let distance = projected.distance(origin);
        if closest.is_none_or(|(_, best)| distance < best) {
            closest = Some((i, distance));
        }
    }
    closest.map(|(i, _)| i)
}
