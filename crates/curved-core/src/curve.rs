//! Piecewise-cubic Hermite curve over the normalized domain `[0, 1]`.
//!
//! A `Curve` is a value: every edit returns a new curve and leaves the
//! receiver untouched. Edits that would break the ordering or spacing
//! invariants are rejected by returning an unchanged copy, which callers
//! detect by comparing point counts (or values) before and after.
//!
//! Invariants held by every `Curve`:
//!
//! - every point has `x ∈ [0, 1]`
//! - points are sorted ascending by `x`
//! - neighbouring points are at least [`MIN_POINT_X_DISTANCE`] apart in `x`

use kurbo::{Point, Vec2};
use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum x-distance between two neighbouring points. Also the tolerance
/// used when looking for an existing point at a given `x`.
pub const MIN_POINT_X_DISTANCE: f64 = 0.01;

/// A curve never drops below this many points through `remove_point`.
pub const MIN_POINT_COUNT: usize = 2;

/// Slopes are clamped to this magnitude so vertical tangents stay finite.
const MAX_SLOPE: f64 = 1.0e3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("point index {index} is out of bounds (len: {len})")]
    PointIndex { index: usize, len: usize },
    #[error("point {index} has x = {x}, outside [0, 1]")]
    OutOfDomain { index: usize, x: f64 },
    #[error("point {index} is out of order or too close to its predecessor")]
    Spacing { index: usize },
}

// ─── Spline point ────────────────────────────────────────────────────────

/// A control point: position `(x, y)` and tangent direction `(tx, ty)`.
/// The tangent is not required to be unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplinePoint {
    pub x: f64,
    pub y: f64,
    pub tx: f64,
    pub ty: f64,
}

impl SplinePoint {
    pub const fn new(x: f64, y: f64, tx: f64, ty: f64) -> Self {
        Self { x, y, tx, ty }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn tangent(&self) -> Vec2 {
        Vec2::new(self.tx, self.ty)
    }

    /// dy/dx described by the tangent.
    pub fn slope(&self) -> f64 {
        if self.tx.abs() < f64::EPSILON {
            if self.ty == 0.0 {
                0.0
            } else {
                self.ty.signum() * MAX_SLOPE
            }
        } else {
            (self.ty / self.tx).clamp(-MAX_SLOPE, MAX_SLOPE)
        }
    }
}

// ─── Curve ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SplinePoint>", into = "Vec<SplinePoint>")]
pub struct Curve {
    points: Vec<SplinePoint>,
}

impl Curve {
    /// Build a curve from points, validating domain, order and spacing.
    pub fn new(points: Vec<SplinePoint>) -> Result<Self, CurveError> {
        for (index, p) in points.iter().enumerate() {
            if !(0.0..=1.0).contains(&p.x) {
                return Err(CurveError::OutOfDomain { index, x: p.x });
            }
        }
        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].x - pair[0].x < MIN_POINT_X_DISTANCE - f64::EPSILON {
                return Err(CurveError::Spacing { index: index + 1 });
            }
        }
        Ok(Self { points })
    }

    /// Straight line from `(0, y0)` to `(1, y1)`.
    pub fn linear(y0: f64, y1: f64) -> Self {
        let t = unit_tangent(y1 - y0);
        Self {
            points: vec![
                SplinePoint::new(0.0, y0, t.x, t.y),
                SplinePoint::new(1.0, y1, t.x, t.y),
            ],
        }
    }

    /// Flat line at `y` across the whole domain.
    pub fn constant(y: f64) -> Self {
        Self::linear(y, y)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SplinePoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Result<&SplinePoint, CurveError> {
        self.points.get(index).ok_or(CurveError::PointIndex {
            index,
            len: self.points.len(),
        })
    }

    /// Index of the point whose `x` lies within `MIN_POINT_X_DISTANCE` of
    /// `x` (clamped to the domain), if any.
    pub fn find_point(&self, x: f64) -> Option<usize> {
        let x = x.clamp(0.0, 1.0);
        self.points
            .iter()
            .position(|p| (p.x - x).abs() < MIN_POINT_X_DISTANCE)
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    /// Insert a point at `(x, y)`. The tangent follows the current slope of
    /// the curve at `x`. Rejected (unchanged copy) when another point is
    /// closer than `MIN_POINT_X_DISTANCE`, or when `x` or `y` is not finite.
    pub fn insert_point(&self, x: f64, y: f64) -> Curve {
        if !(x.is_finite() && y.is_finite()) {
            trace!("insert at ({x}, {y}) rejected: not finite");
            return self.clone();
        }
        let x = x.clamp(0.0, 1.0);
        if let Some(existing) = self.find_point(x) {
            trace!("insert at x = {x} rejected: point {existing} is too close");
            return self.clone();
        }
        let t = if self.points.len() >= 2 {
            unit_tangent(self.slope_at(x))
        } else {
            Vec2::new(1.0, 0.0)
        };
        let index = self.points.partition_point(|p| p.x < x);
        let mut points = self.points.clone();
        points.insert(index, SplinePoint::new(x, y, t.x, t.y));
        Curve { points }
    }

    /// Remove point `index`. The first and last points frame the domain and
    /// are never removed, and the curve keeps at least `MIN_POINT_COUNT`
    /// points; such removals return an unchanged copy.
    pub fn remove_point(&self, index: usize) -> Result<Curve, CurveError> {
        self.point(index)?;
        let len = self.points.len();
        if len <= MIN_POINT_COUNT || index == 0 || index == len - 1 {
            trace!("point {index} of {len} is protected from removal");
            return Ok(self.clone());
        }
        let mut points = self.points.clone();
        points.remove(index);
        Ok(Curve { points })
    }

    /// Move point `index` to `(x, y)`. `x` is clamped between the neighbours
    /// (keeping the minimum spacing); the first and last points keep their `x`.
    /// Non-finite coordinates leave the curve unchanged.
    pub fn set_position(&self, index: usize, x: f64, y: f64) -> Result<Curve, CurveError> {
        let current = *self.point(index)?;
        if !(x.is_finite() && y.is_finite()) {
            return Ok(self.clone());
        }
        let last = self.points.len() - 1;
        let x = if index == 0 || index == last {
            current.x
        } else {
            let lower = self.points[index - 1].x + MIN_POINT_X_DISTANCE;
            let upper = self.points[index + 1].x - MIN_POINT_X_DISTANCE;
            if lower > upper {
                return Ok(self.clone());
            }
            x.clamp(lower, upper)
        };
        let mut points = self.points.clone();
        points[index] = SplinePoint { x, y, ..current };
        Ok(Curve { points })
    }

    pub fn set_tangent(&self, index: usize, tx: f64, ty: f64) -> Result<Curve, CurveError> {
        let current = *self.point(index)?;
        if !(tx.is_finite() && ty.is_finite()) {
            return Ok(self.clone());
        }
        let mut points = self.points.clone();
        points[index] = SplinePoint { tx, ty, ..current };
        Ok(Curve { points })
    }

    // ─── Evaluation ──────────────────────────────────────────────────────

    /// Hermite-interpolated value at `x`. Outside the covered range the
    /// curve is extended flat from its first/last point.
    pub fn evaluate(&self, x: f64) -> f64 {
        match self.segment_at(x) {
            Segment::Empty => 0.0,
            Segment::Clamped(p) => p.y,
            Segment::Inner { p0, p1, t } => {
                let dx = p1.x - p0.x;
                let t2 = t * t;
                let t3 = t2 * t;
                let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
                let h10 = t3 - 2.0 * t2 + t;
                let h01 = -2.0 * t3 + 3.0 * t2;
                let h11 = t3 - t2;
                h00 * p0.y + h10 * dx * p0.slope() + h01 * p1.y + h11 * dx * p1.slope()
            }
        }
    }

    /// Derivative dy/dx at `x`.
    pub fn slope_at(&self, x: f64) -> f64 {
        match self.segment_at(x) {
            Segment::Empty => 0.0,
            Segment::Clamped(p) => p.slope(),
            Segment::Inner { p0, p1, t } => {
                let dx = p1.x - p0.x;
                let t2 = t * t;
                let d00 = 6.0 * t2 - 6.0 * t;
                let d10 = 3.0 * t2 - 4.0 * t + 1.0;
                let d01 = -6.0 * t2 + 6.0 * t;
                let d11 = 3.0 * t2 - 2.0 * t;
                (d00 * p0.y + d01 * p1.y) / dx + d10 * p0.slope() + d11 * p1.slope()
            }
        }
    }

    fn segment_at(&self, x: f64) -> Segment {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return Segment::Empty;
        };
        if x <= first.x {
            return Segment::Clamped(*first);
        }
        if x >= last.x {
            return Segment::Clamped(*last);
        }
        // first.x < x < last.x, so 1 <= i <= len - 1
        let i = self.points.partition_point(|p| p.x <= x);
        let p0 = self.points[i - 1];
        let p1 = self.points[i];
        let t = (x - p0.x) / (p1.x - p0.x);
        Segment::Inner { p0, p1, t }
    }
}

enum Segment {
    Empty,
    Clamped(SplinePoint),
    Inner {
        p0: SplinePoint,
        p1: SplinePoint,
        t: f64,
    },
}

/// Unit tangent for a slope.
fn unit_tangent(slope: f64) -> Vec2 {
    let v = Vec2::new(1.0, slope);
    v / v.hypot()
}

impl TryFrom<Vec<SplinePoint>> for Curve {
    type Error = CurveError;

    fn try_from(points: Vec<SplinePoint>) -> Result<Self, Self::Error> {
        Curve::new(points)
    }
}

impl From<Curve> for Vec<SplinePoint> {
    fn from(curve: Curve) -> Self {
        curve.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn three_point_curve() -> Curve {
        Curve::new(vec![
            SplinePoint::new(0.0, 0.0, 1.0, 0.0),
            SplinePoint::new(0.5, 1.0, 1.0, 0.0),
            SplinePoint::new(1.0, 0.0, 1.0, 0.0),
        ])
        .unwrap()
    }

    fn assert_invariants(curve: &Curve) {
        for p in curve.points() {
            assert!((0.0..=1.0).contains(&p.x), "x out of domain: {}", p.x);
        }
        for pair in curve.points().windows(2) {
            assert!(
                pair[1].x - pair[0].x >= MIN_POINT_X_DISTANCE - 1e-12,
                "points too close: {} {}",
                pair[0].x,
                pair[1].x
            );
        }
    }

    #[test]
    fn new_rejects_unsorted_and_out_of_domain() {
        let unsorted = Curve::new(vec![
            SplinePoint::new(0.5, 0.0, 1.0, 0.0),
            SplinePoint::new(0.2, 0.0, 1.0, 0.0),
        ]);
        assert_eq!(unsorted, Err(CurveError::Spacing { index: 1 }));

        let outside = Curve::new(vec![SplinePoint::new(1.5, 0.0, 1.0, 0.0)]);
        assert_eq!(outside, Err(CurveError::OutOfDomain { index: 0, x: 1.5 }));
    }

    #[test]
    fn evaluate_hits_control_points() {
        let curve = three_point_curve();
        assert!((curve.evaluate(0.0) - 0.0).abs() < 1e-12);
        assert!((curve.evaluate(0.5) - 1.0).abs() < 1e-12);
        assert!((curve.evaluate(1.0) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn evaluate_linear_is_exact() {
        let curve = Curve::linear(0.0, 1.0);
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            assert!(
                (curve.evaluate(x) - x).abs() < 1e-9,
                "linear curve off at {x}: {}",
                curve.evaluate(x)
            );
        }
    }

    #[test]
    fn evaluate_is_continuous_across_points() {
        let curve = three_point_curve();
        let eps = 1e-7;
        let left = curve.evaluate(0.5 - eps);
        let right = curve.evaluate(0.5 + eps);
        assert!((left - right).abs() < 1e-5);
    }

    #[test]
    fn evaluate_extends_flat_outside_points() {
        let curve = Curve::new(vec![
            SplinePoint::new(0.2, 3.0, 1.0, 1.0),
            SplinePoint::new(0.8, 5.0, 1.0, 1.0),
        ])
        .unwrap();
        assert_eq!(curve.evaluate(0.0), 3.0);
        assert_eq!(curve.evaluate(1.0), 5.0);
        assert_eq!(Curve::default().evaluate(0.4), 0.0);
    }

    #[test]
    fn insert_keeps_order_and_follows_slope() {
        let curve = Curve::linear(0.0, 1.0);
        let inserted = curve.insert_point(0.25, 0.25);
        assert_eq!(inserted.len(), 3);
        let p = inserted.point(1).unwrap();
        assert_eq!(p.x, 0.25);
        // tangent follows the line's slope of 1
        assert!((p.slope() - 1.0).abs() < 1e-9);
        assert_invariants(&inserted);
    }

    #[test]
    fn insert_near_existing_point_is_rejected() {
        let curve = three_point_curve();
        let same = curve.insert_point(0.5 + MIN_POINT_X_DISTANCE * 0.5, 0.3);
        assert_eq!(same, curve);
    }

    #[test]
    fn insert_clamps_into_domain() {
        let curve = Curve::new(vec![
            SplinePoint::new(0.0, 0.0, 1.0, 0.0),
            SplinePoint::new(0.5, 0.0, 1.0, 0.0),
        ])
        .unwrap();
        let inserted = curve.insert_point(4.0, 1.0);
        assert_eq!(inserted.points().last().unwrap().x, 1.0);
    }

    #[test]
    fn non_finite_edits_leave_curve_unchanged() {
        let curve = three_point_curve();
        assert_eq!(curve.insert_point(f64::NAN, 0.5), curve);
        assert_eq!(curve.insert_point(0.25, f64::INFINITY), curve);
        assert_eq!(curve.set_position(1, f64::NAN, 0.5).unwrap(), curve);
        assert_eq!(curve.set_position(1, 0.4, f64::NEG_INFINITY).unwrap(), curve);
        assert_eq!(curve.set_tangent(1, f64::NAN, 1.0).unwrap(), curve);
        // an out-of-range index is still reported first
        assert!(curve.set_position(9, f64::NAN, 0.0).is_err());
    }

    #[test]
    fn remove_protects_endpoints_and_floor() {
        let curve = three_point_curve();
        assert_eq!(curve.remove_point(0).unwrap().len(), 3);
        assert_eq!(curve.remove_point(2).unwrap().len(), 3);

        let removed = curve.remove_point(1).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed.remove_point(1).unwrap().len(), 2);
    }

    #[test]
    fn invalid_index_is_an_error() {
        let curve = three_point_curve();
        assert_eq!(
            curve.remove_point(7),
            Err(CurveError::PointIndex { index: 7, len: 3 })
        );
        assert!(curve.set_position(3, 0.1, 0.1).is_err());
        assert!(curve.set_tangent(3, 1.0, 0.0).is_err());
    }

    #[test]
    fn set_position_clamps_between_neighbours() {
        let curve = three_point_curve();
        let moved = curve.set_position(1, 2.0, 0.7).unwrap();
        let p = moved.point(1).unwrap();
        assert!((p.x - (1.0 - MIN_POINT_X_DISTANCE)).abs() < 1e-12);
        assert_eq!(p.y, 0.7);
        assert_invariants(&moved);

        let moved = curve.set_position(1, -1.0, 0.7).unwrap();
        assert!((moved.point(1).unwrap().x - MIN_POINT_X_DISTANCE).abs() < 1e-12);
    }

    #[test]
    fn set_position_pins_endpoint_x() {
        let curve = three_point_curve();
        let moved = curve.set_position(0, 0.3, 0.9).unwrap();
        assert_eq!(moved.point(0).unwrap().position(), Point::new(0.0, 0.9));
        // receiver is untouched
        assert_eq!(curve.point(0).unwrap().y, 0.0);
    }

    #[test]
    fn edit_sequences_preserve_invariants() {
        let mut curve = Curve::linear(0.0, 1.0);
        let xs = [0.5, 0.25, 0.255, 0.75, 0.1, 0.9, 0.505, 0.6];
        for (i, x) in xs.iter().enumerate() {
            curve = curve.insert_point(*x, i as f64 * 0.1);
            assert_invariants(&curve);
        }
        for step in 0..20 {
            let index = 1 + step % (curve.len() - 2);
            let x = (step as f64 * 0.37) % 1.2 - 0.1;
            curve = curve.set_position(index, x, 0.5).unwrap();
            assert_invariants(&curve);
        }
    }

    #[test]
    fn find_point_uses_min_distance() {
        let curve = three_point_curve();
        assert_eq!(curve.find_point(0.505), Some(1));
        assert_eq!(curve.find_point(0.52), None);
        assert_eq!(curve.find_point(1.7), Some(2));
    }

    #[test]
    fn deserialize_validates_points() {
        let ok: Curve = serde_json::from_str(
            r#"[{"x":0.0,"y":0.0,"tx":1.0,"ty":0.0},{"x":1.0,"y":1.0,"tx":1.0,"ty":0.0}]"#,
        )
        .unwrap();
        assert_eq!(ok.len(), 2);

        let bad: Result<Curve, _> = serde_json::from_str(
            r#"[{"x":0.5,"y":0.0,"tx":1.0,"ty":0.0},{"x":0.501,"y":1.0,"tx":1.0,"ty":0.0}]"#,
        );
        assert!(bad.is_err());
    }
}
