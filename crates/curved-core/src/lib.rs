pub mod curve;
pub mod hit;
pub mod id;
pub mod value;

pub use curve::{Curve, CurveError, MIN_POINT_COUNT, MIN_POINT_X_DISTANCE, SplinePoint};
pub use hit::{find_closest_curve, find_points, hit_position, hit_tangent};
pub use id::PropertyId;
pub use value::{PropertyValue, ValueSpread};

// Re-export kurbo geometry so downstream crates share one vocabulary
pub use kurbo::{Point, Vec2};
