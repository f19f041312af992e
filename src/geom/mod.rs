//! Geometry value types: points, rectangles, bounding boxes and the 2×3 node transform.

/// Axis-aligned bounding boxes (plus `kurbo` point/rect re-exports).
pub mod bounds;
/// Affine node transforms with dirty-kind classification.
pub mod transform;

pub use bounds::{BoundingBox, Point, Rect, Vec2};
pub use transform::{DirtyKind, Transform, TransformParams};
