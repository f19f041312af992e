pub use kurbo::{Point, Rect, Vec2};

/// Axis-aligned box accumulated with min/max inflation.
///
/// A box is empty while `min_x > max_x`; [`BoundingBox::EMPTY`] is the reset state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Smallest x covered.
    pub min_x: f64,
    /// Smallest y covered.
    pub min_y: f64,
    /// Largest x covered.
    pub max_x: f64,
    /// Largest y covered.
    pub max_y: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    /// The empty box. Inflating it with any point yields that point.
    pub const EMPTY: Self = Self {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    /// Box spanning two corners in any order.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Box covering `rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self::from_points(Point::new(rect.x0, rect.y0), Point::new(rect.x1, rect.y1))
    }

    /// `true` when nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Return to the empty state.
    pub fn reset(&mut self) {
        *self = Self::EMPTY;
    }

    /// Grow to include `p`.
    pub fn inflate_point(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Grow to include `other`. Empty boxes contribute nothing.
    pub fn inflate_box(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        !self.is_empty()
            && p.x >= self.min_x
            && p.x <= self.max_x
            && p.y >= self.min_y
            && p.y <= self.max_y
    }

    /// `true` when `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// `true` when the two boxes overlap (touching edges count).
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Overlap of two boxes; empty when they are disjoint.
    pub fn intersection(&self, other: &Self) -> Self {
        let out = Self {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        if out.is_empty() { Self::EMPTY } else { out }
    }

    /// Width, or zero when empty.
    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_x - self.min_x }
    }

    /// Height, or zero when empty.
    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_y - self.min_y }
    }

    /// Convert to a rectangle; `None` when empty.
    pub fn to_rect(&self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        Some(Rect::new(self.min_x, self.min_y, self.max_x, self.max_y))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geom/bounds.rs"]
mod tests;
