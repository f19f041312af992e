use crate::foundation::math::{DEG_TO_RAD, sin_cos_deg};
use crate::geom::bounds::{BoundingBox, Point};

const SINGULAR_EPSILON: f64 = 1e-12;

/// Which parts of the linear block differ from identity.
///
/// Bounding-box transformation picks its code path from this: without skew an axis-aligned box
/// stays axis-aligned, so two corners suffice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirtyKind {
    /// Pure translation.
    None,
    /// Axis scaling (`a != 1` or `d != 1`) without skew.
    Scale,
    /// Off-diagonal terms present (`b != 0` or `c != 0`).
    Skew,
}

/// Logical transform parameters of a display object, in local units and degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransformParams {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Horizontal scale.
    pub scale_x: f64,
    /// Vertical scale.
    pub scale_y: f64,
    /// Rotation in degrees, clockwise.
    pub rotation: f64,
    /// Horizontal skew in degrees.
    pub skew_x: f64,
    /// Vertical skew in degrees.
    pub skew_y: f64,
    /// Registration point x (local origin offset).
    pub reg_x: f64,
    /// Registration point y (local origin offset).
    pub reg_y: f64,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            reg_x: 0.0,
            reg_y: 0.0,
        }
    }
}

/// 2×3 affine matrix `[a c tx; b d ty]` mapping local points to global points.
///
/// Fields are private so the invertibility flag and [`DirtyKind`] always match the coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    tx: f64,
    ty: f64,
    invertible: bool,
    kind: DirtyKind,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
        invertible: true,
        kind: DirtyKind::None,
    };

    /// Build from raw coefficients.
    pub fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        let det = a * d - b * c;
        let kind = if b != 0.0 || c != 0.0 {
            DirtyKind::Skew
        } else if a != 1.0 || d != 1.0 {
            DirtyKind::Scale
        } else {
            DirtyKind::None
        };
        Self {
            a,
            b,
            c,
            d,
            tx,
            ty,
            invertible: det.is_finite() && det.abs() > SINGULAR_EPSILON,
            kind,
        }
    }

    /// Pure translation.
    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Pure axis scale.
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Coefficients in `[a, b, c, d, tx, ty]` order (the `kurbo::Affine` order).
    pub fn coeffs(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
    }

    /// Translation part.
    pub fn translation(&self) -> Point {
        Point::new(self.tx, self.ty)
    }

    /// Linear-block classification.
    pub fn kind(&self) -> DirtyKind {
        self.kind
    }

    /// `false` when the matrix is singular (e.g. a zero scale).
    pub fn is_invertible(&self) -> bool {
        self.invertible
    }

    /// Length of the transformed unit vectors, `(|x axis|, |y axis|)`.
    pub fn axis_scales(&self) -> (f64, f64) {
        (self.a.hypot(self.b), self.c.hypot(self.d))
    }

    /// Matrix product `self * other`: `other` is applied first.
    pub fn multiply(&self, other: &Self) -> Self {
        Self::new(
            self.a * other.a + self.c * other.b,
            self.b * other.a + self.d * other.b,
            self.a * other.c + self.c * other.d,
            self.b * other.c + self.d * other.d,
            self.a * other.tx + self.c * other.ty + self.tx,
            self.b * other.tx + self.d * other.ty + self.ty,
        )
    }

    /// Replace `self` with `parent * self`, turning a local matrix into a local-to-global one.
    pub fn prepend(&mut self, parent: &Self) {
        *self = parent.multiply(self);
    }

    /// Local matrix described by `params`, registration offset included.
    pub fn from_params(params: &TransformParams) -> Self {
        let (sin, cos) = sin_cos_deg(params.rotation);
        let mut m = if params.skew_x != 0.0 || params.skew_y != 0.0 {
            let (sx, cx) = (params.skew_x * DEG_TO_RAD).sin_cos();
            let (sy, cy) = (params.skew_y * DEG_TO_RAD).sin_cos();
            Self::new(cy, sy, -sx, cx, params.x, params.y).multiply(&Self::new(
                cos * params.scale_x,
                sin * params.scale_x,
                -sin * params.scale_y,
                cos * params.scale_y,
                0.0,
                0.0,
            ))
        } else {
            Self::new(
                cos * params.scale_x,
                sin * params.scale_x,
                -sin * params.scale_y,
                cos * params.scale_y,
                params.x,
                params.y,
            )
        };
        if params.reg_x != 0.0 || params.reg_y != 0.0 {
            m.tx -= params.reg_x * m.a + params.reg_y * m.c;
            m.ty -= params.reg_x * m.b + params.reg_y * m.d;
        }
        m
    }

    /// Compose a node's local-to-global matrix from its parameters and its parent's matrix.
    ///
    /// `parent` must already be up to date for this frame.
    pub fn append_transform(parent: &Self, params: &TransformParams) -> Self {
        let mut m = Self::from_params(params);
        m.prepend(parent);
        m
    }

    /// Map a local point to global space.
    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Inverse matrix, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        if !self.invertible {
            return None;
        }
        let det = self.a * self.d - self.b * self.c;
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        let tx = -(a * self.tx + c * self.ty);
        let ty = -(b * self.tx + d * self.ty);
        Some(Self::new(a, b, c, d, tx, ty))
    }

    /// Map a global point back into local space; `None` when the matrix is singular.
    pub fn inverse_transform_point(&self, p: Point) -> Option<Point> {
        self.inverse().map(|inv| inv.transform_point(p))
    }

    /// Axis-aligned global box of a local box.
    ///
    /// Without skew only two corners are mapped; otherwise all four.
    pub fn transform_box(&self, local: &BoundingBox) -> BoundingBox {
        if local.is_empty() {
            return BoundingBox::EMPTY;
        }
        if self.kind == DirtyKind::Skew {
            return self.transform_box_general(local);
        }
        BoundingBox::from_points(
            self.transform_point(Point::new(local.min_x, local.min_y)),
            self.transform_point(Point::new(local.max_x, local.max_y)),
        )
    }

    /// Four-corner box transformation, valid for any matrix.
    pub fn transform_box_general(&self, local: &BoundingBox) -> BoundingBox {
        if local.is_empty() {
            return BoundingBox::EMPTY;
        }
        let mut out = BoundingBox::EMPTY;
        for p in [
            Point::new(local.min_x, local.min_y),
            Point::new(local.max_x, local.min_y),
            Point::new(local.min_x, local.max_y),
            Point::new(local.max_x, local.max_y),
        ] {
            out.inflate_point(self.transform_point(p));
        }
        out
    }

    /// Convert to a `kurbo::Affine`.
    pub fn to_affine(&self) -> kurbo::Affine {
        kurbo::Affine::new(self.coeffs())
    }

    /// Convert from a `kurbo::Affine`.
    pub fn from_affine(affine: kurbo::Affine) -> Self {
        let [a, b, c, d, tx, ty] = affine.as_coeffs();
        Self::new(a, b, c, d, tx, ty)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geom/transform.rs"]
mod tests;
