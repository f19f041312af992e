use kurbo::{Affine, BezPath, Circle, Ellipse, ParamCurveNearest, PathEl, RoundedRect, Shape};

use crate::geom::{BoundingBox, Point, Rect};
use crate::render::cpu::{affine_to_cpu, bezpath_to_cpu};
use crate::render::surface::{Color, ImageSurface};

const SHAPE_TOLERANCE: f64 = 0.1;
const STROKE_HIT_ACCURACY: f64 = 1e-3;

/// Stroke paint.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
}

/// One filled and/or stroked path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphicsPath {
    pub path: BezPath,
    pub fill: Option<Color>,
    pub stroke: Option<StrokeStyle>,
}

/// Vector drawing commands of a shape, in local coordinates.
///
/// Built with a chained canvas-like API:
///
/// ```
/// use flitter::{Color, Graphics};
///
/// let g = Graphics::new()
///     .begin_fill(Color::rgb(255, 0, 0))
///     .rect(0.0, 0.0, 10.0, 10.0);
/// assert_eq!(g.bounds().width(), 10.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graphics {
    paths: Vec<GraphicsPath>,
}

/// A graphics object rasterized for drawing.
#[derive(Debug)]
pub struct RasterizedGraphics {
    pub surface: ImageSurface,
    /// Local coordinates of the surface's top-left pixel.
    pub origin: Point,
    /// Device pixels per local unit.
    pub scale: f64,
}

impl Graphics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished paths in paint order.
    pub fn paths(&self) -> &[GraphicsPath] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.iter().all(|p| p.path.elements().is_empty())
    }

    fn start_path(&mut self, fill: Option<Color>, stroke: Option<StrokeStyle>) {
        match self.paths.last_mut() {
            Some(p) if p.path.elements().is_empty() => {
                p.fill = fill;
                p.stroke = stroke;
            }
            _ => self.paths.push(GraphicsPath {
                path: BezPath::new(),
                fill,
                stroke,
            }),
        }
    }

    fn current(&mut self) -> &mut BezPath {
        if self.paths.is_empty() {
            self.paths.push(GraphicsPath::default());
        }
        let last = self.paths.len() - 1;
        &mut self.paths[last].path
    }

    fn current_style(&self) -> (Option<Color>, Option<StrokeStyle>) {
        self.paths
            .last()
            .map_or((None, None), |p| (p.fill, p.stroke))
    }

    /// Fill subsequent geometry with `color`.
    pub fn begin_fill(mut self, color: Color) -> Self {
        let (_, stroke) = self.current_style();
        self.start_path(Some(color), stroke);
        self
    }

    /// Stop filling subsequent geometry.
    pub fn end_fill(mut self) -> Self {
        let (_, stroke) = self.current_style();
        self.start_path(None, stroke);
        self
    }

    /// Stroke subsequent geometry.
    pub fn begin_stroke(mut self, color: Color, width: f64) -> Self {
        let (fill, _) = self.current_style();
        self.start_path(fill, Some(StrokeStyle { color, width }));
        self
    }

    /// Stop stroking subsequent geometry.
    pub fn end_stroke(mut self) -> Self {
        let (fill, _) = self.current_style();
        self.start_path(fill, None);
        self
    }

    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        self.current().move_to((x, y));
        self
    }

    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        self.current().line_to((x, y));
        self
    }

    pub fn quad_to(mut self, cx: f64, cy: f64, x: f64, y: f64) -> Self {
        self.current().quad_to((cx, cy), (x, y));
        self
    }

    pub fn curve_to(mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) -> Self {
        self.current().curve_to((c1x, c1y), (c2x, c2y), (x, y));
        self
    }

    pub fn close_path(mut self) -> Self {
        self.current().close_path();
        self
    }

    fn push_shape(mut self, shape: &impl Shape) -> Self {
        let path = self.current();
        for el in shape.path_elements(SHAPE_TOLERANCE) {
            path.push(el);
        }
        self
    }

    pub fn rect(self, x: f64, y: f64, w: f64, h: f64) -> Self {
        self.push_shape(&Rect::new(x, y, x + w, y + h))
    }

    pub fn round_rect(self, x: f64, y: f64, w: f64, h: f64, radius: f64) -> Self {
        self.push_shape(&RoundedRect::new(x, y, x + w, y + h, radius))
    }

    pub fn circle(self, x: f64, y: f64, radius: f64) -> Self {
        self.push_shape(&Circle::new((x, y), radius))
    }

    pub fn ellipse(self, x: f64, y: f64, w: f64, h: f64) -> Self {
        self.push_shape(&Ellipse::from_rect(Rect::new(x, y, x + w, y + h)))
    }

    /// Local bounds of all paths, strokes included.
    pub fn bounds(&self) -> BoundingBox {
        let mut out = BoundingBox::EMPTY;
        for p in &self.paths {
            if p.path.elements().is_empty() || (p.fill.is_none() && p.stroke.is_none()) {
                continue;
            }
            let mut b = p.path.bounding_box();
            if let Some(stroke) = p.stroke {
                b = b.inflate(stroke.width * 0.5, stroke.width * 0.5);
            }
            out.inflate_box(&BoundingBox::from_rect(b));
        }
        out
    }

    /// The rectangle this graphics fills, if it is exactly one unstroked axis-aligned rectangle.
    ///
    /// Masks of this form clip with a scissor instead of an offscreen composite.
    pub fn as_rect(&self) -> Option<Rect> {
        let mut painted = self.paths.iter().filter(|p| !p.path.elements().is_empty());
        let gp = painted.next()?;
        if painted.next().is_some() || gp.fill.is_none() || gp.stroke.is_some() {
            return None;
        }
        let mut corners = smallvec::SmallVec::<[Point; 5]>::new();
        for (i, el) in gp.path.elements().iter().enumerate() {
            match (i, el) {
                (0, PathEl::MoveTo(p)) | (1..=4, PathEl::LineTo(p)) => corners.push(*p),
                (4 | 5, PathEl::ClosePath) => {}
                _ => return None,
            }
        }
        if corners.len() == 5 {
            if corners[4] != corners[0] {
                return None;
            }
            corners.pop();
        }
        if corners.len() != 4 {
            return None;
        }
        let axis_aligned = (0..4).all(|i| {
            let (a, b) = (corners[i], corners[(i + 1) % 4]);
            a.x == b.x || a.y == b.y
        });
        let rect = Rect::from_points(corners[0], corners[2]);
        (axis_aligned && rect.area() > 0.0).then_some(rect)
    }

    /// Whether the local point `p` lies on painted geometry (non-zero fill or within a stroke).
    pub fn hit_test(&self, p: Point) -> bool {
        self.paths.iter().any(|gp| {
            if gp.fill.is_some() && gp.path.winding(p) != 0 {
                return true;
            }
            match gp.stroke {
                Some(stroke) => {
                    let r = stroke.width * 0.5;
                    gp.path
                        .segments()
                        .any(|seg| seg.nearest(p, STROKE_HIT_ACCURACY).distance_sq <= r * r)
                }
                None => false,
            }
        })
    }

    /// Issue fill/stroke calls into a `vello_cpu` context under `transform`.
    pub(crate) fn draw_into(&self, ctx: &mut vello_cpu::RenderContext, transform: Affine) {
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_fill_rule(vello_cpu::peniko::Fill::NonZero);
        for gp in &self.paths {
            if gp.path.elements().is_empty() {
                continue;
            }
            let path = bezpath_to_cpu(&gp.path);
            if let Some(c) = gp.fill {
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
                ctx.fill_path(&path);
            }
            if let Some(s) = gp.stroke {
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    s.color.r, s.color.g, s.color.b, s.color.a,
                ));
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(s.width));
                ctx.stroke_path(&path);
            }
        }
    }

    /// Rasterize at `scale` device pixels per local unit.
    ///
    /// Returns `None` for empty graphics or when the raster would exceed `u16` pixels per side.
    pub fn rasterize(&self, scale: f64) -> Option<RasterizedGraphics> {
        let b = self.bounds();
        if b.is_empty() || !(scale.is_finite() && scale > 0.0) {
            return None;
        }
        let x0 = (b.min_x * scale).floor();
        let y0 = (b.min_y * scale).floor();
        let w = ((b.max_x * scale).ceil() - x0).max(1.0);
        let h = ((b.max_y * scale).ceil() - y0).max(1.0);
        if w > f64::from(u16::MAX) || h > f64::from(u16::MAX) {
            tracing::debug!(w, h, "graphics raster too large");
            return None;
        }
        let (w, h) = (w as u16, h as u16);

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        self.draw_into(
            &mut ctx,
            Affine::translate((-x0, -y0)) * Affine::scale(scale),
        );
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        let surface = ImageSurface::from_premul_rgba8(
            u32::from(w),
            u32::from(h),
            pixmap.data_as_u8_slice().to_vec(),
        )
        .ok()?;
        Some(RasterizedGraphics {
            surface,
            origin: Point::new(x0 / scale, y0 / scale),
            scale,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graphics.rs"]
mod tests;
