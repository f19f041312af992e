use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use kurbo::Affine;

use crate::foundation::error::{FlitterError, FlitterResult};
use crate::geom::{BoundingBox, Rect, Transform};
use crate::render::clip::ClipMethod;
use crate::render::composite::{CompositeOp, blend, scale_alpha};
use crate::render::renderer::{RenderCaps, RenderObject, RenderSettings, Renderer};
use crate::render::surface::{ImageId, ImageSurface};

/// Raster backend drawing into a premultiplied RGBA8 frame with `vello_cpu`.
///
/// Every draw call is rasterized into a transparent scratch pixmap and then composited onto the
/// current target with the active operator, so all [`CompositeOp`]s keep their whole-canvas
/// semantics inside the active scissor region.
pub struct CpuRenderer {
    width: u16,
    height: u16,
    settings: RenderSettings,
    frame: vello_cpu::Pixmap,
    // Offscreen targets for compose clips; draws go to the last one.
    layers: Vec<vello_cpu::Pixmap>,
    scratch: vello_cpu::Pixmap,
    ctx: vello_cpu::RenderContext,
    transform: Transform,
    alpha: f64,
    op: CompositeOp,
    scissors: Vec<PixelRect>,
    image_cache: HashMap<ImageId, vello_cpu::Image>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PixelRect {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelRect {
    fn intersect(self, other: Self) -> Self {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        Self {
            x0,
            y0,
            x1: self.x1.min(other.x1).max(x0),
            y1: self.y1.min(other.y1).max(y0),
        }
    }
}

impl CpuRenderer {
    /// Create a renderer; `None` when the target is empty or exceeds `u16` pixels per side.
    pub fn new(settings: &RenderSettings) -> Option<Self> {
        let width: u16 = settings.width.try_into().ok()?;
        let height: u16 = settings.height.try_into().ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            width,
            height,
            settings: settings.clone(),
            frame: vello_cpu::Pixmap::new(width, height),
            layers: Vec::new(),
            scratch: vello_cpu::Pixmap::new(width, height),
            ctx: vello_cpu::RenderContext::new(width, height),
            transform: Transform::IDENTITY,
            alpha: 1.0,
            op: CompositeOp::SourceOver,
            scissors: Vec::new(),
            image_cache: HashMap::new(),
        })
    }

    /// Premultiplied RGBA8 bytes of the frame.
    pub fn frame_data(&self) -> &[u8] {
        self.frame.data_as_u8_slice()
    }

    /// Copy of the frame as an image surface.
    pub fn snapshot(&self) -> FlitterResult<ImageSurface> {
        ImageSurface::from_premul_rgba8(
            u32::from(self.width),
            u32::from(self.height),
            self.frame.data_as_u8_slice().to_vec(),
        )
    }

    /// Write the frame as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> FlitterResult<()> {
        self.snapshot()?.save_png(path)
    }

    /// Number of images with a cached paint.
    pub fn cached_images(&self) -> usize {
        self.image_cache.len()
    }

    fn full_rect(&self) -> PixelRect {
        PixelRect {
            x0: 0,
            y0: 0,
            x1: u32::from(self.width),
            y1: u32::from(self.height),
        }
    }

    fn active_clip(&self) -> PixelRect {
        self.scissors.last().copied().unwrap_or_else(|| self.full_rect())
    }

    fn pixel_rect(&self, b: &BoundingBox) -> PixelRect {
        if b.is_empty() {
            return PixelRect {
                x0: 0,
                y0: 0,
                x1: 0,
                y1: 0,
            };
        }
        let clamp_x = |v: f64| v.clamp(0.0, f64::from(self.width)) as u32;
        let clamp_y = |v: f64| v.clamp(0.0, f64::from(self.height)) as u32;
        PixelRect {
            x0: clamp_x(b.min_x.floor()),
            y0: clamp_y(b.min_y.floor()),
            x1: clamp_x(b.max_x.ceil()),
            y1: clamp_y(b.max_y.ceil()),
        }
    }

    fn image_paint(&mut self, image: &ImageSurface) -> Option<vello_cpu::Image> {
        if let Some(paint) = self.image_cache.get(&image.id()) {
            return Some(paint.clone());
        }
        let pixmap =
            match image_premul_bytes_to_pixmap(image.data(), image.width(), image.height()) {
                Ok(p) => p,
                Err(err) => {
                    tracing::debug!(image = image.id().0, %err, "image not drawable");
                    return None;
                }
            };
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache.insert(image.id(), paint.clone());
        Some(paint)
    }

    /// Rasterize the pending context into the scratch pixmap and composite it onto the target.
    fn flush_draw(&mut self, op: CompositeOp, alpha: f64) {
        self.scratch.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.scratch);

        let clip = self.active_clip();
        let width = usize::from(self.width);
        let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        let Self {
            layers,
            frame,
            scratch,
            ..
        } = self;
        let target = layers.last_mut().unwrap_or(frame);
        composite_region(
            target.data_as_u8_slice_mut(),
            scratch.data_as_u8_slice(),
            width,
            clip,
            op,
            alpha,
        );
    }

    fn draw_image_region(&mut self, image: &ImageSurface, src: Rect, dst: Rect) {
        if src.width() <= 0.0 || src.height() <= 0.0 || dst.width() == 0.0 || dst.height() == 0.0
        {
            return;
        }
        let Some(paint) = self.image_paint(image) else {
            return;
        };
        let m = self.transform.to_affine()
            * Affine::translate((dst.x0, dst.y0))
            * Affine::scale_non_uniform(dst.width() / src.width(), dst.height() / src.height())
            * Affine::translate((-src.x0, -src.y0));

        self.ctx.reset();
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(m));
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&rect_to_cpu(src));
        self.flush_draw(self.op, self.alpha);
    }
}

fn composite_region(
    dst: &mut [u8],
    src: &[u8],
    width: usize,
    clip: PixelRect,
    op: CompositeOp,
    alpha: u8,
) {
    for y in clip.y0 as usize..clip.y1 as usize {
        let row = y * width * 4;
        for x in clip.x0 as usize..clip.x1 as usize {
            let i = row + x * 4;
            let s = scale_alpha([src[i], src[i + 1], src[i + 2], src[i + 3]], alpha);
            if s[3] == 0 && !op.affects_uncovered() {
                continue;
            }
            let out = blend([dst[i], dst[i + 1], dst[i + 2], dst[i + 3]], s, op);
            dst[i..i + 4].copy_from_slice(&out);
        }
    }
}

impl Renderer for CpuRenderer {
    fn caps(&self) -> RenderCaps {
        RenderCaps {
            supports_multiply: self.settings.multiply,
        }
    }

    fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn begin_frame(&mut self) {
        let clear = self.settings.clear.map_or([0; 4], |c| c.to_premul());
        for px in self.frame.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&clear);
        }
        self.layers.clear();
        self.scissors.clear();
        self.transform = Transform::IDENTITY;
        self.alpha = 1.0;
        self.op = CompositeOp::SourceOver;
    }

    fn set_transformation(&mut self, transform: &Transform) {
        self.transform = *transform;
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_composition(&mut self, op: CompositeOp) {
        self.op = op;
    }

    fn draw_canvas(&mut self, image: &ImageSurface, dst: Rect) {
        let src = Rect::new(0.0, 0.0, f64::from(image.width()), f64::from(image.height()));
        self.draw_image_region(image, src, dst);
    }

    fn draw_partial(&mut self, image: &ImageSurface, src: Rect, dst: Rect) {
        self.draw_image_region(image, src, dst);
    }

    /// Text is drawn by hosts with a text stack; this backend leaves it out.
    fn draw_text(&mut self, _text: &crate::scene::text::Text) {}

    fn add_object(&mut self, object: &dyn RenderObject) {
        let Some(clip) = object.clip() else {
            object.begin_paint_object(self);
            object.paint_object(self);
            return;
        };
        match clip.method {
            ClipMethod::Show => {
                object.begin_paint_object(self);
                object.paint_object(self);
            }
            ClipMethod::Hide => object.begin_paint_object(self),
            ClipMethod::Scissor => {
                let rect = self.active_clip().intersect(self.pixel_rect(&clip.rect));
                self.scissors.push(rect);
                object.begin_paint_object(self);
                object.paint_object(self);
                self.scissors.pop();
            }
            ClipMethod::Compose => {
                self.layers
                    .push(vello_cpu::Pixmap::new(self.width, self.height));
                object.begin_paint_object(self);
                object.paint_object(self);
                let object_op = self.op;
                let Some(mut layer) = self.layers.pop() else {
                    return;
                };

                if let Some(mask) = &clip.mask {
                    self.ctx.reset();
                    mask.graphics
                        .draw_into(&mut self.ctx, mask.transform.to_affine());
                    self.scratch.data_as_u8_slice_mut().fill(0);
                    self.ctx.flush();
                    self.ctx.render_to_pixmap(&mut self.scratch);
                    let full = self.full_rect();
                    composite_region(
                        layer.data_as_u8_slice_mut(),
                        self.scratch.data_as_u8_slice(),
                        usize::from(self.width),
                        full,
                        clip.op,
                        255,
                    );
                }

                let clip_rect = self.active_clip();
                let width = usize::from(self.width);
                let target = self.layers.last_mut().unwrap_or(&mut self.frame);
                composite_region(
                    target.data_as_u8_slice_mut(),
                    layer.data_as_u8_slice(),
                    width,
                    clip_rect,
                    object_op,
                    255,
                );
            }
        }
    }

    fn uncache(&mut self, image: ImageId) {
        if self.image_cache.remove(&image).is_some() {
            tracing::trace!(image = image.0, "cpu image paint released");
        }
    }
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

pub(crate) fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> FlitterResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| FlitterError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| FlitterError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(FlitterError::render("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
