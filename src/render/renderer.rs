use crate::geom::{BoundingBox, Rect, Transform};
use crate::render::clip::ClipDescriptor;
use crate::render::composite::CompositeOp;
use crate::render::surface::{Color, ImageId, ImageSurface};
use crate::scene::text::Text;

/// Backend capability flags, decided once when the renderer is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderCaps {
    /// The backend implements [`CompositeOp::Multiply`] natively.
    ///
    /// The composer picks its per-channel multiply strategy from this flag.
    pub supports_multiply: bool,
}

/// Measured extent of a text object, in local units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
}

/// Draw-call sink consumed by the scene graph.
///
/// Calls are stateful in the canvas manner: the transformation, alpha and composition set last
/// apply to every following draw call.
pub trait Renderer {
    /// Capability flags.
    fn caps(&self) -> RenderCaps;

    /// Target size in pixels.
    fn size(&self) -> (u32, u32);

    /// Start a frame (clears the target in raster backends).
    fn begin_frame(&mut self) {}

    /// Finish a frame.
    fn end_frame(&mut self) {}

    /// Set the local-to-device transform for subsequent draws.
    fn set_transformation(&mut self, transform: &Transform);

    /// Set the global alpha (`0.0..=1.0`) for subsequent draws.
    fn set_alpha(&mut self, alpha: f64);

    /// Set the composition operator for subsequent draws.
    fn set_composition(&mut self, op: CompositeOp);

    /// Draw a whole image into `dst` (local units).
    fn draw_canvas(&mut self, image: &ImageSurface, dst: Rect);

    /// Draw the `src` region of an image (image pixels) into `dst` (local units).
    fn draw_partial(&mut self, image: &ImageSurface, src: Rect, dst: Rect);

    /// Draw a video frame. Backends without a video path draw it as an image.
    fn draw_video(&mut self, frame: &ImageSurface, src: Option<Rect>, dst: Rect) {
        match src {
            Some(src) => self.draw_partial(frame, src, dst),
            None => self.draw_canvas(frame, dst),
        }
    }

    /// Draw a text object. Backends without text support leave this a no-op.
    fn draw_text(&mut self, _text: &Text) {}

    /// Measure a text object; `None` when the backend has no text metrics.
    fn measure_text(&mut self, _text: &Text) -> Option<TextMetrics> {
        None
    }

    /// Pointer cursor hint. No-op outside interactive hosts.
    fn set_cursor(&mut self, _cursor: &str) {}

    /// Paint one render object, honoring its clip descriptor.
    ///
    /// [`crate::render::clip::ClipMethod::Hide`] still calls
    /// [`RenderObject::begin_paint_object`].
    fn add_object(&mut self, object: &dyn RenderObject);

    /// Release anything cached for `image`.
    fn uncache(&mut self, image: ImageId);
}

/// A paintable scene object as seen by a [`Renderer`].
pub trait RenderObject {
    /// Global bounding box.
    fn render_box(&self) -> BoundingBox;

    /// Clip or mask applied to this object.
    fn clip(&self) -> Option<&ClipDescriptor>;

    /// Set renderer state (transform, alpha, composition) for this object.
    fn begin_paint_object(&self, renderer: &mut dyn Renderer);

    /// Issue the object's draw calls.
    fn paint_object(&self, renderer: &mut dyn Renderer);
}

/// Available backend kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// CPU raster backend powered by `vello_cpu`.
    Cpu,
    /// Call recorder, paints nothing.
    Recording,
}

/// Backend-agnostic settings.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// If set, raster backends clear the target to this color on `begin_frame`.
    pub clear: Option<Color>,
    /// Report native multiply support (raster backends only).
    pub multiply: bool,
}

impl RenderSettings {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            clear: None,
            multiply: true,
        }
    }
}

/// Create a renderer.
///
/// Returns `None` when the backend cannot be created for these settings (e.g. a zero-sized or
/// oversized raster target).
pub fn create_renderer(kind: BackendKind, settings: &RenderSettings) -> Option<Box<dyn Renderer>> {
    match kind {
        BackendKind::Cpu => match crate::render::cpu::CpuRenderer::new(settings) {
            Some(r) => Some(Box::new(r)),
            None => {
                tracing::debug!(
                    width = settings.width,
                    height = settings.height,
                    "cpu renderer unavailable for target size"
                );
                None
            }
        },
        BackendKind::Recording => Some(Box::new(
            crate::render::recording::RecordingRenderer::new(settings.width, settings.height),
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
