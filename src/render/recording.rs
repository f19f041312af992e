use std::collections::HashMap;

use crate::geom::{BoundingBox, Rect, Transform};
use crate::render::clip::ClipMethod;
use crate::render::composite::CompositeOp;
use crate::render::renderer::{RenderCaps, RenderObject, Renderer, TextMetrics};
use crate::render::surface::{ImageId, ImageSurface};
use crate::scene::text::Text;

/// One recorded renderer call.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCall {
    BeginFrame,
    EndFrame,
    SetTransformation([f64; 6]),
    SetAlpha(f64),
    SetComposition(CompositeOp),
    DrawCanvas { image: ImageId, dst: Rect },
    DrawPartial { image: ImageId, src: Rect, dst: Rect },
    DrawText(String),
    AddObject {
        render_box: BoundingBox,
        clip: Option<ClipMethod>,
    },
    Uncache(ImageId),
}

/// Renderer that paints nothing and records every call.
///
/// Used as a spy in tests and for dry runs; text is "measured" at a fixed advance per
/// character so layout sees non-empty bounds.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    width: u32,
    height: u32,
    caps: RenderCaps,
    calls: Vec<RenderCall>,
    uncached: HashMap<ImageId, u32>,
    char_advance: f64,
}

impl RecordingRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            char_advance: 8.0,
            ..Self::default()
        }
    }

    /// Override the reported capability flags.
    pub fn with_caps(mut self, caps: RenderCaps) -> Self {
        self.caps = caps;
        self
    }

    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of `uncache` calls for `image`.
    pub fn uncache_count(&self, image: ImageId) -> u32 {
        self.uncached.get(&image).copied().unwrap_or(0)
    }

    /// Total number of `uncache` calls.
    pub fn total_uncached(&self) -> u32 {
        self.uncached.values().sum()
    }

    /// Images drawn with `draw_canvas`/`draw_partial`, in call order.
    pub fn drawn_images(&self) -> Vec<ImageId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::DrawCanvas { image, .. } | RenderCall::DrawPartial { image, .. } => {
                    Some(*image)
                }
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn caps(&self) -> RenderCaps {
        self.caps
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_frame(&mut self) {
        self.calls.push(RenderCall::BeginFrame);
    }

    fn end_frame(&mut self) {
        self.calls.push(RenderCall::EndFrame);
    }

    fn set_transformation(&mut self, transform: &Transform) {
        self.calls
            .push(RenderCall::SetTransformation(transform.coeffs()));
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.calls.push(RenderCall::SetAlpha(alpha));
    }

    fn set_composition(&mut self, op: CompositeOp) {
        self.calls.push(RenderCall::SetComposition(op));
    }

    fn draw_canvas(&mut self, image: &ImageSurface, dst: Rect) {
        self.calls.push(RenderCall::DrawCanvas {
            image: image.id(),
            dst,
        });
    }

    fn draw_partial(&mut self, image: &ImageSurface, src: Rect, dst: Rect) {
        self.calls.push(RenderCall::DrawPartial {
            image: image.id(),
            src,
            dst,
        });
    }

    fn draw_text(&mut self, text: &Text) {
        self.calls.push(RenderCall::DrawText(text.content().to_owned()));
    }

    fn measure_text(&mut self, text: &Text) -> Option<TextMetrics> {
        let lines = text.lines().count().max(1);
        let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        Some(TextMetrics {
            width: longest as f64 * self.char_advance,
            height: lines as f64 * text.line_height(),
        })
    }

    fn add_object(&mut self, object: &dyn RenderObject) {
        let clip = object.clip().map(|c| c.method);
        self.calls.push(RenderCall::AddObject {
            render_box: object.render_box(),
            clip,
        });
        object.begin_paint_object(self);
        if clip != Some(ClipMethod::Hide) {
            object.paint_object(self);
        }
    }

    fn uncache(&mut self, image: ImageId) {
        *self.uncached.entry(image).or_insert(0) += 1;
        self.calls.push(RenderCall::Uncache(image));
    }
}
