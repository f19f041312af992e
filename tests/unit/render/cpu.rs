use std::cell::Cell;

use super::*;
use crate::render::clip::{ClipDescriptor, MaskShape};
use crate::render::surface::Color;
use crate::scene::graphics::Graphics;

fn solid(w: u32, h: u32, color: Color) -> ImageSurface {
    let mut s = ImageSurface::new(w, h);
    s.fill(color, CompositeOp::Copy, 1.0);
    s
}

fn renderer(w: u32, h: u32) -> CpuRenderer {
    let mut r = CpuRenderer::new(&RenderSettings::new(w, h)).expect("renderer");
    r.begin_frame();
    r
}

fn px(r: &CpuRenderer, x: usize, y: usize) -> [u8; 4] {
    let w = r.size().0 as usize;
    let i = (y * w + x) * 4;
    let d = r.frame_data();
    [d[i], d[i + 1], d[i + 2], d[i + 3]]
}

struct Probe {
    image: ImageSurface,
    dst: Rect,
    clip: Option<ClipDescriptor>,
    begun: Cell<u32>,
    painted: Cell<u32>,
}

impl Probe {
    fn new(image: ImageSurface, dst: Rect, clip: Option<ClipDescriptor>) -> Self {
        Self {
            image,
            dst,
            clip,
            begun: Cell::new(0),
            painted: Cell::new(0),
        }
    }
}

impl RenderObject for Probe {
    fn render_box(&self) -> BoundingBox {
        BoundingBox::from_rect(self.dst)
    }

    fn clip(&self) -> Option<&ClipDescriptor> {
        self.clip.as_ref()
    }

    fn begin_paint_object(&self, renderer: &mut dyn Renderer) {
        self.begun.set(self.begun.get() + 1);
        renderer.set_transformation(&Transform::IDENTITY);
        renderer.set_alpha(1.0);
        renderer.set_composition(CompositeOp::SourceOver);
    }

    fn paint_object(&self, renderer: &mut dyn Renderer) {
        self.painted.set(self.painted.get() + 1);
        renderer.draw_canvas(&self.image, self.dst);
    }
}

#[test]
fn rejects_degenerate_targets() {
    assert!(CpuRenderer::new(&RenderSettings::new(0, 10)).is_none());
    assert!(CpuRenderer::new(&RenderSettings::new(70_000, 10)).is_none());
}

#[test]
fn begin_frame_clears_to_settings_color() {
    let mut settings = RenderSettings::new(2, 2);
    settings.clear = Some(Color::rgb(0, 0, 255));
    let mut r = CpuRenderer::new(&settings).unwrap();
    r.begin_frame();
    assert_eq!(px(&r, 1, 1), [0, 0, 255, 255]);
}

#[test]
fn draws_image_under_transform() {
    let mut r = renderer(8, 8);
    let img = solid(4, 4, Color::rgb(255, 0, 0));
    r.set_transformation(&Transform::translate(2.0, 2.0));
    r.draw_canvas(&img, Rect::new(0.0, 0.0, 4.0, 4.0));

    let inside = px(&r, 3, 3);
    assert!(inside[0] > 240 && inside[3] > 240, "{inside:?}");
    assert_eq!(px(&r, 0, 0), [0, 0, 0, 0]);
    assert_eq!(px(&r, 7, 7), [0, 0, 0, 0]);
    assert_eq!(r.cached_images(), 1);

    r.uncache(img.id());
    assert_eq!(r.cached_images(), 0);
}

#[test]
fn global_alpha_scales_the_draw() {
    let mut r = renderer(4, 4);
    r.set_alpha(0.5);
    r.draw_canvas(&solid(4, 4, Color::WHITE), Rect::new(0.0, 0.0, 4.0, 4.0));
    let p = px(&r, 1, 1);
    assert!((i32::from(p[3]) - 128).abs() <= 2, "{p:?}");
}

#[test]
fn copy_clears_uncovered_pixels() {
    let mut r = renderer(4, 4);
    r.draw_canvas(&solid(4, 4, Color::WHITE), Rect::new(0.0, 0.0, 4.0, 4.0));
    r.set_composition(CompositeOp::Copy);
    r.draw_canvas(&solid(1, 1, Color::BLACK), Rect::new(0.0, 0.0, 1.0, 1.0));
    assert_eq!(px(&r, 3, 3), [0, 0, 0, 0]);
}

#[test]
fn scissor_clip_limits_painting() {
    let mut r = renderer(8, 8);
    let probe = Probe::new(
        solid(8, 8, Color::rgb(255, 0, 0)),
        Rect::new(0.0, 0.0, 8.0, 8.0),
        Some(ClipDescriptor::scissor(BoundingBox::from_rect(Rect::new(
            0.0, 0.0, 4.0, 8.0,
        )))),
    );
    r.add_object(&probe);
    assert!(px(&r, 2, 2)[3] > 240);
    assert_eq!(px(&r, 6, 2), [0, 0, 0, 0]);
}

#[test]
fn hide_begins_but_does_not_paint() {
    let mut r = renderer(4, 4);
    let probe = Probe::new(
        solid(4, 4, Color::WHITE),
        Rect::new(0.0, 0.0, 4.0, 4.0),
        Some(ClipDescriptor::hide(BoundingBox::EMPTY)),
    );
    r.add_object(&probe);
    assert_eq!(probe.begun.get(), 1);
    assert_eq!(probe.painted.get(), 0);
    assert_eq!(px(&r, 1, 1), [0, 0, 0, 0]);
}

#[test]
fn compose_clip_masks_through_offscreen_layer() {
    let mut r = renderer(8, 8);
    let mask = Graphics::new()
        .begin_fill(Color::BLACK)
        .rect(4.0, 0.0, 4.0, 8.0);
    let rect = mask.bounds();
    let probe = Probe::new(
        solid(8, 8, Color::rgb(0, 255, 0)),
        Rect::new(0.0, 0.0, 8.0, 8.0),
        Some(ClipDescriptor::compose(
            rect,
            MaskShape {
                graphics: Arc::new(mask),
                transform: Transform::IDENTITY,
            },
            CompositeOp::DestinationIn,
        )),
    );
    r.add_object(&probe);
    assert_eq!(probe.painted.get(), 1);
    assert_eq!(px(&r, 1, 4), [0, 0, 0, 0]);
    let kept = px(&r, 6, 4);
    assert!(kept[1] > 240 && kept[3] > 240, "{kept:?}");
}

#[test]
fn caps_follow_settings() {
    let mut settings = RenderSettings::new(1, 1);
    settings.multiply = false;
    let r = CpuRenderer::new(&settings).unwrap();
    assert!(!r.caps().supports_multiply);
}
