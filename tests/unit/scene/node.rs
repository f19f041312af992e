use super::*;

use crate::render::clip::ClipMethod;
use crate::render::recording::{RecordingRenderer, RenderCall};
use crate::render::surface::Color;

fn square(size: f64) -> Arc<Graphics> {
    Arc::new(Graphics::new().begin_fill(Color::BLACK).rect(0.0, 0.0, size, size))
}

fn settled(kind: NodeKind) -> Node {
    let mut node = Node::new(kind);
    node.dirty = DirtyFlags::empty();
    node
}

fn region(graphics: Arc<Graphics>, rectangular: bool) -> MaskRegion {
    let rect = graphics.bounds();
    MaskRegion {
        graphics,
        transform: Transform::IDENTITY,
        rect,
        rectangular,
    }
}

fn bbox(x0: f64, y0: f64, x1: f64, y1: f64) -> BoundingBox {
    BoundingBox::from_rect(Rect::new(x0, y0, x1, y1))
}

#[test]
fn new_nodes_start_fully_dirty() {
    let node = Node::new(NodeKind::Container);
    assert_eq!(node.dirty(), DirtyFlags::ALL);
    assert!(node.children().is_empty());
    assert!(Node::new(NodeKind::Shape(square(1.0))).children.is_none());
}

#[test]
fn setters_record_what_changed() {
    let mut node = settled(NodeKind::Shape(square(10.0)));
    node.set_position(0.0, 0.0);
    assert!(node.dirty().is_empty(), "unchanged params stay clean");

    node.set_position(5.0, 0.0);
    assert_eq!(node.dirty(), DirtyFlags::TRANSFORM);

    node.dirty = DirtyFlags::empty();
    node.set_alpha(0.5);
    assert_eq!(node.dirty(), DirtyFlags::TRANSFORM);

    node.dirty = DirtyFlags::empty();
    node.set_graphics(square(20.0));
    assert_eq!(node.dirty(), DirtyFlags::SHAPE);
}

#[test]
fn set_graphics_ignores_the_same_graphics_and_other_kinds() {
    let g = square(10.0);
    let mut shape = settled(NodeKind::Shape(Arc::clone(&g)));
    shape.set_graphics(g);
    assert!(shape.dirty().is_empty());

    let mut container = settled(NodeKind::Container);
    container.set_graphics(square(3.0));
    assert!(container.dirty().is_empty());
    assert!(container.graphics().is_none());
}

#[test]
fn showing_again_recomputes_everything() {
    let mut node = settled(NodeKind::Container);
    node.set_visible(false);
    assert!(node.dirty().is_empty());
    node.set_visible(true);
    assert_eq!(node.dirty(), DirtyFlags::ALL);

    node.dirty = DirtyFlags::empty();
    node.set_off(true);
    node.set_off(false);
    assert_eq!(node.dirty(), DirtyFlags::ALL);
}

#[test]
fn disjoint_mask_hides() {
    let mask = region(square(10.0), true);
    let clip = mask.clip_for(&bbox(20.0, 20.0, 30.0, 30.0));
    assert_eq!(clip.method, ClipMethod::Hide);
}

#[test]
fn rectangular_mask_shows_or_scissors() {
    let mask = region(square(10.0), true);
    assert_eq!(mask.clip_for(&bbox(2.0, 2.0, 8.0, 8.0)).method, ClipMethod::Show);
    let partial = mask.clip_for(&bbox(5.0, 5.0, 15.0, 15.0));
    assert_eq!(partial.method, ClipMethod::Scissor);
    assert_eq!(partial.rect, mask.rect);
}

#[test]
fn shaped_mask_composes_destination_in() {
    let circle = Arc::new(Graphics::new().begin_fill(Color::BLACK).circle(5.0, 5.0, 5.0));
    let mask = region(circle, false);
    let clip = mask.clip_for(&bbox(2.0, 2.0, 8.0, 8.0));
    assert_eq!(clip.method, ClipMethod::Compose);
    assert_eq!(clip.op, CompositeOp::DestinationIn);
    assert!(clip.mask.is_some());

    assert!(mask.admits(Point::new(5.0, 5.0)));
    assert!(!mask.admits(Point::new(0.5, 0.5)), "corner lies outside the circle");
}

#[test]
fn uncached_shape_paints_nothing() {
    let mut renderer = RecordingRenderer::new(10, 10);
    let node = Node::new(NodeKind::Shape(square(4.0)));
    // No raster cache yet.
    node.paint_object(&mut renderer);
    assert!(renderer.drawn_images().is_empty());
}

#[test]
fn begin_paint_sets_state_from_layout() {
    let mut renderer = RecordingRenderer::new(10, 10);
    let mut node = Node::new(NodeKind::Container);
    node.transform = Transform::translate(3.0, 4.0);
    node.global_alpha = 0.25;
    node.begin_paint_object(&mut renderer);
    assert_eq!(
        renderer.calls(),
        &[
            RenderCall::SetTransformation([1.0, 0.0, 0.0, 1.0, 3.0, 4.0]),
            RenderCall::SetAlpha(0.25),
            RenderCall::SetComposition(CompositeOp::SourceOver),
        ]
    );
}

#[test]
fn text_paints_its_content() {
    let mut renderer = RecordingRenderer::new(10, 10);
    let node = Node::new(NodeKind::Text(Text::new("hi")));
    node.paint_object(&mut renderer);
    assert_eq!(renderer.calls(), &[RenderCall::DrawText("hi".to_owned())]);
}
