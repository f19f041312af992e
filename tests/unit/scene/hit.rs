use super::*;

use crate::render::recording::RecordingRenderer;
use crate::render::surface::Color;
use crate::scene::events::EventType;

fn filled(w: f64, h: f64) -> Graphics {
    Graphics::new().begin_fill(Color::BLACK).rect(0.0, 0.0, w, h)
}

fn layout(scene: &mut Scene) {
    let mut r = RecordingRenderer::new(100, 100);
    scene.layout(&mut r, 0.0);
}

fn click() -> EventMask {
    EventMask::of(EventType::Click)
}

/// Container holding one shape, appended to the root.
fn group(scene: &mut Scene) -> (NodeId, NodeId) {
    let root = scene.root();
    let container = scene.create_container();
    let shape = scene.create_shape(filled(10.0, 10.0));
    scene.add_child(root, container).unwrap();
    scene.add_child(container, shape).unwrap();
    (container, shape)
}

#[test]
fn subtrees_without_listeners_are_pruned() {
    let mut scene = Scene::default();
    let (_, listening) = group(&mut scene);
    let (quiet, quiet_shape) = group(&mut scene);
    scene.on(listening, EventType::Click, |_, _| {}).unwrap();
    layout(&mut scene);

    let hit = scene.hit_test_object(Point::new(5.0, 5.0), click(), EventMask::EMPTY);
    assert_eq!(hit, Some(listening));
    assert_eq!(scene.node(quiet).unwrap().hit_visits(), 1);
    assert_eq!(scene.node(quiet_shape).unwrap().hit_visits(), 0);
}

#[test]
fn first_hit_stops_the_walk() {
    let mut scene = Scene::default();
    let (container, lower) = group(&mut scene);
    let upper = scene.create_shape(filled(10.0, 10.0));
    scene.add_child(container, upper).unwrap();
    scene.on(container, EventType::Click, |_, _| {}).unwrap();
    layout(&mut scene);

    let p = Point::new(5.0, 5.0);
    assert_eq!(scene.hit_test_object(p, click(), EventMask::EMPTY), Some(upper));
    assert_eq!(scene.node(lower).unwrap().hit_visits(), 0);

    assert_eq!(scene.hit_test_objects(p, click(), EventMask::EMPTY), vec![upper, lower]);
}

#[test]
fn leaves_receive_events_for_listening_ancestors() {
    let mut scene = Scene::default();
    let (container, shape) = group(&mut scene);
    scene.on(container, EventType::Click, |_, _| {}).unwrap();
    layout(&mut scene);
    assert_eq!(
        scene.hit_test_object(Point::new(1.0, 1.0), click(), EventMask::EMPTY),
        Some(shape)
    );
    assert_eq!(
        scene.hit_test_object(Point::new(1.0, 1.0), EventMask::of(EventType::MouseUp), EventMask::EMPTY),
        None
    );
}

#[test]
fn misses_outside_content_and_hidden_nodes() {
    let mut scene = Scene::default();
    let (_, shape) = group(&mut scene);
    scene.on(shape, EventType::Click, |_, _| {}).unwrap();
    layout(&mut scene);
    assert_eq!(scene.hit_test_object(Point::new(15.0, 5.0), click(), EventMask::EMPTY), None);

    scene.node_mut(shape).unwrap().set_visible(false);
    layout(&mut scene);
    assert_eq!(scene.hit_test_object(Point::new(5.0, 5.0), click(), EventMask::EMPTY), None);
}

#[test]
fn transformed_leaves_are_tested_in_local_space() {
    let mut scene = Scene::default();
    let (container, shape) = group(&mut scene);
    scene.on(shape, EventType::Click, |_, _| {}).unwrap();
    {
        let node = scene.node_mut(container).unwrap();
        node.set_position(50.0, 50.0);
        node.set_rotation(45.0);
    }
    layout(&mut scene);
    // Inside the rotated square, but in a corner of its axis-aligned box.
    assert_eq!(scene.hit_test_object(Point::new(50.0, 57.0), click(), EventMask::EMPTY), Some(shape));
    assert_eq!(scene.hit_test_object(Point::new(56.0, 51.0), click(), EventMask::EMPTY), None);
}

#[test]
fn masks_limit_the_hit_area() {
    let mut scene = Scene::default();
    let root = scene.root();
    let shape = scene.create_shape(filled(20.0, 20.0));
    let mask = scene.create_shape(filled(10.0, 10.0));
    scene.add_child(root, shape).unwrap();
    scene.set_mask(shape, Some(mask)).unwrap();
    scene.on(shape, EventType::Click, |_, _| {}).unwrap();
    layout(&mut scene);
    assert_eq!(scene.hit_test_object(Point::new(5.0, 5.0), click(), EventMask::EMPTY), Some(shape));
    assert_eq!(scene.hit_test_object(Point::new(15.0, 5.0), click(), EventMask::EMPTY), None);
}

#[test]
fn pointer_dispatch_reaches_the_listener() {
    let mut scene = Scene::default();
    let (_, shape) = group(&mut scene);
    let hits = std::rc::Rc::new(std::cell::Cell::new(0));
    let h = std::rc::Rc::clone(&hits);
    scene
        .on(shape, EventType::Click, move |_, e| {
            assert_eq!(e.stage_point, Point::new(2.0, 3.0));
            h.set(h.get() + 1);
        })
        .unwrap();
    layout(&mut scene);
    assert_eq!(scene.dispatch_pointer(EventType::Click, Point::new(2.0, 3.0)), Some(shape));
    assert_eq!(hits.get(), 1);
    assert_eq!(scene.dispatch_pointer(EventType::Click, Point::new(50.0, 50.0)), None);
}

#[test]
fn inert_leaves_do_not_shadow_listeners_below() {
    let mut scene = Scene::default();
    let root = scene.root();
    let listening = scene.create_shape(filled(10.0, 10.0));
    let inert = scene.create_shape(filled(10.0, 10.0));
    scene.add_child(root, listening).unwrap();
    scene.add_child(root, inert).unwrap();
    let hits = std::rc::Rc::new(std::cell::Cell::new(0));
    let h = std::rc::Rc::clone(&hits);
    scene
        .on(listening, EventType::Click, move |_, _| h.set(h.get() + 1))
        .unwrap();
    layout(&mut scene);

    let p = Point::new(5.0, 5.0);
    assert_eq!(scene.hit_test_object(p, click(), EventMask::EMPTY), Some(listening));
    assert_eq!(scene.hit_test_objects(p, click(), EventMask::EMPTY), vec![listening]);
    assert_eq!(scene.dispatch_pointer(EventType::Click, p), Some(listening));
    assert_eq!(hits.get(), 1);
}

#[test]
fn scaled_bitmaps_recheck_pointers_that_moved_on_screen() {
    use crate::render::surface::ImageSurface;
    use crate::scene::bitmap::Bitmap;

    // 4x2 image, left half opaque.
    let mut data = vec![0u8; 4 * 2 * 4];
    for px in data.chunks_exact_mut(16) {
        px[..8].fill(255);
    }
    let image = std::sync::Arc::new(ImageSurface::from_premul_rgba8(4, 2, data).unwrap());
    let mut scene = Scene::default();
    let root = scene.root();
    let bitmap = scene.create_bitmap(Bitmap::new(image));
    scene.add_child(root, bitmap).unwrap();
    scene.node_mut(bitmap).unwrap().set_scale(10.0, 10.0);
    scene.on(bitmap, EventType::Click, |_, _| {}).unwrap();
    layout(&mut scene);

    assert_eq!(scene.hit_test_object(Point::new(15.0, 5.0), click(), EventMask::EMPTY), Some(bitmap));
    assert_eq!(scene.hit_test_object(Point::new(34.0, 5.0), click(), EventMask::EMPTY), None);
}
