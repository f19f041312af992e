use std::cell::{Cell, RefCell};

use super::*;

use crate::animation::guide::Orientation;
use crate::animation::property::PropertyId;
use crate::geom::Point;
use crate::scene::graphics::Graphics;

fn scene_with_node() -> (Scene, NodeId) {
    let mut scene = Scene::default();
    let node = scene.create_shape(Graphics::new());
    (scene, node)
}

fn x_of(scene: &Scene, id: NodeId) -> f64 {
    scene.node(id).unwrap().params().x
}

#[test]
fn linear_move_reaches_its_target_exactly() {
    let (mut scene, node) = scene_with_node();
    let mut tween = Tween::get(&scene, node)
        .unwrap()
        .to(Props::new().x(100.0), 10.0, Ease::Linear)
        .unwrap();
    for _ in 0..5 {
        tween.advance(&mut scene, 1.0);
    }
    assert!((x_of(&scene, node) - 50.0).abs() < 1e-9);
    for _ in 0..5 {
        tween.advance(&mut scene, 1.0);
    }
    assert_eq!(x_of(&scene, node), 100.0);
    assert!(tween.is_complete());

    tween.advance(&mut scene, 3.0);
    assert_eq!(x_of(&scene, node), 100.0, "clamped past the end");
}

#[test]
fn chained_steps_start_where_the_previous_ended() {
    let (mut scene, node) = scene_with_node();
    let mut tween = Tween::get(&scene, node)
        .unwrap()
        .to(Props::new().x(10.0), 4.0, Ease::Linear)
        .unwrap()
        .wait(2.0)
        .to(Props::new().y(20.0), 4.0, Ease::Linear)
        .unwrap();
    assert_eq!(tween.duration(), 10.0);
    assert_eq!(tween.end_values().number(PropertyId::X), 10.0);
    assert_eq!(tween.end_values().number(PropertyId::Y), 20.0);

    tween.set_position(&mut scene, 5.0, true);
    assert_eq!(x_of(&scene, node), 10.0);
    assert_eq!(scene.node(node).unwrap().params().y, 0.0);

    tween.set_position(&mut scene, 8.0, true);
    let params = *scene.node(node).unwrap().params();
    assert_eq!(params.x, 10.0);
    assert!((params.y - 10.0).abs() < 1e-9);
}

#[test]
fn seeking_backwards_restores_earlier_values() {
    let (mut scene, node) = scene_with_node();
    let mut tween = Tween::get(&scene, node)
        .unwrap()
        .to(Props::new().x(10.0), 2.0, Ease::Linear)
        .unwrap()
        .to(Props::new().alpha(0.0), 2.0, Ease::Linear)
        .unwrap();
    tween.set_position(&mut scene, 4.0, true);
    assert_eq!(scene.node(node).unwrap().alpha(), 0.0);

    tween.set_position(&mut scene, 1.0, true);
    let n = scene.node(node).unwrap();
    assert_eq!(n.alpha(), 1.0);
    assert!((n.params().x - 5.0).abs() < 1e-9);
}

#[test]
fn actions_fire_once_on_forward_playback() {
    let (mut scene, node) = scene_with_node();
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let mut tween = Tween::get(&scene, node)
        .unwrap()
        .wait(3.0)
        .call(move |_| h.set(h.get() + 1))
        .wait(3.0);

    tween.advance(&mut scene, 1.0);
    tween.advance(&mut scene, 1.0);
    assert_eq!(hits.get(), 0);
    tween.advance(&mut scene, 1.0);
    assert_eq!(hits.get(), 1);
    tween.advance(&mut scene, 2.0);
    assert_eq!(hits.get(), 1);

    // Seeks never fire actions.
    tween.set_position(&mut scene, 3.0, true);
    assert_eq!(hits.get(), 1);
}

#[test]
fn actions_at_zero_fire_on_the_first_positioning() {
    let (mut scene, node) = scene_with_node();
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let mut tween = Tween::get(&scene, node)
        .unwrap()
        .call(move |_| h.set(h.get() + 1))
        .wait(2.0);
    tween.set_position(&mut scene, 0.0, false);
    assert_eq!(hits.get(), 1);
    tween.set_position(&mut scene, 0.0, false);
    assert_eq!(hits.get(), 1);
}

#[test]
fn looping_tween_wraps_and_fires_across_the_seam() {
    let (mut scene, node) = scene_with_node();
    let order = Rc::new(RefCell::new(Vec::new()));
    let (a, b) = (Rc::clone(&order), Rc::clone(&order));
    let mut tween = Tween::get(&scene, node)
        .unwrap()
        .to(Props::new().x(40.0), 4.0, Ease::Linear)
        .unwrap()
        .call(move |_| a.borrow_mut().push("end"))
        .with_loop(true);
    tween.actions.insert(
        0,
        ActionEntry {
            time: 1.0,
            action: Rc::new(move |_| b.borrow_mut().push("one")),
        },
    );

    tween.set_position(&mut scene, 3.0, false);
    tween.set_position(&mut scene, 5.0, false);
    assert_eq!(tween.position(), 1.0);
    assert!((x_of(&scene, node) - 10.0).abs() < 1e-9);
    assert_eq!(*order.borrow(), vec!["one", "end", "one"]);
    assert!(!tween.is_complete());
}

#[test]
fn paused_tweens_hold_still() {
    let (mut scene, node) = scene_with_node();
    let mut tween = Tween::get(&scene, node)
        .unwrap()
        .to(Props::new().x(10.0), 10.0, Ease::Linear)
        .unwrap();
    tween.set_paused(true);
    tween.advance(&mut scene, 5.0);
    assert_eq!(tween.position(), 0.0);
    assert_eq!(x_of(&scene, node), 0.0);
}

#[test]
fn resumed_tweens_continue_where_they_left_off() {
    let build = |scene: &Scene, node| {
        Tween::get(scene, node)
            .unwrap()
            .to(Props::new().x(100.0).alpha(0.2), 10.0, Ease::InOutQuad)
            .unwrap()
            .to(Props::new().y(-40.0), 6.0, Ease::OutBack)
            .unwrap()
    };
    let (mut scene, node) = scene_with_node();
    let mut paused = build(&scene, node);
    let (mut reference_scene, reference_node) = scene_with_node();
    let mut reference = build(&reference_scene, reference_node);

    for _ in 0..3 {
        paused.advance(&mut scene, 1.0);
    }
    paused.set_paused(true);
    let held = *scene.node(node).unwrap().params();
    for _ in 0..7 {
        paused.advance(&mut scene, 1.5);
    }
    assert_eq!(*scene.node(node).unwrap().params(), held);
    paused.set_paused(false);
    for _ in 0..9 {
        paused.advance(&mut scene, 1.0);
    }

    for _ in 0..12 {
        reference.advance(&mut reference_scene, 1.0);
    }
    assert_eq!(paused.position(), reference.position());
    assert_eq!(
        scene.node(node).unwrap().params(),
        reference_scene.node(reference_node).unwrap().params()
    );
    assert_eq!(
        scene.node(node).unwrap().alpha(),
        reference_scene.node(reference_node).unwrap().alpha()
    );
}

#[test]
fn rejects_bad_steps_and_gone_targets() {
    let (mut scene, node) = scene_with_node();
    let tween = Tween::get(&scene, node).unwrap();
    assert!(tween.to(Props::new().x(1.0), -1.0, Ease::Linear).is_err());

    scene.destroy(node);
    assert!(Tween::get(&scene, node).is_err());
}

#[test]
fn guided_motion_follows_the_path() {
    let (mut scene, node) = scene_with_node();
    let path = GuidePath::new(vec![
        Point::new(0.0, 0.0),
        Point::new(50.0, 0.0),
        Point::new(100.0, 0.0),
    ])
    .unwrap()
    .with_orientation(Orientation::Fixed);
    let mut tween = Tween::get(&scene, node)
        .unwrap()
        .to_along(&path, Props::new(), 10.0, Ease::Linear)
        .unwrap();
    tween.set_position(&mut scene, 5.0, true);
    let p = *scene.node(node).unwrap().params();
    assert!((p.x - 50.0).abs() < 1.0);
    assert!(p.y.abs() < 1e-9);

    tween.set_position(&mut scene, 10.0, true);
    assert!((x_of(&scene, node) - 100.0).abs() < 1e-6);
}
