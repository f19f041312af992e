use super::*;

use crate::animation::ease::Ease;
use crate::animation::property::Props;
use crate::render::recording::RecordingRenderer;
use crate::render::surface::Color;
use crate::scene::graphics::Graphics;

fn shape(scene: &mut Scene) -> NodeId {
    scene.create_shape(Graphics::new().begin_fill(Color::BLACK).rect(0.0, 0.0, 10.0, 10.0))
}

fn slide(scene: &Scene, target: NodeId) -> Tween {
    Tween::get(scene, target)
        .unwrap()
        .to(Props::new().x(240.0).alpha(0.0), 24.0, Ease::InOutQuad)
        .unwrap()
}

/// Clip under the root holding one sliding shape.
fn clip_scene(clip: MovieClip) -> (Scene, NodeId, NodeId) {
    let mut scene = Scene::default();
    let target = shape(&mut scene);
    let tween = slide(&scene, target);
    let clip = scene.create_movie_clip(clip.with_tween(tween));
    let root = scene.root();
    scene.add_child(root, clip).unwrap();
    (scene, clip, target)
}

fn run_frames(scene: &mut Scene, renderer: &mut RecordingRenderer, times: std::ops::RangeInclusive<u32>) {
    for t in times {
        scene.layout(renderer, f64::from(t));
    }
}

#[test]
fn resolves_labels_and_frames() {
    let clip = MovieClip::default().with_label("mid", 12.0);
    assert!(clip.resolve(&"nope".into()).is_err());
    assert!(clip.resolve(&FrameTarget::Frame(f64::NAN)).is_err());
    // Empty timeline: everything clamps to frame 0.
    assert_eq!(clip.resolve(&"mid".into()).unwrap(), 0.0);
}

#[test]
fn first_layout_attaches_tween_targets() {
    let (mut scene, clip, target) = clip_scene(MovieClip::default());
    let mut r = RecordingRenderer::new(100, 100);
    scene.layout(&mut r, 0.0);
    assert_eq!(scene.parent(target), Some(clip));
    assert_eq!(scene.movie_clip(clip).unwrap().duration(), 24.0);
    assert_eq!(scene.node(target).unwrap().params().x, 0.0);
}

#[test]
fn independent_clips_step_one_frame_per_distinct_time() {
    let (mut scene, clip, _) = clip_scene(MovieClip::default());
    let mut r = RecordingRenderer::new(100, 100);
    run_frames(&mut scene, &mut r, 0..=3);
    scene.layout(&mut r, 3.0);
    assert_eq!(scene.movie_clip(clip).unwrap().position(), 3.0);
}

#[test]
fn goto_label_matches_a_fresh_seek() {
    let (mut scene, clip, target) = clip_scene(MovieClip::default().with_label("mid", 12.0));
    let mut r = RecordingRenderer::new(100, 100);
    run_frames(&mut scene, &mut r, 0..=4);
    scene.goto_and_stop(clip, "mid").unwrap();

    let mut fresh_scene = Scene::default();
    let fresh_target = shape(&mut fresh_scene);
    let mut fresh = slide(&fresh_scene, fresh_target);
    fresh.set_position(&mut fresh_scene, 12.0, true);

    let got = scene.node(target).unwrap();
    let want = fresh_scene.node(fresh_target).unwrap();
    assert_eq!(got.params(), want.params());
    assert_eq!(got.alpha(), want.alpha());

    let c = scene.movie_clip(clip).unwrap();
    assert!(c.is_paused());
    assert_eq!(c.current_label(), Some("mid"));

    // Stopped clips hold their frame.
    run_frames(&mut scene, &mut r, 5..=8);
    assert_eq!(scene.movie_clip(clip).unwrap().position(), 12.0);
}

#[test]
fn looping_clips_wrap_after_the_last_frame() {
    let (mut scene, clip, target) = clip_scene(MovieClip::default());
    let mut r = RecordingRenderer::new(100, 100);
    run_frames(&mut scene, &mut r, 0..=24);
    assert_eq!(scene.movie_clip(clip).unwrap().position(), 24.0);
    assert_eq!(scene.node(target).unwrap().params().x, 240.0);

    scene.layout(&mut r, 25.0);
    assert_eq!(scene.movie_clip(clip).unwrap().position(), 0.0);
    assert_eq!(scene.node(target).unwrap().params().x, 0.0);
}

#[test]
fn non_looping_clips_stop_at_the_end() {
    let (mut scene, clip, _) = clip_scene(MovieClip::new(PlayMode::Independent, 0.0, false));
    let mut r = RecordingRenderer::new(100, 100);
    run_frames(&mut scene, &mut r, 0..=30);
    assert_eq!(scene.movie_clip(clip).unwrap().position(), 24.0);
}

#[test]
fn single_frame_clips_hold_their_start_position() {
    let (mut scene, clip, target) = clip_scene(MovieClip::new(PlayMode::Single, 6.0, true));
    let mut r = RecordingRenderer::new(100, 100);
    run_frames(&mut scene, &mut r, 0..=5);
    assert_eq!(scene.movie_clip(clip).unwrap().position(), 6.0);
    assert!(scene.node(target).unwrap().params().x > 0.0);
}

#[test]
fn off_property_attaches_and_detaches_targets() {
    let mut scene = Scene::default();
    let always = shape(&mut scene);
    let late = shape(&mut scene);
    let first = slide(&scene, always);
    let second = Tween::get(&scene, late)
        .unwrap()
        .set(Props::new().off(true))
        .unwrap()
        .wait(5.0)
        .set(Props::new().off(false))
        .unwrap();
    let clip = scene.create_movie_clip(MovieClip::default().with_tween(first).with_tween(second));
    let root = scene.root();
    scene.add_child(root, clip).unwrap();

    let mut r = RecordingRenderer::new(100, 100);
    scene.layout(&mut r, 0.0);
    assert_eq!(scene.children(clip), &[always]);
    assert_eq!(scene.parent(late), None);

    run_frames(&mut scene, &mut r, 1..=5);
    assert_eq!(scene.children(clip), &[always, late]);

    scene.goto_and_stop(clip, 2.0).unwrap();
    assert_eq!(scene.children(clip), &[always]);
}

#[test]
fn stop_from_a_timeline_action_is_applied_after_the_update() {
    let mut scene = Scene::default();
    let target = shape(&mut scene);
    let clip = scene.create_movie_clip(MovieClip::default());
    let root = scene.root();
    scene.add_child(root, clip).unwrap();
    let tween = Tween::get(&scene, target)
        .unwrap()
        .wait(5.0)
        .call(move |scene| {
            scene.goto_and_stop(clip, 5.0).unwrap();
        })
        .wait(5.0);
    scene.add_timeline_tween(clip, tween).unwrap();

    let mut r = RecordingRenderer::new(100, 100);
    run_frames(&mut scene, &mut r, 0..=8);
    let c = scene.movie_clip(clip).unwrap();
    assert!(c.is_paused());
    assert_eq!(c.position(), 5.0);
}

#[test]
fn synched_clips_follow_their_parent() {
    let mut scene = Scene::default();
    let (outer, inner) = (shape(&mut scene), shape(&mut scene));
    let parent_tween = slide(&scene, outer);
    let child_tween = slide(&scene, inner);
    let parent = scene.create_movie_clip(MovieClip::default().with_tween(parent_tween));
    let child = scene.create_movie_clip(
        MovieClip::new(PlayMode::Synched, 2.0, true).with_tween(child_tween),
    );
    let root = scene.root();
    scene.add_child(root, parent).unwrap();
    scene.add_child(parent, child).unwrap();

    let mut r = RecordingRenderer::new(100, 100);
    scene.layout(&mut r, 0.0);
    // The start position shows first, whatever frame the parent is on.
    assert_eq!(scene.movie_clip(child).unwrap().position(), 2.0);

    run_frames(&mut scene, &mut r, 1..=6);
    assert_eq!(scene.movie_clip(parent).unwrap().position(), 6.0);
    assert_eq!(scene.movie_clip(child).unwrap().position(), 8.0);

    // Re-attaching anchors the clip to the parent's current frame again.
    assert!(scene.remove_child(parent, child));
    scene.add_child(parent, child).unwrap();
    scene.layout(&mut r, 7.0);
    assert_eq!(scene.movie_clip(parent).unwrap().position(), 7.0);
    assert_eq!(scene.movie_clip(child).unwrap().position(), 2.0);
    scene.layout(&mut r, 8.0);
    assert_eq!(scene.movie_clip(child).unwrap().position(), 3.0);
}

#[test]
fn synched_and_single_clips_agree_on_the_start_position() {
    let mut scene = Scene::default();
    let (outer, a, b) = (shape(&mut scene), shape(&mut scene), shape(&mut scene));
    let parent_tween = slide(&scene, outer);
    let (synched_tween, single_tween) = (slide(&scene, a), slide(&scene, b));
    let parent = scene.create_movie_clip(MovieClip::default().with_tween(parent_tween));
    let synched = scene.create_movie_clip(
        MovieClip::new(PlayMode::Synched, 5.0, false).with_tween(synched_tween),
    );
    let single = scene.create_movie_clip(
        MovieClip::new(PlayMode::Single, 5.0, false).with_tween(single_tween),
    );
    let root = scene.root();
    scene.add_child(root, parent).unwrap();
    scene.add_child(parent, synched).unwrap();
    scene.add_child(parent, single).unwrap();

    let mut r = RecordingRenderer::new(100, 100);
    scene.layout(&mut r, 0.0);
    assert_eq!(scene.movie_clip(parent).unwrap().position(), 0.0);
    assert_eq!(scene.movie_clip(synched).unwrap().position(), 5.0);
    assert_eq!(scene.movie_clip(single).unwrap().position(), 5.0);
    assert_eq!(
        scene.node(a).unwrap().params().x,
        scene.node(b).unwrap().params().x
    );
}

#[test]
fn setting_the_play_mode_forces_a_seek() {
    let mut clip = MovieClip::default();
    clip.needs_seek = false;
    clip.set_mode(PlayMode::Independent);
    assert!(!clip.needs_seek);
    clip.set_mode(PlayMode::Single);
    assert!(clip.needs_seek);
}
