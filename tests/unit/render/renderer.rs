use super::*;
use crate::render::recording::{RecordingRenderer, RenderCall};

#[test]
fn create_renderer_reports_unavailable_targets() {
    assert!(create_renderer(BackendKind::Cpu, &RenderSettings::new(0, 0)).is_none());
    let cpu = create_renderer(BackendKind::Cpu, &RenderSettings::new(16, 8)).expect("cpu");
    assert_eq!(cpu.size(), (16, 8));
    assert!(cpu.caps().supports_multiply);
    assert!(create_renderer(BackendKind::Recording, &RenderSettings::new(0, 0)).is_some());
}

#[test]
fn draw_video_defaults_to_image_draws() {
    let mut r = RecordingRenderer::new(4, 4);
    let frame = ImageSurface::new(2, 2);
    let dst = Rect::new(0.0, 0.0, 2.0, 2.0);
    r.draw_video(&frame, None, dst);
    r.draw_video(&frame, Some(Rect::new(0.0, 0.0, 1.0, 1.0)), dst);
    assert!(matches!(r.calls()[0], RenderCall::DrawCanvas { .. }));
    assert!(matches!(r.calls()[1], RenderCall::DrawPartial { .. }));
}

#[test]
fn documented_no_ops_do_nothing() {
    let mut r = crate::render::cpu::CpuRenderer::new(&RenderSettings::new(2, 2)).unwrap();
    r.begin_frame();
    r.set_cursor("pointer");
    r.draw_text(&Text::new("hello"));
    assert!(r.frame_data().iter().all(|b| *b == 0));
    assert_eq!(r.measure_text(&Text::new("hello")), None);
}

#[test]
fn recording_counts_uncache_per_image() {
    let mut r = RecordingRenderer::new(1, 1);
    let a = ImageId(41);
    r.uncache(a);
    r.uncache(a);
    r.uncache(ImageId(42));
    assert_eq!(r.uncache_count(a), 2);
    assert_eq!(r.total_uncached(), 3);
}
