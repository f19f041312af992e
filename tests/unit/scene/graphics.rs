use super::*;

const RED: Color = Color::rgb(255, 0, 0);

#[test]
fn empty_graphics_has_no_bounds() {
    let g = Graphics::new();
    assert!(g.is_empty());
    assert!(g.bounds().is_empty());
    assert!(g.rasterize(1.0).is_none());
}

#[test]
fn unpainted_geometry_has_no_bounds() {
    let g = Graphics::new().rect(0.0, 0.0, 5.0, 5.0);
    assert!(g.bounds().is_empty());
}

#[test]
fn fill_bounds_and_hit_test() {
    let g = Graphics::new().begin_fill(RED).rect(10.0, 20.0, 30.0, 40.0);
    let b = g.bounds();
    assert_eq!(b.to_rect(), Some(Rect::new(10.0, 20.0, 40.0, 60.0)));
    assert!(g.hit_test(Point::new(25.0, 30.0)));
    assert!(!g.hit_test(Point::new(5.0, 30.0)));
}

#[test]
fn stroke_inflates_bounds_and_hits_near_the_line() {
    let g = Graphics::new()
        .begin_stroke(RED, 4.0)
        .move_to(0.0, 0.0)
        .line_to(100.0, 0.0);
    let b = g.bounds();
    assert_eq!(b.min_y, -2.0);
    assert_eq!(b.max_y, 2.0);
    assert!(g.hit_test(Point::new(50.0, 1.5)));
    assert!(!g.hit_test(Point::new(50.0, 3.0)));
}

#[test]
fn style_changes_start_new_paths() {
    let g = Graphics::new()
        .begin_fill(RED)
        .rect(0.0, 0.0, 1.0, 1.0)
        .begin_fill(Color::BLACK)
        .circle(5.0, 5.0, 1.0);
    assert_eq!(g.paths().len(), 2);
    assert_eq!(g.paths()[1].fill, Some(Color::BLACK));
}

#[test]
fn rasterize_covers_the_fill() {
    let g = Graphics::new().begin_fill(RED).rect(2.0, 2.0, 4.0, 4.0);
    let r = g.rasterize(2.0).expect("raster");
    assert_eq!(r.origin, Point::new(2.0, 2.0));
    assert_eq!((r.surface.width(), r.surface.height()), (8, 8));
    assert_eq!(r.surface.pixel(4, 4), Some([255, 0, 0, 255]));
}

#[test]
fn as_rect_recognizes_plain_rectangles_only() {
    let r = Graphics::new().begin_fill(RED).rect(1.0, 2.0, 3.0, 4.0);
    assert_eq!(r.as_rect(), Some(Rect::new(1.0, 2.0, 4.0, 6.0)));
    assert_eq!(Graphics::new().begin_fill(RED).circle(0.0, 0.0, 2.0).as_rect(), None);
    assert_eq!(Graphics::new().begin_stroke(RED, 1.0).rect(0.0, 0.0, 1.0, 1.0).as_rect(), None);
    let two = r.begin_fill(Color::BLACK).rect(0.0, 0.0, 1.0, 1.0);
    assert_eq!(two.as_rect(), None);
}
