use super::*;

fn arch() -> GuidePath {
    GuidePath::new(vec![
        Point::new(0.0, 0.0),
        Point::new(100.0, 100.0),
        Point::new(200.0, 0.0),
    ])
    .unwrap()
}

fn corner() -> GuidePath {
    GuidePath::new(vec![
        Point::new(0.0, 0.0),
        Point::new(100.0, 0.0),
        Point::new(100.0, 100.0),
    ])
    .unwrap()
}

#[test]
fn point_count_is_validated() {
    assert!(GuidePath::new(vec![Point::ZERO, Point::ZERO]).is_err());
    assert!(GuidePath::new(vec![Point::ZERO; 4]).is_err());
    assert_eq!(GuidePath::new(vec![Point::ZERO; 5]).unwrap().segment_count(), 2);
}

#[test]
fn straight_path_length_is_exact() {
    let p = GuidePath::new(vec![
        Point::new(0.0, 0.0),
        Point::new(50.0, 0.0),
        Point::new(100.0, 0.0),
    ])
    .unwrap();
    let t = ArcTable::build(&p, 4.0, 16);
    assert_eq!(t.leaf_count(), 1);
    assert!((t.total_length() - 100.0).abs() < 1e-6);
}

#[test]
fn bisection_respects_the_leaf_cap() {
    let sharp = GuidePath::new(vec![
        Point::new(0.0, 0.0),
        Point::new(500.0, 1000.0),
        Point::new(1.0, 0.0),
    ])
    .unwrap();
    assert!(ArcTable::build(&sharp, 0.001, 16).leaf_count() <= 16);
    assert_eq!(ArcTable::build(&sharp, 0.001, 1).leaf_count(), 1);
    assert!(ArcTable::build(&arch(), 4.0, 16).leaf_count() > 1);
}

#[test]
fn samples_are_evenly_spaced_by_arc_length() {
    let path = arch();
    let table = ArcTable::build(&path, 4.0, 16);
    let s = GuideSamples::build(&path, &table, 21);
    assert_eq!(s.len(), 21);
    assert_eq!(s.samples()[0].point, Point::new(0.0, 0.0));
    let end = s.last().point;
    assert!((end - Point::new(200.0, 0.0)).hypot() < 1e-6);

    let steps: Vec<f64> = s
        .samples()
        .windows(2)
        .map(|w| w[0].point.distance(w[1].point))
        .collect();
    let mean = steps.iter().sum::<f64>() / steps.len() as f64;
    for (i, d) in steps.iter().enumerate() {
        assert!((d - mean).abs() / mean < 0.03, "step {i}: {d} vs mean {mean}");
    }
}

#[test]
fn range_and_direction() {
    let path = arch().with_range(1.0, 0.0);
    let table = ArcTable::build(&path, 4.0, 16);
    let s = GuideSamples::build(&path, &table, 5);
    assert!((s.samples()[0].point - Point::new(200.0, 0.0)).hypot() < 1e-6);
    assert!(s.last().point.distance(Point::ZERO) < 1e-6);

    let half = arch().with_range(0.0, 0.5);
    let s = GuideSamples::build(&half, &ArcTable::build(&half, 4.0, 16), 3);
    assert!((s.last().point - Point::new(100.0, 50.0)).hypot() < 1e-6);
}

#[test]
fn orientation_modes() {
    let angles = |o: Orientation| {
        let p = corner().with_orientation(o);
        let t = ArcTable::build(&p, 4.0, 16);
        GuideSamples::build(&p, &t, 9)
    };
    let none = angles(Orientation::None);
    assert!(!none.oriented());
    assert!(none.samples().iter().all(|s| s.angle == 0.0));

    let auto = angles(Orientation::Auto);
    assert!(auto.samples()[0].angle.abs() < 1e-9);
    assert!((auto.last().angle - 90.0).abs() < 1e-6);

    let cw = angles(Orientation::Cw);
    assert!(cw.samples().windows(2).all(|w| w[1].angle >= w[0].angle));
    assert!((cw.last().angle - 90.0).abs() < 1e-6);

    let ccw = angles(Orientation::Ccw);
    assert!(ccw.samples().windows(2).all(|w| w[1].angle <= w[0].angle));
    assert!((ccw.last().angle + 270.0).abs() < 1e-6);
}

#[test]
fn sample_interpolates_between_frames() {
    let path = arch();
    let s = GuideSamples::build(&path, &ArcTable::build(&path, 4.0, 16), 3);
    let mid = s.sample(0.25);
    let want = s.samples()[0].point.lerp(s.samples()[1].point, 0.5);
    assert!((mid.point - want).hypot() < 1e-9);
    assert_eq!(s.sample(-1.0).point, s.samples()[0].point);
    assert_eq!(s.sample(2.0).point, s.last().point);
}
