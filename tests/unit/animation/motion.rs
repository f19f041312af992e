use super::*;
use crate::animation::guide::{ArcTable, GuidePath, Orientation};
use crate::geom::Point;

fn first(targets: &Props, duration: f64) -> TweenMotion {
    TweenMotion::chain(
        PropertyValues::default(),
        PropertyMask::EMPTY,
        0.0,
        duration,
        targets,
        Ease::Linear,
    )
    .unwrap()
}

#[test]
fn numeric_slots_interpolate_linearly() {
    let m = first(&Props::new().x(100.0).alpha(0.0), 10.0);
    let mut v = PropertyValues::default();
    let written = m.interpolate(5.0, false, &mut v);
    assert_eq!(v.number(PropertyId::X), 50.0);
    assert_eq!(v.number(PropertyId::Alpha), 0.5);
    assert!(written.contains(PropertyId::X) && written.contains(PropertyId::Alpha));
    assert!(!written.contains(PropertyId::Y));
}

#[test]
fn endpoints_are_exact_for_every_ease() {
    for ease in Ease::ALL {
        let m = TweenMotion::chain(
            PropertyValues::default(),
            PropertyMask::EMPTY,
            2.0,
            7.0,
            &Props::new().x(0.3),
            ease,
        )
        .unwrap();
        let mut v = PropertyValues::default();
        m.interpolate(9.0, false, &mut v);
        assert_eq!(v.number(PropertyId::X), 0.3, "{ease:?}");
        m.interpolate(2.0, false, &mut v);
        assert_eq!(v.number(PropertyId::X), 0.0, "{ease:?}");
    }
}

#[test]
fn step_slots_switch_at_the_end_only() {
    let m = first(&Props::new().visible(false), 4.0);
    let mut v = PropertyValues::default();

    assert!(m.interpolate(0.0, false, &mut v).contains(PropertyId::Visible));
    assert!(v.flag(PropertyId::Visible));

    // Mid-motion, non-seek: untouched.
    v.set(PropertyId::Visible, false.into());
    assert!(!m.interpolate(2.0, false, &mut v).contains(PropertyId::Visible));
    assert!(!v.flag(PropertyId::Visible));

    // Mid-motion seek: reset to `from`.
    m.interpolate(2.0, true, &mut v);
    assert!(v.flag(PropertyId::Visible));

    m.interpolate(4.0, false, &mut v);
    assert!(!v.flag(PropertyId::Visible));
}

#[test]
fn zero_length_motion_jumps_to_target() {
    let m = first(&Props::new().x(5.0), 0.0);
    assert_eq!(m.ratio(0.0), 1.0);
    assert_eq!(m.ratio(-1.0), 0.0);
    assert_eq!(m.end_values().number(PropertyId::X), 5.0);
}

#[test]
fn chained_masks_only_grow() {
    let a = first(&Props::new().x(10.0), 5.0);
    let b = TweenMotion::chain(
        a.end_values(),
        a.mask(),
        5.0,
        5.0,
        &Props::new().alpha(0.0),
        Ease::Linear,
    )
    .unwrap();
    assert!(b.mask().is_superset(a.mask()));
    assert!(b.mask().contains(PropertyId::Alpha));

    // A seek into the second motion restores the first motion's end value for X.
    let mut v = PropertyValues::default();
    v.set(PropertyId::X, 999.0.into());
    let written = b.interpolate(6.0, true, &mut v);
    assert_eq!(written, b.mask());
    assert_eq!(v.number(PropertyId::X), 10.0);
    assert!((v.number(PropertyId::Alpha) - 0.8).abs() < 1e-12);
}

#[test]
fn mismatched_values_and_bad_durations_are_rejected() {
    let bad = Props::new().with(PropertyId::X, true);
    let base = PropertyValues::default;
    assert!(
        TweenMotion::chain(base(), PropertyMask::EMPTY, 0.0, 1.0, &bad, Ease::Linear).is_err()
    );
    let ok = Props::new().x(1.0);
    assert!(
        TweenMotion::chain(base(), PropertyMask::EMPTY, 0.0, -1.0, &ok, Ease::Linear).is_err()
    );
    assert!(
        TweenMotion::chain(base(), PropertyMask::EMPTY, 0.0, f64::NAN, &ok, Ease::Linear)
            .is_err()
    );
}

#[test]
fn guide_drives_position_and_rotation() {
    let path = GuidePath::new(vec![
        Point::new(0.0, 0.0),
        Point::new(50.0, 0.0),
        Point::new(100.0, 0.0),
    ])
    .unwrap()
    .with_orientation(Orientation::Auto);
    let table = ArcTable::build(&path, 4.0, 16);
    let samples = Arc::new(GuideSamples::build(&path, &table, 11));
    let m = first(&Props::new().rotation(10.0), 10.0).with_guide(samples);
    assert!(m.mask().contains(PropertyId::Y));

    let mut v = PropertyValues::default();
    m.interpolate(5.0, false, &mut v);
    assert!((v.number(PropertyId::X) - 50.0).abs() < 1e-6);
    assert!((v.number(PropertyId::Rotation) - 5.0).abs() < 1e-9);

    let end = m.end_values();
    assert!((end.number(PropertyId::X) - 100.0).abs() < 1e-6);
    assert!((end.number(PropertyId::Rotation) - 10.0).abs() < 1e-9);
}
