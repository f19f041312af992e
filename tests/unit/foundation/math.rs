use super::*;

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(0, 200), 0);
    assert_eq!(mul_div255_u8(255, 128), 128);
}

#[test]
fn quarter_turns_are_exact() {
    assert_eq!(sin_cos_deg(90.0), (1.0, 0.0));
    assert_eq!(sin_cos_deg(-90.0), (-1.0, 0.0));
    assert_eq!(sin_cos_deg(540.0), (0.0, -1.0));
    let (s, c) = sin_cos_deg(30.0);
    assert!((s - 0.5).abs() < 1e-12);
    assert!((c - 3f64.sqrt() / 2.0).abs() < 1e-12);
}

#[test]
fn normalize_turn_wraps_into_half_turns() {
    assert_eq!(normalize_turn(270.0), -90.0);
    assert_eq!(normalize_turn(-270.0), 90.0);
    assert_eq!(normalize_turn(180.0), 180.0);
    assert_eq!(normalize_turn(10.0), 10.0);
}

#[test]
fn premultiply_round_trips_opaque_and_clears_transparent() {
    let mut px = vec![200, 100, 50, 255, 9, 9, 9, 0, 255, 0, 0, 128];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[..4], &[200, 100, 50, 255]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    assert_eq!(&px[8..], &[128, 0, 0, 128]);
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[8..], &[255, 0, 0, 128]);
}
