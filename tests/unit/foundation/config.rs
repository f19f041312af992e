use super::*;

#[test]
fn partial_json_fills_defaults() {
    let cfg = RuntimeConfig::from_reader(r#"{"fps": 30}"#.as_bytes()).unwrap();
    assert_eq!(cfg.fps, 30.0);
    assert_eq!(cfg.hit_proximity_sq, HIT_PROXIMITY_SQ);
    assert_eq!(cfg.guide_max_subdivisions, GUIDE_MAX_SUBDIVISIONS);
    assert!(cfg.release_on_detach);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(RuntimeConfig::from_reader(r#"{"fps": 0}"#.as_bytes()).is_err());
    assert!(RuntimeConfig::from_reader(r#"{"guide_tolerance": -1}"#.as_bytes()).is_err());
    assert!(RuntimeConfig::from_reader("not json".as_bytes()).is_err());
}

#[test]
fn frame_interval_follows_fps() {
    let cfg = RuntimeConfig {
        fps: 40.0,
        ..RuntimeConfig::default()
    };
    assert_eq!(cfg.frame_interval_ms(), 25.0);
}
