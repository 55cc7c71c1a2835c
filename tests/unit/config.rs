use super::*;

#[test]
fn defaults_disable_tiling() {
    let cfg = TileStoreConfig::default();
    assert_eq!(cfg.tile_count, 0);
    assert!(!cfg.tiling_enabled());
    assert_eq!(cfg.tile_size, IntSize::new(512, 512));
    cfg.validate().unwrap();
}

#[test]
fn partial_json_fills_defaults() {
    let cfg = TileStoreConfig::from_json_str(
        r#"{ "tile_count": 6, "tile_size": { "width": 256, "height": 128 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.tile_count, 6);
    assert_eq!(cfg.tile_size, IntSize::new(256, 128));
    assert_eq!(cfg.min_visible_tile_margin, 1);
    assert_eq!(cfg.pressure, PressurePolicy::default());
}

#[test]
fn empty_tile_size_is_rejected() {
    let err = TileStoreConfig::from_json_str(r#"{ "tile_size": { "width": 0, "height": 64 } }"#)
        .unwrap_err();
    assert!(err.to_string().contains("tile_size"));
}

#[test]
fn malformed_json_is_a_config_error() {
    let err = TileStoreConfig::from_json_str("{ nope").unwrap_err();
    assert!(matches!(err, TileStoreError::Config(_)));
}

#[test]
fn missing_file_reports_path() {
    let err = TileStoreConfig::from_path("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.json"));
}

#[test]
fn durations_follow_millis() {
    let cfg = TileStoreConfig {
        fallback_timeout_ms: 250,
        tick_interval_ms: 20,
        ..TileStoreConfig::default()
    };
    assert_eq!(cfg.fallback_timeout(), Duration::from_millis(250));
    assert_eq!(cfg.tick_interval(), Duration::from_millis(20));
}
