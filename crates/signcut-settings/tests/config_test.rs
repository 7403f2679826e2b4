use signcut_settings::{Config, SettingsError};
use signcut_core::{FillDirection, StrategyKind};
use tempfile::tempdir;

#[test]
fn test_json_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("job.json");

    let mut config = Config::default();
    config.sheet.width = 2440.0;
    config.sheet.height = 1220.0;
    config.packing.fill_direction = FillDirection::Horizontal;
    config.import.real_width_cm = Some(80.0);
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_toml_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("job.toml");

    let mut config = Config::default();
    config.packing.strategy = StrategyKind::BestShortSideFit;
    config.hot_wire.preset = "xps_50".to_string();
    config.hot_wire.temperature = Some(750);
    config.save_to_file(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("best_short_side_fit"));

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_unknown_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("job.yaml");
    let err = Config::default().save_to_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::UnsupportedFormat(_)));
}

#[test]
fn test_invalid_file_fails_validation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"sheet": {"width": -5.0}}"#).unwrap();
    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidSetting { .. }));
}

#[test]
fn test_load_or_default_missing_file() {
    let dir = tempdir().unwrap();
    let config = Config::load_or_default(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}
