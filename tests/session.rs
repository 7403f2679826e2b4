use signcut::{CamSession, Config};
use signcut_core::{EmitError, Error, PackError};
use tempfile::tempdir;

const TWO_SQUARES: &str = r#"<svg viewBox="0 0 200 100">
  <rect x="10" y="10" width="20" height="20"/>
  <rect x="100" y="10" width="40" height="40"/>
</svg>"#;

const ONE_SQUARE: &str = r#"<svg viewBox="0 0 100 100">
  <rect x="40" y="40" width="10" height="10"/>
</svg>"#;

#[test]
fn test_load_replaces_previous_drawing() {
    let mut session = CamSession::default();
    session.load_svg(TWO_SQUARES).unwrap();
    session.pack().unwrap();
    assert_eq!(session.parts().len(), 2);
    assert!(session.layout().is_some());

    session.load_svg(ONE_SQUARE).unwrap();
    assert_eq!(session.parts().len(), 1);
    assert!(session.layout().is_none());
    assert_eq!(session.svg(), Some(ONE_SQUARE));
}

#[test]
fn test_failed_load_leaves_session_empty() {
    let mut session = CamSession::default();
    session.load_svg(TWO_SQUARES).unwrap();
    assert!(session.load_svg("not an svg document").is_err());
    assert!(!session.is_loaded());
    assert!(session.svg().is_none());
    assert!(session.parts().is_empty());
}

#[test]
fn test_repack_replaces_sheets() {
    let mut session = CamSession::default();
    session.load_svg(TWO_SQUARES).unwrap();
    let first = session.pack().unwrap().sheets.len();

    let mut config = session.config().clone();
    config.sheet.width = 50.0;
    config.sheet.height = 50.0;
    config.sheet.gap = 0.0;
    session.set_config(config);
    let second = session.pack().unwrap();

    assert_eq!(first, 1);
    assert_eq!(second.sheets.len(), 2);
    assert!(second.is_complete());
}

#[test]
fn test_real_width_scaling() {
    let mut config = Config::default();
    config.import.real_width_cm = Some(20.0);
    let mut session = CamSession::new(config);
    let outcome = session
        .load_svg(
            r#"<svg viewBox="0 0 100 50">
  <rect x="10" y="10" width="20" height="20"/>
</svg>"#,
        )
        .unwrap();
    assert!((outcome.scale_factor - 2.0).abs() < 1e-12);

    let part = &outcome.parts[0];
    assert!((part.w() - 40.0).abs() < 1e-9);
    assert!((part.h() - 40.0).abs() < 1e-9);
    assert!((part.original_bbox.w - 20.0).abs() < 1e-9);
}

#[test]
fn test_router_block_per_part() {
    let mut session = CamSession::default();
    session.load_svg(TWO_SQUARES).unwrap();
    let sheets = session.pack().unwrap().sheets.len();
    assert_eq!(sheets, 1);

    let gcode = session.router_gcode(1).unwrap();
    assert!(gcode.starts_with("%\n"));
    assert!(gcode.ends_with("M30\n%\n"));
    assert_eq!(gcode.lines().filter(|l| *l == "M3").count(), 2);
}

#[test]
fn test_ecocut_mode_uses_single_plunge() {
    let mut config = Config::default();
    config.toolpath.ecocut = true;
    let mut session = CamSession::new(config);
    session.load_svg(TWO_SQUARES).unwrap();
    session.pack().unwrap();

    let gcode = session.router_gcode(1).unwrap();
    assert_eq!(gcode.lines().filter(|l| *l == "M3").count(), 1);
    assert!(gcode.contains("(Continuous path)"));
}

#[test]
fn test_hot_wire_uses_configured_preset() {
    let mut config = Config::default();
    config.hot_wire.preset = "xps_50".to_string();
    let mut session = CamSession::new(config);
    session.load_svg(ONE_SQUARE).unwrap();
    session.pack().unwrap();

    let program = session.hot_wire(1).unwrap();
    assert!(program.gcode.contains("M3 S800"));
    assert_eq!(program.stats.paths, 1);
}

#[test]
fn test_unknown_sheet_is_reported() {
    let mut session = CamSession::default();
    session.load_svg(ONE_SQUARE).unwrap();
    session.pack().unwrap();

    let err = session.toolpath(7).unwrap_err();
    assert!(matches!(
        err,
        signcut::CamToolError::Core(Error::Pack(PackError::SheetNotFound { sheet_id: 7 }))
    ));
}

#[test]
fn test_empty_drawing_is_not_an_error() {
    let mut session = CamSession::default();
    let outcome = session.load_svg(r#"<svg viewBox="0 0 10 10"></svg>"#).unwrap();
    assert!(outcome.is_empty());

    let layout = session.pack().unwrap();
    assert!(layout.sheets.is_empty());
    assert_eq!(layout.total, 0);
}

#[test]
fn test_config_file_drives_session() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("job.json");

    let mut config = Config::default();
    config.router.feed_rate = 900.0;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_or_default(&path).unwrap();
    let mut session = CamSession::new(loaded);
    session.load_svg(ONE_SQUARE).unwrap();
    session.pack().unwrap();
    assert!(session.router_gcode(1).unwrap().contains("G1 F900"));
}

#[test]
fn test_emit_error_classification() {
    let err: signcut::CamToolError = EmitError::EmptyToolpath.into();
    assert!(err.is_emit_error());
}
