use rstest::rstest;
use std::fs;
use tank_config::{load_file, load_toml};
use tempfile::tempdir;

#[rstest]
#[case("[api]\nbase_url = \"\"", "base_url must not be empty")]
#[case("[api]\nbase_url = \"localhost:8080\"", "must start with http")]
#[case("[api]\ntimeout_ms = 0", "timeout_ms must be >= 1")]
#[case("[polling]\nstatus_ms = 5", "status_ms must be >= 10")]
#[case(
    "[polling]\nstatus_ms = 1000\nhistory_ms = 500",
    "history_ms must be >= polling.status_ms"
)]
#[case("[control]\nquiet_window_ms = 120000", "quiet_window_ms must be <= 60000")]
#[case("[logging]\nlevel = \"loud\"", "logging.level must be one of")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation must be one of")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error {err} does not mention {needle}"
    );
}

#[test]
fn accepts_full_config() {
    let toml = r#"
[api]
base_url = "http://192.168.1.20:8080/api"
timeout_ms = 800

[polling]
status_ms = 250
history_ms = 4000

[control]
quiet_window_ms = 2500

[logging]
file = "logs/tank.log"
level = "DEBUG"
rotation = "daily"
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.api.timeout_ms, 800);
    assert_eq!(cfg.control.quiet_window_ms, 2500);
    assert_eq!(cfg.logging.file.as_deref(), Some("logs/tank.log"));
}

#[test]
fn zero_quiet_window_is_allowed() {
    let cfg = load_toml("[control]\nquiet_window_ms = 0").expect("parse TOML");
    cfg.validate().expect("a zero window disables suppression");
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let cfg = load_file(&dir.path().join("absent.toml")).expect("defaults");
    assert_eq!(cfg.polling.status_ms, 200);
}

#[test]
fn unparsable_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[polling\nstatus_ms = ").unwrap();
    let err = load_file(&path).expect_err("should fail to parse");
    assert!(format!("{err}").contains("invalid configuration"));
}

#[test]
fn wrong_types_are_rejected_at_parse_time() {
    assert!(load_toml("[polling]\nstatus_ms = \"fast\"").is_err());
}
