use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[api]
base_url = "http://127.0.0.1:9/api"
timeout_ms = 300

[polling]
status_ms = 50
history_ms = 500

[control]
quiet_window_ms = 2000
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

// Every case runs against the in-process simulated tank, which starts in AUTOMATIC.
#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["status"], 0, "Mode:          AUTOMATIC", "stdout")]
#[case(&["history"], 0, "readings", "stdout")]
#[case(&["mode", "manual"], 0, "Mode change to MANUAL accepted.", "stdout")]
#[case(&["valve", "40"], 3, "Can only set valve in MANUAL mode", "stderr")]
#[case(&["mode", "remote"], 2, "invalid value", "stderr")]
#[case(&["valve"], 2, "required", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("tank_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("--simulate");
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn missing_config_file_means_defaults() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("tank_cli").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("check-config");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:8080/api"))
        .stdout(predicate::str::contains("200ms"));
}

#[test]
fn cli_overrides_beat_the_file() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut cmd = Command::cargo_bin("tank_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .args(["--base-url", "http://tank.local/api", "--status-ms", "250"])
        .arg("check-config");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("http://tank.local/api"))
        .stdout(predicate::str::contains("250ms"));
}

#[rstest]
#[case("[polling]\nstatus_ms = 5\n", "polling.status_ms must be >= 10")]
#[case("[api]\nbase_url = \"ftp://x\"\n", "api.base_url must start with")]
#[case("[polling\n", "could not be loaded")]
fn invalid_config_is_explained(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, toml).unwrap();
    let mut cmd = Command::cargo_bin("tank_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("check-config");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn override_is_validated_too() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut cmd = Command::cargo_bin("tank_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .args(["--history-ms", "20"])
        .arg("check-config");
    cmd.assert().code(1).stderr(predicate::str::contains(
        "polling.history_ms must be >= polling.status_ms",
    ));
}

#[test]
fn watch_exits_on_quit() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut cmd = assert_cmd::Command::cargo_bin("tank_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--simulate")
        .arg("watch")
        .write_stdin("manual\nbogus\nquit\n")
        .timeout(std::time::Duration::from_secs(20));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Tank level monitor"))
        .stderr(predicate::str::contains("unknown command `bogus`"));
}
