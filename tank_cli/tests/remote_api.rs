//! One-shot commands against a fake dashboard server: JSON output schema and
//! how server and transport failures surface as exit codes.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::net::TcpListener;
use std::process::Command;
use std::thread;
use tiny_http::{Response, Server};

/// Answer every request with the same reply until the test process exits.
fn serve(code: u16, body: &'static str) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        for req in server.incoming_requests() {
            let _ = req.respond(Response::from_string(body).with_status_code(code));
        }
    });
    format!("http://{addr}/api")
}

/// An address nothing listens on.
fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/api")
}

fn tank(base_url: &str) -> Command {
    let dir = std::env::temp_dir().join("tank-cli-no-config.toml");
    let mut cmd = Command::cargo_bin("tank_cli").unwrap();
    cmd.arg("--config").arg(dir).arg("--base-url").arg(base_url);
    cmd
}

#[test]
fn status_json_schema() {
    let base = serve(
        200,
        r#"{"mode":"MANUAL","waterLevel":18.254,"valveOpening":40,"tmsConnected":true,"timestamp":1700000000000}"#,
    );
    let out = tank(&base).args(["--json", "status"]).output().unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["mode"], "MANUAL");
    assert_eq!(v["valve_opening"], 40);
    assert_eq!(v["device_linked"], true);
    assert_eq!(v["server_time_ms"], 1_700_000_000_000u64);
    assert!((v["water_level"].as_f64().unwrap() - 18.254).abs() < 1e-3);
}

#[test]
fn history_json_schema() {
    let base = serve(
        200,
        r#"{"readings":[{"timestamp":1,"level":10.5},{"timestamp":2,"level":11.0}],"count":2}"#,
    );
    let out = tank(&base).args(["--json", "history"]).output().unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["count"], 2);
    assert_eq!(v["readings"][1]["timestamp_ms"], 2);
}

#[test]
fn level_is_shown_with_two_decimals() {
    let base = serve(
        200,
        r#"{"mode":"AUTOMATIC","waterLevel":7.5,"valveOpening":100,"tmsConnected":false}"#,
    );
    tank(&base)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("7.50 cm"))
        .stdout(predicate::str::contains("no link"));
}

#[rstest]
#[case(400, r#"{"error":"Can only set valve in MANUAL mode"}"#, 3, "Can only set valve in MANUAL mode")]
#[case(500, "", 3, "HTTP 500")]
#[case(200, "not json", 5, "does not understand")]
fn status_failures_map_to_exit_codes(
    #[case] code: u16,
    #[case] body: &'static str,
    #[case] exit: i32,
    #[case] needle: &str,
) {
    let base = serve(code, body);
    tank(&base)
        .arg("status")
        .assert()
        .code(exit)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn rejected_valve_json_error() {
    let base = serve(400, r#"{"error":"Opening must be 0-100"}"#);
    let out = tank(&base)
        .args(["--json", "valve", "50"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let v: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(v["reason"], "Rejected");
    assert_eq!(v["status"], 400);
    assert_eq!(v["server_message"], "Opening must be 0-100");
}

#[test]
fn unreachable_server_is_a_transport_error() {
    tank(&closed_url())
        .args(["mode", "automatic"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("could not be reached"));
}

#[test]
fn valve_is_clamped_before_sending() {
    let base = serve(200, "{}");
    tank(&base)
        .args(["valve", "150"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Valve set to 100%."));
}
