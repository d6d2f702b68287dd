//! Human-readable error descriptions and structured JSON error formatting.

use serde_json::json;
use tank_core::error::{ApiError, BuildError, SessionError};

/// The API error behind a report, if there is one.
fn api_error(err: &eyre::Report) -> Option<&ApiError> {
    err.downcast_ref::<ApiError>()
        .or_else(|| match err.downcast_ref::<SessionError>() {
            Some(SessionError::Api(e)) => Some(e),
            _ => None,
        })
}

fn humanize_api(e: &ApiError) -> String {
    match e {
        ApiError::Transport(detail) => format!(
            "What happened: The dashboard API could not be reached ({detail}).\nLikely causes: The control unit is off, the network is down, or api.base_url points to the wrong host/port.\nHow to fix: Check the address with --base-url or [api] base_url in the config, and raise api.timeout_ms on slow links."
        ),
        ApiError::Rejected { status, message } => format!(
            "What happened: The server refused the request (HTTP {status}): {message}\nLikely causes: Valve commands are only accepted in MANUAL mode, and openings must be 0-100.\nHow to fix: Switch to manual first (`tank mode manual`), then retry."
        ),
        ApiError::Malformed(detail) => format!(
            "What happened: The server answered with data this client does not understand ({detail}).\nLikely causes: api.base_url points to a different service, or client and server versions differ.\nHow to fix: Verify the URL ends in /api and that the server is the tank controller."
        ),
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(e) = api_error(err) {
        return humanize_api(e);
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingApi => {
                "What happened: No API endpoint was wired into the session.\nLikely causes: Internal setup error.\nHow to fix: Re-run with --log-level=debug and report the output.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid session timing ({msg}).\nLikely causes: Out-of-range [polling] or [control] values, or command-line overrides.\nHow to fix: Edit the config file or the --status-ms/--history-ms flags, then rerun."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SessionError>() {
        return match se {
            SessionError::RendererInit(detail) => format!(
                "What happened: The dashboard could not start drawing ({detail}).\nLikely causes: stdout is closed or not writable.\nHow to fix: Run in a terminal, or redirect output to a file."
            ),
            SessionError::InvalidModeTarget(mode) => format!(
                "What happened: {mode} cannot be requested.\nLikely causes: Only AUTOMATIC and MANUAL are operator modes.\nHow to fix: Use `auto` or `manual`."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("invalid configuration") || lower.contains("read config") {
        return format!(
            "What happened: The config file could not be loaded.\nLikely causes: TOML syntax error or a value of the wrong type.\nHow to fix: Fix the file and try again. Detail: {msg}"
        );
    }

    if lower.starts_with("api.")
        || lower.starts_with("polling.")
        || lower.starts_with("control.")
        || lower.starts_with("logging.")
    {
        return format!(
            "What happened: Configuration is invalid: {msg}.\nLikely causes: An out-of-range value in the TOML or on the command line.\nHow to fix: Correct the value; `tank check-config` prints the effective settings."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: rejected = 3, transport = 4, malformed = 5, anything else = 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match api_error(err) {
        Some(ApiError::Rejected { .. }) => 3,
        Some(ApiError::Transport(_)) => 4,
        Some(ApiError::Malformed(_)) => 5,
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    let message = humanize(err);
    match api_error(err) {
        Some(ApiError::Rejected { status, message: server }) => json!({
            "reason": "Rejected",
            "status": status,
            "server_message": server,
            "message": message,
        }),
        Some(ApiError::Transport(_)) => json!({ "reason": "Transport", "message": message }),
        Some(ApiError::Malformed(_)) => json!({ "reason": "Malformed", "message": message }),
        None => json!({ "reason": "Error", "message": message }),
    }
    .to_string()
}
