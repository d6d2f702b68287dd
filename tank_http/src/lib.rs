//! HTTP transport for the tank dashboard (blocking `ureq` agent) plus an
//! in-process simulated tank for running without a control unit.
//!
//! Decoding is split into pure `decode_*` functions so the wire format can be
//! tested without a socket.
pub mod error;
pub mod sim;
pub mod util;

pub use error::HttpError;
pub use sim::SimulatedApi;

use error::Result;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tank_traits::{ApiResult, DashboardApi, HistoryReading, Mode, ModeCommand, StatusReport};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStatus {
    mode: String,
    water_level: f32,
    valve_opening: f64,
    tms_connected: bool,
    #[serde(default)]
    timestamp: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireReading {
    timestamp: u64,
    level: f32,
}

#[derive(Debug, Deserialize)]
struct WireHistory {
    readings: Vec<WireReading>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
}

/// Decode a `/status` body.
pub fn decode_status(body: &str) -> Result<StatusReport> {
    let wire: WireStatus =
        serde_json::from_str(body).map_err(|e| HttpError::Malformed(format!("status: {e}")))?;
    let mode = Mode::from_wire(&wire.mode)
        .ok_or_else(|| HttpError::Malformed(format!("status: unknown mode {:?}", wire.mode)))?;
    if !wire.water_level.is_finite() {
        return Err(HttpError::Malformed(
            "status: non-finite numeric field".to_string(),
        ));
    }
    let valve_opening = opening_to_int(wire.valve_opening).ok_or_else(|| {
        HttpError::Malformed(format!("status: valveOpening {} out of range", wire.valve_opening))
    })?;
    Ok(StatusReport {
        mode,
        water_level: wire.water_level,
        valve_opening,
        device_linked: wire.tms_connected,
        server_time_ms: wire.timestamp,
    })
}

/// Largest magnitude an `f64` holds as an exact integer (2^53).
const EXACT_INT_F64: f64 = 9_007_199_254_740_992.0;

/// Round a reported opening to an integer. Out-of-range values are clamped
/// later by the core; `None` only for non-finite or absurd magnitudes.
fn opening_to_int(v: f64) -> Option<i64> {
    let rounded = v.round();
    if !rounded.is_finite() || rounded.abs() > EXACT_INT_F64 {
        return None;
    }
    // Exact: `rounded` is integral and within +-2^53.
    #[allow(clippy::cast_possible_truncation)]
    Some(rounded as i64)
}

/// Decode a `/history` body, preserving server order.
pub fn decode_history(body: &str) -> Result<Vec<HistoryReading>> {
    let wire: WireHistory =
        serde_json::from_str(body).map_err(|e| HttpError::Malformed(format!("history: {e}")))?;
    Ok(wire
        .readings
        .into_iter()
        .map(|r| HistoryReading {
            timestamp_ms: r.timestamp,
            level: r.level,
        })
        .collect())
}

/// Build the error for a non-2xx answer. The `error` field is surfaced
/// verbatim; bodies without one fall back to the status code.
pub fn decode_rejection(code: u16, body: &str) -> HttpError {
    let message = serde_json::from_str::<WireError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| format!("HTTP {code}"));
    HttpError::Status { code, message }
}

/// Blocking HTTP client for the control unit's REST API.
#[derive(Debug, Clone)]
pub struct HttpApi {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .build();
        Self {
            agent,
            base_url: util::normalize_base(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> Result<String> {
        let url = util::join_url(&self.base_url, path);
        let response = self.agent.get(&url).call();
        Self::read_body(response)
    }

    fn post(&self, path: &str, body: &serde_json::Value) -> Result<()> {
        let url = util::join_url(&self.base_url, path);
        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string());
        Self::read_body(response).map(|_| ())
    }

    fn read_body(response: std::result::Result<ureq::Response, ureq::Error>) -> Result<String> {
        match response {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| HttpError::Transport(format!("read body: {e}"))),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(decode_rejection(code, &body))
            }
            Err(ureq::Error::Transport(t)) => Err(HttpError::Transport(t.to_string())),
        }
    }
}

impl DashboardApi for HttpApi {
    fn status(&self) -> ApiResult<StatusReport> {
        let body = self.get("status")?;
        Ok(decode_status(&body)?)
    }

    fn history(&self) -> ApiResult<Vec<HistoryReading>> {
        let body = self.get("history")?;
        Ok(decode_history(&body)?)
    }

    fn set_mode(&self, mode: ModeCommand) -> ApiResult<()> {
        tracing::debug!(mode = mode.as_wire(), "POST mode");
        Ok(self.post("mode", &json!({ "mode": mode.as_wire() }))?)
    }

    fn set_valve(&self, opening: u8) -> ApiResult<()> {
        tracing::debug!(opening, "POST valve");
        Ok(self.post("valve", &json!({ "opening": opening }))?)
    }
}
