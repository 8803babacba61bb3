use chrono::{DateTime, Utc};
use serde::Serialize;

/// Deployment diagnostic for `GET /ghost` and `?debug=1`. Carries whether a
/// credential is present, never its value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostDiagnostic {
    pub ok: bool,
    pub debug: bool,
    pub provider: &'static str,
    pub model: String,
    pub has_key: bool,
    pub timeout_secs: u64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub has_key: bool,
    pub model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoResponse {
    pub ok: bool,
    pub method: String,
    pub url: String,
    pub headers: std::collections::BTreeMap<String, String>,
    pub raw_body: String,
}
