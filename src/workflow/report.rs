//! One-line JSON rendering of an [`Outcome`] for the surrounding process.
//!
//! This is the only place the textual protocol exists; the engine's own
//! types never carry it.

use serde::Serialize;

use crate::workflow::outcome::Outcome;

/// Wire shape of the result line. Absent fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u8>,
}

impl From<&Outcome> for ReportLine {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Completed(c) => Self {
                ok: c.is_success(),
                stage: None,
                state: outcome.terminal_state(),
                config_tx_hash: Some(c.config_tx_hash.to_string()),
                tx_hash: Some(c.request_tx_hash.to_string()),
                request_id: Some(c.event.request_id.to_string()),
                response: Some(c.event.response.clone()),
                err: Some(c.event.error_hex()),
                error_kind: None,
                error: None,
                status: None,
            },
            Outcome::Failed(f) => Self {
                ok: false,
                stage: Some(f.stage.label()),
                state: outcome.terminal_state(),
                config_tx_hash: f.config_tx_hash.map(|h| h.to_string()),
                tx_hash: f.tx_hash.map(|h| h.to_string()),
                request_id: None,
                response: None,
                err: None,
                error_kind: Some(f.kind),
                error: Some(f.detail.clone()),
                status: f.receipt_success.map(u8::from),
            },
        }
    }
}

/// Serialize `outcome` as a single line of JSON.
pub fn render(outcome: &Outcome) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ReportLine::from(outcome))
}
