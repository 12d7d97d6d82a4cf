//! Request and response bodies for the relay HTTP endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::audit::AuditRecord;
use crate::relay::{Advice, RelayError, RelayRequest, RequestKind};

/// Body of `POST /ai-chat`.
///
/// Accepts the browser client's field names (`type`, `data`, `userId`) as
/// well as the relay's own (`kind`, `payload`, `callerId`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayRequestBody {
    /// Request kind as sent by the client.
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
    /// Kind-specific payload.
    #[serde(default, alias = "payload")]
    pub data: serde_json::Value,
    /// Caller identifier.
    #[serde(default, rename = "userId", alias = "callerId")]
    pub user_id: Option<String>,
}

impl RelayRequestBody {
    /// Validate the kind and build a relay request.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::UnknownKind` for a missing or unregistered kind.
    pub fn into_request(self) -> Result<RelayRequest, RelayError> {
        let kind: RequestKind = self.kind.unwrap_or_default().parse()?;
        Ok(RelayRequest {
            kind,
            payload: self.data,
            caller_id: self.user_id,
        })
    }
}

/// Success body of `POST /ai-chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    /// Advisory text.
    pub content: String,
    /// Present (possibly `null`) only for kinds that define a sentiment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Option<f64>>,
}

impl From<Advice> for RelayResponse {
    fn from(advice: Advice) -> Self {
        Self {
            sentiment: advice.kind.has_sentiment().then_some(advice.sentiment),
            content: advice.content,
        }
    }
}

/// Error body for every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human readable message.
    pub error: String,
    /// Stable classification code.
    pub kind: String,
}

/// Maximum number of audit rows returned by `GET /api/logs`.
pub const MAX_LOGS_LIMIT: usize = 100;

const fn default_limit() -> usize {
    MAX_LOGS_LIMIT
}

/// Query parameters for `GET /api/logs`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsQuery {
    /// Maximum number of records to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl LogsQuery {
    /// Get the effective limit, capped at `MAX_LOGS_LIMIT`.
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_LOGS_LIMIT)
    }
}

impl Default for LogsQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

/// Response for `GET /api/logs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    /// Records, newest first.
    pub logs: Vec<AuditRecord>,
}

/// Response for `GET /api/metrics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsResponse {
    /// Total recorded attempts.
    pub total: u64,
    /// Attempts that ended in an upstream failure.
    pub failures: u64,
    /// Attempts per request kind.
    pub by_kind: BTreeMap<String, u64>,
}

/// Response for `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` when the server answers.
    pub status: String,
    /// Upstream model identifier.
    pub model: String,
    /// Whether the audit trail is enabled.
    pub audit: bool,
}
