//! Audit record types for relay logging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::relay::{ErrorKind, RelayError, RequestKind};

/// One relay attempt, written once and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record ID.
    pub id: Uuid,
    /// Caller that issued the request, if known.
    pub caller_id: Option<String>,
    /// Request kind.
    pub kind: RequestKind,
    /// Full composed prompt.
    pub prompt: String,
    /// Normalized content returned to the caller, absent on failure.
    pub response: Option<String>,
    /// When the attempt completed.
    pub timestamp: DateTime<Utc>,
    /// Client address from proxy headers.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Wall-clock time from composition to normalization, in milliseconds.
    pub latency_ms: u64,
    /// Upstream model identifier.
    pub model: String,
    /// Provider finish reason.
    pub finish_reason: Option<String>,
    /// Sentiment extracted from the reply.
    pub sentiment: Option<f64>,
    /// Structured output was expected but the raw text was used.
    pub parse_degraded: bool,
    /// Failure classification, absent on success.
    pub error_kind: Option<ErrorKind>,
    /// Failure message, absent on success.
    pub error: Option<String>,
}

impl AuditRecord {
    /// Create a new builder for an audit record.
    #[must_use]
    pub fn builder(kind: RequestKind, prompt: impl Into<String>) -> AuditRecordBuilder {
        AuditRecordBuilder::new(kind, prompt)
    }

    /// Whether the upstream attempt succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error_kind.is_none()
    }

    /// Outcome code stored in the database: `success` or the error kind.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        self.error_kind.map_or("success", |k| k.as_str())
    }
}

/// Builder for creating audit records.
#[derive(Debug, Clone)]
pub struct AuditRecordBuilder {
    record: AuditRecord,
}

impl AuditRecordBuilder {
    /// Create a new builder with required fields.
    pub fn new(kind: RequestKind, prompt: impl Into<String>) -> Self {
        Self {
            record: AuditRecord {
                id: Uuid::new_v4(),
                caller_id: None,
                kind,
                prompt: prompt.into(),
                response: None,
                timestamp: Utc::now(),
                ip_address: None,
                user_agent: None,
                latency_ms: 0,
                model: String::new(),
                finish_reason: None,
                sentiment: None,
                parse_degraded: false,
                error_kind: None,
                error: None,
            },
        }
    }

    /// Set a custom timestamp.
    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.record.timestamp = timestamp;
        self
    }

    /// Set the caller id.
    #[must_use]
    pub fn caller_id(mut self, caller_id: Option<String>) -> Self {
        self.record.caller_id = caller_id;
        self
    }

    /// Set the client address and user agent.
    #[must_use]
    pub fn client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.record.ip_address = ip_address;
        self.record.user_agent = user_agent;
        self
    }

    /// Set the upstream model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.record.model = model.into();
        self
    }

    /// Set the latency.
    #[must_use]
    pub fn latency_ms(mut self, latency_ms: u64) -> Self {
        self.record.latency_ms = latency_ms;
        self
    }

    /// Record a successful reply.
    #[must_use]
    pub fn response(
        mut self,
        content: impl Into<String>,
        sentiment: Option<f64>,
        finish_reason: Option<String>,
    ) -> Self {
        self.record.response = Some(content.into());
        self.record.sentiment = sentiment;
        self.record.finish_reason = finish_reason;
        self
    }

    /// Mark the reply as parsed from raw text.
    #[must_use]
    pub fn parse_degraded(mut self, degraded: bool) -> Self {
        self.record.parse_degraded = degraded;
        self
    }

    /// Record a classified failure.
    #[must_use]
    pub fn failure(mut self, error: &RelayError) -> Self {
        self.record.error_kind = Some(error.kind());
        self.record.error = Some(error.to_string());
        self
    }

    /// Build the audit record.
    #[must_use]
    pub fn build(self) -> AuditRecord {
        self.record
    }
}
