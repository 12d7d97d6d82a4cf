//! Relay error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RequestKind;

/// Errors surfaced at the relay boundary.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Required process-wide configuration is missing. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The caller asked for a kind with no registered template.
    #[error("Unknown type: {0}")]
    UnknownKind(String),
    /// The payload does not have the shape the kind requires.
    #[error("Malformed {kind} payload: {reason}")]
    MalformedPayload { kind: RequestKind, reason: String },
    /// Upstream answered HTTP 429.
    #[error("Upstream rate limit reached: {0}")]
    RateLimited(String),
    /// Upstream answered HTTP 402 or signalled an exhausted quota.
    #[error("Upstream quota exhausted: {0}")]
    QuotaExhausted(String),
    /// Any other upstream failure, including timeouts.
    #[error("AI gateway error: {0}")]
    Upstream(String),
}

/// Stable classification of a [`RelayError`], used on the wire and in audit rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    UnknownKind,
    MalformedPayload,
    RateLimited,
    QuotaExhausted,
    Upstream,
}

impl ErrorKind {
    /// Returns the snake-case code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::UnknownKind => "unknown_kind",
            Self::MalformedPayload => "malformed_payload",
            Self::RateLimited => "rate_limited",
            Self::QuotaExhausted => "quota_exhausted",
            Self::Upstream => "upstream",
        }
    }

    /// Parse a snake-case code back into a kind.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        [
            Self::Configuration,
            Self::UnknownKind,
            Self::MalformedPayload,
            Self::RateLimited,
            Self::QuotaExhausted,
            Self::Upstream,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == code)
    }
}

impl RelayError {
    pub(crate) fn malformed(kind: RequestKind, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            kind,
            reason: reason.into(),
        }
    }

    /// Classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::UnknownKind(_) => ErrorKind::UnknownKind,
            Self::MalformedPayload { .. } => ErrorKind::MalformedPayload,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::QuotaExhausted(_) => ErrorKind::QuotaExhausted,
            Self::Upstream(_) => ErrorKind::Upstream,
        }
    }

    /// HTTP status exposed over the network boundary: 429 and 402 pass
    /// through, everything else is 500.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RateLimited(_) => 429,
            Self::QuotaExhausted(_) => 402,
            _ => 500,
        }
    }

    /// Whether the error came from the upstream call rather than the caller
    /// or local configuration.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::QuotaExhausted(_) | Self::Upstream(_)
        )
    }
}
