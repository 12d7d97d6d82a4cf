//! Advisory request kinds.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RelayError;

/// Category of an advisory request. Selects the prompt template and the
/// expected response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Reflection on a member's journal entry.
    Journal,
    /// Caretaker advice derived from mood and weather.
    Empathy,
    /// Clinician trend summary over a week of history.
    Doctor,
    /// Longitudinal correlation over up to two weeks of history.
    Insight,
}

impl RequestKind {
    /// Every registered kind.
    pub const ALL: [Self; 4] = [Self::Journal, Self::Empathy, Self::Doctor, Self::Insight];

    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Empathy => "empathy",
            Self::Doctor => "doctor",
            Self::Insight => "insight",
        }
    }

    /// Whether replies for this kind carry a sentiment score.
    #[must_use]
    pub fn has_sentiment(&self) -> bool {
        matches!(self, Self::Journal | Self::Insight)
    }
}

impl FromStr for RequestKind {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RelayError::UnknownKind(s.to_string()))
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single advisory request from a role view.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayRequest {
    /// Request kind.
    pub kind: RequestKind,
    /// Kind-specific structured data.
    pub payload: serde_json::Value,
    /// Optional caller identifier, recorded in the audit trail.
    pub caller_id: Option<String>,
}

impl RelayRequest {
    /// Create a request without a caller id.
    #[must_use]
    pub fn new(kind: RequestKind, payload: serde_json::Value) -> Self {
        Self {
            kind,
            payload,
            caller_id: None,
        }
    }

    /// Attach a caller id (builder pattern).
    #[must_use]
    pub fn with_caller(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        for kind in RequestKind::ALL {
            assert_eq!(kind.as_str().parse::<RequestKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = "horoscope".parse::<RequestKind>().unwrap_err();
        assert!(matches!(err, RelayError::UnknownKind(ref k) if k == "horoscope"));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("Journal".parse::<RequestKind>().is_err());
    }

    #[test]
    fn test_has_sentiment() {
        assert!(RequestKind::Journal.has_sentiment());
        assert!(RequestKind::Insight.has_sentiment());
        assert!(!RequestKind::Empathy.has_sentiment());
        assert!(!RequestKind::Doctor.has_sentiment());
    }

    #[test]
    fn test_request_builder() {
        let request = RelayRequest::new(RequestKind::Journal, serde_json::json!({"text": "hi"}))
            .with_caller("user-1");
        assert_eq!(request.caller_id.as_deref(), Some("user-1"));
        assert_eq!(request.payload["text"], "hi");
    }
}
