//! Shared server state and the live event feed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::audit::AuditLog;
use crate::relay::{Advice, Relay, RelayError, RequestKind};

/// Default capacity for the event broadcast channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Outcome of one relay call, pushed to admin clients over SSE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayEvent {
    /// Request kind.
    pub kind: RequestKind,
    /// `success` or the error kind code.
    pub outcome: String,
    /// Caller that issued the request.
    pub caller_id: Option<String>,
    /// The reply ignored the structured format.
    pub parse_degraded: bool,
    /// When the call finished.
    pub timestamp: DateTime<Utc>,
}

impl RelayEvent {
    /// Event for a successful call.
    #[must_use]
    pub fn completed(advice: &Advice, caller_id: Option<String>) -> Self {
        Self {
            kind: advice.kind,
            outcome: "success".to_string(),
            caller_id,
            parse_degraded: advice.parse_degraded,
            timestamp: Utc::now(),
        }
    }

    /// Event for a failed call.
    #[must_use]
    pub fn failed(kind: RequestKind, error: &RelayError, caller_id: Option<String>) -> Self {
        Self {
            kind,
            outcome: error.kind().as_str().to_string(),
            caller_id,
            parse_degraded: false,
            timestamp: Utc::now(),
        }
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The live relay.
    pub relay: Arc<Relay>,
    /// Audit log for the admin endpoints, absent when auditing is disabled.
    pub audit: Option<Arc<AuditLog>>,
    /// Sender for broadcasting relay outcomes to SSE clients.
    pub events: broadcast::Sender<RelayEvent>,
    /// Cancellation token for graceful shutdown.
    pub cancel: CancellationToken,
}

impl AppState {
    /// Create app state without an audit log.
    #[must_use]
    pub fn new(relay: Arc<Relay>) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);
        Self {
            relay,
            audit: None,
            events,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach the audit log used by the admin endpoints (builder pattern).
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Broadcast an event. Dropped silently when nobody is listening.
    pub fn publish(&self, event: RelayEvent) {
        let _ = self.events.send(event);
    }
}
