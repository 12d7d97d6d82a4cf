//! Fire-and-forget recording of relay attempts.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::task::TaskTracker;

use super::error::AuditError;
use super::logger::AuditLog;
use super::types::AuditRecord;

/// Append-only destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record.
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Sink used when auditing is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn append(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Writes audit records in the background.
///
/// Writes never block the caller and their failures are only logged.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    tracker: TaskTracker,
}

impl std::fmt::Debug for AuditRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRecorder")
            .field("pending", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

impl AuditRecorder {
    /// Create a recorder writing to the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            tracker: TaskTracker::new(),
        }
    }

    /// Create a recorder that drops every record.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopAuditSink))
    }

    /// Recorder for an optional audit log, dropping records when there is none.
    #[must_use]
    pub fn for_log(audit: Option<&Arc<AuditLog>>) -> Self {
        match audit {
            Some(audit) => Self::new(audit.clone()),
            None => Self::disabled(),
        }
    }

    /// Queue a record for writing. Returns immediately.
    pub fn record(&self, record: AuditRecord) {
        let sink = Arc::clone(&self.sink);
        self.tracker.spawn(async move {
            if let Err(e) = sink.append(&record).await {
                tracing::warn!(
                    id = %record.id,
                    kind = %record.kind,
                    error = %e,
                    "Failed to persist audit record"
                );
            }
        });
    }

    /// Number of writes still in flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every queued write to finish.
    ///
    /// Single caller only: a concurrent `flush` can reopen the tracker while
    /// another is still waiting, leaving that one blocked until the next close.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
