//! Audit log implementation with async `SQLite` operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error::AuditError;
use super::recorder::AuditSink;
use super::schema::SCHEMA;
use super::types::AuditRecord;
use crate::config::AuditConfig;
use crate::relay::{ErrorKind, RequestKind};

/// Returns the default path for the audit database.
///
/// This is `~/.local/share/moodsync-relay/audit.db` on Unix systems.
#[must_use]
pub fn default_audit_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moodsync-relay")
        .join("audit.db")
}

const SELECT_COLUMNS: &str = "SELECT id, user_id, type, prompt, response, ip_address, user_agent, latency_ms, model,
        finish_reason, sentiment, parse_degraded, outcome, error, created_at FROM ai_logs";

/// Map a row to a record. Rows with an unknown type are skipped.
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Option<AuditRecord>> {
    let id: String = row.get(0)?;
    let kind: String = row.get(2)?;
    let latency_ms: i64 = row.get(7)?;
    let outcome: String = row.get(12)?;
    let created_at: String = row.get(14)?;

    let Ok(kind) = kind.parse::<RequestKind>() else {
        tracing::warn!(id = %id, kind = %kind, "Skipping audit row with unknown type");
        return Ok(None);
    };

    Ok(Some(AuditRecord {
        id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
        caller_id: row.get(1)?,
        kind,
        prompt: row.get(3)?,
        response: row.get(4)?,
        timestamp: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_or_else(|_| chrono::Utc::now(), |dt| dt.with_timezone(&chrono::Utc)),
        ip_address: row.get(5)?,
        user_agent: row.get(6)?,
        latency_ms: latency_ms.unsigned_abs(),
        model: row.get(8)?,
        finish_reason: row.get(9)?,
        sentiment: row.get(10)?,
        parse_degraded: row.get(11)?,
        error_kind: ErrorKind::from_code(&outcome),
        error: row.get(13)?,
    }))
}

/// Audit log for recording relay attempts.
///
/// Uses `SQLite` for persistent storage with async operations via `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct AuditLog {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl AuditLog {
    /// Open an audit log at the specified path.
    ///
    /// Creates parent directories if they don't exist and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot be applied.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| {
                    AuditError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        let path_clone = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, AuditError> {
            let conn =
                Connection::open(&path_clone).map_err(|source| AuditError::DatabaseOpen {
                    path: path_clone,
                    source,
                })?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| AuditError::TaskCancelled)??;

        tracing::debug!(path = %path.display(), "Opened audit log");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open an in-memory audit log for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or the schema cannot be applied.
    pub async fn open_in_memory() -> Result<Self, AuditError> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection, AuditError> {
            let conn = Connection::open_in_memory()?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| AuditError::TaskCancelled)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Open the configured audit trail, or `None` when it is disabled or
    /// cannot be opened.
    ///
    /// An unopenable database only disables auditing; relaying carries on.
    pub async fn open_configured(config: &AuditConfig) -> Option<Arc<Self>> {
        if !config.enabled {
            tracing::info!("Audit trail disabled");
            return None;
        }
        let path = config.resolved_path();
        match Self::open(&path).await {
            Ok(audit) => Some(Arc::new(audit)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to open audit trail, continuing without it"
                );
                None
            }
        }
    }

    /// Returns the path to the database, if opened from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be inserted.
    pub async fn log_record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let id = record.id.to_string();
        let user_id = record.caller_id.clone();
        let kind = record.kind.as_str();
        let prompt = record.prompt.clone();
        let response = record.response.clone();
        let ip_address = record.ip_address.clone();
        let user_agent = record.user_agent.clone();
        let latency_ms = i64::try_from(record.latency_ms).unwrap_or(i64::MAX);
        let model = record.model.clone();
        let finish_reason = record.finish_reason.clone();
        let sentiment = record.sentiment;
        let parse_degraded = record.parse_degraded;
        let outcome = record.outcome();
        let error = record.error.clone();
        let created_at = record
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Micros, true);

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<(), AuditError> {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO ai_logs (id, user_id, type, prompt, response, ip_address, user_agent, latency_ms,
                    model, finish_reason, sentiment, parse_degraded, outcome, error, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    id, user_id, kind, prompt, response, ip_address, user_agent, latency_ms,
                    model, finish_reason, sentiment, parse_degraded, outcome, error, created_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|_| AuditError::TaskCancelled)?
    }

    /// Most recent records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, AuditError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<AuditRecord>, AuditError> {
            let conn = conn.blocking_lock();
            let mut stmt =
                conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC LIMIT ?1"))?;
            let records = stmt
                .query_map(params![limit], record_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records.into_iter().flatten().collect())
        })
        .await
        .map_err(|_| AuditError::TaskCancelled)?
    }

    /// Most recent records for one caller, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn recent_for_caller(
        &self,
        caller_id: impl Into<String>,
        limit: usize,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let caller_id = caller_id.into();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<AuditRecord>, AuditError> {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2"
            ))?;
            let records = stmt
                .query_map(params![caller_id, limit], record_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records.into_iter().flatten().collect())
        })
        .await
        .map_err(|_| AuditError::TaskCancelled)?
    }

    async fn count_where(
        &self,
        clause: &'static str,
        arg: Option<String>,
    ) -> Result<u64, AuditError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<u64, AuditError> {
            let conn = conn.blocking_lock();
            let sql = format!("SELECT COUNT(*) FROM ai_logs {clause}");
            let count: i64 = match arg {
                Some(arg) => conn.query_row(&sql, params![arg], |row| row.get(0))?,
                None => conn.query_row(&sql, [], |row| row.get(0))?,
            };
            Ok(count.unsigned_abs())
        })
        .await
        .map_err(|_| AuditError::TaskCancelled)?
    }

    /// Count total records in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_records(&self) -> Result<u64, AuditError> {
        self.count_where("", None).await
    }

    /// Count records of one kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_by_kind(&self, kind: RequestKind) -> Result<u64, AuditError> {
        self.count_where("WHERE type = ?1", Some(kind.as_str().to_string()))
            .await
    }

    /// Count failed upstream attempts.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_failures(&self) -> Result<u64, AuditError> {
        self.count_where("WHERE outcome != 'success'", None).await
    }
}

#[async_trait]
impl AuditSink for AuditLog {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.log_record(record).await
    }
}
