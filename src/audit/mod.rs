//! Audit logging module for relay attempts.

mod error;
mod logger;
mod recorder;
mod schema;
mod types;

pub use error::AuditError;
pub use logger::{default_audit_path, AuditLog};
pub use recorder::{AuditRecorder, AuditSink, NoopAuditSink};
pub use schema::{SCHEMA, SCHEMA_VERSION};
pub use types::{AuditRecord, AuditRecordBuilder};
