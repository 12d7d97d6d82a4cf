//! Database schema for relay audit logging.

/// Current schema version for migrations.
pub const SCHEMA_VERSION: u32 = 1;

/// SQL schema for the audit database.
pub const SCHEMA: &str = r"
-- Enable WAL mode for better concurrent read/write performance
PRAGMA journal_mode = WAL;

-- One row per relay attempt; rows are never updated
CREATE TABLE IF NOT EXISTS ai_logs (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT,
    type TEXT NOT NULL,
    prompt TEXT NOT NULL,
    response TEXT,
    ip_address TEXT,
    user_agent TEXT,
    latency_ms INTEGER NOT NULL DEFAULT 0,
    model TEXT NOT NULL,
    finish_reason TEXT,
    sentiment REAL,
    parse_degraded INTEGER NOT NULL DEFAULT 0,
    outcome TEXT NOT NULL,
    error TEXT,
    created_at TEXT NOT NULL
);

-- Schema version table for migrations
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_ai_logs_created_at ON ai_logs(created_at);
CREATE INDEX IF NOT EXISTS idx_ai_logs_type ON ai_logs(type);
CREATE INDEX IF NOT EXISTS idx_ai_logs_outcome ON ai_logs(outcome);
CREATE INDEX IF NOT EXISTS idx_ai_logs_user_id ON ai_logs(user_id);
";

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                [name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_schema_version() {
        assert_eq!(SCHEMA_VERSION, 1);
    }

    #[test]
    fn test_schema_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        assert!(table_exists(&conn, "ai_logs"));
        assert!(table_exists(&conn, "schema_version"));
    }

    #[test]
    fn test_schema_creates_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let expected_indexes = [
            "idx_ai_logs_created_at",
            "idx_ai_logs_type",
            "idx_ai_logs_outcome",
            "idx_ai_logs_user_id",
        ];

        for index_name in expected_indexes {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name=?",
                    [index_name],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Index {index_name} should exist");
        }
    }

    #[test]
    fn test_schema_requires_outcome() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO ai_logs (id, type, prompt, model, created_at) VALUES ('a', 'journal', 'p', 'm', datetime('now'))",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        assert!(table_exists(&conn, "ai_logs"));
    }
}
