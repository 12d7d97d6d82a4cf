//! Colored CLI output for advice and audit records.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::audit::AuditRecord;
use crate::relay::Advice;

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum number of characters, adding an ellipsis
/// if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// Format a sentiment score for display.
#[must_use]
pub fn format_sentiment(sentiment: Option<f64>) -> String {
    sentiment.map_or_else(|| "-".to_string(), |s| format!("{s:.2}"))
}

/// Print an advisory answer.
pub fn print_advice(advice: &Advice) {
    let tag = if advice.degraded {
        "[FALLBACK]".yellow().bold().to_string()
    } else {
        "[ADVICE]".green().bold().to_string()
    };

    println!("{} {}", tag, advice.kind.cyan());
    println!("{}", advice.content);
    if advice.kind.has_sentiment() {
        println!(
            "{} {}",
            "sentiment:".dimmed(),
            format_sentiment(advice.sentiment)
        );
    }
    if advice.parse_degraded {
        println!("{}", "model ignored the structured format".dimmed());
    }
    let _ = io::stdout().flush();
}

/// Print one audit record as a single line.
pub fn print_audit_record(record: &AuditRecord) {
    let outcome = if record.is_success() {
        record.outcome().green().to_string()
    } else {
        record.outcome().red().to_string()
    };

    println!(
        "{} {:<8} {:<18} {:>6}ms caller={} {}",
        record
            .timestamp
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()
            .dimmed(),
        record.kind.cyan(),
        outcome,
        record.latency_ms,
        record.caller_id.as_deref().unwrap_or("-"),
        truncate(
            record
                .response
                .as_deref()
                .or(record.error.as_deref())
                .unwrap_or(""),
            DEFAULT_MAX_LEN
        )
    );
}

/// Print the notice shown when the audit trail is turned off.
pub fn print_audit_disabled() {
    println!(
        "{} {}",
        "[AUDIT]".yellow().bold(),
        "Audit trail is disabled ([audit] enabled = false)".dimmed()
    );
}

/// Print a batch of audit records, newest first.
pub fn print_audit_records(records: &[AuditRecord]) {
    if records.is_empty() {
        println!("{}", "No audit records".dimmed());
        return;
    }
    for record in records {
        print_audit_record(record);
    }
    let _ = io::stdout().flush();
}
