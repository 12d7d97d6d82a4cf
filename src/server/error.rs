//! Server error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::api::ErrorResponse;
use crate::audit::AuditError;
use crate::relay::RelayError;

/// Errors that can occur while serving requests or running the server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Server error.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    /// The request body is not a JSON object.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Relay failure, passed through with its classification.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// The audit trail is turned off.
    #[error("Audit trail is disabled")]
    AuditDisabled,

    /// Reading the audit trail failed.
    #[error("Audit trail unavailable: {0}")]
    Audit(#[from] AuditError),
}

impl ServerError {
    /// Stable code sent as the `kind` field of error bodies.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BindError { .. } | Self::Serve(_) => "server",
            Self::InvalidBody(_) => "invalid_body",
            Self::Relay(err) => err.kind().as_str(),
            Self::AuditDisabled => "audit_disabled",
            Self::Audit(_) => "audit_unavailable",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Relay(err) => StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::AuditDisabled => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
            kind: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RequestKind;

    #[test]
    fn test_bind_error_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let error = ServerError::BindError {
            address: "127.0.0.1:8787".to_string(),
            source: io_error,
        };
        assert!(error
            .to_string()
            .contains("Failed to bind to 127.0.0.1:8787"));
        assert!(error.to_string().contains("address in use"));
    }

    #[test]
    fn test_relay_status_passthrough() {
        let limited = ServerError::from(RelayError::RateLimited("HTTP 429".into()));
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.code(), "rate_limited");

        let quota = ServerError::from(RelayError::QuotaExhausted("HTTP 402".into()));
        assert_eq!(quota.status(), StatusCode::PAYMENT_REQUIRED);

        let malformed = ServerError::from(RelayError::MalformedPayload {
            kind: RequestKind::Doctor,
            reason: "empty".into(),
        });
        assert_eq!(malformed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(malformed.code(), "malformed_payload");
    }

    #[test]
    fn test_relay_error_message_is_transparent() {
        let error = ServerError::from(RelayError::UnknownKind("poem".into()));
        assert_eq!(error.to_string(), "Unknown type: poem");
    }

    #[test]
    fn test_audit_disabled() {
        let error = ServerError::AuditDisabled;
        assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error.code(), "audit_disabled");
    }
}
