//! HTTP handlers for the relay API.

use std::collections::BTreeMap;
use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use super::api::{
    HealthResponse, LogsQuery, LogsResponse, MetricsResponse, RelayRequestBody, RelayResponse,
};
use super::error::ServerError;
use super::state::{AppState, RelayEvent};
use crate::relay::{RequestKind, RequestMetadata};

/// Path the browser client posts to.
pub const RELAY_PATH: &str = "/ai-chat";
/// Alternate path for the same endpoint.
pub const RELAY_PATH_ALIAS: &str = "/api/relay";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Client address and user agent from proxy headers.
///
/// `x-real-ip` wins; otherwise the first hop of `x-forwarded-for`.
#[must_use]
pub fn client_metadata(headers: &HeaderMap) -> RequestMetadata {
    let ip_address = header_value(headers, "x-real-ip").or_else(|| {
        header_value(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|first| first.trim().to_string()))
    });

    RequestMetadata {
        ip_address,
        user_agent: header_value(headers, "user-agent"),
    }
}

/// POST /ai-chat - Relay one advisory request to the model.
pub async fn post_relay(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RelayRequestBody>, JsonRejection>,
) -> Result<Json<RelayResponse>, ServerError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected relay body");
        ServerError::InvalidBody(rejection.body_text())
    })?;

    let request = body.into_request().inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected relay request");
    })?;
    let metadata = client_metadata(&headers);

    let result = state.relay.handle(&request, &metadata).await;
    match result {
        Ok(advice) => {
            state.publish(RelayEvent::completed(&advice, request.caller_id.clone()));
            Ok(Json(RelayResponse::from(advice)))
        }
        Err(err) => {
            if err.is_upstream() {
                state.publish(RelayEvent::failed(request.kind, &err, request.caller_id));
            }
            Err(err.into())
        }
    }
}

/// GET /api/logs - Newest audit records for the admin view.
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, ServerError> {
    let audit = state.audit.as_ref().ok_or(ServerError::AuditDisabled)?;
    let logs = audit.recent(query.effective_limit()).await?;
    Ok(Json(LogsResponse { logs }))
}

/// GET /api/metrics - Aggregated audit counts.
pub async fn get_metrics(
    State(state): State<AppState>,
) -> Result<Json<MetricsResponse>, ServerError> {
    let audit = state.audit.as_ref().ok_or(ServerError::AuditDisabled)?;

    let mut by_kind = BTreeMap::new();
    for kind in RequestKind::ALL {
        by_kind.insert(kind.as_str().to_string(), audit.count_by_kind(kind).await?);
    }

    Ok(Json(MetricsResponse {
        total: audit.count_records().await?,
        failures: audit.count_failures().await?,
        by_kind,
    }))
}

/// GET /api/health - Liveness and configuration summary.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.relay.model().to_string(),
        audit: state.audit.is_some(),
    })
}

/// GET /api/events - SSE stream of relay outcomes.
pub async fn get_events_sse(
    State(state): State<AppState>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok(Event::default().event(event.kind.as_str()).data(data)))
            }
            // lagged
            Err(_) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
