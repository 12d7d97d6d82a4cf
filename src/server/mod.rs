//! HTTP surface for the relay: advisory endpoint, admin log view and a live
//! event stream.

mod api;
mod app;
mod error;
mod handlers;
mod state;

pub use api::{
    ErrorResponse, HealthResponse, LogsQuery, LogsResponse, MetricsResponse, RelayRequestBody,
    RelayResponse, MAX_LOGS_LIMIT,
};
pub use app::RelayServer;
pub use error::ServerError;
pub use handlers::{client_metadata, RELAY_PATH, RELAY_PATH_ALIAS};
pub use state::{AppState, RelayEvent, DEFAULT_EVENT_CHANNEL_CAPACITY};
