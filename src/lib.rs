//! MoodSync relay - AI advisory relay for mood tracking role views.

pub mod audit;
pub mod config;
pub mod display;
pub mod fallback;
pub mod mood;
pub mod relay;
pub mod server;
pub mod session;
