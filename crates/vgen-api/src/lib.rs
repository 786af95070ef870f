//! Axum HTTP API server.
//!
//! This crate provides:
//! - The video generation REST API (submit, poll, list)
//! - The job lifecycle manager driving create → generate → terminal update
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, FallbackPolicy, DEMO_VIDEO_URL};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::JobLifecycleManager;
pub use state::AppState;
