//! Shared infrastructure for the LA crime dashboard HTTP API.
//!
//! This crate provides the HTTP glue around `lacrime-lib`:
//!
//! - [`AppState`]: Incident store built at startup, shared by every handler
//! - [`ServiceConfig`]: Environment-driven data paths and bind address
//! - [`health_ready`]: Liveness/readiness handlers backed by a store query
//! - [`ProblemDetails`]: RFC 9457 Problem Details for consistent error responses
//! - [`metrics`]: Prometheus metrics infrastructure
//! - [`logging`]: Structured JSON logging setup
//! - [`middleware`]: Request-ID propagation and HTTP metrics
//!
//! # Architecture
//!
//! Handlers stay thin; all query and parsing logic lives in `lacrime-lib`:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Extract path keyword / request ID                        │
//! │  - Call lacrime-lib APIs                                    │
//! │  - Serialize JSON or map errors to ProblemDetails           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides a fixture-backed state for handler
//! testing. Enable the `test-utils` feature to access it from dependent crates.

#![deny(warnings)]

mod config;
mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::ServiceConfig;
pub use health::{
    health_live, health_ready, readiness, BoundaryFileCheck, HealthReport, HealthStatus,
};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_features_served, record_geo_asset_failed,
    record_incidents_returned, record_query_failed, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_GEO_ASSET,
    PROBLEM_INVALID_REQUEST, PROBLEM_NOT_FOUND, PROBLEM_QUERY_FAILED, PROBLEM_SERVICE_UNAVAILABLE,
};
pub use state::{AppState, AppStateError};
