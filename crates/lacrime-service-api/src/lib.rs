//! LA crime dashboard HTTP API.
//!
//! Serves the incident dataset and the two map overlays to the browser
//! dashboard. Every route is a read-only `GET`.
//!
//! # Endpoints
//!
//! - `GET /` - Plain-text welcome message
//! - `GET /crimedata` - All incident rows
//! - `GET /crimedata/{keyword}` - Rows whose description contains the keyword
//! - `GET /crimedata/other/all` - Rows outside every dashboard category
//! - `GET /stations` - Police station points as GeoJSON
//! - `GET /cityareas` - Neighborhood service areas as GeoJSON
//! - `GET /metrics` - Prometheus metrics endpoint
//! - `GET /health/live` - Liveness check
//! - `GET /health/ready` - Readiness check (store query and boundary files)

#![deny(warnings)]

pub mod handlers;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use lacrime_service_shared::{health_live, health_ready, metrics_handler, AppState, MetricsLayer};

/// Build the application router over a loaded state.
///
/// Cross-origin requests are allowed from any origin since the dashboard is
/// served from a different port.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::welcome))
        .route("/crimedata", get(handlers::all_incidents))
        .route("/crimedata/other/all", get(handlers::other_incidents))
        .route("/crimedata/{keyword}", get(handlers::incidents_by_keyword))
        .route("/stations", get(handlers::stations))
        .route("/cityareas", get(handlers::city_areas))
        .route("/metrics", get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .layer(MetricsLayer)
        .with_state(state)
}
