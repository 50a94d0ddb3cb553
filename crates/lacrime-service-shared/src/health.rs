//! Liveness and readiness handlers.
//!
//! Liveness only confirms the process answers. Readiness runs a one-row query
//! against the incident table and checks each boundary file on disk. A missing
//! boundary file degrades its map route but leaves the service ready; a store
//! that cannot answer makes it unready.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use lacrime_lib::GeoAsset;

use crate::{AppState, ServiceConfig};

/// Overall outcome of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// Incidents are served but at least one boundary file is missing.
    Degraded,
    Unavailable,
}

/// Whether one boundary file exists at its configured path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryFileCheck {
    pub asset: String,
    pub present: bool,
}

/// JSON body of both health endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incidents_loaded: Option<usize>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boundary_files: Vec<BoundaryFileCheck>,

    /// Why the store failed its check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl HealthReport {
    fn new(config: &ServiceConfig, status: HealthStatus) -> Self {
        Self {
            status,
            service: config.service_name.clone(),
            version: config.service_version.clone(),
            incidents_loaded: None,
            boundary_files: Vec::new(),
            reason: None,
        }
    }

    /// `503` when the store cannot answer, `200` otherwise.
    pub fn http_status(&self) -> StatusCode {
        match self.status {
            HealthStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            HealthStatus::Ok | HealthStatus::Degraded => StatusCode::OK,
        }
    }
}

/// Check the store and boundary files behind `state`.
pub fn readiness(state: &AppState) -> HealthReport {
    let config = state.config();

    if let Err(e) = state.store().ping() {
        let mut report = HealthReport::new(config, HealthStatus::Unavailable);
        report.reason = Some(e.to_string());
        return report;
    }

    let boundary_files: Vec<BoundaryFileCheck> = [GeoAsset::Stations, GeoAsset::CityAreas]
        .into_iter()
        .map(|asset| BoundaryFileCheck {
            asset: asset.label().to_string(),
            present: state.geo_asset_path(asset).is_file(),
        })
        .collect();

    let status = if boundary_files.iter().all(|check| check.present) {
        HealthStatus::Ok
    } else {
        HealthStatus::Degraded
    };

    let mut report = HealthReport::new(config, status);
    report.incidents_loaded = Some(state.store().row_count());
    report.boundary_files = boundary_files;
    report
}

/// Liveness handler.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"lacrime-service-api","version":"0.1.0"}
/// ```
pub async fn health_live(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthReport::new(state.config(), HealthStatus::Ok))
}

/// Readiness handler.
///
/// ```text
/// GET /health/ready
/// {"status":"ok","service":"lacrime-service-api","version":"0.1.0","incidents_loaded":812345,
///  "boundary_files":[{"asset":"stations","present":true},{"asset":"cityareas","present":true}]}
/// ```
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let report = readiness(&state);
    match report.status {
        HealthStatus::Unavailable => {
            tracing::warn!(reason = ?report.reason, "readiness check failed")
        }
        HealthStatus::Degraded => tracing::debug!("boundary file missing, map routes degraded"),
        HealthStatus::Ok => {}
    }
    (report.http_status(), Json(report)).into_response()
}
