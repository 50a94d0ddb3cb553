//! LA crime dashboard HTTP API server.
//!
//! # Configuration
//!
//! - `CRIME_DATA_PATH` - Incident CSV (default: data/DataCleaned.csv)
//! - `CRIME_DB_PATH` - Optional SQLite file; the store is in-memory when unset
//! - `CRIME_DB_READERS` - SQLite connections serving reads (default: 4)
//! - `METRICS_ENABLED` - Set to false to skip the Prometheus recorder
//! - `STATIONS_GEOJSON_PATH` / `CITY_AREAS_GEOJSON_PATH` - Boundary files
//! - `SERVICE_HOST` / `SERVICE_PORT` - Bind address (default: 127.0.0.1:5000)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text

use tracing::{error, info};

use lacrime_service_api::build_router;
use lacrime_service_shared::{
    init_logging, init_metrics, AppState, LoggingConfig, MetricsConfig, MetricsError,
    ServiceConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("api");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    match init_metrics(&metrics_config) {
        Ok(()) => {}
        Err(MetricsError::Disabled) => info!("metrics disabled"),
        Err(e) => {
            tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics")
        }
    }

    let config = ServiceConfig::from_env()
        .with_service(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    let addr = config.socket_addr();

    info!(
        data_path = %config.crime_data_path.display(),
        table = %config.table_name,
        readers = config.read_connections,
        addr = %addr,
        "starting crime data api"
    );

    let state = AppState::load(config.clone()).map_err(|e| {
        error!(error = %e, path = %config.crime_data_path.display(), "failed to load incident store");
        e
    })?;

    info!(
        rows = state.store().row_count(),
        columns = state.store().columns().len(),
        "incident store loaded"
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "listening on");
    axum::serve(listener, app).await?;

    Ok(())
}
