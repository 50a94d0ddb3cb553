//! Application state for the HTTP API.
//!
//! Holds the incident store built at startup plus the configured boundary file
//! locations. The store is only read after construction, so handlers share it
//! through an `Arc` without any coordination beyond the store's own connection
//! guard.

use std::path::Path;
use std::sync::Arc;

use lacrime_lib::{Error as LibError, GeoAsset, IncidentQueries, IncidentStore};

use crate::config::ServiceConfig;

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// Incident CSV not found at the configured path.
    DatasetNotFound(String),

    /// Failed to build the incident store from the CSV.
    StoreLoad(LibError),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatasetNotFound(path) => write!(f, "incident dataset not found: {}", path),
            Self::StoreLoad(e) => write!(f, "failed to load incident store: {}", e),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StoreLoad(e) => Some(e),
            Self::DatasetNotFound(_) => None,
        }
    }
}

impl From<LibError> for AppStateError {
    fn from(err: LibError) -> Self {
        match err {
            LibError::DatasetNotFound { path } => Self::DatasetNotFound(path.display().to_string()),
            other => Self::StoreLoad(other),
        }
    }
}

/// Shared application state for all axum handlers.
///
/// This struct is cheaply cloneable (using `Arc` internally) and should be
/// shared via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: IncidentStore,
    config: ServiceConfig,
}

impl AppState {
    /// Build the incident store from the configured CSV.
    ///
    /// Any existing table contents are replaced. Fails if the CSV is missing
    /// or malformed; the caller must not start serving in that case.
    pub fn load(config: ServiceConfig) -> Result<Self, AppStateError> {
        let csv_path = config.crime_data_path.clone();
        if !csv_path.exists() {
            return Err(AppStateError::DatasetNotFound(
                csv_path.display().to_string(),
            ));
        }

        tracing::info!(path = %csv_path.display(), "loading incident dataset");
        let store = IncidentStore::load(&csv_path, config.store_options())?;
        tracing::info!(
            rows = store.row_count(),
            columns = store.columns().len(),
            description_column = %store.description_column(),
            "incident dataset loaded"
        );

        Ok(Self::from_components(store, config))
    }

    /// Create application state from an already-built store.
    ///
    /// This is useful for testing or when the CSV comes from a non-file reader.
    pub fn from_components(store: IncidentStore, config: ServiceConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store, config }),
        }
    }

    /// Access the loaded incident store.
    pub fn store(&self) -> &IncidentStore {
        &self.inner.store
    }

    /// Query facade over the incident store.
    pub fn incidents(&self) -> IncidentQueries<'_> {
        IncidentQueries::new(&self.inner.store)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Path of the boundary file backing `asset`.
    pub fn geo_asset_path(&self, asset: GeoAsset) -> &Path {
        self.inner.config.geo_asset_path(asset)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("incident_count", &self.inner.store.row_count())
            .field("stations_path", &self.inner.config.stations_path)
            .field("city_areas_path", &self.inner.config.city_areas_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lacrime_lib::StoreOptions;
    use std::io::Cursor;

    fn minimal_store() -> IncidentStore {
        let csv = "DR_NO,Crm Cd Desc\n1,GRAND THEFT AUTO\n2,ARSON\n";
        IncidentStore::from_reader(Cursor::new(csv), StoreOptions::default()).unwrap()
    }

    #[test]
    fn test_app_state_from_components() {
        let state = AppState::from_components(minimal_store(), ServiceConfig::default());

        assert_eq!(state.store().row_count(), 2);
        assert_eq!(state.incidents().by_keyword("arson").unwrap().len(), 1);
    }

    #[test]
    fn test_app_state_clone_shares_store() {
        let state1 = AppState::from_components(minimal_store(), ServiceConfig::default());
        let state2 = state1.clone();

        assert!(std::ptr::eq(state1.store(), state2.store()));
    }

    #[test]
    fn test_app_state_debug() {
        let state = AppState::from_components(minimal_store(), ServiceConfig::default());
        let debug = format!("{:?}", state);

        assert!(debug.contains("AppState"));
        assert!(debug.contains("incident_count"));
        assert!(debug.contains("stations_path"));
    }

    #[test]
    fn test_app_state_error_display() {
        let err = AppStateError::DatasetNotFound("/path/to/DataCleaned.csv".to_string());
        assert!(err.to_string().contains("/path/to/DataCleaned.csv"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_app_state_load_nonexistent() {
        let config = ServiceConfig::with_data_dir("/nonexistent/data");
        let result = AppState::load(config);

        match result.unwrap_err() {
            AppStateError::DatasetNotFound(path) => {
                assert!(path.contains("nonexistent"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_app_state_load_malformed_csv() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ServiceConfig::with_data_dir(dir.path());
        std::fs::write(&config.crime_data_path, "DR_NO,Crm Cd Desc\n1,THEFT,extra\n").unwrap();

        let result = AppState::load(config);
        assert!(matches!(result.unwrap_err(), AppStateError::StoreLoad(_)));
    }
}
