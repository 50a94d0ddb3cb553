//! Test utilities for handler testing.
//!
//! This module provides fixture paths and a pre-loaded [`AppState`] built
//! from the checked-in incident CSV and boundary files.

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::config::ServiceConfig;
use crate::state::AppState;

/// Directory holding the test fixtures.
pub const TEST_FIXTURE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../docs/fixtures");

/// Lazily-initialized test state using the fixture files.
static TEST_STATE: OnceLock<AppState> = OnceLock::new();

/// Configuration pointing every data path at the fixtures directory.
pub fn fixture_config() -> ServiceConfig {
    let dir = PathBuf::from(TEST_FIXTURE_DIR);
    ServiceConfig {
        crime_data_path: dir.join("crime_sample.csv"),
        stations_path: dir.join("stations.geojson"),
        city_areas_path: dir.join("city_areas.geojson"),
        ..ServiceConfig::with_data_dir(&dir)
    }
}

/// Get a shared test AppState loaded from the fixture files.
///
/// # Panics
///
/// Panics if the fixture CSV cannot be loaded. This indicates a test
/// configuration issue.
pub fn test_state() -> AppState {
    TEST_STATE
        .get_or_init(|| {
            let config = fixture_config();
            AppState::load(config.clone()).unwrap_or_else(|e| {
                panic!(
                    "failed to load test fixture from {:?}: {}",
                    config.crime_data_path, e
                )
            })
        })
        .clone()
}

/// Known facts about the fixture CSV for use in assertions.
pub mod fixture_incidents {
    /// Rows in `crime_sample.csv`.
    pub const ROW_COUNT: usize = 12;

    /// DR numbers of rows matching none of the category keywords.
    pub const OTHER_DR_NUMBERS: [i64; 3] = [201607038, 200516043, 202116604];

    /// Rows whose description contains "VEHICLE".
    pub const VEHICLE_COUNT: usize = 3;

    /// Features in `stations.geojson`.
    pub const STATION_COUNT: usize = 4;

    /// Features in `city_areas.geojson`.
    pub const CITY_AREA_COUNT: usize = 3;
}
