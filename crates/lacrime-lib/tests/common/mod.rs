//! Shared fixture helpers for integration tests.

use std::path::PathBuf;

/// Directory holding the checked-in CSV and GeoJSON fixtures.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Twelve-row extract of the cleaned LAPD incident CSV.
#[allow(dead_code)]
pub fn crime_csv_path() -> PathBuf {
    fixtures_dir().join("crime_sample.csv")
}

#[allow(dead_code)]
pub fn stations_path() -> PathBuf {
    fixtures_dir().join("stations.geojson")
}

#[allow(dead_code)]
pub fn city_areas_path() -> PathBuf {
    fixtures_dir().join("city_areas.geojson")
}
