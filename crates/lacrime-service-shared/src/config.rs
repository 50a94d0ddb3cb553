//! Environment-driven service configuration.
//!
//! # Environment Variables
//!
//! - `CRIME_DATA_PATH`: incident CSV (default: `data/DataCleaned.csv`)
//! - `CRIME_DB_PATH`: on-disk SQLite file; unset keeps the table in memory
//! - `CRIME_TABLE_NAME`: table the CSV is loaded into (default: `LA_Crime_Data`)
//! - `CRIME_DESCRIPTION_COLUMN`: keyword filter column (default: `Crm Cd Desc`)
//! - `CRIME_DB_READERS`: SQLite connections serving reads (default: `4`)
//! - `STATIONS_GEOJSON_PATH`: police stations (default: `data/LAPD_Police_Stations.geojson`)
//! - `CITY_AREAS_GEOJSON_PATH`: service areas (default: `data/Neighborhood_Service_Areas.geojson`)
//! - `SERVICE_HOST`: bind address (default: `127.0.0.1`)
//! - `SERVICE_PORT`: HTTP port (default: `5000`)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use lacrime_lib::{
    GeoAsset, StoreOptions, DEFAULT_DESCRIPTION_COLUMN, DEFAULT_READ_CONNECTIONS,
    DEFAULT_TABLE_NAME,
};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_CSV_FILE: &str = "DataCleaned.csv";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SERVICE_NAME: &str = "lacrime-api";

/// Paths and network settings for the API service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub crime_data_path: PathBuf,
    pub database_path: Option<PathBuf>,
    pub table_name: String,
    pub description_column: String,
    pub read_connections: usize,
    pub stations_path: PathBuf,
    pub city_areas_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    /// Name reported by the health endpoints.
    pub service_name: String,
    pub service_version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::with_data_dir(DEFAULT_DATA_DIR)
    }
}

impl ServiceConfig {
    /// Defaults with every data file resolved under `dir`.
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            crime_data_path: dir.join(DEFAULT_CSV_FILE),
            database_path: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            description_column: DEFAULT_DESCRIPTION_COLUMN.to_string(),
            read_connections: DEFAULT_READ_CONNECTIONS,
            stations_path: dir.join(GeoAsset::Stations.default_file_name()),
            city_areas_path: dir.join(GeoAsset::CityAreas.default_file_name()),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Identify the binary serving this configuration.
    pub fn with_service(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.service_name = name.into();
        self.service_version = version.into();
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults.
    ///
    /// Unparseable host, port or reader count values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            crime_data_path: var("CRIME_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.crime_data_path),
            database_path: var("CRIME_DB_PATH").map(PathBuf::from),
            table_name: var("CRIME_TABLE_NAME").unwrap_or(defaults.table_name),
            description_column: var("CRIME_DESCRIPTION_COLUMN")
                .unwrap_or(defaults.description_column),
            read_connections: var("CRIME_DB_READERS")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.read_connections),
            stations_path: var("STATIONS_GEOJSON_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.stations_path),
            city_areas_path: var("CITY_AREAS_GEOJSON_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.city_areas_path),
            host: var("SERVICE_HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or(defaults.host),
            port: var("SERVICE_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            service_name: defaults.service_name,
            service_version: defaults.service_version,
        }
    }

    /// Store options derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        let options = StoreOptions::default()
            .with_table_name(self.table_name.clone())
            .with_description_column(self.description_column.clone())
            .with_read_connections(self.read_connections);
        match &self.database_path {
            Some(path) => options.with_database_path(path.clone()),
            None => options,
        }
    }

    /// Location of a boundary file.
    pub fn geo_asset_path(&self, asset: GeoAsset) -> &Path {
        match asset {
            GeoAsset::Stations => &self.stations_path,
            GeoAsset::CityAreas => &self.city_areas_path,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_dashboard_layout() {
        let config = ServiceConfig::from_lookup(lookup(&[]));
        assert_eq!(config.crime_data_path, PathBuf::from("data/DataCleaned.csv"));
        assert_eq!(
            config.stations_path,
            PathBuf::from("data/LAPD_Police_Stations.geojson")
        );
        assert_eq!(
            config.city_areas_path,
            PathBuf::from("data/Neighborhood_Service_Areas.geojson")
        );
        assert_eq!(config.table_name, "LA_Crime_Data");
        assert_eq!(config.description_column, "Crm Cd Desc");
        assert!(config.database_path.is_none());
        assert_eq!(config.read_connections, DEFAULT_READ_CONNECTIONS);
        assert_eq!(config.service_name, "lacrime-api");
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("CRIME_DATA_PATH", "/srv/crime.csv"),
            ("CRIME_DB_PATH", "/srv/crime.sqlite"),
            ("CRIME_DESCRIPTION_COLUMN", "description"),
            ("SERVICE_HOST", "0.0.0.0"),
            ("SERVICE_PORT", "8080"),
            ("CRIME_DB_READERS", "8"),
        ]));
        assert_eq!(config.crime_data_path, PathBuf::from("/srv/crime.csv"));
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");

        let options = config.store_options();
        assert_eq!(options.description_column, "description");
        assert_eq!(
            options.database_path,
            Some(PathBuf::from("/srv/crime.sqlite"))
        );
        assert_eq!(options.read_connections, 8);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("SERVICE_PORT", "not-a-port"),
            ("SERVICE_HOST", "localhost:80"),
            ("CRIME_TABLE_NAME", "   "),
            ("CRIME_DB_READERS", "0"),
        ]));
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.table_name, "LA_Crime_Data");
        assert_eq!(config.read_connections, DEFAULT_READ_CONNECTIONS);
    }

    #[test]
    fn service_identity_is_set_by_the_binary() {
        let config = ServiceConfig::default().with_service("lacrime-service-api", "2.1.0");
        assert_eq!(config.service_name, "lacrime-service-api");
        assert_eq!(config.service_version, "2.1.0");
    }

    #[test]
    fn geo_asset_paths_resolve_per_asset() {
        let config = ServiceConfig::with_data_dir("/fixtures");
        assert_eq!(
            config.geo_asset_path(GeoAsset::Stations),
            Path::new("/fixtures/LAPD_Police_Stations.geojson")
        );
        assert_eq!(
            config.geo_asset_path(GeoAsset::CityAreas),
            Path::new("/fixtures/Neighborhood_Service_Areas.geojson")
        );
    }
}
