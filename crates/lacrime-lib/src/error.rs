use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the LA crime library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A backing data file could not be located at the resolved path.
    #[error("dataset not found at {path}")]
    DatasetNotFound { path: PathBuf },

    /// The incident CSV is structurally unusable (no header, blank or duplicate columns).
    #[error("invalid incident dataset: {message}")]
    InvalidDataset { message: String },

    /// A column the store needs is absent from the loaded dataset.
    #[error("column '{column}' not found; available columns: {}", .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// A boundary file parsed as GeoJSON but contains an unusable feature.
    #[error("invalid GeoJSON in {path}: {message}")]
    InvalidGeoJson { path: PathBuf, message: String },

    /// The store connection lock was poisoned by a panicking reader.
    #[error("incident store is unavailable: connection lock poisoned")]
    StoreUnavailable,

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for CSV parsing errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Wrapper for GeoJSON parsing errors.
    #[error(transparent)]
    GeoJson(#[from] geojson::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
