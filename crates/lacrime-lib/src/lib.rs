//! LA crime dashboard library entry points.
//!
//! This crate loads the cleaned incident CSV into a queryable table, runs the
//! keyword and residual-category filters the dashboard needs, and normalizes
//! the station and service-area boundary files into GeoJSON feature
//! collections. HTTP services should only depend on the functions exported
//! here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod db;
pub mod error;
pub mod geo;
pub mod incidents;

pub use db::{
    Column, ColumnAffinity, IncidentRecord, IncidentStore, StoreOptions,
    DEFAULT_DESCRIPTION_COLUMN, DEFAULT_READ_CONNECTIONS, DEFAULT_TABLE_NAME,
};
pub use error::{Error, Result};
pub use geo::{load_feature_collection, BoundaryCollection, BoundaryFeature, GeoAsset};
pub use incidents::{is_other_category, IncidentQueries, OTHER_CATEGORY_KEYWORDS};
