//! Boundary overlays for the dashboard map.
//!
//! Police station points and neighborhood service-area polygons are read from
//! GeoJSON files on every call and normalized into plain
//! `{type, geometry, properties}` features. Nothing is cached; the files are
//! small and static.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use geojson::{GeoJson, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Key that never appears in emitted feature properties.
const GEOMETRY_KEY: &str = "geometry";

/// The two boundary datasets the API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeoAsset {
    /// LAPD police station locations (points).
    Stations,
    /// Neighborhood service areas (polygons).
    CityAreas,
}

impl GeoAsset {
    /// Stable label used in logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            GeoAsset::Stations => "stations",
            GeoAsset::CityAreas => "cityareas",
        }
    }

    /// File name shipped with the LAPD open-data extracts.
    pub fn default_file_name(self) -> &'static str {
        match self {
            GeoAsset::Stations => "LAPD_Police_Stations.geojson",
            GeoAsset::CityAreas => "Neighborhood_Service_Areas.geojson",
        }
    }
}

impl fmt::Display for GeoAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single normalized feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryFeature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    pub properties: JsonObject,
}

/// A normalized feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<BoundaryFeature>,
}

impl BoundaryCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Read and normalize the GeoJSON file at `path`.
pub fn load_feature_collection(path: &Path) -> Result<BoundaryCollection> {
    if !path.exists() {
        return Err(Error::DatasetNotFound {
            path: path.to_path_buf(),
        });
    }

    let raw = fs::read_to_string(path)?;
    let collection = parse_feature_collection(&raw).map_err(|err| match err {
        Error::InvalidGeoJson { message, .. } => Error::InvalidGeoJson {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })?;

    debug!(path = %path.display(), features = collection.len(), "boundary file loaded");
    Ok(collection)
}

/// Normalize GeoJSON text into a [`BoundaryCollection`].
///
/// Accepts a FeatureCollection, a single Feature, or a bare Geometry. Feature
/// ids, bounding boxes and foreign members are dropped, and a `geometry` key is
/// never carried in properties. A feature without geometry is rejected.
pub fn parse_feature_collection(raw: &str) -> Result<BoundaryCollection> {
    let features = match GeoJson::from_str(raw)? {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .enumerate()
            .map(|(idx, feature)| normalize_feature(idx, feature.geometry, feature.properties))
            .collect::<Result<Vec<_>>>()?,
        GeoJson::Feature(feature) => {
            vec![normalize_feature(0, feature.geometry, feature.properties)?]
        }
        GeoJson::Geometry(geometry) => vec![normalize_feature(0, Some(geometry), None)?],
    };

    Ok(BoundaryCollection {
        kind: "FeatureCollection".to_string(),
        features,
    })
}

fn normalize_feature(
    idx: usize,
    geometry: Option<Geometry>,
    properties: Option<JsonObject>,
) -> Result<BoundaryFeature> {
    let geometry = geometry.ok_or_else(|| Error::InvalidGeoJson {
        path: Default::default(),
        message: format!("feature {idx} has no geometry"),
    })?;

    let mut properties = properties.unwrap_or_default();
    properties.shift_remove(GEOMETRY_KEY);

    Ok(BoundaryFeature {
        kind: "Feature".to_string(),
        geometry,
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Value as GeoValue;
    use serde_json::json;

    const STATIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 1,
                "bbox": [-118.3, 34.0, -118.3, 34.0],
                "geometry": {"type": "Point", "coordinates": [-118.2468, 34.0561]},
                "properties": {"DIVISION": "CENTRAL", "PREC": 1, "geometry": "stale"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-118.4512, 34.0443]},
                "properties": null
            }
        ]
    }"#;

    #[test]
    fn collection_is_normalized() {
        let collection = parse_feature_collection(STATIONS).unwrap();
        assert_eq!(collection.kind, "FeatureCollection");
        assert_eq!(collection.len(), 2);

        let first = &collection.features[0];
        assert_eq!(first.kind, "Feature");
        assert!(matches!(first.geometry.value, GeoValue::Point(_)));
        assert_eq!(first.properties.get("DIVISION"), Some(&json!("CENTRAL")));
        assert!(!first.properties.contains_key("geometry"));

        assert!(collection.features[1].properties.is_empty());
    }

    #[test]
    fn serialized_feature_has_only_standard_members() {
        let collection = parse_feature_collection(STATIONS).unwrap();
        let value = serde_json::to_value(&collection).unwrap();
        let feature = value["features"][0].as_object().unwrap();

        let mut keys: Vec<&str> = feature.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["geometry", "properties", "type"]);
        assert_eq!(value["type"], json!("FeatureCollection"));
        assert_eq!(feature["geometry"]["type"], json!("Point"));
    }

    #[test]
    fn single_feature_and_bare_geometry_are_wrapped() {
        let feature = r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,2.0]},"properties":{"a":1}}"#;
        assert_eq!(parse_feature_collection(feature).unwrap().len(), 1);

        let geometry = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#;
        let collection = parse_feature_collection(geometry).unwrap();
        assert_eq!(collection.len(), 1);
        assert!(collection.features[0].properties.is_empty());
    }

    #[test]
    fn feature_without_geometry_is_rejected() {
        let raw = r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":null,"properties":{}}]}"#;
        let err = parse_feature_collection(raw).unwrap_err();
        assert!(err.to_string().contains("feature 0 has no geometry"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_feature_collection("{not json"),
            Err(Error::GeoJson(_))
        ));
    }

    #[test]
    fn missing_file_reports_dataset_not_found() {
        let err = load_feature_collection(Path::new("/nonexistent/stations.geojson")).unwrap_err();
        assert!(matches!(err, Error::DatasetNotFound { .. }));
    }

    #[test]
    fn asset_labels_match_routes() {
        assert_eq!(GeoAsset::Stations.label(), "stations");
        assert_eq!(GeoAsset::CityAreas.to_string(), "cityareas");
        assert_eq!(
            GeoAsset::CityAreas.default_file_name(),
            "Neighborhood_Service_Areas.geojson"
        );
    }
}
