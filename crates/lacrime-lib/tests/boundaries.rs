mod common;

use geojson::Value as GeoValue;
use lacrime_lib::{load_feature_collection, Error, Result};
use tempfile::NamedTempFile;

fn raw_feature_count(path: &std::path::Path) -> usize {
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    raw["features"].as_array().map(Vec::len).unwrap_or_default()
}

#[test]
fn stations_fixture_loads_points() -> Result<()> {
    let path = common::stations_path();
    let collection = load_feature_collection(&path)?;

    assert_eq!(collection.len(), raw_feature_count(&path));
    for feature in &collection.features {
        assert!(matches!(feature.geometry.value, GeoValue::Point(_)));
        assert!(feature.properties.contains_key("DIVISION"));
        assert!(!feature.properties.contains_key("geometry"));
    }
    Ok(())
}

#[test]
fn city_areas_fixture_loads_polygons() -> Result<()> {
    let path = common::city_areas_path();
    let collection = load_feature_collection(&path)?;

    assert_eq!(collection.len(), raw_feature_count(&path));
    let names: Vec<&str> = collection
        .features
        .iter()
        .filter_map(|f| f.properties.get("NAME").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(names, vec!["Central", "West LA", "Harbor Districts"]);
    assert!(collection
        .features
        .iter()
        .all(|f| matches!(f.geometry.value, GeoValue::Polygon(_))));
    Ok(())
}

#[test]
fn reads_are_fresh_per_call() -> Result<()> {
    let file = NamedTempFile::new()?;
    std::fs::write(
        file.path(),
        r#"{"type":"FeatureCollection","features":[]}"#,
    )?;
    assert!(load_feature_collection(file.path())?.is_empty());

    std::fs::write(
        file.path(),
        r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Point","coordinates":[0.0,0.0]},"properties":{}}]}"#,
    )?;
    assert_eq!(load_feature_collection(file.path())?.len(), 1);
    Ok(())
}

#[test]
fn feature_without_geometry_names_the_file() -> Result<()> {
    let file = NamedTempFile::new()?;
    std::fs::write(
        file.path(),
        r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":null,"properties":{"NAME":"x"}}]}"#,
    )?;
    match load_feature_collection(file.path()) {
        Err(Error::InvalidGeoJson { path, .. }) => assert_eq!(path, file.path()),
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}
