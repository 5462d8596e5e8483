//! `GeoJSON` feature-collection parsing for the SNV road network.
//!
//! The national dataset mixes route centerlines with administrative
//! features (state boundaries, survey markers). Anything that is not a
//! line geometry is skipped silently; features without a route code
//! are kept so callers can still see them, but they never win a
//! lookup.

use geo::LineString;
use geojson::{FeatureCollection, GeoJson};

use crate::{NetworkError, RoadGeometry, RoadNetwork};
use rodovia_match_geo::GeoPoint;

/// Property keys that may carry the SNV route code, in precedence
/// order. First non-null wins.
const ROUTE_CODE_KEYS: &[&str] = &["codigo_snv", "cod_snv", "snv"];

/// Parses a `GeoJSON` feature collection into a [`RoadNetwork`].
///
/// # Errors
///
/// Returns [`NetworkError::Geojson`] when the text is not valid
/// `GeoJSON`, or [`NetworkError::Dataset`] when it is valid but not a
/// feature collection.
pub fn parse_network(geojson_text: &str) -> Result<RoadNetwork, NetworkError> {
    let gj: GeoJson = geojson_text.parse()?;
    let collection =
        FeatureCollection::try_from(gj).map_err(|e| NetworkError::Dataset {
            message: format!("not a feature collection: {e}"),
        })?;

    let total = collection.features.len();
    let mut features = Vec::new();
    let mut skipped = 0_usize;

    for feature in collection.features {
        let route_code = feature.properties.as_ref().and_then(extract_route_code);

        let lines = feature
            .geometry
            .and_then(|geometry| geometry_lines(&geometry))
            .map(|lines| {
                lines
                    .into_iter()
                    .filter(|line| usable_line(line))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        if lines.is_empty() {
            skipped += 1;
            continue;
        }

        features.push(RoadGeometry { route_code, lines });
    }

    if skipped > 0 {
        log::debug!("Skipped {skipped}/{total} features without usable line geometry");
    }

    Ok(RoadNetwork::new(features))
}

/// First non-null route code among [`ROUTE_CODE_KEYS`]. Numeric codes
/// are accepted and stringified, since some state datasets store the
/// SNV code as a number.
fn extract_route_code(properties: &geojson::JsonObject) -> Option<String> {
    for key in ROUTE_CODE_KEYS {
        match properties.get(*key) {
            Some(serde_json::Value::String(code)) if !code.is_empty() => {
                return Some(code.clone());
            }
            Some(serde_json::Value::Number(code)) => return Some(code.to_string()),
            _ => {}
        }
    }
    None
}

/// Extracts the constituent lines of a Line or MultiLine geometry.
/// Any other geometry type yields `None`.
fn geometry_lines(geometry: &geojson::Geometry) -> Option<Vec<LineString<f64>>> {
    let geom: geo::Geometry<f64> = geometry.clone().try_into().ok()?;
    match geom {
        geo::Geometry::LineString(line) => Some(vec![line]),
        geo::Geometry::MultiLineString(multi) => Some(multi.0),
        _ => None,
    }
}

/// A line is usable when it has at least two vertices and every vertex
/// is a plausible WGS84 coordinate.
fn usable_line(line: &LineString<f64>) -> bool {
    line.0.len() >= 2
        && line
            .coords()
            .all(|c| GeoPoint::new(c.y, c.x).is_valid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_collection(features: &str) -> String {
        format!(r#"{{"type":"FeatureCollection","features":[{features}]}}"#)
    }

    const BR_101: &str = r#"{"type":"Feature","properties":{"codigo_snv":"101BRJ0010"},
        "geometry":{"type":"LineString","coordinates":[[-43.2,-22.9],[-43.1,-22.8]]}}"#;

    #[test]
    fn parses_line_feature() {
        let network = parse_network(&feature_collection(BR_101)).unwrap();
        assert_eq!(network.len(), 1);
        assert_eq!(
            network.features()[0].route_code.as_deref(),
            Some("101BRJ0010")
        );
        assert_eq!(network.features()[0].lines.len(), 1);
    }

    #[test]
    fn parses_multi_line_feature() {
        let feature = r#"{"type":"Feature","properties":{"cod_snv":"116BSP0350"},
            "geometry":{"type":"MultiLineString","coordinates":[
                [[-46.6,-23.5],[-46.5,-23.4]],
                [[-46.61,-23.51],[-46.51,-23.41]]]}}"#;
        let network = parse_network(&feature_collection(feature)).unwrap();
        assert_eq!(network.features()[0].lines.len(), 2);
    }

    #[test]
    fn route_code_key_precedence() {
        let feature = r#"{"type":"Feature",
            "properties":{"snv":"fallback","codigo_snv":"primary"},
            "geometry":{"type":"LineString","coordinates":[[0.0,0.0],[1.0,1.0]]}}"#;
        let network = parse_network(&feature_collection(feature)).unwrap();
        assert_eq!(network.features()[0].route_code.as_deref(), Some("primary"));
    }

    #[test]
    fn null_code_falls_through_to_next_key() {
        let feature = r#"{"type":"Feature",
            "properties":{"codigo_snv":null,"cod_snv":"060BGO0230"},
            "geometry":{"type":"LineString","coordinates":[[0.0,0.0],[1.0,1.0]]}}"#;
        let network = parse_network(&feature_collection(feature)).unwrap();
        assert_eq!(
            network.features()[0].route_code.as_deref(),
            Some("060BGO0230")
        );
    }

    #[test]
    fn numeric_code_is_stringified() {
        let feature = r#"{"type":"Feature","properties":{"snv":101},
            "geometry":{"type":"LineString","coordinates":[[0.0,0.0],[1.0,1.0]]}}"#;
        let network = parse_network(&feature_collection(feature)).unwrap();
        assert_eq!(network.features()[0].route_code.as_deref(), Some("101"));
    }

    #[test]
    fn polygon_features_are_skipped() {
        let polygon = r#"{"type":"Feature","properties":{"codigo_snv":"X"},
            "geometry":{"type":"Polygon","coordinates":[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]]}}"#;
        let network =
            parse_network(&feature_collection(&format!("{polygon},{BR_101}"))).unwrap();
        assert_eq!(network.len(), 1);
    }

    #[test]
    fn codeless_feature_is_kept() {
        let feature = r#"{"type":"Feature","properties":{"name":"access road"},
            "geometry":{"type":"LineString","coordinates":[[0.0,0.0],[1.0,1.0]]}}"#;
        let network = parse_network(&feature_collection(feature)).unwrap();
        assert_eq!(network.len(), 1);
        assert!(network.features()[0].route_code.is_none());
    }

    #[test]
    fn single_vertex_line_is_dropped() {
        let feature = r#"{"type":"Feature","properties":{"snv":"X"},
            "geometry":{"type":"LineString","coordinates":[[0.0,0.0]]}}"#;
        let network = parse_network(&feature_collection(feature)).unwrap();
        assert!(network.is_empty());
    }

    #[test]
    fn out_of_range_coordinates_are_dropped() {
        let feature = r#"{"type":"Feature","properties":{"snv":"X"},
            "geometry":{"type":"LineString","coordinates":[[-43.2,-22.9],[-43.1,-95.0]]}}"#;
        let network = parse_network(&feature_collection(feature)).unwrap();
        assert!(network.is_empty());
    }

    #[test]
    fn rejects_bare_geometry() {
        let err = parse_network(r#"{"type":"Point","coordinates":[0.0,0.0]}"#).unwrap_err();
        assert!(matches!(err, NetworkError::Dataset { .. }));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_network("not geojson").is_err());
    }
}
