//! Nearest-route lookup over the loaded network.
//!
//! A full linear scan over the features: the call pattern is a one-off
//! lookup per clicked/observed point, not a bulk spatial join, so an
//! index would cost more to build than it ever saves.

use geo::{Closest, ClosestPoint, Line, Point};

use crate::{RoadGeometry, RoadNetwork, to_geo_point, to_point};
use rodovia_match_geo::{GeoPoint, distance_meters};
use rodovia_match_network_models::{Confidence, LookupConfig};

/// A successful nearest-route lookup. Borrows from the network handle
/// and is never persisted by this crate.
#[derive(Debug, Clone, Copy)]
pub struct LookupResult<'a> {
    /// Route code of the winning feature.
    pub route_code: &'a str,
    /// Distance from the query point to the feature, in meters.
    pub distance_meters: f64,
    /// Confidence bucket for that distance.
    pub confidence: Confidence,
    /// The winning feature.
    pub feature: &'a RoadGeometry,
}

impl RoadNetwork {
    /// Finds the route nearest to `point`.
    ///
    /// Features without a route code are skipped. Returns `None` when
    /// the nearest candidate is further than `config.tolerance_m` —
    /// attaching a coordinate to a route tens of kilometers away is
    /// worse than reporting no route at all.
    #[must_use]
    pub fn lookup_nearest_route(
        &self,
        point: GeoPoint,
        config: &LookupConfig,
    ) -> Option<LookupResult<'_>> {
        let target = to_point(point);
        let mut best: Option<(f64, &str, &RoadGeometry)> = None;

        for feature in self.features() {
            let Some(code) = feature.route_code.as_deref() else {
                continue;
            };
            let Some(distance) = min_distance_to_feature(point, target, feature) else {
                continue;
            };
            if best.is_none_or(|(current, _, _)| distance < current) {
                best = Some((distance, code, feature));
            }
        }

        let (distance, route_code, feature) = best?;
        if distance > config.tolerance_m {
            log::debug!(
                "Nearest route {route_code} is {distance:.1} m away, beyond the \
                 {:.0} m tolerance",
                config.tolerance_m
            );
            return None;
        }

        Some(LookupResult {
            route_code,
            distance_meters: distance,
            confidence: Confidence::from_distance(distance, config),
            feature,
        })
    }

    /// Nearest route for a two-point segment observation, approximated
    /// by looking up the segment's midpoint. This does not compute
    /// true segment-to-segment overlap.
    #[must_use]
    pub fn lookup_nearest_route_for_segment(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        config: &LookupConfig,
    ) -> Option<LookupResult<'_>> {
        let midpoint = GeoPoint::new(
            f64::midpoint(start.latitude, end.latitude),
            f64::midpoint(start.longitude, end.longitude),
        );
        self.lookup_nearest_route(midpoint, config)
    }
}

impl RoadGeometry {
    /// Minimum distance in meters from `point` to this feature, or
    /// `None` for a feature with no usable lines.
    #[must_use]
    pub fn distance_to(&self, point: GeoPoint) -> Option<f64> {
        min_distance_to_feature(point, to_point(point), self)
    }
}

/// Minimum distance from `point` to any sub-segment of the feature.
/// Sub-lines are handled independently; there is no interpolation
/// across the gap between carriageways.
fn min_distance_to_feature(
    point: GeoPoint,
    target: Point<f64>,
    feature: &RoadGeometry,
) -> Option<f64> {
    let mut min: Option<f64> = None;
    for line in &feature.lines {
        for segment in line.lines() {
            let d = distance_to_segment(point, target, &segment);
            min = Some(min.map_or(d, |m| m.min(d)));
        }
    }
    min
}

/// Distance from a point to one segment: planar projection onto the
/// segment in degree space, then geodesic distance to the projected
/// point.
pub(crate) fn distance_to_segment(point: GeoPoint, target: Point<f64>, segment: &Line<f64>) -> f64 {
    let nearest = match segment.closest_point(&target) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => p,
        Closest::Indeterminate => Point::from(segment.start),
    };
    distance_meters(point, to_geo_point(nearest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_network;

    fn network() -> RoadNetwork {
        parse_network(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"codigo_snv":"101BRJ0010"},
                 "geometry":{"type":"LineString",
                             "coordinates":[[-43.2,-22.9],[-43.2,-22.8],[-43.2,-22.7]]}},
                {"type":"Feature","properties":{"codigo_snv":"116BSP0350"},
                 "geometry":{"type":"MultiLineString",
                             "coordinates":[[[-46.6,-23.5],[-46.6,-23.4]],
                                            [[-46.59,-23.5],[-46.59,-23.4]]]}},
                {"type":"Feature","properties":{"name":"service road"},
                 "geometry":{"type":"LineString",
                             "coordinates":[[-43.2001,-22.9],[-43.2001,-22.8]]}}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn point_on_vertex_is_exact_and_high() {
        let network = network();
        let result = network
            .lookup_nearest_route(GeoPoint::new(-22.9, -43.2), &LookupConfig::default())
            .unwrap();
        assert_eq!(result.route_code, "101BRJ0010");
        assert!(result.distance_meters < 1e-6);
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn far_point_returns_none() {
        let network = network();
        // ~1 km east of the BR-101 line.
        let result =
            network.lookup_nearest_route(GeoPoint::new(-22.85, -43.19), &LookupConfig::default());
        assert!(result.is_none());
    }

    #[test]
    fn raised_tolerance_reaches_low_confidence() {
        let network = network();
        let result = network
            .lookup_nearest_route(
                GeoPoint::new(-22.85, -43.199),
                &LookupConfig::with_tolerance(500.0),
            )
            .unwrap();
        assert_eq!(result.route_code, "101BRJ0010");
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn codeless_feature_never_wins() {
        let network = network();
        // Exactly on the code-less service road, ~10 m from BR-101.
        let result = network
            .lookup_nearest_route(GeoPoint::new(-22.85, -43.2001), &LookupConfig::default())
            .unwrap();
        assert_eq!(result.route_code, "101BRJ0010");
        assert!(result.distance_meters > 1.0);
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn multi_line_minimum_over_sub_lines() {
        let network = network();
        // On the second carriageway of BR-116.
        let result = network
            .lookup_nearest_route(GeoPoint::new(-23.45, -46.59), &LookupConfig::default())
            .unwrap();
        assert_eq!(result.route_code, "116BSP0350");
        assert!(result.distance_meters < 1e-6);
    }

    #[test]
    fn projection_beats_nearest_vertex() {
        let network = network();
        // Midway between two vertices of BR-101, slightly east: the
        // perpendicular distance is meters while either vertex is km.
        let result = network
            .lookup_nearest_route(GeoPoint::new(-22.85, -43.1999), &LookupConfig::default())
            .unwrap();
        assert!(result.distance_meters < 15.0, "{}", result.distance_meters);
    }

    #[test]
    fn segment_lookup_uses_midpoint() {
        let network = network();
        let result = network
            .lookup_nearest_route_for_segment(
                GeoPoint::new(-22.9, -43.2),
                GeoPoint::new(-22.8, -43.2),
                &LookupConfig::default(),
            )
            .unwrap();
        assert_eq!(result.route_code, "101BRJ0010");
        assert!(result.distance_meters < 1e-6);
    }

    #[test]
    fn empty_network_returns_none() {
        let network = RoadNetwork::default();
        assert!(
            network
                .lookup_nearest_route(GeoPoint::new(0.0, 0.0), &LookupConfig::default())
                .is_none()
        );
    }
}
