#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory road-network model for GPS-to-route attribution.
//!
//! Loads SNV centerline features from the national/state `GeoJSON`
//! dataset, caches the parsed network per dataset id, and answers the
//! two questions field tooling keeps asking: "which route is this
//! coordinate on?" ([`RoadNetwork::lookup_nearest_route`]) and "what
//! km is this point at?" ([`linref::interpolate_km`]).

pub mod cache;
pub mod linref;
pub mod lookup;
pub mod parse;

use geo::{LineString, Point};
use rodovia_match_geo::GeoPoint;
use thiserror::Error;

/// Errors that can occur while building a road network.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The dataset text is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    Geojson(#[from] geojson::Error),

    /// The dataset parsed but cannot be used as a road network.
    #[error("Dataset error: {message}")]
    Dataset {
        /// Description of what went wrong.
        message: String,
    },
}

/// One centerline feature of the road network.
///
/// A route may be split across several features, and a single feature
/// may carry several lines (dual carriageways arrive as MultiLine).
/// Features are never mutated after load.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadGeometry {
    /// SNV route code, when the feature carries one. Administrative
    /// features without a code are kept but never win a lookup.
    pub route_code: Option<String>,
    /// Constituent lines in (lon, lat) coordinate order.
    pub lines: Vec<LineString<f64>>,
}

impl RoadGeometry {
    /// Vertices of the feature's longest line as [`GeoPoint`]s, for
    /// use as a linear-referencing polyline.
    #[must_use]
    pub fn longest_line_points(&self) -> Vec<GeoPoint> {
        self.lines
            .iter()
            .max_by_key(|line| line.0.len())
            .map(|line| line.points().map(to_geo_point).collect())
            .unwrap_or_default()
    }
}

/// A parsed, immutable road network. Obtained from
/// [`cache::NetworkCache::load`] and shared read-only between callers.
#[derive(Debug, Default)]
pub struct RoadNetwork {
    features: Vec<RoadGeometry>,
}

impl RoadNetwork {
    /// Wraps parsed features into a network.
    #[must_use]
    pub const fn new(features: Vec<RoadGeometry>) -> Self {
        Self { features }
    }

    /// All features, including code-less administrative ones.
    #[must_use]
    pub fn features(&self) -> &[RoadGeometry] {
        &self.features
    }

    /// Number of features in the network.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.features.len()
    }

    /// `true` when the network has no features.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features carrying the given route code.
    pub fn features_for_route<'a>(
        &'a self,
        route_code: &'a str,
    ) -> impl Iterator<Item = &'a RoadGeometry> {
        self.features
            .iter()
            .filter(move |f| f.route_code.as_deref() == Some(route_code))
    }
}

/// (lat, lon) value type to the (x=lon, y=lat) convention `geo` uses.
pub(crate) fn to_point(p: GeoPoint) -> Point<f64> {
    Point::new(p.longitude, p.latitude)
}

pub(crate) fn to_geo_point(p: Point<f64>) -> GeoPoint {
    GeoPoint::new(p.y(), p.x())
}
