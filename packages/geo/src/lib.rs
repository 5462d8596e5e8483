#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geodesic primitives shared across the rodovia-match workspace.
//!
//! Everything here is pure computation over WGS84 coordinates: the
//! Haversine distance used by every other package, a median-centroid
//! outlier filter for GPS point sets, and the proximity sorter that
//! drives "nearest necessity" field alerts.

pub mod outliers;
pub mod proximity;

use serde::{Deserialize, Serialize};

/// Earth radius in meters used by [`distance_meters`].
///
/// Fixed at 6,371,000 m to reproduce the distances of the production
/// system this library replaces. Note this is *not* the IUGG mean
/// radius (6,371,008.8 m) that general-purpose geodesy crates use.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate pair.
///
/// Immutable value type. Latitude is expected in [-90, 90] and
/// longitude in [-180, 180]; see [`GeoPoint::is_valid`]. Out-of-range
/// values are not rejected here — parsers filter them instead, since a
/// national dataset is expected to contain some garbage rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point from decimal-degree coordinates.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` when both coordinates are inside the WGS84
    /// valid range. NaN fails both comparisons and is invalid.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Great-circle distance between two points in meters.
///
/// Haversine formula over [`EARTH_RADIUS_M`]. Symmetric, and zero for
/// identical inputs. NaN/Inf coordinates propagate into the result —
/// this is a pure numeric function with no error conditions.
#[must_use]
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(-15.793_889, -47.882_778);
        assert!(distance_meters(p, p).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(-23.55, -46.63);
        let b = GeoPoint::new(-22.91, -43.17);
        let ab = distance_meters(a, b);
        let ba = distance_meters(b, a);
        assert!((ab - ba).abs() / ab < 1e-6);
    }

    #[test]
    fn one_degree_longitude_at_equator() {
        let d = distance_meters(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn nan_propagates() {
        let d = distance_meters(GeoPoint::new(f64::NAN, 0.0), GeoPoint::new(0.0, 0.0));
        assert!(d.is_nan());
    }

    #[test]
    fn validity_range() {
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(-90.1, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }
}
