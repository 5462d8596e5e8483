//! Median-centroid filtering of geographically implausible points.
//!
//! Field devices occasionally report a fix thousands of kilometers
//! from the survey area (cold-start GPS, swapped lat/lon). Before a
//! point set is used for route attribution it is filtered against a
//! pseudo-centroid built from the per-axis *medians* — unlike the
//! mean, the median is not dragged toward the bad fixes it is
//! supposed to reject.

use crate::{GeoPoint, distance_meters};

/// Default retention radius around the pseudo-centroid, in kilometers.
///
/// 2,500 km comfortably covers a state-sized survey lot while
/// rejecting fixes on the wrong continent.
pub const DEFAULT_OUTLIER_RADIUS_KM: f64 = 2500.0;

/// Removes points further than `max_distance_km` from the median
/// pseudo-centroid of the set.
///
/// Returns an order-preserving subset. An empty input yields an empty
/// output; a single point is always retained (its distance to the
/// centroid — itself — is zero).
#[must_use]
pub fn remove_outliers(points: &[GeoPoint], max_distance_km: f64) -> Vec<GeoPoint> {
    if points.len() <= 1 {
        return points.to_vec();
    }

    let centroid = GeoPoint::new(
        median(points.iter().map(|p| p.latitude).collect()),
        median(points.iter().map(|p| p.longitude).collect()),
    );
    let max_meters = max_distance_km * 1000.0;

    points
        .iter()
        .copied()
        .filter(|p| distance_meters(*p, centroid) <= max_meters)
        .collect()
}

/// Median of a non-empty value set. Even-length inputs average the two
/// middle values.
fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        f64::midpoint(values[mid - 1], values[mid])
    } else {
        values[mid]
    }
}
