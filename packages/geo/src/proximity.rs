//! Distance-ordered views over positioned records.
//!
//! Runs on every device position update against the full list of
//! pending necessities, so it stays a single pass plus one sort —
//! no spatial index, no per-item allocation.

use crate::{GeoPoint, distance_meters};

/// A record that may expose a geographic position.
///
/// Records without coordinates (imported from spreadsheets, km-only
/// plans) are valid and simply excluded from proximity views.
pub trait HasPosition {
    /// The record's position, if it has one.
    fn position(&self) -> Option<GeoPoint>;
}

impl HasPosition for GeoPoint {
    fn position(&self) -> Option<GeoPoint> {
        Some(*self)
    }
}

/// Orders `items` by ascending distance from `here`.
///
/// Items lacking coordinates are filtered out, not an error. The sort
/// is stable: ties keep their input order.
#[must_use]
pub fn sort_by_proximity<T: HasPosition>(
    items: impl IntoIterator<Item = T>,
    here: GeoPoint,
) -> Vec<(T, f64)> {
    let mut with_distance: Vec<(T, f64)> = items
        .into_iter()
        .filter_map(|item| {
            let position = item.position()?;
            Some((item, distance_meters(here, position)))
        })
        .collect();

    with_distance.sort_by(|a, b| a.1.total_cmp(&b.1));
    with_distance
}
