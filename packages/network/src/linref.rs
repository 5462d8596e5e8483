//! Linear referencing: expressing a position as km-along-route.
//!
//! Enables "click on map → get km" and "photo GPS → get km" without
//! the caller pre-computing any referencing structure. The km value is
//! interpolated between the segment's known start/end markers in
//! proportion to geodesic distance along the polyline.

use geo::{Line, LineLocatePoint};

use crate::{lookup, to_point};
use rodovia_match_geo::{GeoPoint, distance_meters};
use rodovia_match_network_models::ProjectionMode;

/// Interpolates the km position of `click` along `polyline`, whose
/// endpoints are at `km_start` and `km_end`.
///
/// A degenerate polyline (fewer than two vertices, or zero total
/// length) returns `km_start`: the UI needs *an* answer, but the event
/// is logged because silently misattributing a km is how bad survey
/// rows are born.
///
/// `ProjectionMode::NearestVertex` reproduces the production system's
/// nearest-endpoint approximation; `ProjectionMode::Perpendicular`
/// projects onto the closest sub-segment properly. Both clamp the
/// projection fraction to [0, 1], so clicks beyond either end pin to
/// the corresponding marker.
#[must_use]
pub fn interpolate_km(
    click: GeoPoint,
    polyline: &[GeoPoint],
    km_start: f64,
    km_end: f64,
    mode: ProjectionMode,
) -> f64 {
    if polyline.len() < 2 {
        log::warn!(
            "Degenerate polyline ({} vertices); returning start km {km_start}",
            polyline.len()
        );
        return km_start;
    }

    // Cumulative geodesic arc length at each vertex.
    let mut cumulative = Vec::with_capacity(polyline.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for pair in polyline.windows(2) {
        total += distance_meters(pair[0], pair[1]);
        cumulative.push(total);
    }

    if total <= 0.0 {
        log::warn!("Zero-length polyline; returning start km {km_start}");
        return km_start;
    }

    let (index, t) = match mode {
        ProjectionMode::NearestVertex => nearest_vertex_projection(click, polyline),
        ProjectionMode::Perpendicular => perpendicular_projection(click, polyline),
    };

    let segment_length = cumulative[index] - cumulative[index - 1];
    let along = t.mul_add(segment_length, cumulative[index - 1]);

    (along / total).mul_add(km_end - km_start, km_start)
}

/// Closest sub-segment chosen by nearest *endpoint*, with the fraction
/// taken as distance-to-first-vertex over segment length. Cheap, and
/// exact whenever the click sits on the polyline itself.
fn nearest_vertex_projection(click: GeoPoint, polyline: &[GeoPoint]) -> (usize, f64) {
    let mut best_index = 1;
    let mut best_cost = f64::INFINITY;

    for i in 1..polyline.len() {
        let cost =
            distance_meters(click, polyline[i - 1]).min(distance_meters(click, polyline[i]));
        if cost < best_cost {
            best_cost = cost;
            best_index = i;
        }
    }

    let segment_length = distance_meters(polyline[best_index - 1], polyline[best_index]);
    let t = if segment_length > 0.0 {
        (distance_meters(click, polyline[best_index - 1]) / segment_length).clamp(0.0, 1.0)
    } else {
        0.0
    };

    (best_index, t)
}

/// Closest sub-segment chosen by true point-to-segment distance, with
/// the fraction from planar projection onto that segment.
fn perpendicular_projection(click: GeoPoint, polyline: &[GeoPoint]) -> (usize, f64) {
    let target = to_point(click);
    let mut best_index = 1;
    let mut best_distance = f64::INFINITY;

    for i in 1..polyline.len() {
        let segment = Line::new(to_point(polyline[i - 1]), to_point(polyline[i]));
        let distance = lookup::distance_to_segment(click, target, &segment);
        if distance < best_distance {
            best_distance = distance;
            best_index = i;
        }
    }

    let segment = Line::new(
        to_point(polyline[best_index - 1]),
        to_point(polyline[best_index]),
    );
    let t = segment
        .line_locate_point(&target)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    (best_index, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_line() -> Vec<GeoPoint> {
        vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)]
    }

    #[test]
    fn midpoint_of_straight_line_nearest_vertex() {
        let km = interpolate_km(
            GeoPoint::new(0.0, 0.5),
            &straight_line(),
            0.0,
            100.0,
            ProjectionMode::NearestVertex,
        );
        assert!((km - 50.0).abs() < 2.0, "got {km}");
    }

    #[test]
    fn midpoint_of_straight_line_perpendicular() {
        let km = interpolate_km(
            GeoPoint::new(0.0, 0.5),
            &straight_line(),
            0.0,
            100.0,
            ProjectionMode::Perpendicular,
        );
        assert!((km - 50.0).abs() < 2.0, "got {km}");
    }

    #[test]
    fn modes_agree_for_off_axis_click_within_tolerance() {
        let polyline = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.4),
            GeoPoint::new(0.0, 1.0),
        ];
        let click = GeoPoint::new(0.001, 0.8);
        let nearest = interpolate_km(click, &polyline, 0.0, 100.0, ProjectionMode::NearestVertex);
        let perpendicular =
            interpolate_km(click, &polyline, 0.0, 100.0, ProjectionMode::Perpendicular);
        assert!((perpendicular - 80.0).abs() < 0.5, "got {perpendicular}");
        // The endpoint approximation may drift slightly; it must stay
        // in the same neighborhood.
        assert!((nearest - 80.0).abs() < 2.0, "got {nearest}");
    }

    #[test]
    fn empty_polyline_returns_start_km() {
        let km = interpolate_km(
            GeoPoint::new(0.0, 0.5),
            &[],
            12.5,
            20.0,
            ProjectionMode::NearestVertex,
        );
        assert!((km - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn single_vertex_returns_start_km() {
        let km = interpolate_km(
            GeoPoint::new(0.0, 0.5),
            &[GeoPoint::new(0.0, 0.0)],
            7.0,
            9.0,
            ProjectionMode::Perpendicular,
        );
        assert!((km - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_length_polyline_returns_start_km() {
        let p = GeoPoint::new(-15.0, -47.0);
        let km = interpolate_km(
            GeoPoint::new(0.0, 0.0),
            &[p, p],
            33.0,
            44.0,
            ProjectionMode::NearestVertex,
        );
        assert!((km - 33.0).abs() < f64::EPSILON);
    }

    #[test]
    fn click_beyond_end_clamps_to_end_km() {
        let km = interpolate_km(
            GeoPoint::new(0.0, 1.5),
            &straight_line(),
            0.0,
            100.0,
            ProjectionMode::Perpendicular,
        );
        assert!((km - 100.0).abs() < 1e-9, "got {km}");
    }

    #[test]
    fn click_before_start_clamps_to_start_km() {
        let km = interpolate_km(
            GeoPoint::new(0.0, -0.5),
            &straight_line(),
            0.0,
            100.0,
            ProjectionMode::Perpendicular,
        );
        assert!(km.abs() < 1e-9, "got {km}");
    }

    #[test]
    fn decreasing_km_range_interpolates_downward() {
        // South-to-north surveys reference km in the opposite sense.
        let km = interpolate_km(
            GeoPoint::new(0.0, 0.5),
            &straight_line(),
            100.0,
            0.0,
            ProjectionMode::Perpendicular,
        );
        assert!((km - 50.0).abs() < 2.0, "got {km}");
    }

    #[test]
    fn on_vertex_click_hits_its_cumulative_fraction() {
        let polyline = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.25),
            GeoPoint::new(0.0, 1.0),
        ];
        let km = interpolate_km(
            GeoPoint::new(0.0, 0.25),
            &polyline,
            0.0,
            100.0,
            ProjectionMode::NearestVertex,
        );
        assert!((km - 25.0).abs() < 0.5, "got {km}");
    }
}
