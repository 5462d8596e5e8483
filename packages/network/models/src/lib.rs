#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Confidence and configuration types for road-network lookups.
//!
//! The distance cut-offs here were fixed literals in the system this
//! library replaces (20 m / 50 m). They are named, overridable values
//! now because urban and rural route classes reasonably need different
//! tolerances.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default distance (meters) under which a lookup is high-confidence.
pub const DEFAULT_HIGH_CONFIDENCE_M: f64 = 20.0;

/// Default distance (meters) under which a lookup is medium-confidence.
pub const DEFAULT_MEDIUM_CONFIDENCE_M: f64 = 50.0;

/// Default maximum distance (meters) for a lookup to succeed at all.
pub const DEFAULT_TOLERANCE_M: f64 = 50.0;

/// How strongly a coordinate is attributed to the route it matched.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    /// Within the high-confidence radius (default 20 m).
    High,
    /// Between the high and medium radii (default 20–50 m).
    Medium,
    /// Beyond the medium radius. Only reachable when the caller raises
    /// the lookup tolerance above the medium cut-off.
    Low,
}

impl Confidence {
    /// Classifies a matched distance against the configured cut-offs.
    #[must_use]
    pub fn from_distance(distance_m: f64, config: &LookupConfig) -> Self {
        if distance_m <= config.high_m {
            Self::High
        } else if distance_m <= config.medium_m {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Distance cut-offs for nearest-route lookups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupConfig {
    /// High-confidence radius in meters.
    pub high_m: f64,
    /// Medium-confidence radius in meters.
    pub medium_m: f64,
    /// Maximum distance in meters for a lookup to return a result.
    /// Beyond this the lookup reports "no route" rather than guessing.
    pub tolerance_m: f64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            high_m: DEFAULT_HIGH_CONFIDENCE_M,
            medium_m: DEFAULT_MEDIUM_CONFIDENCE_M,
            tolerance_m: DEFAULT_TOLERANCE_M,
        }
    }
}

impl LookupConfig {
    /// The default cut-offs with a caller-chosen tolerance.
    #[must_use]
    pub fn with_tolerance(tolerance_m: f64) -> Self {
        Self {
            tolerance_m,
            ..Self::default()
        }
    }
}

/// How a click/observation point is projected onto a polyline during
/// km interpolation.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionMode {
    /// Nearest-endpoint approximation, reproducing the production
    /// system's km values.
    #[default]
    NearestVertex,
    /// True perpendicular projection onto the closest sub-segment.
    Perpendicular,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_buckets() {
        let config = LookupConfig::default();
        assert_eq!(Confidence::from_distance(0.0, &config), Confidence::High);
        assert_eq!(Confidence::from_distance(20.0, &config), Confidence::High);
        assert_eq!(Confidence::from_distance(20.1, &config), Confidence::Medium);
        assert_eq!(Confidence::from_distance(50.0, &config), Confidence::Medium);
        assert_eq!(Confidence::from_distance(50.1, &config), Confidence::Low);
    }

    #[test]
    fn custom_tolerance_keeps_buckets() {
        let config = LookupConfig::with_tolerance(200.0);
        assert!((config.high_m - DEFAULT_HIGH_CONFIDENCE_M).abs() < f64::EPSILON);
        assert!((config.tolerance_m - 200.0).abs() < f64::EPSILON);
        assert_eq!(Confidence::from_distance(120.0, &config), Confidence::Low);
    }

    #[test]
    fn confidence_serializes_screaming() {
        let json = serde_json::to_string(&Confidence::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
    }

    #[test]
    fn projection_mode_default() {
        assert_eq!(ProjectionMode::default(), ProjectionMode::NearestVertex);
    }
}
