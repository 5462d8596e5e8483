#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types for the necessity-vs-inventory reconciliation flow.
//!
//! Necessities come from the planning import, inventory rows from the
//! cadastral survey; both are read-only to this workspace. The
//! classifier produces [`MatchResult`] rows, which only a human
//! decision (or a re-run of the classifier) may mutate afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rodovia_match_geo::{GeoPoint, proximity::HasPosition};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default distance (meters) under which a pair is an exact match.
pub const DEFAULT_EXACT_M: f64 = 10.0;

/// Default distance (meters) under which a pair is a high match.
/// Shared value with the lookup high-confidence radius.
pub const DEFAULT_HIGH_M: f64 = 20.0;

/// Default distance (meters) under which a pair is a partial match;
/// beyond it a candidate is not considered matched at all.
pub const DEFAULT_PARTIAL_M: f64 = 50.0;

/// The planned service on a road element.
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
pub enum ServiceAction {
    /// Install an element that does not exist yet.
    Include,
    /// Replace an existing element in kind.
    Replace,
    /// Remove an existing element.
    Remove,
}

/// A planned maintenance/installation action from the planning import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NecessityRecord {
    /// Identifier assigned by the planning import.
    pub id: String,
    /// Element type tag (e.g. "placa", "defensa", "balizador").
    pub element_type: String,
    /// Planned service on the element.
    pub service_action: ServiceAction,
    /// Km marker where the necessity starts.
    pub km_initial: f64,
    /// Km marker where it ends, for linear elements.
    pub km_final: Option<f64>,
    /// GPS position of the start, when surveyed.
    pub initial_position: Option<GeoPoint>,
    /// Declared side of the road ("BD", "BE", "EIXO", ...), verbatim
    /// from the import.
    pub side_of_road: Option<String>,
    /// SNV route code, when the import resolved one.
    pub route_code: Option<String>,
    /// Element-specific declared attributes (material, film type, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl HasPosition for NecessityRecord {
    fn position(&self) -> Option<GeoPoint> {
        self.initial_position
    }
}

/// An as-built element from the cadastral inventory. Structurally a
/// sibling of [`NecessityRecord`] without the planned service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    /// Cadastral identifier.
    pub id: String,
    /// Element type tag.
    pub element_type: String,
    /// Km marker where the element starts.
    pub km_initial: f64,
    /// Km marker where it ends, for linear elements.
    pub km_final: Option<f64>,
    /// Surveyed GPS position.
    pub position: Option<GeoPoint>,
    /// Declared side of the road.
    pub side_of_road: Option<String>,
    /// SNV route code.
    pub route_code: Option<String>,
    /// As-built attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl HasPosition for InventoryRecord {
    fn position(&self) -> Option<GeoPoint> {
        self.position
    }
}

/// How strongly a necessity corresponds to an inventory candidate.
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
pub enum MatchTier {
    /// Within the exact radius (default 10 m).
    Exact,
    /// Within the high radius (default 20 m).
    High,
    /// Within the partial radius (default 50 m).
    Partial,
    /// No candidate within tolerance; surfaced for a manual creation
    /// decision.
    None,
}

/// Reviewer resolution of a match. `Pending` until a human acts.
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
pub enum MatchDecision {
    /// Awaiting review (or no review needed yet).
    Pending,
    /// Reviewer confirmed the pairing.
    Confirmed,
    /// Reviewer flagged the pairing for the external project team.
    /// Terminal here; resolution happens outside this system.
    Inconsistency,
    /// Reviewer rejected the pairing.
    Rejected,
}

impl MatchDecision {
    /// Terminal decisions cannot be changed afterwards.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Outcome of classifying one necessity against the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Identifier of this result row.
    pub id: String,
    /// The necessity that was classified.
    pub necessity_id: String,
    /// The winning inventory candidate, absent for tier `None`.
    pub inventory_id: Option<String>,
    /// Distance to the winning candidate in meters.
    pub distance_meters: Option<f64>,
    /// Geographic match tier.
    pub match_tier: MatchTier,
    /// Reviewer decision state.
    pub decision: MatchDecision,
    /// Names of declared fields that disagree between the pair. A
    /// non-empty list forces manual review regardless of tier.
    #[serde(default)]
    pub attribute_divergences: Vec<String>,
    /// Export flag read by the project-team CSV collaborator. Field
    /// name kept verbatim from the production system.
    #[serde(rename = "exportar_para_projetista")]
    pub exportar_para_projetista: bool,
    /// Free-text comment left by the reviewer.
    pub reviewer_comment: Option<String>,
    /// When the reviewer acted.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Who reviewed.
    pub reviewer_id: Option<String>,
    /// When the classifier produced (or last refreshed) this row.
    pub classified_at: DateTime<Utc>,
}

impl MatchResult {
    /// `true` when the pair needs a human decision before the
    /// reconciliation can close: either the attributes diverge or
    /// nothing was matched at all.
    #[must_use]
    pub fn requires_review(&self) -> bool {
        self.decision == MatchDecision::Pending
            && (!self.attribute_divergences.is_empty() || self.match_tier == MatchTier::None)
    }
}

/// Distance cut-offs for the match tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierThresholds {
    /// Exact-match radius in meters.
    pub exact_m: f64,
    /// High-match radius in meters.
    pub high_m: f64,
    /// Partial-match radius in meters; doubles as the candidate
    /// tolerance.
    pub partial_m: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            exact_m: DEFAULT_EXACT_M,
            high_m: DEFAULT_HIGH_M,
            partial_m: DEFAULT_PARTIAL_M,
        }
    }
}

impl MatchTier {
    /// Buckets a candidate distance against the thresholds.
    #[must_use]
    pub fn from_distance(distance_m: f64, thresholds: &TierThresholds) -> Self {
        if distance_m <= thresholds.exact_m {
            Self::Exact
        } else if distance_m <= thresholds.high_m {
            Self::High
        } else if distance_m <= thresholds.partial_m {
            Self::Partial
        } else {
            Self::None
        }
    }
}

/// Classifier configuration: default thresholds plus explicit
/// per-element-type overrides (urban signage wants tighter radii than
/// rural guardrail, and an explicit mapping beats string dispatch).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchConfig {
    /// Thresholds applied when no override matches.
    #[serde(default)]
    pub default: TierThresholds,
    /// Overrides keyed by element type tag.
    #[serde(default)]
    pub per_element: BTreeMap<String, TierThresholds>,
}

impl MatchConfig {
    /// Thresholds for the given element type.
    #[must_use]
    pub fn thresholds_for(&self, element_type: &str) -> TierThresholds {
        self.per_element
            .get(element_type)
            .copied()
            .unwrap_or(self.default)
    }
}
