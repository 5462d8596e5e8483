//! The match classifier: geographic tier plus attribute comparison.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use rodovia_match_geo::distance_meters;
use rodovia_match_reconcile_models::{
    InventoryRecord, MatchConfig, MatchDecision, MatchResult, MatchTier, NecessityRecord,
};

/// Classifies one necessity against every inventory candidate and
/// keeps the nearest one inside the partial-match tolerance.
///
/// Candidates must share the element type, must not contradict a
/// declared route code, and must expose a position. A necessity
/// without coordinates — or with no candidate in tolerance — yields a
/// tier-`None` result with no inventory reference, surfaced for a
/// manual creation decision.
#[must_use]
pub fn classify_necessity(
    necessity: &NecessityRecord,
    inventories: &[InventoryRecord],
    config: &MatchConfig,
    now: DateTime<Utc>,
) -> MatchResult {
    let thresholds = config.thresholds_for(&necessity.element_type);

    let Some(position) = necessity.initial_position else {
        log::debug!(
            "Necessity {} has no coordinates; left unmatched",
            necessity.id
        );
        return unmatched(necessity, now);
    };

    let mut best: Option<(f64, &InventoryRecord)> = None;
    for candidate in inventories {
        if candidate.element_type != necessity.element_type {
            continue;
        }
        if let (Some(declared), Some(surveyed)) = (&necessity.route_code, &candidate.route_code) {
            if declared != surveyed {
                continue;
            }
        }
        let Some(candidate_position) = candidate.position else {
            continue;
        };

        let distance = distance_meters(position, candidate_position);
        if distance > thresholds.partial_m {
            continue;
        }
        if best.is_none_or(|(current, _)| distance < current) {
            best = Some((distance, candidate));
        }
    }

    let Some((distance, inventory)) = best else {
        return unmatched(necessity, now);
    };

    let divergences = attribute_divergences(necessity, inventory);
    if !divergences.is_empty() {
        log::debug!(
            "Necessity {} matched inventory {} at {distance:.1} m but diverges on {}",
            necessity.id,
            inventory.id,
            divergences.join(", ")
        );
    }

    MatchResult {
        id: Uuid::new_v4().to_string(),
        necessity_id: necessity.id.clone(),
        inventory_id: Some(inventory.id.clone()),
        distance_meters: Some(distance),
        match_tier: MatchTier::from_distance(distance, &thresholds),
        decision: MatchDecision::Pending,
        attribute_divergences: divergences,
        exportar_para_projetista: false,
        reviewer_comment: None,
        reviewed_at: None,
        reviewer_id: None,
        classified_at: now,
    }
}

/// Classifies every necessity independently. Pairs share no mutable
/// state, so result order mirrors input order but carries no meaning.
#[must_use]
pub fn classify_all(
    necessities: &[NecessityRecord],
    inventories: &[InventoryRecord],
    config: &MatchConfig,
    now: DateTime<Utc>,
) -> Vec<MatchResult> {
    necessities
        .iter()
        .map(|necessity| classify_necessity(necessity, inventories, config, now))
        .collect()
}

/// Refreshes pending results in place against current records.
/// Terminal decisions are left untouched. Returns how many rows were
/// refreshed.
pub fn reclassify(
    results: &mut [MatchResult],
    necessities: &[NecessityRecord],
    inventories: &[InventoryRecord],
    config: &MatchConfig,
    now: DateTime<Utc>,
) -> usize {
    let by_id: BTreeMap<&str, &NecessityRecord> = necessities
        .iter()
        .map(|n| (n.id.as_str(), n))
        .collect();

    let mut refreshed = 0;
    for result in results.iter_mut() {
        if result.decision.is_terminal() {
            continue;
        }
        let Some(necessity) = by_id.get(result.necessity_id.as_str()) else {
            log::warn!(
                "Match result {} references unknown necessity {}; skipped",
                result.id,
                result.necessity_id
            );
            continue;
        };

        let fresh = classify_necessity(necessity, inventories, config, now);
        result.inventory_id = fresh.inventory_id;
        result.distance_meters = fresh.distance_meters;
        result.match_tier = fresh.match_tier;
        result.attribute_divergences = fresh.attribute_divergences;
        result.classified_at = now;
        refreshed += 1;
    }
    refreshed
}

/// Deletes results whose inventory target no longer exists. Results
/// without an inventory reference are kept — they are the manual
/// creation queue, not orphans. Returns how many rows were removed.
pub fn purge_orphans(results: &mut Vec<MatchResult>, inventories: &[InventoryRecord]) -> usize {
    let live: BTreeSet<&str> = inventories.iter().map(|i| i.id.as_str()).collect();
    let before = results.len();

    results.retain(|result| {
        result
            .inventory_id
            .as_deref()
            .is_none_or(|id| live.contains(id))
    });

    let removed = before - results.len();
    if removed > 0 {
        log::info!("Purged {removed} orphaned match result(s)");
    }
    removed
}

/// Declared fields that disagree between the pair: any attribute key
/// present on both sides with different values, plus a declared
/// side-of-road mismatch. Key order follows the attribute map.
fn attribute_divergences(necessity: &NecessityRecord, inventory: &InventoryRecord) -> Vec<String> {
    let mut divergences = Vec::new();

    for (key, declared) in &necessity.attributes {
        if let Some(surveyed) = inventory.attributes.get(key) {
            if declared != surveyed {
                divergences.push(key.clone());
            }
        }
    }

    if let (Some(declared), Some(surveyed)) = (&necessity.side_of_road, &inventory.side_of_road) {
        if declared != surveyed {
            divergences.push("side_of_road".to_string());
        }
    }

    divergences
}

fn unmatched(necessity: &NecessityRecord, now: DateTime<Utc>) -> MatchResult {
    MatchResult {
        id: Uuid::new_v4().to_string(),
        necessity_id: necessity.id.clone(),
        inventory_id: None,
        distance_meters: None,
        match_tier: MatchTier::None,
        decision: MatchDecision::Pending,
        attribute_divergences: Vec::new(),
        exportar_para_projetista: false,
        reviewer_comment: None,
        reviewed_at: None,
        reviewer_id: None,
        classified_at: now,
    }
}
