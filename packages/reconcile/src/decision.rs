//! The reviewer decision state machine.
//!
//! `Pending` is the only state a reviewer can act on; everything else
//! is terminal. `Inconsistency` does not resolve the pair — it tags it
//! for the external project team by raising the export flag.

use chrono::{DateTime, Utc};

use crate::ReconcileError;
use rodovia_match_reconcile_models::{MatchDecision, MatchResult};

/// An explicit reviewer action on a pending match result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    /// Accept the pairing as-is.
    Confirm,
    /// Refuse the pairing.
    Reject,
    /// Escalate to the project team for external review.
    FlagInconsistency,
}

impl ReviewAction {
    const fn decision(self) -> MatchDecision {
        match self {
            Self::Confirm => MatchDecision::Confirmed,
            Self::Reject => MatchDecision::Rejected,
            Self::FlagInconsistency => MatchDecision::Inconsistency,
        }
    }
}

/// Applies a reviewer action to a pending result.
///
/// # Errors
///
/// Returns [`ReconcileError::AlreadyDecided`] when the result already
/// carries a terminal decision — reopening a closed reconciliation is
/// an administrative operation outside this workflow.
pub fn apply_decision(
    result: &mut MatchResult,
    action: ReviewAction,
    reviewer_id: &str,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), ReconcileError> {
    if result.decision.is_terminal() {
        return Err(ReconcileError::AlreadyDecided {
            id: result.id.clone(),
            decision: result.decision,
        });
    }

    result.decision = action.decision();
    result.reviewer_id = Some(reviewer_id.to_string());
    result.reviewer_comment = comment;
    result.reviewed_at = Some(now);

    if action == ReviewAction::FlagInconsistency {
        result.exportar_para_projetista = true;
        log::info!(
            "Match result {} flagged as inconsistency for the project team",
            result.id
        );
    }

    Ok(())
}
