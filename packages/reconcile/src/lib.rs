#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reconciliation of planned necessities against the as-built
//! inventory.
//!
//! The classifier pairs each necessity with its nearest in-tolerance
//! inventory candidate and buckets the distance into a match tier.
//! Geographic proximity alone never closes a pair whose declared
//! attributes disagree — those go to a human reviewer, whose decision
//! is applied through the small state machine in [`decision`].

pub mod classify;
pub mod decision;
pub mod export;

use thiserror::Error;

/// Errors that can occur in the reconciliation workflow.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A reviewer acted on a result that already carries a terminal
    /// decision.
    #[error("match result {id} already decided as {decision}")]
    AlreadyDecided {
        /// Result row id.
        id: String,
        /// The terminal decision it carries.
        decision: rodovia_match_reconcile_models::MatchDecision,
    },

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A result row references a necessity the caller did not supply.
    #[error("unknown necessity {necessity_id} referenced by match result {result_id}")]
    UnknownNecessity {
        /// The missing necessity id.
        necessity_id: String,
        /// The referencing result row id.
        result_id: String,
    },
}
