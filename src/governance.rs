//! Governance decision ladder
//!
//! Maps the truth delta and the cycle's threshold set to a terminal
//! action and process exit code. Evaluated once per cycle; decisions are
//! outputs, not persisted state.

use crate::adaptive_threshold::ThresholdSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

/// Exit code reserved for structural failures (WORM write, unreadable
/// baseline, unwritable report). Distinct from the three decision codes.
pub const EXIT_STRUCTURAL_FAILURE: i32 = 3;

/// Terminal governance action for one monitoring cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GovernanceAction {
    Approve,
    Investigate,
    Block,
}

impl GovernanceAction {
    pub fn exit_code(&self) -> i32 {
        match self {
            GovernanceAction::Approve => 0,
            GovernanceAction::Investigate => 1,
            GovernanceAction::Block => 2,
        }
    }
}

impl fmt::Display for GovernanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GovernanceAction::Approve => write!(f, "APPROVE"),
            GovernanceAction::Investigate => write!(f, "INVESTIGATE"),
            GovernanceAction::Block => write!(f, "BLOCK"),
        }
    }
}

/// Terminal output of one monitoring cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceDecision {
    pub action: GovernanceAction,
    pub exit_code: i32,
    pub delta: f64,
    pub thresholds: ThresholdSet,
}

/// First-match-wins decision ladder over the threshold set.
pub struct GovernanceDecisionEngine;

impl GovernanceDecisionEngine {
    /// Decide the cycle action. Never panics for any numeric delta; a
    /// malformed (NaN) delta fails closed to BLOCK.
    pub fn decide(delta: f64, thresholds: ThresholdSet) -> GovernanceDecision {
        let action = if delta.is_nan() {
            error!(delta, "malformed truth delta, failing closed to BLOCK");
            GovernanceAction::Block
        } else if delta >= thresholds.t_improve {
            GovernanceAction::Approve
        } else if delta >= thresholds.t_stable {
            GovernanceAction::Approve
        } else if delta >= thresholds.t_critical {
            GovernanceAction::Investigate
        } else {
            GovernanceAction::Block
        };

        GovernanceDecision {
            action,
            exit_code: action.exit_code(),
            delta,
            thresholds,
        }
    }
}
