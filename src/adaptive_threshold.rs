//! Adaptive governance threshold derivation
//!
//! Recomputes the approve/investigate/block cutoffs each cycle from the
//! rolling-window variance instead of using static values. Below five
//! samples the controller stays in a learning phase and hands back the base
//! thresholds untouched.

use crate::rolling_stats::RollingStatisticsTracker;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Minimum window population before adaptation kicks in.
pub const LEARNING_PHASE_SAMPLES: usize = 5;

/// Sigma multiplier for the adaptive margin. 1.5 sigma corresponds to
/// roughly 86.6% one-sided confidence under a normal model; treated as a
/// design constant, never re-derived at runtime.
pub const SIGMA_MULTIPLIER: f64 = 1.5;

/// Volatility band above which thresholds widen (more permissive).
pub const HIGH_VOLATILITY: f64 = 0.03;
/// Volatility band below which thresholds tighten (more strict).
pub const LOW_VOLATILITY: f64 = 0.01;

const WIDEN_FACTOR: f64 = 1.3;
const TIGHTEN_FACTOR: f64 = 0.7;

/// Governance cutoffs for one monitoring cycle.
///
/// Invariant: `t_improve >= t_stable >= t_critical`. Derived each cycle and
/// logged for audit; never persisted as source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSet {
    pub t_improve: f64,
    pub t_stable: f64,
    pub t_critical: f64,
    pub adaptive: bool,
}

impl ThresholdSet {
    pub fn new(t_improve: f64, t_stable: f64, t_critical: f64) -> Self {
        Self {
            t_improve,
            t_stable,
            t_critical,
            adaptive: false,
        }
    }

    /// Clamp the ordering invariant after any adjustment.
    pub fn normalized(mut self) -> Self {
        if self.t_stable > self.t_improve {
            self.t_stable = self.t_improve;
        }
        if self.t_critical > self.t_stable {
            self.t_critical = self.t_stable;
        }
        self
    }

    pub fn is_ordered(&self) -> bool {
        self.t_improve >= self.t_stable && self.t_stable >= self.t_critical
    }
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self::new(0.05, -0.03, -0.10)
    }
}

/// Derives adaptive thresholds from rolling-window statistics.
pub struct AdaptiveThresholdController;

impl AdaptiveThresholdController {
    /// Compute the cycle thresholds from window statistics.
    ///
    /// With fewer than [`LEARNING_PHASE_SAMPLES`] samples the base set is
    /// returned unmodified with `adaptive=false`; callers disable anomaly
    /// detection in that phase.
    pub fn compute(tracker: &RollingStatisticsTracker, base: ThresholdSet) -> ThresholdSet {
        if tracker.sample_count() < LEARNING_PHASE_SAMPLES {
            info!(
                samples = tracker.sample_count(),
                required = LEARNING_PHASE_SAMPLES,
                "learning phase: using base thresholds"
            );
            return ThresholdSet {
                adaptive: false,
                ..base
            };
        }

        let sigma = tracker.stddev();
        let factor = if sigma > HIGH_VOLATILITY {
            WIDEN_FACTOR
        } else if sigma < LOW_VOLATILITY {
            TIGHTEN_FACTOR
        } else {
            1.0
        };

        // Thresholds widen outward from the base: improve/stable rise,
        // critical drops by the same margin.
        let margin = SIGMA_MULTIPLIER * sigma * factor;
        let adapted = ThresholdSet {
            t_improve: base.t_improve + margin,
            t_stable: base.t_stable + margin,
            t_critical: base.t_critical - margin,
            adaptive: true,
        }
        .normalized();

        debug!(
            sigma,
            factor,
            margin,
            t_improve = adapted.t_improve,
            t_stable = adapted.t_stable,
            t_critical = adapted.t_critical,
            "adaptive thresholds computed"
        );
        adapted
    }
}
