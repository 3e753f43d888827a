//! Evidence resilience scoring
//!
//! Folds the graph connectivity metrics and the total cross-source mutual
//! information into one bounded [0,1] value. Monotonically non-decreasing in
//! every input.

use serde::{Deserialize, Serialize};

/// Weights and normalization constants for the resilience fold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResilienceWeights {
    /// Fixed floor applied before the weighted contributions.
    pub baseline: f64,
    /// Expected MI ceiling in bits; mi_total normalizes against this.
    pub mi_ceiling: f64,
    pub w_mi: f64,
    pub w_density: f64,
    pub w_clustering: f64,
}

impl Default for ResilienceWeights {
    fn default() -> Self {
        Self {
            baseline: 0.25,
            mi_ceiling: 4.0,
            w_mi: 0.3,
            w_density: 0.3,
            w_clustering: 0.1,
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Combines MI and graph metrics into the entropy-resilience sub-score.
pub struct ResilienceScorer {
    weights: ResilienceWeights,
}

impl ResilienceScorer {
    pub fn new(weights: ResilienceWeights) -> Self {
        Self { weights }
    }

    pub fn new_default() -> Self {
        Self::new(ResilienceWeights::default())
    }

    /// Score in [0,1]. Inputs outside their natural ranges are clamped
    /// rather than rejected; the governance layer treats non-finite inputs
    /// upstream.
    pub fn score(&self, mi_total: f64, density: f64, clustering: f64) -> f64 {
        let mi_norm = if self.weights.mi_ceiling > 0.0 {
            clamp_unit(mi_total / self.weights.mi_ceiling)
        } else {
            0.0
        };
        clamp_unit(
            self.weights.baseline
                + mi_norm * self.weights.w_mi
                + clamp_unit(density) * self.weights.w_density
                + clamp_unit(clustering) * self.weights.w_clustering,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_evidence_scores_the_baseline_floor() {
        let scorer = ResilienceScorer::new_default();
        assert!((scorer.score(0.0, 0.0, 0.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn saturated_inputs_stay_within_unit_interval() {
        let scorer = ResilienceScorer::new_default();
        let score = scorer.score(100.0, 1.0, 1.0);
        assert!(score <= 1.0);
        assert!((score - 0.95).abs() < 1e-12);
    }

    #[test]
    fn score_is_monotone_in_each_input() {
        let scorer = ResilienceScorer::new_default();
        let grid = [0.0, 0.1, 0.4, 0.9, 1.0];
        for &mi in &grid {
            for &density in &grid {
                for &clustering in &grid {
                    let base = scorer.score(mi, density, clustering);
                    assert!(scorer.score(mi + 0.5, density, clustering) >= base);
                    assert!(scorer.score(mi, (density + 0.3).min(1.0), clustering) >= base);
                    assert!(scorer.score(mi, density, (clustering + 0.3).min(1.0)) >= base);
                }
            }
        }
    }

    #[test]
    fn zero_ceiling_disables_mi_contribution() {
        let scorer = ResilienceScorer::new(ResilienceWeights {
            mi_ceiling: 0.0,
            ..ResilienceWeights::default()
        });
        assert_eq!(scorer.score(10.0, 0.0, 0.0), 0.25);
    }
}
