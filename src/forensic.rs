//! Forensic master-score aggregation
//!
//! Combines the structural, content, entropy-resilience and vector
//! sub-scores into a single capped master score with a grade drawn from an
//! ordered tier table.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Sub-scores for one aggregation run, each in [0,1]. A new run produces a
/// new instance; values are never mutated after computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterScoreComponents {
    pub structural: f64,
    pub content: f64,
    pub entropy_resilience: f64,
    pub vector_magnitude: f64,
}

impl MasterScoreComponents {
    pub fn is_finite(&self) -> bool {
        self.structural.is_finite()
            && self.content.is_finite()
            && self.entropy_resilience.is_finite()
            && self.vector_magnitude.is_finite()
    }
}

/// Per-component floors for the perfect-evidence cap rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapThresholds {
    pub structural: f64,
    pub content: f64,
    pub resilience: f64,
    pub vector: f64,
}

impl Default for CapThresholds {
    fn default() -> Self {
        Self {
            structural: 0.99,
            content: 0.99,
            resilience: 0.70,
            vector: 0.90,
        }
    }
}

/// Component weights for the non-capped weighted sum. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatorWeights {
    pub w_structural: f64,
    pub w_content: f64,
    pub w_resilience: f64,
    pub w_vector: f64,
}

impl Default for AggregatorWeights {
    fn default() -> Self {
        Self {
            w_structural: 0.25,
            w_content: 0.30,
            w_resilience: 0.20,
            w_vector: 0.25,
        }
    }
}

/// Certification grade tiers, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Platinum,
    Gold,
    Silver,
    Bronze,
    None,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Grade::Platinum => "Platinum",
            Grade::Gold => "Gold",
            Grade::Silver => "Silver",
            Grade::Bronze => "Bronze",
            Grade::None => "None",
        };
        write!(f, "{name}")
    }
}

/// One cut point in the grade table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeTier {
    pub min_score: f64,
    pub grade: Grade,
}

/// Ordered grade cut points; configuration, not logic scattered through the
/// aggregator.
pub fn default_grade_tiers() -> Vec<GradeTier> {
    vec![
        GradeTier {
            min_score: 0.95,
            grade: Grade::Platinum,
        },
        GradeTier {
            min_score: 0.85,
            grade: Grade::Gold,
        },
        GradeTier {
            min_score: 0.70,
            grade: Grade::Silver,
        },
        GradeTier {
            min_score: 0.50,
            grade: Grade::Bronze,
        },
    ]
}

/// Result of one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterScore {
    pub score: f64,
    pub capped: bool,
    pub grade: Grade,
}

/// Weighted aggregator with the perfect-evidence cap rule.
pub struct ForensicAggregator {
    weights: AggregatorWeights,
    cap_thresholds: CapThresholds,
    grade_tiers: Vec<GradeTier>,
}

impl ForensicAggregator {
    pub fn new(
        weights: AggregatorWeights,
        cap_thresholds: CapThresholds,
        grade_tiers: Vec<GradeTier>,
    ) -> Self {
        let mut tiers = grade_tiers;
        // Tier table is consulted top-down; keep it sorted regardless of
        // configuration order.
        tiers.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
        Self {
            weights,
            cap_thresholds,
            grade_tiers: tiers,
        }
    }

    pub fn new_default() -> Self {
        Self::new(
            AggregatorWeights::default(),
            CapThresholds::default(),
            default_grade_tiers(),
        )
    }

    fn grade_for(&self, score: f64) -> Grade {
        self.grade_tiers
            .iter()
            .find(|tier| score >= tier.min_score)
            .map(|tier| tier.grade)
            .unwrap_or(Grade::None)
    }

    /// Aggregate the component scores. When every component clears its cap
    /// threshold the score caps at exactly 1.0; otherwise the weighted sum
    /// applies. Output is always clamped to [0,1].
    pub fn aggregate(&self, components: &MasterScoreComponents) -> MasterScore {
        let capped = components.structural >= self.cap_thresholds.structural
            && components.content >= self.cap_thresholds.content
            && components.entropy_resilience >= self.cap_thresholds.resilience
            && components.vector_magnitude >= self.cap_thresholds.vector;

        let score = if capped {
            1.0
        } else {
            let weighted = components.structural * self.weights.w_structural
                + components.content * self.weights.w_content
                + components.entropy_resilience * self.weights.w_resilience
                + components.vector_magnitude * self.weights.w_vector;
            weighted.clamp(0.0, 1.0)
        };

        let grade = self.grade_for(score);
        debug!(score, capped, %grade, "master score aggregated");
        MasterScore {
            score,
            capped,
            grade,
        }
    }
}
