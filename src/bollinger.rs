//! Bollinger band anomaly flagging
//!
//! Mean +/- 1.5 sigma envelope over the truth-delta series, borrowed from
//! statistical process control. Stateless; the caller supplies the rolling
//! statistics.

use serde::{Deserialize, Serialize};

/// Sigma multiplier for the band envelope.
pub const BAND_WIDTH_SIGMA: f64 = 1.5;

/// Result of evaluating the current delta against the band envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandEvaluation {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub anomaly: bool,
}

/// Pure band evaluator; no internal state.
pub struct BollingerBandEvaluator;

impl BollingerBandEvaluator {
    pub fn evaluate(current: f64, mean: f64, stddev: f64) -> BandEvaluation {
        let upper = mean + BAND_WIDTH_SIGMA * stddev;
        let lower = mean - BAND_WIDTH_SIGMA * stddev;
        BandEvaluation {
            upper,
            middle: mean,
            lower,
            anomaly: current > upper || current < lower,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_inside_bands_is_not_anomalous() {
        let eval = BollingerBandEvaluator::evaluate(0.05, 0.0, 0.1);
        assert_eq!(eval.middle, 0.0);
        assert!((eval.upper - 0.15).abs() < 1e-12);
        assert!((eval.lower + 0.15).abs() < 1e-12);
        assert!(!eval.anomaly);
    }

    #[test]
    fn value_outside_either_band_is_anomalous() {
        assert!(BollingerBandEvaluator::evaluate(0.2, 0.0, 0.1).anomaly);
        assert!(BollingerBandEvaluator::evaluate(-0.2, 0.0, 0.1).anomaly);
    }

    #[test]
    fn boundary_values_are_inside() {
        let eval = BollingerBandEvaluator::evaluate(0.15, 0.0, 0.1);
        assert!(!eval.anomaly);
    }

    #[test]
    fn zero_stddev_collapses_bands_to_mean() {
        let eval = BollingerBandEvaluator::evaluate(0.03, 0.03, 0.0);
        assert!(!eval.anomaly);
        assert!(BollingerBandEvaluator::evaluate(0.031, 0.03, 0.0).anomaly);
    }
}
