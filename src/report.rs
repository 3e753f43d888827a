//! Cycle report rendering
//!
//! The JSON record produced at the end of every monitoring cycle. The same
//! value is written to the report output and appended to the WORM ledger.

use crate::adaptive_threshold::ThresholdSet;
use crate::bollinger::BandEvaluation;
use crate::errors::{VeridictError, VeridictResult};
use crate::forensic::{Grade, MasterScoreComponents};
use crate::governance::GovernanceAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Resilience metrics block of the report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResilienceMetrics {
    pub mi_total: f64,
    pub density: f64,
    pub avg_degree: f64,
    pub clustering: f64,
}

/// Terminal report for one monitoring cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub timestamp: DateTime<Utc>,
    pub delta_magnitude: f64,
    pub governance_action: GovernanceAction,
    pub exit_code: i32,
    pub adaptive_thresholds: ThresholdSet,
    /// Absent during the learning phase, when anomaly detection is off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger_bands: Option<BandEvaluation>,
    pub master_score: f64,
    pub capped: bool,
    pub grade: Grade,
    pub components: MasterScoreComponents,
    pub resilience_metrics: ResilienceMetrics,
    pub evidence_complete: bool,
}

impl CycleReport {
    /// JSON value appended to the WORM ledger.
    pub fn to_value(&self) -> VeridictResult<serde_json::Value> {
        serde_json::to_value(self).map_err(VeridictError::from)
    }

    /// Write the report to a file, or to stdout when no path is given.
    pub fn write(&self, path: Option<&Path>) -> VeridictResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        match path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)
                            .map_err(|e| VeridictError::report(e.to_string()))?;
                    }
                }
                fs::write(path, json.as_bytes())
                    .map_err(|e| VeridictError::report(e.to_string()))?;
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}
