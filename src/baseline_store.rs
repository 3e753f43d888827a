//! Prior-state persistence
//!
//! The baseline file carries the previous cycle's delta, master score,
//! rolling window and base thresholds. It is read once at cycle start and
//! written once at cycle end through a temp-file-plus-rename so no partial
//! write is ever visible to another process.

use crate::adaptive_threshold::ThresholdSet;
use crate::errors::{VeridictError, VeridictResult};
use crate::rolling_stats::TruthDeltaSample;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persisted state from the previous monitoring cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineState {
    pub last_delta: f64,
    pub last_master_score: f64,
    pub window: Vec<TruthDeltaSample>,
    pub thresholds_base: ThresholdSet,
}

impl BaselineState {
    /// Cold-start state: empty window, zero delta.
    pub fn cold_start(thresholds_base: ThresholdSet) -> Self {
        Self {
            last_delta: 0.0,
            last_master_score: 0.0,
            window: Vec::new(),
            thresholds_base,
        }
    }
}

/// File-backed baseline store with atomic replacement.
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the prior state. A missing file is a cold start, not an error;
    /// an unreadable or corrupt file is a structural failure.
    pub fn load(&self, default_base: ThresholdSet) -> VeridictResult<BaselineState> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no baseline found, cold start");
            return Ok(BaselineState::cold_start(default_base));
        }
        let bytes = fs::read(&self.path)
            .map_err(|e| VeridictError::baseline("load", e.to_string()))?;
        let state: BaselineState = serde_json::from_slice(&bytes)
            .map_err(|e| VeridictError::baseline("parse", e.to_string()))?;
        debug!(
            samples = state.window.len(),
            last_delta = state.last_delta,
            "baseline loaded"
        );
        Ok(state)
    }

    /// Persist the end-of-cycle state via write-to-temp plus atomic rename.
    pub fn save(&self, state: &BaselineState) -> VeridictResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| VeridictError::baseline("create_dir", e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json.as_bytes())
            .map_err(|e| VeridictError::baseline("write_tmp", e.to_string()))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| VeridictError::baseline("rename", e.to_string()))?;
        debug!(path = %self.path.display(), "baseline persisted");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_a_cold_start() {
        let dir = tempdir().expect("tempdir");
        let store = BaselineStore::new(dir.path().join("baseline.json"));
        let state = store.load(ThresholdSet::default()).expect("load");
        assert_eq!(state.last_delta, 0.0);
        assert!(state.window.is_empty());
    }

    #[test]
    fn round_trip_preserves_window_order() {
        let dir = tempdir().expect("tempdir");
        let store = BaselineStore::new(dir.path().join("baseline.json"));

        let window: Vec<TruthDeltaSample> = (0..5)
            .map(|i| TruthDeltaSample::new(Utc::now(), i as f64 * 0.01))
            .collect();
        let state = BaselineState {
            last_delta: -0.02,
            last_master_score: 0.81,
            window: window.clone(),
            thresholds_base: ThresholdSet::default(),
        };
        store.save(&state).expect("save");

        let loaded = store.load(ThresholdSet::default()).expect("load");
        assert_eq!(loaded.last_delta, -0.02);
        assert_eq!(loaded.last_master_score, 0.81);
        let magnitudes: Vec<f64> = loaded.window.iter().map(|s| s.magnitude).collect();
        let expected: Vec<f64> = window.iter().map(|s| s.magnitude).collect();
        assert_eq!(magnitudes, expected);
    }

    #[test]
    fn corrupt_file_is_a_structural_failure() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("baseline.json");
        fs::write(&path, b"{broken").expect("write");
        let store = BaselineStore::new(path);
        let err = store.load(ThresholdSet::default()).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn save_replaces_without_leaving_temp_files() {
        let dir = tempdir().expect("tempdir");
        let store = BaselineStore::new(dir.path().join("baseline.json"));
        let state = BaselineState::cold_start(ThresholdSet::default());
        store.save(&state).expect("first save");
        store.save(&state).expect("second save");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
