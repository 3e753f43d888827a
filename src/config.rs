//! Engine configuration
//!
//! Layered figment configuration: serialized defaults, then `veridict.toml`,
//! then `VERIDICT_`-prefixed environment variables. Every tunable of the
//! scoring pipeline lives here so the components stay free of hardcoded
//! policy.

use crate::adaptive_threshold::ThresholdSet;
use crate::forensic::{default_grade_tiers, AggregatorWeights, CapThresholds, GradeTier};
use crate::resilience::ResilienceWeights;
use crate::rolling_stats::DEFAULT_WINDOW_CAPACITY;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Base (non-adaptive) governance thresholds as configured.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BaseThresholds {
    pub improve: f64,
    pub stable: f64,
    pub critical: f64,
}

impl Default for BaseThresholds {
    fn default() -> Self {
        Self {
            improve: 0.05,
            stable: -0.03,
            critical: -0.10,
        }
    }
}

impl BaseThresholds {
    pub fn to_threshold_set(self) -> ThresholdSet {
        ThresholdSet::new(self.improve, self.stable, self.critical)
    }

    pub fn is_ordered(&self) -> bool {
        self.improve >= self.stable && self.stable >= self.critical
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the baseline state, signing key and WORM ledger.
    pub data_dir: String,
    /// Directory scanned for evidence artifact records.
    pub evidence_dir: String,
    /// Wall-clock bound on the evidence scan, in seconds.
    pub scan_timeout_secs: u64,
    pub window_capacity: usize,
    #[serde(default)]
    pub thresholds: BaseThresholds,
    #[serde(default)]
    pub resilience: ResilienceWeights,
    #[serde(default)]
    pub aggregator: AggregatorWeights,
    #[serde(default)]
    pub cap: CapThresholds,
    #[serde(default = "default_grade_tiers")]
    pub grade_tiers: Vec<GradeTier>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            evidence_dir: "evidence".to_string(),
            scan_timeout_secs: 30,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            thresholds: BaseThresholds::default(),
            resilience: ResilienceWeights::default(),
            aggregator: AggregatorWeights::default(),
            cap: CapThresholds::default(),
            grade_tiers: default_grade_tiers(),
        }
    }
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|dir| dir.join("veridict").to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string())
}

impl EngineConfig {
    pub fn baseline_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("baseline.json")
    }

    pub fn worm_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("worm")
    }

    pub fn signing_key_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("signing_key.json")
    }

    /// Render the configuration as a starter TOML file.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Load the layered configuration. A missing TOML file is fine; malformed
/// values and an unordered base threshold set are not.
pub fn load_config(config_path: Option<&str>) -> Result<EngineConfig, figment::Error> {
    let toml_path = config_path.unwrap_or("veridict.toml");
    let figment = Figment::from(Serialized::defaults(EngineConfig::default()))
        .merge(Toml::file(toml_path))
        .merge(Env::prefixed("VERIDICT_"));

    let config: EngineConfig = figment.extract()?;

    if config.window_capacity == 0 {
        return Err(figment::Error::from(
            "window_capacity must be at least 1".to_string(),
        ));
    }
    if !config.thresholds.is_ordered() {
        return Err(figment::Error::from(
            "base thresholds must satisfy improve >= stable >= critical".to_string(),
        ));
    }

    Ok(config)
}
