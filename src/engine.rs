//! Monitoring cycle orchestration
//!
//! One full pass per invocation: load baseline, scan evidence, build the
//! graph and entropy metrics, fold resilience, aggregate the master score,
//! derive adaptive thresholds, decide, report, append to the WORM ledger and
//! persist the new baseline. All state is carried in an explicit
//! [`EngineState`]; there are no process-wide singletons.

use crate::adaptive_threshold::{AdaptiveThresholdController, ThresholdSet};
use crate::artifact_scan::{ArtifactScanner, ScanOutcome};
use crate::baseline_store::{BaselineState, BaselineStore};
use crate::bollinger::{BandEvaluation, BollingerBandEvaluator};
use crate::config::EngineConfig;
use crate::entropy::EntropyCalculator;
use crate::errors::VeridictResult;
use crate::evidence_graph::{EvidenceGraphBuilder, GraphMetrics};
use crate::forensic::{ForensicAggregator, Grade, MasterScore, MasterScoreComponents};
use crate::governance::{GovernanceAction, GovernanceDecision, GovernanceDecisionEngine};
use crate::keys::LedgerSigningKey;
use crate::report::{CycleReport, ResilienceMetrics};
use crate::resilience::ResilienceScorer;
use crate::rolling_stats::{RollingStatisticsTracker, TruthDeltaSample};
use crate::worm_store::{WormReceipt, WormStore, WormStoreSled};
use chrono::Utc;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

/// Mutable state for one cycle, constructed at cycle start and persisted or
/// discarded at cycle end.
pub struct EngineState {
    pub baseline: BaselineState,
    pub tracker: RollingStatisticsTracker,
    pub scan: ScanOutcome,
    pub graph_metrics: GraphMetrics,
    pub mi_total: f64,
}

/// Outcome of one completed (durable) cycle.
pub struct CycleOutcome {
    pub report: CycleReport,
    pub receipt: WormReceipt,
}

/// Drives the scoring pipeline for one repository.
pub struct TrustCycleEngine {
    config: EngineConfig,
}

impl TrustCycleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Run one monitoring cycle. The decision is durable only once the WORM
    /// append has succeeded; any structural failure aborts before the
    /// baseline is advanced.
    pub fn run_cycle(&self, report_path: Option<&Path>) -> VeridictResult<CycleOutcome> {
        let base_thresholds = self.config.thresholds.to_threshold_set();
        let baseline_store = BaselineStore::new(self.config.baseline_path());
        let baseline = baseline_store.load(base_thresholds)?;

        let scanner = ArtifactScanner::new(Duration::from_secs(self.config.scan_timeout_secs));
        let scan = scanner.scan(Path::new(&self.config.evidence_dir))?;
        if !scan.complete {
            warn!("evidence scan incomplete, scores degrade on partial corpus");
        }

        let graph = EvidenceGraphBuilder::build(&scan.artifacts);
        let graph_metrics = graph.metrics();
        let mi = EntropyCalculator::total_mutual_information(&scan.artifacts);

        let resilience = ResilienceScorer::new(self.config.resilience).score(
            mi.total_bits,
            graph_metrics.density,
            graph_metrics.clustering,
        );

        // The vector sub-score reflects the trajectory entering this cycle:
        // the previous delta mapped onto [0,1] around a neutral 0.5.
        let components = MasterScoreComponents {
            structural: scan.structural_ratio(),
            content: scan.content_ratio(),
            entropy_resilience: resilience,
            vector_magnitude: (0.5 + baseline.last_delta).clamp(0.0, 1.0),
        };

        let aggregator = ForensicAggregator::new(
            self.config.aggregator,
            self.config.cap,
            self.config.grade_tiers.clone(),
        );

        let mut state = EngineState {
            tracker: RollingStatisticsTracker::from_samples(
                baseline.window.clone(),
                self.config.window_capacity,
            ),
            baseline,
            scan,
            graph_metrics,
            mi_total: mi.total_bits,
        };

        let (master, delta, bands, decision) =
            self.evaluate(&mut state, &aggregator, &components, base_thresholds);

        let report = CycleReport {
            timestamp: Utc::now(),
            delta_magnitude: delta,
            governance_action: decision.action,
            exit_code: decision.exit_code,
            adaptive_thresholds: decision.thresholds,
            bollinger_bands: bands,
            master_score: master.score,
            capped: master.capped,
            grade: master.grade,
            components,
            resilience_metrics: ResilienceMetrics {
                mi_total: state.mi_total,
                density: state.graph_metrics.density,
                avg_degree: state.graph_metrics.avg_degree,
                clustering: state.graph_metrics.clustering,
            },
            evidence_complete: state.scan.complete,
        };

        report.write(report_path)?;

        // The decision becomes durable here; a failed append aborts the
        // cycle before the baseline advances.
        let receipt = self.open_ledger()?.append(report.to_value()?)?;

        baseline_store.save(&BaselineState {
            last_delta: delta,
            last_master_score: master.score,
            window: state.tracker.samples(),
            thresholds_base: base_thresholds,
        })?;

        info!(
            action = %decision.action,
            score = master.score,
            delta,
            "cycle complete"
        );
        Ok(CycleOutcome { report, receipt })
    }

    /// Score aggregation and governance evaluation. Non-finite values
    /// anywhere fail closed to BLOCK without poisoning the rolling window.
    fn evaluate(
        &self,
        state: &mut EngineState,
        aggregator: &ForensicAggregator,
        components: &MasterScoreComponents,
        base_thresholds: ThresholdSet,
    ) -> (MasterScore, f64, Option<BandEvaluation>, GovernanceDecision) {
        if !components.is_finite() {
            error!(?components, "non-finite component scores, failing closed");
            let master = MasterScore {
                score: 0.0,
                capped: false,
                grade: Grade::None,
            };
            let decision = GovernanceDecision {
                action: GovernanceAction::Block,
                exit_code: GovernanceAction::Block.exit_code(),
                delta: 0.0,
                thresholds: base_thresholds,
            };
            return (master, 0.0, None, decision);
        }

        let master = aggregator.aggregate(components);
        let delta = master.score - state.baseline.last_master_score;
        if !delta.is_finite() {
            error!(delta, "non-finite truth delta, failing closed");
            let decision = GovernanceDecision {
                action: GovernanceAction::Block,
                exit_code: GovernanceAction::Block.exit_code(),
                delta: 0.0,
                thresholds: base_thresholds,
            };
            return (master, 0.0, None, decision);
        }

        state
            .tracker
            .record(TruthDeltaSample::new(Utc::now(), delta));
        let thresholds = AdaptiveThresholdController::compute(&state.tracker, base_thresholds);

        // Anomaly detection stays off while the controller is learning.
        let bands = if thresholds.adaptive {
            let evaluation =
                BollingerBandEvaluator::evaluate(delta, state.tracker.mean(), state.tracker.stddev());
            if evaluation.anomaly {
                warn!(delta, upper = evaluation.upper, lower = evaluation.lower,
                    "truth delta outside adaptive bands");
            }
            Some(evaluation)
        } else {
            None
        };

        let decision = GovernanceDecisionEngine::decide(delta, thresholds);
        (master, delta, bands, decision)
    }

    fn open_ledger(&self) -> VeridictResult<WormStoreSled> {
        let key = LedgerSigningKey::load_or_generate(&self.config.signing_key_path())?;
        WormStoreSled::open(&self.config.worm_path(), key)
    }

    /// Verify the WORM ledger chain end to end.
    pub fn verify_ledger(&self) -> VeridictResult<bool> {
        self.open_ledger()?.verify_chain()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
