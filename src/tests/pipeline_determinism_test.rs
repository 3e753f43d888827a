//! Determinism of the scoring pipeline across identical runs

use crate::engine::TrustCycleEngine;
use crate::tests::engine_cycle_test::{test_config, write_evidence_fixture};
use std::path::Path;
use tempfile::tempdir;

#[test]
fn identical_corpus_and_state_yield_identical_scores() {
    let mut metrics = Vec::new();
    let mut scores = Vec::new();

    for _ in 0..5 {
        // Fresh state each run: same artifact set, same (cold) prior state.
        let root = tempdir().expect("tempdir");
        let config = test_config(root.path());
        write_evidence_fixture(Path::new(&config.evidence_dir));

        let engine = TrustCycleEngine::new(config);
        let outcome = engine.run_cycle(None).expect("cycle");
        metrics.push(outcome.report.resilience_metrics);
        scores.push(outcome.report.master_score);
    }

    for i in 1..5 {
        assert_eq!(metrics[i], metrics[0], "resilience metrics drifted on run {i}");
        assert_eq!(scores[i], scores[0], "master score drifted on run {i}");
    }
}

#[test]
fn graph_and_entropy_ignore_artifact_file_order() {
    use crate::artifact_scan::ArtifactScanner;
    use crate::entropy::EntropyCalculator;
    use crate::evidence_graph::EvidenceGraphBuilder;
    use std::time::Duration;

    let root = tempdir().expect("tempdir");
    let config = test_config(root.path());
    let evidence_dir = Path::new(&config.evidence_dir);
    write_evidence_fixture(evidence_dir);

    let scanner = ArtifactScanner::new(Duration::from_secs(30));
    let outcome = scanner.scan(evidence_dir).expect("scan");

    let mut reversed = outcome.artifacts.clone();
    reversed.reverse();

    let forward_graph = EvidenceGraphBuilder::build(&outcome.artifacts);
    let reversed_graph = EvidenceGraphBuilder::build(&reversed);
    assert_eq!(forward_graph.nodes, reversed_graph.nodes);
    assert_eq!(forward_graph.edges, reversed_graph.edges);

    let forward_mi = EntropyCalculator::total_mutual_information(&outcome.artifacts);
    let reversed_mi = EntropyCalculator::total_mutual_information(&reversed);
    assert_eq!(forward_mi.total_bits, reversed_mi.total_bits);
}
