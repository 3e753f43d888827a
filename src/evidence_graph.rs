//! Evidence cross-reference graph construction
//!
//! Builds a typed graph over scanned artifacts by applying every matching
//! edge rule (hash chains, UUID links, policy/test mapping, temporal
//! clustering) and derives the connectivity metrics consumed by the
//! resilience scorer.
//!
//! Determinism: the builder sorts artifacts by (content hash, node key)
//! before processing and keeps nodes/edges in ordered collections, so the
//! same artifact set always yields byte-identical graphs regardless of
//! filesystem iteration order.

use crate::evidence::{
    ArtifactDescriptor, EdgeRelation, EvidenceEdge, EvidenceNode, EvidenceKind, NodeKey,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Maximum artifacts linked pairwise inside one temporal bucket. Buckets
/// larger than this contribute edges only among the first `CAP` members in
/// sorted key order, bounding the edge count at CAP*(CAP-1)/2 per bucket.
pub const TEMPORAL_CLUSTER_CAP: usize = 12;

/// Connectivity metrics over the undirected support of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetrics {
    pub density: f64,
    pub avg_degree: f64,
    pub clustering: f64,
}

/// Typed evidence graph. Every edge endpoint is guaranteed to exist as a
/// node; the builder only links keys it has already registered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceGraph {
    pub nodes: BTreeMap<NodeKey, EvidenceNode>,
    pub edges: BTreeSet<EvidenceEdge>,
}

impl EvidenceGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Undirected adjacency over the edge set.
    fn adjacency(&self) -> BTreeMap<&NodeKey, BTreeSet<&NodeKey>> {
        let mut adj: BTreeMap<&NodeKey, BTreeSet<&NodeKey>> = BTreeMap::new();
        for key in self.nodes.keys() {
            adj.entry(key).or_default();
        }
        for edge in &self.edges {
            if edge.source == edge.target {
                continue;
            }
            adj.entry(&edge.source).or_default().insert(&edge.target);
            adj.entry(&edge.target).or_default().insert(&edge.source);
        }
        adj
    }

    /// Number of distinct unordered node pairs with at least one edge.
    fn undirected_edge_count(adj: &BTreeMap<&NodeKey, BTreeSet<&NodeKey>>) -> usize {
        let degree_sum: usize = adj.values().map(|n| n.len()).sum();
        degree_sum / 2
    }

    /// Density, average degree and mean local clustering coefficient.
    pub fn metrics(&self) -> GraphMetrics {
        let v = self.node_count();
        let adj = self.adjacency();
        let e = Self::undirected_edge_count(&adj);

        let density = if v > 1 {
            2.0 * e as f64 / (v as f64 * (v as f64 - 1.0))
        } else {
            0.0
        };
        let avg_degree = if v > 0 { 2.0 * e as f64 / v as f64 } else { 0.0 };

        // Mean local clustering over nodes with degree >= 2: the fraction of
        // a node's neighbor pairs that are themselves connected.
        let mut coefficients = Vec::new();
        for neighbors in adj.values() {
            let d = neighbors.len();
            if d < 2 {
                continue;
            }
            let neighbor_list: Vec<&&NodeKey> = neighbors.iter().collect();
            let mut closed = 0usize;
            for i in 0..neighbor_list.len() {
                for j in (i + 1)..neighbor_list.len() {
                    if adj
                        .get(*neighbor_list[i])
                        .is_some_and(|n| n.contains(*neighbor_list[j]))
                    {
                        closed += 1;
                    }
                }
            }
            let possible = d * (d - 1) / 2;
            coefficients.push(closed as f64 / possible as f64);
        }
        let clustering = if coefficients.is_empty() {
            0.0
        } else {
            coefficients.iter().sum::<f64>() / coefficients.len() as f64
        };

        GraphMetrics {
            density,
            avg_degree,
            clustering,
        }
    }
}

/// Applies the edge rules over a scanned artifact set.
pub struct EvidenceGraphBuilder;

impl EvidenceGraphBuilder {
    /// Build the graph. All matching edge rules apply; duplicate edges for
    /// the same (source, target, relation) triple collapse into one.
    pub fn build(artifacts: &[ArtifactDescriptor]) -> EvidenceGraph {
        let mut sorted: Vec<&ArtifactDescriptor> = artifacts.iter().collect();
        sorted.sort_by(|a, b| {
            (&a.content_hash, a.node_key()).cmp(&(&b.content_hash, b.node_key()))
        });

        let mut graph = EvidenceGraph::default();

        // Node merge pass: identity is (kind, id), first occurrence in
        // sorted order wins.
        for artifact in &sorted {
            graph
                .nodes
                .entry(artifact.node_key())
                .or_insert_with(|| artifact.node());
        }

        // Lookup indexes over the merged node set.
        let mut by_hash: BTreeMap<&str, NodeKey> = BTreeMap::new();
        let mut by_id: BTreeMap<&str, NodeKey> = BTreeMap::new();
        for artifact in &sorted {
            by_hash
                .entry(artifact.content_hash.as_str())
                .or_insert_with(|| artifact.node_key());
            by_id
                .entry(artifact.id.as_str())
                .or_insert_with(|| artifact.node_key());
        }

        Self::link_hash_chains(&sorted, &by_hash, &mut graph);
        Self::link_uuid_refs(&sorted, &by_id, &mut graph);
        Self::link_policy_tests(&mut graph);
        Self::link_temporal_clusters(&sorted, &mut graph);

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "evidence graph built"
        );
        graph
    }

    /// hash_chain: A declares prev_hash equal to B's content hash => B -> A.
    fn link_hash_chains(
        sorted: &[&ArtifactDescriptor],
        by_hash: &BTreeMap<&str, NodeKey>,
        graph: &mut EvidenceGraph,
    ) {
        for artifact in sorted {
            let Some(prev) = artifact.prev_hash.as_deref() else {
                continue;
            };
            if let Some(predecessor) = by_hash.get(prev) {
                if *predecessor != artifact.node_key() {
                    graph.edges.insert(EvidenceEdge::new(
                        predecessor.clone(),
                        artifact.node_key(),
                        EdgeRelation::HashChain,
                    ));
                }
            }
        }
    }

    /// uuid_link: A references another artifact's UUID/id => A -> B.
    fn link_uuid_refs(
        sorted: &[&ArtifactDescriptor],
        by_id: &BTreeMap<&str, NodeKey>,
        graph: &mut EvidenceGraph,
    ) {
        for artifact in sorted {
            for reference in &artifact.uuid_refs {
                if let Some(target) = by_id.get(reference.as_str()) {
                    if *target != artifact.node_key() {
                        graph.edges.insert(EvidenceEdge::new(
                            artifact.node_key(),
                            target.clone(),
                            EdgeRelation::UuidLink,
                        ));
                    }
                }
            }
        }
    }

    /// policy_test_map: a test whose identifier embeds a policy rule
    /// identifier maps onto that policy (case-insensitive substring).
    fn link_policy_tests(graph: &mut EvidenceGraph) {
        let policies: Vec<(NodeKey, String)> = graph
            .nodes
            .keys()
            .filter(|k| k.kind == EvidenceKind::Policy)
            .map(|k| (k.clone(), k.id.to_lowercase()))
            .collect();
        let tests: Vec<(NodeKey, String)> = graph
            .nodes
            .keys()
            .filter(|k| k.kind == EvidenceKind::Test)
            .map(|k| (k.clone(), k.id.to_lowercase()))
            .collect();

        for (test_key, test_id) in &tests {
            for (policy_key, policy_id) in &policies {
                if !policy_id.is_empty() && test_id.contains(policy_id.as_str()) {
                    graph.edges.insert(EvidenceEdge::new(
                        test_key.clone(),
                        policy_key.clone(),
                        EdgeRelation::PolicyTestMap,
                    ));
                }
            }
        }
    }

    /// temporal_cluster: artifacts sharing an hour bucket link pairwise,
    /// capped per bucket to avoid combinatorial blowup.
    fn link_temporal_clusters(sorted: &[&ArtifactDescriptor], graph: &mut EvidenceGraph) {
        let mut buckets: BTreeMap<String, BTreeSet<NodeKey>> = BTreeMap::new();
        for artifact in sorted {
            let bucket = artifact.timestamp.format("%Y-%m-%dT%H").to_string();
            buckets.entry(bucket).or_default().insert(artifact.node_key());
        }

        for members in buckets.values() {
            let capped: Vec<&NodeKey> = members.iter().take(TEMPORAL_CLUSTER_CAP).collect();
            for i in 0..capped.len() {
                for j in (i + 1)..capped.len() {
                    graph.edges.insert(EvidenceEdge::new(
                        capped[i].clone(),
                        capped[j].clone(),
                        EdgeRelation::TemporalCluster,
                    ));
                }
            }
        }
    }
}
