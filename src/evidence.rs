//! Evidence data model
//!
//! Typed nodes and edges for the evidence cross-reference graph, plus the
//! adapter-facing artifact descriptor that scanners produce. Arbitrary
//! upstream record shapes collapse into the closed [`EvidenceKind`] variant;
//! unknown kinds map to `Other` rather than failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of evidence source categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Manifest,
    Uuid,
    Policy,
    Test,
    Worm,
    Other,
}

impl EvidenceKind {
    /// Adapter mapping from free-form kind strings; unknown values land in
    /// `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "manifest" => EvidenceKind::Manifest,
            "uuid" => EvidenceKind::Uuid,
            "policy" => EvidenceKind::Policy,
            "test" => EvidenceKind::Test,
            "worm" => EvidenceKind::Worm,
            _ => EvidenceKind::Other,
        }
    }
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvidenceKind::Manifest => "manifest",
            EvidenceKind::Uuid => "uuid",
            EvidenceKind::Policy => "policy",
            EvidenceKind::Test => "test",
            EvidenceKind::Worm => "worm",
            EvidenceKind::Other => "other",
        };
        write!(f, "{name}")
    }
}

/// Identity of an evidence node: the (kind, id) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub kind: EvidenceKind,
    pub id: String,
}

impl NodeKey {
    pub fn new(kind: EvidenceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// One evidence artifact in the graph. Immutable; identity is (kind, id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceNode {
    pub id: String,
    pub kind: EvidenceKind,
    pub hash: String,
}

impl EvidenceNode {
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.kind, self.id.clone())
    }
}

/// Relation attached to an evidence edge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRelation {
    HashChain,
    UuidLink,
    PolicyTestMap,
    TemporalCluster,
    Reference,
}

/// Directed cross-reference between two evidence nodes.
///
/// Duplicate edges for the same (source, target, relation) triple are
/// idempotent; the builder stores edges in an ordered set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceEdge {
    pub source: NodeKey,
    pub target: NodeKey,
    pub relation: EdgeRelation,
}

impl EvidenceEdge {
    pub fn new(source: NodeKey, target: NodeKey, relation: EdgeRelation) -> Self {
        Self {
            source,
            target,
            relation,
        }
    }

    /// Edge weight; uniform for now, carried for forward compatibility of
    /// the serialized form.
    pub fn weight(&self) -> f64 {
        1.0
    }
}

/// Scanner-produced descriptor of one evidence artifact.
///
/// This is the collaborator-owned wire shape: whatever the upstream
/// validators emit, the adapter reduces it to this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDescriptor {
    pub id: String,
    pub kind: EvidenceKind,
    pub timestamp: DateTime<Utc>,
    pub content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uuid_refs: Vec<String>,
    /// True when the recorded content hash matched the bytes on disk.
    #[serde(default)]
    pub hash_verified: bool,
}

impl ArtifactDescriptor {
    pub fn node(&self) -> EvidenceNode {
        EvidenceNode {
            id: self.id.clone(),
            kind: self.kind,
            hash: self.content_hash.clone(),
        }
    }

    pub fn node_key(&self) -> NodeKey {
        NodeKey::new(self.kind, self.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_maps_to_other() {
        assert_eq!(EvidenceKind::parse("policy"), EvidenceKind::Policy);
        assert_eq!(EvidenceKind::parse("POLICY"), EvidenceKind::Policy);
        assert_eq!(EvidenceKind::parse("telemetry_blob"), EvidenceKind::Other);
    }

    #[test]
    fn edges_dedupe_by_triple() {
        use std::collections::BTreeSet;

        let a = NodeKey::new(EvidenceKind::Policy, "p1");
        let b = NodeKey::new(EvidenceKind::Test, "t1");
        let mut edges = BTreeSet::new();
        edges.insert(EvidenceEdge::new(a.clone(), b.clone(), EdgeRelation::PolicyTestMap));
        edges.insert(EvidenceEdge::new(a.clone(), b.clone(), EdgeRelation::PolicyTestMap));
        edges.insert(EvidenceEdge::new(a, b, EdgeRelation::Reference));
        assert_eq!(edges.len(), 2);
    }
}
