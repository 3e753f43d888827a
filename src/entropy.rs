//! Shannon entropy and mutual information over evidence distributions
//!
//! Per-source entropy is computed over hour-bucket occupancy counts; the
//! pairwise mutual information treats each observed hour bucket as one
//! observation of presence/absence for the two sources. Total MI is the sum
//! over all unordered source pairs.

use crate::evidence::{ArtifactDescriptor, EvidenceKind};
use std::collections::{BTreeMap, BTreeSet};

/// Floating-point floor applied to MI results. The identity
/// I(X;Y) = H(X)+H(Y)-H(X,Y) is non-negative; tiny negative residue from
/// rounding clamps to zero.
const MI_EPSILON: f64 = 1e-12;

fn entropy_from_counts<I: IntoIterator<Item = u64>>(counts: I) -> f64 {
    let counts: Vec<u64> = counts.into_iter().filter(|&c| c > 0).collect();
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Shannon entropy of a category/count distribution, in bits.
/// Zero-count categories contribute nothing (0 * log2(0) = 0 by convention).
pub fn shannon_entropy<K: Ord>(distribution: &BTreeMap<K, u64>) -> f64 {
    entropy_from_counts(distribution.values().copied())
}

/// Mutual information I(X;Y) = H(X) + H(Y) - H(X,Y) from empirical counts,
/// clamped to be non-negative.
pub fn mutual_information<K: Ord, L: Ord>(
    x: &BTreeMap<K, u64>,
    y: &BTreeMap<L, u64>,
    joint: &BTreeMap<(K, L), u64>,
) -> f64 {
    let mi = shannon_entropy(x) + shannon_entropy(y) - entropy_from_counts(joint.values().copied());
    if mi < MI_EPSILON {
        0.0
    } else {
        mi
    }
}

/// Aggregate MI over the evidence corpus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiSummary {
    pub total_bits: f64,
    pub pair_count: usize,
}

/// Entropy metrics over a scanned artifact corpus.
pub struct EntropyCalculator;

impl EntropyCalculator {
    fn bucket_of(artifact: &ArtifactDescriptor) -> String {
        artifact.timestamp.format("%Y-%m-%dT%H").to_string()
    }

    /// Hour-bucket occupancy counts per evidence source kind.
    pub fn source_distributions(
        artifacts: &[ArtifactDescriptor],
    ) -> BTreeMap<EvidenceKind, BTreeMap<String, u64>> {
        let mut distributions: BTreeMap<EvidenceKind, BTreeMap<String, u64>> = BTreeMap::new();
        for artifact in artifacts {
            *distributions
                .entry(artifact.kind)
                .or_default()
                .entry(Self::bucket_of(artifact))
                .or_insert(0) += 1;
        }
        distributions
    }

    /// Shannon entropy per source kind over its bucket distribution.
    pub fn source_entropy(artifacts: &[ArtifactDescriptor]) -> BTreeMap<EvidenceKind, f64> {
        Self::source_distributions(artifacts)
            .iter()
            .map(|(kind, dist)| (*kind, shannon_entropy(dist)))
            .collect()
    }

    /// Total mutual information summed over all unordered source-kind pairs.
    ///
    /// For a pair (A, B) each hour bucket observed anywhere in the corpus is
    /// one observation of (A present, B present); MI is computed from those
    /// empirical presence counts.
    pub fn total_mutual_information(artifacts: &[ArtifactDescriptor]) -> MiSummary {
        let distributions = Self::source_distributions(artifacts);
        let kinds: Vec<EvidenceKind> = distributions.keys().copied().collect();

        let all_buckets: BTreeSet<&String> =
            distributions.values().flat_map(|d| d.keys()).collect();
        if all_buckets.is_empty() || kinds.len() < 2 {
            return MiSummary {
                total_bits: 0.0,
                pair_count: 0,
            };
        }

        let mut total_bits = 0.0;
        let mut pair_count = 0;
        for i in 0..kinds.len() {
            for j in (i + 1)..kinds.len() {
                let dist_a = &distributions[&kinds[i]];
                let dist_b = &distributions[&kinds[j]];

                let mut x: BTreeMap<bool, u64> = BTreeMap::new();
                let mut y: BTreeMap<bool, u64> = BTreeMap::new();
                let mut joint: BTreeMap<(bool, bool), u64> = BTreeMap::new();
                for bucket in &all_buckets {
                    let a_present = dist_a.contains_key(*bucket);
                    let b_present = dist_b.contains_key(*bucket);
                    *x.entry(a_present).or_insert(0) += 1;
                    *y.entry(b_present).or_insert(0) += 1;
                    *joint.entry((a_present, b_present)).or_insert(0) += 1;
                }

                total_bits += mutual_information(&x, &y, &joint);
                pair_count += 1;
            }
        }

        MiSummary {
            total_bits,
            pair_count,
        }
    }
}
