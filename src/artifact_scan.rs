//! Evidence artifact scanning and adaptation
//!
//! Walks the evidence directory, parses collaborator-owned JSON records into
//! [`ArtifactDescriptor`]s and verifies declared content hashes. Malformed
//! records are skipped with a warning; the cycle continues on partial
//! evidence. The scan honors a wall-clock deadline and reports an incomplete
//! corpus instead of blocking indefinitely.

use crate::errors::{VeridictError, VeridictResult};
use crate::evidence::{ArtifactDescriptor, EvidenceKind};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Collaborator-owned wire shape of one evidence record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifactRecord {
    id: String,
    kind: String,
    timestamp: DateTime<Utc>,
    content_hash: String,
    #[serde(default)]
    prev_hash: Option<String>,
    #[serde(default)]
    uuid_refs: Vec<String>,
    /// Inline payload, when the producer embeds it. Used only to re-verify
    /// the declared content hash.
    #[serde(default)]
    content: Option<String>,
}

/// Result of one evidence scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Parsed artifacts, sorted by (content hash, kind, id).
    pub artifacts: Vec<ArtifactDescriptor>,
    /// Candidate record files discovered on disk.
    pub discovered: usize,
    /// Records that parsed into a descriptor.
    pub parsed: usize,
    /// Parsed records whose declared content hash matched the payload.
    pub hash_verified: usize,
    /// False when the scan deadline expired before the walk finished.
    pub complete: bool,
}

impl ScanOutcome {
    /// Fraction of discovered records that parsed; 0 for an empty corpus.
    pub fn structural_ratio(&self) -> f64 {
        if self.discovered == 0 {
            0.0
        } else {
            self.parsed as f64 / self.discovered as f64
        }
    }

    /// Fraction of parsed records with a verified content hash.
    pub fn content_ratio(&self) -> f64 {
        if self.parsed == 0 {
            0.0
        } else {
            self.hash_verified as f64 / self.parsed as f64
        }
    }
}

/// Directory scanner for evidence records.
pub struct ArtifactScanner {
    deadline: Duration,
}

impl ArtifactScanner {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// Scan `dir` for `.json` evidence records. A missing directory yields
    /// an empty, complete outcome (cold corpus, not an error).
    pub fn scan(&self, dir: &Path) -> VeridictResult<ScanOutcome> {
        let mut outcome = ScanOutcome {
            artifacts: Vec::new(),
            discovered: 0,
            parsed: 0,
            hash_verified: 0,
            complete: true,
        };

        if !dir.exists() {
            warn!(dir = %dir.display(), "evidence directory missing, scanning nothing");
            return Ok(outcome);
        }

        let started = Instant::now();
        let files = collect_record_files(dir)?;
        for path in files {
            if started.elapsed() > self.deadline {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "evidence scan deadline exceeded, proceeding with partial corpus"
                );
                outcome.complete = false;
                break;
            }
            outcome.discovered += 1;
            match parse_record(&path) {
                Ok(descriptor) => {
                    outcome.parsed += 1;
                    if descriptor.hash_verified {
                        outcome.hash_verified += 1;
                    }
                    outcome.artifacts.push(descriptor);
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping malformed artifact");
                }
            }
        }

        // Stable processing order for everything downstream.
        outcome
            .artifacts
            .sort_by(|a, b| (&a.content_hash, a.node_key()).cmp(&(&b.content_hash, b.node_key())));

        debug!(
            discovered = outcome.discovered,
            parsed = outcome.parsed,
            verified = outcome.hash_verified,
            complete = outcome.complete,
            "evidence scan finished"
        );
        Ok(outcome)
    }
}

/// Recursively collect `.json` files in sorted path order. Sorting here
/// removes any dependence on filesystem iteration order.
fn collect_record_files(dir: &Path) -> VeridictResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current)
            .map_err(|e| VeridictError::io(format!("read_dir {}", current.display()), e))?;
        let mut children: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        children.sort();
        for child in children {
            if child.is_dir() {
                pending.push(child);
            } else if child.extension().is_some_and(|ext| ext == "json") {
                files.push(child);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn parse_record(path: &Path) -> VeridictResult<ArtifactDescriptor> {
    let bytes =
        fs::read(path).map_err(|e| VeridictError::io(format!("read {}", path.display()), e))?;
    let raw: RawArtifactRecord = serde_json::from_slice(&bytes)
        .map_err(|e| VeridictError::serialization(path.display().to_string(), e))?;

    if raw.id.trim().is_empty() {
        return Err(VeridictError::scan(format!(
            "artifact {} has an empty id",
            path.display()
        )));
    }

    let hash_verified = match &raw.content {
        Some(content) => {
            let mut hasher = Sha256::new();
            hasher.update(content.as_bytes());
            let computed = format!("{:x}", hasher.finalize());
            computed == raw.content_hash.to_lowercase()
        }
        // No inline payload to check against; counts as unverified.
        None => false,
    };

    Ok(ArtifactDescriptor {
        id: raw.id,
        kind: EvidenceKind::parse(&raw.kind),
        timestamp: raw.timestamp,
        content_hash: raw.content_hash,
        prev_hash: raw.prev_hash,
        uuid_refs: raw.uuid_refs,
        hash_verified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_record(dir: &Path, name: &str, json: &str) {
        let mut file = fs::File::create(dir.join(name)).expect("create record");
        file.write_all(json.as_bytes()).expect("write record");
    }

    fn scanner() -> ArtifactScanner {
        ArtifactScanner::new(Duration::from_secs(30))
    }

    #[test]
    fn parses_well_formed_records() {
        let dir = tempdir().expect("tempdir");
        let content = "policy body";
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        write_record(
            dir.path(),
            "policy.json",
            &format!(
                r#"{{"id":"GDPR-7","kind":"policy","timestamp":"2026-03-14T09:15:00Z","contentHash":"{hash}","content":"{content}"}}"#
            ),
        );

        let outcome = scanner().scan(dir.path()).expect("scan");
        assert_eq!(outcome.discovered, 1);
        assert_eq!(outcome.parsed, 1);
        assert_eq!(outcome.hash_verified, 1);
        assert!(outcome.complete);
        assert_eq!(outcome.artifacts[0].kind, EvidenceKind::Policy);
        assert!((outcome.structural_ratio() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let dir = tempdir().expect("tempdir");
        write_record(dir.path(), "broken.json", "{not json");
        write_record(
            dir.path(),
            "ok.json",
            r#"{"id":"t1","kind":"test","timestamp":"2026-03-14T09:15:00Z","contentHash":"abc"}"#,
        );

        let outcome = scanner().scan(dir.path()).expect("scan");
        assert_eq!(outcome.discovered, 2);
        assert_eq!(outcome.parsed, 1);
        assert!((outcome.structural_ratio() - 0.5).abs() < 1e-12);
        // No inline payload means the hash stays unverified.
        assert_eq!(outcome.hash_verified, 0);
        assert_eq!(outcome.content_ratio(), 0.0);
    }

    #[test]
    fn missing_directory_is_a_cold_corpus() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("nowhere");
        let outcome = scanner().scan(&missing).expect("scan");
        assert_eq!(outcome.discovered, 0);
        assert!(outcome.complete);
        assert_eq!(outcome.structural_ratio(), 0.0);
    }

    #[test]
    fn mismatched_content_hash_is_unverified() {
        let dir = tempdir().expect("tempdir");
        write_record(
            dir.path(),
            "tampered.json",
            r#"{"id":"w1","kind":"worm","timestamp":"2026-03-14T09:15:00Z","contentHash":"deadbeef","content":"actual body"}"#,
        );
        let outcome = scanner().scan(dir.path()).expect("scan");
        assert_eq!(outcome.parsed, 1);
        assert_eq!(outcome.hash_verified, 0);
    }

    #[test]
    fn unknown_kind_degrades_to_other() {
        let dir = tempdir().expect("tempdir");
        write_record(
            dir.path(),
            "odd.json",
            r#"{"id":"x","kind":"anti_gaming_log","timestamp":"2026-03-14T09:15:00Z","contentHash":"ff"}"#,
        );
        let outcome = scanner().scan(dir.path()).expect("scan");
        assert_eq!(outcome.artifacts[0].kind, EvidenceKind::Other);
    }

    #[test]
    fn expired_deadline_marks_outcome_incomplete() {
        let dir = tempdir().expect("tempdir");
        for i in 0..4 {
            write_record(
                dir.path(),
                &format!("r{i}.json"),
                &format!(
                    r#"{{"id":"a{i}","kind":"test","timestamp":"2026-03-14T09:15:00Z","contentHash":"h{i}"}}"#
                ),
            );
        }
        let outcome = ArtifactScanner::new(Duration::ZERO)
            .scan(dir.path())
            .expect("scan");
        assert!(!outcome.complete);
        assert!(outcome.parsed < 4);
    }
}
