//! WORM decision ledger
//!
//! Append-only, hash-chained storage for cycle reports. Each appended
//! record carries a SHA-256 hash linking it to its predecessor and an
//! Ed25519 signature over that hash; `verify_chain` recomputes the whole
//! chain. Records are never updated or deleted.

use crate::errors::{VeridictError, VeridictResult};
use crate::keys::LedgerSigningKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sled::Db;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

/// Receipt returned for a successful append.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WormReceipt {
    pub uuid: Uuid,
    pub signature: String,
    pub chain_prev: Option<String>,
}

/// One stored ledger record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WormRecord {
    pub uuid: Uuid,
    pub seq: u64,
    pub appended_at: DateTime<Utc>,
    pub payload: serde_json::Value,
    pub content_hash: String,
    pub chain_prev: Option<String>,
    pub signature: String,
    pub public_key: String,
}

/// Append/verify contract for the decision ledger. The engine only appends
/// its cycle report; ledger internals stay behind this trait.
pub trait WormStore {
    fn append(&self, payload: serde_json::Value) -> VeridictResult<WormReceipt>;
    fn verify_chain(&self) -> VeridictResult<bool>;
}

/// sled-backed WORM ledger.
pub struct WormStoreSled {
    db: Db,
    signing_key: LedgerSigningKey,
}

const RECORDS_TREE: &str = "worm_records";

fn seq_key(seq: u64) -> [u8; 8] {
    seq.to_be_bytes()
}

fn chain_hash(chain_prev: Option<&str>, payload_json: &str) -> String {
    let mut hasher = Sha256::new();
    if let Some(prev) = chain_prev {
        hasher.update(prev.as_bytes());
    }
    hasher.update(payload_json.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl WormStoreSled {
    pub fn open(path: &Path, signing_key: LedgerSigningKey) -> VeridictResult<Self> {
        let db = sled::open(path)
            .map_err(|e| VeridictError::ledger(format!("open {}", path.display()), e))?;
        Ok(Self { db, signing_key })
    }

    fn tree(&self) -> VeridictResult<sled::Tree> {
        self.db
            .open_tree(RECORDS_TREE)
            .map_err(|e| VeridictError::ledger("open records tree", e))
    }

    /// Sequence number and content hash of the current chain head.
    fn head(&self, tree: &sled::Tree) -> VeridictResult<Option<(u64, String)>> {
        match tree.last().map_err(|e| VeridictError::ledger("read head", e))? {
            Some((_, bytes)) => {
                let record: WormRecord = serde_json::from_slice(&bytes)?;
                Ok(Some((record.seq, record.content_hash)))
            }
            None => Ok(None),
        }
    }

    /// All records in chain order. Exposed for audit tooling.
    pub fn records(&self) -> VeridictResult<Vec<WormRecord>> {
        let tree = self.tree()?;
        let mut records = Vec::new();
        for entry in tree.iter() {
            let (_, bytes) = entry.map_err(|e| VeridictError::ledger("iterate records", e))?;
            records.push(serde_json::from_slice(&bytes)?);
        }
        Ok(records)
    }
}

impl WormStore for WormStoreSled {
    fn append(&self, payload: serde_json::Value) -> VeridictResult<WormReceipt> {
        let tree = self.tree()?;
        let head = self.head(&tree)?;
        let (seq, chain_prev) = match head {
            Some((last_seq, last_hash)) => (last_seq + 1, Some(last_hash)),
            None => (0, None),
        };

        let payload_json = serde_json::to_string(&payload)?;
        let content_hash = chain_hash(chain_prev.as_deref(), &payload_json);
        let signature = self.signing_key.sign_b64(content_hash.as_bytes());

        let record = WormRecord {
            uuid: Uuid::new_v4(),
            seq,
            appended_at: Utc::now(),
            payload,
            content_hash: content_hash.clone(),
            chain_prev: chain_prev.clone(),
            signature: signature.clone(),
            public_key: self.signing_key.public_key_b64(),
        };

        let bytes = serde_json::to_vec(&record)?;
        tree.insert(seq_key(seq), bytes)
            .map_err(|e| VeridictError::worm_write("insert record", e))?;
        tree.flush()
            .map_err(|e| VeridictError::worm_write("flush ledger", e))?;

        debug!(seq, hash = %content_hash, "worm record appended");
        Ok(WormReceipt {
            uuid: record.uuid,
            signature,
            chain_prev,
        })
    }

    /// Walk the full chain: hash continuity, recomputed content hashes and
    /// signatures must all hold.
    fn verify_chain(&self) -> VeridictResult<bool> {
        let mut prev_hash: Option<String> = None;
        for (index, record) in self.records()?.into_iter().enumerate() {
            if record.seq != index as u64 {
                warn!(seq = record.seq, index, "ledger sequence gap");
                return Ok(false);
            }
            if record.chain_prev != prev_hash {
                warn!(seq = record.seq, "ledger chain link mismatch");
                return Ok(false);
            }
            let payload_json = serde_json::to_string(&record.payload)?;
            let expected = chain_hash(record.chain_prev.as_deref(), &payload_json);
            if expected != record.content_hash {
                warn!(seq = record.seq, "ledger content hash mismatch");
                return Ok(false);
            }
            if !LedgerSigningKey::verify_b64(
                &record.public_key,
                record.content_hash.as_bytes(),
                &record.signature,
            ) {
                warn!(seq = record.seq, "ledger signature invalid");
                return Ok(false);
            }
            prev_hash = Some(record.content_hash);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn open_store(dir: &Path) -> WormStoreSled {
        let key = LedgerSigningKey::generate().expect("key");
        WormStoreSled::open(&dir.join("worm"), key).expect("open store")
    }

    #[test]
    fn appends_link_into_a_chain() {
        let dir = tempdir().expect("tempdir");
        let store = open_store(dir.path());

        let first = store.append(json!({"cycle": 1})).expect("append 1");
        assert!(first.chain_prev.is_none());

        let second = store.append(json!({"cycle": 2})).expect("append 2");
        assert!(second.chain_prev.is_some());
        assert!(store.verify_chain().expect("verify"));

        let records = store.records().expect("records");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].chain_prev.as_deref(), Some(records[0].content_hash.as_str()));
    }

    #[test]
    fn empty_ledger_verifies() {
        let dir = tempdir().expect("tempdir");
        let store = open_store(dir.path());
        assert!(store.verify_chain().expect("verify"));
    }

    #[test]
    fn tampered_record_fails_verification() {
        let dir = tempdir().expect("tempdir");
        let store = open_store(dir.path());
        store.append(json!({"cycle": 1})).expect("append");
        store.append(json!({"cycle": 2})).expect("append");

        // Rewrite the first record's payload behind the store's back.
        let tree = store.db.open_tree(RECORDS_TREE).expect("tree");
        let bytes = tree.get(seq_key(0)).expect("get").expect("record");
        let mut record: WormRecord = serde_json::from_slice(&bytes).expect("parse");
        record.payload = json!({"cycle": "forged"});
        tree.insert(seq_key(0), serde_json::to_vec(&record).expect("serialize"))
            .expect("insert");

        assert!(!store.verify_chain().expect("verify"));
    }

    #[test]
    fn receipts_expose_signature_and_prev() {
        let dir = tempdir().expect("tempdir");
        let store = open_store(dir.path());
        let receipt = store.append(json!({"decision": "APPROVE"})).expect("append");
        assert!(!receipt.signature.is_empty());
        let records = store.records().expect("records");
        assert!(LedgerSigningKey::verify_b64(
            &records[0].public_key,
            records[0].content_hash.as_bytes(),
            &receipt.signature,
        ));
    }
}
