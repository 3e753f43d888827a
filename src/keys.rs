//! Persistent Ed25519 key management for ledger signing
//!
//! Loads the engine's signing key from a base64-encoded JSON key file, or
//! generates one on first use. Receipts appended to the WORM ledger are
//! signed with this key.

use crate::errors::{VeridictError, VeridictResult};
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use chrono::Utc;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// On-disk key file format.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyData {
    /// Base64-encoded private key (32 bytes)
    private_key_b64: String,
    /// Base64-encoded public key (32 bytes)
    public_key_b64: String,
    created_at: String,
    purpose: String,
}

/// Engine signing key pair.
#[derive(Debug, Clone)]
pub struct LedgerSigningKey {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl LedgerSigningKey {
    /// Generate a fresh key pair from OS randomness.
    pub fn generate() -> VeridictResult<Self> {
        let mut seed = [0u8; 32];
        getrandom::fill(&mut seed)
            .map_err(|e| VeridictError::crypto(format!("entropy source failed: {e}")))?;
        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key();
        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// Load the key file, generating and persisting a new pair when absent.
    pub fn load_or_generate(path: &Path) -> VeridictResult<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let key = Self::generate()?;
        key.save(path)?;
        info!(path = %path.display(), "generated new ledger signing key");
        Ok(key)
    }

    fn load(path: &Path) -> VeridictResult<Self> {
        let bytes = fs::read(path)
            .map_err(|e| VeridictError::io(format!("read key file {}", path.display()), e))?;
        let data: KeyData = serde_json::from_slice(&bytes)?;

        let private_bytes = B64
            .decode(&data.private_key_b64)
            .map_err(|e| VeridictError::crypto(format!("invalid private key encoding: {e}")))?;
        let key_array: [u8; 32] = private_bytes
            .as_slice()
            .try_into()
            .map_err(|_| VeridictError::crypto("private key must be 32 bytes"))?;

        let signing_key = SigningKey::from_bytes(&key_array);
        let verifying_key = signing_key.verifying_key();

        // Cross-check the stored public key against the derived one.
        let stored_public = B64
            .decode(&data.public_key_b64)
            .map_err(|e| VeridictError::crypto(format!("invalid public key encoding: {e}")))?;
        if stored_public != verifying_key.to_bytes() {
            return Err(VeridictError::crypto(
                "key file public key does not match private key",
            ));
        }

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    fn save(&self, path: &Path) -> VeridictResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| VeridictError::io("create key dir", e))?;
        }
        let data = KeyData {
            private_key_b64: B64.encode(self.signing_key.to_bytes()),
            public_key_b64: B64.encode(self.verifying_key.to_bytes()),
            created_at: Utc::now().to_rfc3339(),
            purpose: "worm_ledger_signing".to_string(),
        };
        let json = serde_json::to_string_pretty(&data)?;
        fs::write(path, json.as_bytes())
            .map_err(|e| VeridictError::io(format!("write key file {}", path.display()), e))?;
        Ok(())
    }

    /// Sign a message; returns the base64-encoded signature.
    pub fn sign_b64(&self, message: &[u8]) -> String {
        B64.encode(self.signing_key.sign(message).to_bytes())
    }

    /// Base64-encoded public key for receipt verification.
    pub fn public_key_b64(&self) -> String {
        B64.encode(self.verifying_key.to_bytes())
    }

    /// Verify a base64 signature over a message against a base64 public key.
    pub fn verify_b64(public_key_b64: &str, message: &[u8], signature_b64: &str) -> bool {
        let Ok(pub_bytes) = B64.decode(public_key_b64) else {
            return false;
        };
        let Ok(sig_bytes) = B64.decode(signature_b64) else {
            return false;
        };
        let Ok(pub_array) = <[u8; 32]>::try_from(pub_bytes.as_slice()) else {
            return false;
        };
        let Ok(sig_array) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&pub_array) else {
            return false;
        };
        let signature = Signature::from_bytes(&sig_array);
        verifying_key.verify(message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generated_key_signs_and_verifies() {
        let key = LedgerSigningKey::generate().expect("generate");
        let signature = key.sign_b64(b"decision record");
        assert!(LedgerSigningKey::verify_b64(
            &key.public_key_b64(),
            b"decision record",
            &signature
        ));
        assert!(!LedgerSigningKey::verify_b64(
            &key.public_key_b64(),
            b"tampered record",
            &signature
        ));
    }

    #[test]
    fn load_or_generate_is_stable_across_calls() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("signing_key.json");
        let first = LedgerSigningKey::load_or_generate(&path).expect("first");
        let second = LedgerSigningKey::load_or_generate(&path).expect("second");
        assert_eq!(first.public_key_b64(), second.public_key_b64());
    }

    #[test]
    fn garbage_signature_never_verifies() {
        let key = LedgerSigningKey::generate().expect("generate");
        assert!(!LedgerSigningKey::verify_b64(
            &key.public_key_b64(),
            b"msg",
            "not-base64!!"
        ));
    }
}
