//! Ed25519 signing keypair.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use didi_core::error::{DidiError, Result};
use didi_core::identity::IdentityRecord;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

/// The agent's signing keypair.
///
/// Secret material is zeroized by `ed25519-dalek` when the key is dropped.
pub struct SigningKeyPair {
    signing_key: SigningKey,
}

impl SigningKeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::thread_rng()),
        }
    }

    /// Rebuilds the keypair from a stored private key (base64 of the 32-byte seed).
    ///
    /// Fails with `InvalidKey` when the text is not base64 or not a 32-byte seed.
    pub fn from_private_key_text(text: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| DidiError::invalid_key(format!("private key is not base64: {}", e)))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| DidiError::invalid_key(format!("private key must be 32 bytes, got {}", b.len())))?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    pub fn public_key_text(&self) -> String {
        STANDARD.encode(self.signing_key.verifying_key().to_bytes())
    }

    pub fn private_key_text(&self) -> String {
        STANDARD.encode(self.signing_key.to_bytes())
    }

    pub fn to_identity_record(&self) -> IdentityRecord {
        IdentityRecord {
            public_key: self.public_key_text(),
            private_key: self.private_key_text(),
        }
    }

    /// Sign a message (deterministic - no RNG needed).
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Signs `message` and returns the signature in base64.
    pub fn sign_base64(&self, message: &[u8]) -> String {
        STANDARD.encode(self.sign(message))
    }
}

/// Verifies a base64 signature against a base64 public key.
pub fn verify_base64(public_key: &str, message: &[u8], signature: &str) -> Result<()> {
    let key: [u8; 32] = STANDARD
        .decode(public_key)?
        .try_into()
        .map_err(|_| DidiError::invalid_key("public key must be 32 bytes"))?;
    let verifying_key = VerifyingKey::from_bytes(&key).map_err(|e| DidiError::invalid_key(e.to_string()))?;

    let signature: [u8; 64] = STANDARD
        .decode(signature)?
        .try_into()
        .map_err(|_| DidiError::Security("signature must be 64 bytes".to_string()))?;

    verifying_key
        .verify(message, &Signature::from_bytes(&signature))
        .map_err(|_| DidiError::Security("signature verification failed".to_string()))
}
