//! Key material for sealing permission records at rest.
//!
//! Records are sealed to a storage public key with an ephemeral X25519
//! exchange, a Blake3-derived key and ChaCha20-Poly1305.

use std::fmt;
use std::str::FromStr;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::error::{PermsError, Result};

/// Domain separation context for storage keys.
const STORAGE_KDF_CONTEXT: &str = "sharegate-perms-v1 storage sealing key";

/// An X25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn to_dalek(self) -> PublicKey {
        PublicKey::from(self.0)
    }
}

impl From<PublicKey> for X25519PublicKey {
    fn from(pk: PublicKey) -> Self {
        Self(*pk.as_bytes())
    }
}

impl fmt::Debug for X25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519PublicKey({})", &self.to_hex()[..16])
    }
}

impl FromStr for X25519PublicKey {
    type Err = PermsError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| PermsError::InvalidKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| PermsError::InvalidKey("expected 32 bytes".into()))?;
        Ok(Self(bytes))
    }
}

/// Long-lived secret that opens records sealed to its public key.
pub struct StorageSecret(StaticSecret);

impl StorageSecret {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(StaticSecret::from(bytes))
    }

    /// Create from seed bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Derive the public key records are sealed to.
    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey::from(PublicKey::from(&self.0))
    }

    /// Recover the sealing key for an envelope produced by [`seal_key`].
    pub(crate) fn open_key(&self, ephemeral_public: &X25519PublicKey) -> SealingKey {
        let shared = self.0.diffie_hellman(&ephemeral_public.to_dalek());
        SealingKey::derive(shared.as_bytes(), ephemeral_public, &self.public_key())
    }
}

/// Create a fresh sealing key for `recipient`.
///
/// Returns the key and the ephemeral public key that must travel with the
/// ciphertext. The ephemeral secret is consumed here and never stored.
pub(crate) fn seal_key(recipient: &X25519PublicKey) -> (SealingKey, X25519PublicKey) {
    let ephemeral = EphemeralSecret::random_from_rng(rand::thread_rng());
    let ephemeral_public = X25519PublicKey::from(PublicKey::from(&ephemeral));
    let shared = ephemeral.diffie_hellman(&recipient.to_dalek());

    let key = SealingKey::derive(shared.as_bytes(), &ephemeral_public, recipient);
    (key, ephemeral_public)
}

/// A 256-bit ChaCha20-Poly1305 key bound to one ephemeral exchange.
pub(crate) struct SealingKey([u8; 32]);

impl SealingKey {
    /// Derive from the DH output, binding both public keys into the key.
    fn derive(shared: &[u8; 32], ephemeral: &X25519PublicKey, recipient: &X25519PublicKey) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(STORAGE_KDF_CONTEXT);
        hasher.update(shared);
        hasher.update(ephemeral.as_bytes());
        hasher.update(recipient.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub(crate) fn encrypt(&self, plaintext: &[u8], nonce: &[u8; 12]) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| PermsError::EncryptionError(e.to_string()))?;
        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|e| PermsError::EncryptionError(e.to_string()))
    }

    pub(crate) fn decrypt(&self, ciphertext: &[u8], nonce: &[u8; 12]) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| PermsError::DecryptionError(e.to_string()))?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| PermsError::DecryptionError(e.to_string()))
    }
}

/// Generate a random 96-bit nonce.
pub(crate) fn random_nonce() -> [u8; 12] {
    let mut nonce = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}
