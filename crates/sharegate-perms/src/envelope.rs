//! Sealed storage envelope.
//!
//! Every persisted permission record is wrapped in a [`StorageEnvelope`].
//! The envelope is the opaque container handed between the storage layer
//! and an [`Encryptor`](crate::Encryptor); on disk it is CBOR.

use serde::{Deserialize, Serialize};

use crate::crypto::X25519PublicKey;
use crate::error::{PermsError, Result};

/// Format identifier for sealed envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EnvelopeFormat {
    /// Ephemeral X25519, Blake3 KDF, ChaCha20-Poly1305.
    X25519ChaCha20Poly1305 = 1,
}

/// An encrypted permission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEnvelope {
    /// Sealing scheme.
    pub format: EnvelopeFormat,

    /// Key the record was sealed to.
    pub recipient: X25519PublicKey,

    /// Ephemeral public key from the sealing exchange.
    pub ephemeral_public: X25519PublicKey,

    /// Nonce used for encryption (unique per envelope).
    pub nonce: [u8; 12],

    /// The encrypted record (includes authentication tag).
    pub ciphertext: Vec<u8>,
}

impl StorageEnvelope {
    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| PermsError::SerializationError(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| PermsError::SerializationError(e.to_string()))
    }
}
