//! The encryption contract used by [`PermissionStorage`](crate::PermissionStorage).
//!
//! Storage never sees key material. It asks an [`Encryptor`] for the public
//! key records should be sealed to, and hands envelopes back to it to open.

use sharegate_core::Permission;

use crate::crypto::{random_nonce, seal_key, StorageSecret, X25519PublicKey};
use crate::envelope::{EnvelopeFormat, StorageEnvelope};
use crate::error::{PermsError, Result};

/// Encrypts and decrypts permission records for storage.
///
/// `decrypt_from_storage` returns the bare record. Implementations must be
/// usable from many tasks at once.
pub trait Encryptor: Send + Sync {
    /// The key records for this storage boundary are sealed to.
    fn public_key(&self) -> X25519PublicKey;

    /// Seal a record for `recipient`.
    fn encrypt_for_storage(
        &self,
        recipient: &X25519PublicKey,
        record: &Permission,
    ) -> Result<StorageEnvelope>;

    /// Open an envelope and parse the record inside it.
    fn decrypt_from_storage(&self, envelope: &StorageEnvelope) -> Result<Permission>;
}

/// Reference [`Encryptor`]: anonymous sealed boxes over X25519.
///
/// Anyone holding the public key can seal; only the secret holder can open.
pub struct SealedBoxEncryptor {
    secret: StorageSecret,
    public: X25519PublicKey,
}

impl SealedBoxEncryptor {
    /// Create an encryptor around an existing secret.
    pub fn new(secret: StorageSecret) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Create an encryptor with a fresh random secret.
    pub fn generate() -> Self {
        Self::new(StorageSecret::generate())
    }
}

impl Encryptor for SealedBoxEncryptor {
    fn public_key(&self) -> X25519PublicKey {
        self.public
    }

    fn encrypt_for_storage(
        &self,
        recipient: &X25519PublicKey,
        record: &Permission,
    ) -> Result<StorageEnvelope> {
        let (key, ephemeral_public) = seal_key(recipient);
        let nonce = random_nonce();
        let ciphertext = key.encrypt(&record.to_bytes(), &nonce)?;

        Ok(StorageEnvelope {
            format: EnvelopeFormat::X25519ChaCha20Poly1305,
            recipient: *recipient,
            ephemeral_public,
            nonce,
            ciphertext,
        })
    }

    fn decrypt_from_storage(&self, envelope: &StorageEnvelope) -> Result<Permission> {
        if envelope.recipient != self.public {
            return Err(PermsError::DecryptionError(format!(
                "envelope sealed to {:?}, not to this encryptor",
                envelope.recipient
            )));
        }

        let plaintext = match envelope.format {
            EnvelopeFormat::X25519ChaCha20Poly1305 => self
                .secret
                .open_key(&envelope.ephemeral_public)
                .decrypt(&envelope.ciphertext, &envelope.nonce)?,
        };

        Ok(Permission::from_bytes(&plaintext)?)
    }
}
