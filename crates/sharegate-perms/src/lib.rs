//! # Sharegate Permissions Storage
//!
//! Encrypted, durable, per-record permission storage with a read-through
//! cache.
//!
//! ## Overview
//!
//! Each permission record is serialized to its JSON wire schema, sealed by an
//! [`Encryptor`] and written as one blob per `(resource, grantee)` pair. The
//! [`PermissionStorage`] keeps a per-resource cache in front of the blob
//! store so repeated checks do not pay for a decrypt.
//!
//! ## Key Concepts
//!
//! - **Encryptor**: the collaborator that seals and opens records
//! - **StorageEnvelope**: the opaque sealed container stored in the blob
//! - **Complete bucket**: a cache bucket filled from a full prefix listing,
//!   the only kind allowed to answer `load_all` without the store
//!
//! ## Encryption Model
//!
//! [`SealedBoxEncryptor`] seals every record to a storage public key:
//!
//! 1. **Ephemeral exchange**: a one-time X25519 key agrees a secret with the
//!    storage key
//! 2. **Key derivation**: Blake3 derives a ChaCha20-Poly1305 key bound to both
//!    public keys
//! 3. **Sealing**: the record is encrypted under a random nonce
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sharegate_core::PrincipalId;
//! use sharegate_perms::{PermissionStorage, SealedBoxEncryptor};
//! use sharegate_store::MemoryBlobStore;
//!
//! let namespace: PrincipalId = "0x00000000000000000000000000000000000000a1".parse().unwrap();
//! let storage = PermissionStorage::new(
//!     Arc::new(MemoryBlobStore::new()),
//!     Arc::new(SealedBoxEncryptor::generate()),
//!     namespace,
//! );
//! ```

pub mod crypto;
pub mod encryptor;
pub mod envelope;
pub mod error;
pub mod storage;

pub use crypto::{StorageSecret, X25519PublicKey};
pub use encryptor::{Encryptor, SealedBoxEncryptor};
pub use envelope::{EnvelopeFormat, StorageEnvelope};
pub use error::{PermsError, Result};
pub use storage::{PermissionStorage, StorageConfig};
