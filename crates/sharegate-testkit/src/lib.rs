//! # Sharegate Testkit
//!
//! Testing utilities for Sharegate.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a memory store, an encryptor and deterministic principals
//! - **Faults**: a blob store that fails on chosen paths
//! - **Generators**: Proptest strategies for identifiers and levels
//! - **Golden vectors**: wire-format records with their expected decoding
//!
//! ## Test Fixtures
//!
//! ```rust
//! use sharegate_testkit::fixtures::{address, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let storage = fixture.storage();
//! assert_eq!(storage.namespace(), &fixture.namespace);
//! assert!(address(7).ends_with("07"));
//! ```
//!
//! ## Fault Injection
//!
//! ```rust
//! use sharegate_testkit::faults::FaultyBlobStore;
//!
//! let store = FaultyBlobStore::new();
//! store.fail_puts_under("permissions/0xabc/db-2");
//! ```
//!
//! ## Golden Vectors
//!
//! ```rust
//! use sharegate_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use faults::FaultyBlobStore;
pub use fixtures::{address, multi_party_fixtures, principal, TestFixture};
pub use vectors::{all_vectors, verify_all_vectors, RecordVector};
