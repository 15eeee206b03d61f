//! # IBI Core
//!
//! Core cryptographic primitives for identity-based identification (IBI).
//!
//! This crate provides the fundamental building blocks for:
//! - Digital-signature schemes over ristretto255 (single- and twin-secret)
//! - The transform from a signature scheme to a canonical three-move
//!   identification protocol
//! - Hierarchical credential delegation
//! - Group identification with publicly derivable member keys
//!
//! ## Protocol Overview
//!
//! A trust authority generates a master key pair and issues a per-identity
//! credential, which is a signature over the identity string. The credential
//! holder later proves possession to any verifier holding only the master
//! public key by running a commit-challenge-response exchange; the credential
//! itself is never revealed.
//!
//! ## Example
//!
//! ```rust
//! use ibi_core::{Algorithm, SecretKey, ibi};
//!
//! let msk = SecretKey::generate(Algorithm::Heng04);
//! let mpk = msk.public_key();
//!
//! let credential = ibi::issue(&msk, b"alice").unwrap();
//! ibi::validate(&mpk, &credential).unwrap();
//!
//! let (prover, commitment) = ibi::Prover::new(&credential).unwrap().commit().unwrap();
//! let (verifier, challenge) = ibi::Verifier::new(&mpk, b"alice")
//!     .unwrap()
//!     .challenge(&commitment)
//!     .unwrap();
//! let response = prover.respond(&challenge).unwrap();
//! verifier.decide(&response).unwrap();
//! ```

pub mod algorithm;
pub mod ds;
pub mod error;
pub mod gibi;
pub mod group;
pub mod ibi;

pub use algorithm::Algorithm;
pub use ds::{DsSignature, PublicKey, SecretKey};
pub use error::{Error, Result};
pub use ibi::UserKey;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Separator between levels of a hierarchical fully-qualified name
pub const FQN_SEPARATOR: u8 = b'.';
