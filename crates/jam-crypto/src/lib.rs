//! Host cryptography surface.
//!
//! The state-transition core is pure and does no I/O; everything
//! cryptographic it needs is either a stateless hash/verify function
//! (blake2b-256, keccak-256, ed25519) or the bandersnatch ring-VRF backend
//! reached through the [`RingVrfVerifier`] trait. The ring backend owns the
//! one-time ring parameters for the validator-set size and is constructed
//! exactly once by the host.

pub mod bandersnatch;
pub mod ed25519;
pub mod hash;

#[cfg(feature = "testing")]
pub mod testing;

pub use bandersnatch::{
    BandersnatchPublic, RingCommitment, RingVrfProof, RingVrfVerifier, VrfOutput, VrfSignature,
};
pub use ed25519::{Ed25519Public, Ed25519Signature};
pub use hash::{blake2b_256, keccak_256};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("ring vrf proof verification failed")]
    RingProofInvalid,

    #[error("ring commitment construction failed: {0}")]
    RingCommitment(String),

    #[error("vrf output extraction failed")]
    VrfOutputInvalid,
}

pub type Result<T> = std::result::Result<T, CryptoError>;
