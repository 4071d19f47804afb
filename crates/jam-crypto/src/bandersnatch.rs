//! Bandersnatch VRF types and the ring-VRF backend interface.
//!
//! The concrete ring-VRF implementation is an external collaborator; the
//! core only needs commitment construction, anonymous ticket-proof
//! verification, and VRF-output extraction from a block's seal signature.
//! Byte widths follow the protocol wire sizes.

use crate::CryptoError;
use jam_types::Hash;
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

pub const PUBLIC_KEY_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 96;
pub const RING_PROOF_SIZE: usize = 784;
pub const RING_COMMITMENT_SIZE: usize = 144;

/// A compressed bandersnatch public key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct BandersnatchPublic(pub [u8; PUBLIC_KEY_SIZE]);

/// A plain (non-ring) bandersnatch VRF signature, as found in block seals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfSignature(#[serde(with = "BigArray")] pub [u8; SIGNATURE_SIZE]);

impl Default for VrfSignature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_SIZE])
    }
}

/// An anonymous ring-VRF ticket proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingVrfProof(#[serde(with = "BigArray")] pub [u8; RING_PROOF_SIZE]);

impl Default for RingVrfProof {
    fn default() -> Self {
        Self([0u8; RING_PROOF_SIZE])
    }
}

/// A Pedersen commitment to a validator ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingCommitment(#[serde(with = "BigArray")] pub [u8; RING_COMMITMENT_SIZE]);

impl Default for RingCommitment {
    fn default() -> Self {
        Self([0u8; RING_COMMITMENT_SIZE])
    }
}

/// A 32-byte VRF output.
pub type VrfOutput = Hash;

/// The ring-VRF backend supplied by the host.
///
/// Implementations carry the precomputed universal parameters for the
/// protocol's ring size; they are built once at startup and shared
/// immutably for the life of the process.
pub trait RingVrfVerifier: Send + Sync {
    /// Commit to a validator ring's bandersnatch keys.
    fn ring_commitment(&self, keys: &[BandersnatchPublic]) -> Result<RingCommitment, CryptoError>;

    /// Verify an anonymous ring proof over `input` with auxiliary data
    /// `aux`, returning the VRF output it commits to.
    fn verify_ring_proof(
        &self,
        commitment: &RingCommitment,
        input: &[u8],
        aux: &[u8],
        proof: &RingVrfProof,
    ) -> Result<VrfOutput, CryptoError>;

    /// Extract the VRF output of a plain seal signature.
    fn vrf_output(&self, signature: &VrfSignature) -> Result<VrfOutput, CryptoError>;
}
