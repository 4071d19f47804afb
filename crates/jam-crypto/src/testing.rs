//! Deterministic ring-VRF stand-in for tests.
//!
//! Proof layout: bytes 0..32 carry the claimed VRF output, bytes 32..64 must
//! equal blake2b-256 of the VRF input. Seal signatures carry their output in
//! bytes 0..32. This gives tests full control over ticket identifiers while
//! still rejecting proofs bound to the wrong input.

use crate::bandersnatch::{
    BandersnatchPublic, RingCommitment, RingVrfProof, RingVrfVerifier, VrfOutput, VrfSignature,
    RING_PROOF_SIZE, SIGNATURE_SIZE,
};
use crate::hash::blake2b_256;
use crate::CryptoError;

/// The insecure test backend.
pub struct TestRingVrf;

impl TestRingVrf {
    /// Forge a ring proof over `input` claiming `output`.
    pub fn prove(input: &[u8], output: VrfOutput) -> RingVrfProof {
        let mut proof = [0u8; RING_PROOF_SIZE];
        proof[..32].copy_from_slice(&output);
        proof[32..64].copy_from_slice(&blake2b_256(input));
        RingVrfProof(proof)
    }

    /// Forge a seal signature whose VRF output is `output`.
    pub fn seal(output: VrfOutput) -> VrfSignature {
        let mut sig = [0u8; SIGNATURE_SIZE];
        sig[..32].copy_from_slice(&output);
        VrfSignature(sig)
    }
}

impl RingVrfVerifier for TestRingVrf {
    fn ring_commitment(&self, keys: &[BandersnatchPublic]) -> Result<RingCommitment, CryptoError> {
        let mut concat = Vec::with_capacity(keys.len() * 32);
        for key in keys {
            concat.extend_from_slice(&key.0);
        }
        let mut commitment = [0u8; 144];
        commitment[..32].copy_from_slice(&blake2b_256(&concat));
        Ok(RingCommitment(commitment))
    }

    fn verify_ring_proof(
        &self,
        _commitment: &RingCommitment,
        input: &[u8],
        _aux: &[u8],
        proof: &RingVrfProof,
    ) -> Result<VrfOutput, CryptoError> {
        if proof.0[32..64] != blake2b_256(input) {
            return Err(CryptoError::RingProofInvalid);
        }
        let mut output = [0u8; 32];
        output.copy_from_slice(&proof.0[..32]);
        Ok(output)
    }

    fn vrf_output(&self, signature: &VrfSignature) -> Result<VrfOutput, CryptoError> {
        let mut output = [0u8; 32];
        output.copy_from_slice(&signature.0[..32]);
        Ok(output)
    }
}
