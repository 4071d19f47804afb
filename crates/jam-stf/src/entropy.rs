//! Entropy accumulation.
//!
//! η[0] is the running accumulator folded with each block's seal VRF
//! output; η[1..3] are snapshots of the accumulator at the ends of the
//! last three epochs, rotated on each epoch boundary.

use jam_crypto::{blake2b_256, VrfOutput};
use jam_types::Hash;
use serde::{Deserialize, Serialize};

pub const ENTROPY_POOL_SIZE: usize = 4;

/// η: the entropy accumulator and epochal randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntropyPool(pub [Hash; ENTROPY_POOL_SIZE]);

impl EntropyPool {
    pub fn new(genesis: Hash) -> Self {
        Self([genesis; ENTROPY_POOL_SIZE])
    }

    /// Fold a seal VRF output into the accumulator. Runs every slot.
    pub fn accumulate(&mut self, vrf_output: &VrfOutput) {
        let mut preimage = Vec::with_capacity(64);
        preimage.extend_from_slice(&self.0[0]);
        preimage.extend_from_slice(vrf_output);
        self.0[0] = blake2b_256(&preimage);
    }

    /// Shift the historical snapshots on an epoch boundary. η[0] is kept;
    /// the caller folds the current block's VRF output in right after.
    pub fn rotate(&mut self) {
        for i in (1..ENTROPY_POOL_SIZE).rev() {
            self.0[i] = self.0[i - 1];
        }
    }
}
