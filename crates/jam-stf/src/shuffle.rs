//! Seeded Fisher-Yates shuffle.
//!
//! Index entropy is derived from the seed hash in 4-byte little-endian
//! chunks: every eighth index re-hashes the seed with the chunk counter,
//! blake2b(seed ∥ le32(⌊i/8⌋)), and the chunk at offset 4·i mod 32 is read
//! from the digest.

use jam_crypto::blake2b_256;
use jam_types::Hash;

/// Shuffle `slice` in place, deterministically in `seed`.
pub fn shuffle<T: Copy>(slice: &mut [T], seed: &Hash) {
    if slice.len() <= 1 {
        return;
    }

    let seeds = derive_shuffle_seeds(seed, slice.len());

    let mut pool: Vec<T> = slice.to_vec();
    for (i, entropy) in seeds.into_iter().enumerate() {
        let index = entropy as usize % pool.len();
        slice[i] = pool[index];
        pool[index] = pool[pool.len() - 1];
        pool.pop();
    }
}

fn derive_shuffle_seeds(seed: &Hash, length: usize) -> Vec<u32> {
    let mut output = Vec::with_capacity(length);
    let mut digest = [0u8; 32];

    for i in 0..length {
        let offset = (4 * i) % 32;
        if offset == 0 {
            let mut preimage = Vec::with_capacity(36);
            preimage.extend_from_slice(seed);
            preimage.extend_from_slice(&((i / 8) as u32).to_le_bytes());
            digest = blake2b_256(&preimage);
        }

        let chunk: [u8; 4] = digest[offset..offset + 4].try_into().expect("4-byte chunk");
        output.push(u32::from_le_bytes(chunk));
    }

    output
}
