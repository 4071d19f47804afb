//! Hashing backends.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use jam_types::Hash;
use sha3::Keccak256;

type Blake2b256 = Blake2b<U32>;

/// blake2b-256 of a single byte string.
pub fn blake2b_256(data: &[u8]) -> Hash {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// keccak-256 over the concatenation of the given parts.
pub fn keccak_256(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        sha3::Digest::update(&mut hasher, part);
    }
    hasher.finalize().into()
}
