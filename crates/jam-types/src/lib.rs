//! Chain-wide primitive types.
//!
//! Hashes and blobs, JAM time (slots, epochs, the Common Era), the protocol
//! parameter set (full chain and the `tiny` test profile), and the LSB-first
//! bit-sequence codec used for signed availability bitfields.

pub mod codec;
pub mod params;
pub mod time;

pub use time::{Epoch, JamTime, TimeSlot};

/// Hash length in bytes.
pub const HASH_LENGTH: usize = 32;

/// 32-byte opaque identifier (blake2b or keccak output depending on context).
pub type Hash = [u8; HASH_LENGTH];

/// The all-zero hash.
pub const ZERO_HASH: Hash = [0u8; HASH_LENGTH];

/// Arbitrary-length octet sequence.
pub type Blob = Vec<u8>;

/// `0x`-prefixed lowercase hex rendering of a hash.
pub fn hash_to_hex(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Parse a hash from hex, with or without a `0x` prefix.
pub fn hash_from_hex(s: &str) -> Result<Hash, hex::FromHexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s)?;
    let mut hash = ZERO_HASH;
    if bytes.len() != HASH_LENGTH {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    hash.copy_from_slice(&bytes);
    Ok(hash)
}
