//! ed25519 keys and signature verification.
//!
//! Verification goes through `ed25519-consensus` for consensus-stable
//! acceptance criteria. The all-zero public key is the protocol's null key;
//! it is not a valid curve point and therefore never verifies anything.

use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

pub const PUBLIC_KEY_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 64;

/// An ed25519 public key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Ed25519Public(pub [u8; PUBLIC_KEY_SIZE]);

impl Ed25519Public {
    /// The null key: all zeroes.
    pub const NULL: Self = Self([0u8; PUBLIC_KEY_SIZE]);

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }
}

/// A 64-byte ed25519 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ed25519Signature(#[serde(with = "BigArray")] pub [u8; SIGNATURE_SIZE]);

impl Default for Ed25519Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_SIZE])
    }
}

/// Verify `signature` over `message` under `public`.
///
/// Malformed keys (including the null key) simply fail verification.
pub fn verify(public: &Ed25519Public, message: &[u8], signature: &Ed25519Signature) -> bool {
    let Ok(key) = ed25519_consensus::VerificationKey::try_from(public.0) else {
        return false;
    };
    let sig = ed25519_consensus::Signature::from(signature.0);
    key.verify(&sig, message).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_verify_round_trip() {
        let sk = ed25519_consensus::SigningKey::new(OsRng);
        let pk = Ed25519Public(sk.verification_key().to_bytes());
        let sig = Ed25519Signature(sk.sign(b"jam message").to_bytes());

        assert!(verify(&pk, b"jam message", &sig));
        assert!(!verify(&pk, b"other message", &sig));
    }

    #[test]
    fn test_null_key_never_verifies() {
        let sk = ed25519_consensus::SigningKey::new(OsRng);
        let sig = Ed25519Signature(sk.sign(b"msg").to_bytes());

        assert!(Ed25519Public::NULL.is_null());
        assert!(!verify(&Ed25519Public::NULL, b"msg", &sig));
    }
}
