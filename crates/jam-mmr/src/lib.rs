//! Merkle mountain range.
//!
//! Peaks are stored sparsely, one optional hash per level. Appending a leaf
//! carry-propagates upward: an empty level absorbs the incoming hash, an
//! occupied level combines with it and carries the pair hash one level up.
//! `super_peak` folds all peaks into a single commitment under the `"peak"`
//! domain separator.
//!
//! The pair hasher is supplied by the caller; chain history uses keccak-256.

use jam_types::{Hash, ZERO_HASH};
use serde::{Deserialize, Serialize};

/// A hash over the concatenation of the given parts.
pub type Hasher = fn(&[&[u8]]) -> Hash;

/// Sparse peak list, index = level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mmr {
    peaks: Vec<Option<Hash>>,
}

impl Mmr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peaks(&self) -> &[Option<Hash>] {
        &self.peaks
    }

    /// Number of levels, occupied or not.
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Return a new range with `leaf` appended.
    pub fn append(&self, leaf: Hash, hasher: Hasher) -> Self {
        let mut peaks = self.peaks.clone();
        let mut carry = leaf;

        for level in 0..peaks.len() {
            match peaks[level].take() {
                None => {
                    peaks[level] = Some(carry);
                    return Self { peaks };
                }
                Some(existing) => {
                    // Level cleared by `take`; combined hash moves up.
                    carry = hasher(&[&existing, &carry]);
                }
            }
        }

        peaks.push(Some(carry));
        Self { peaks }
    }

    /// Fold all peaks into one commitment.
    ///
    /// Peaks are folded in ascending level order, each step hashing
    /// `"peak" ∥ accumulated ∥ next`. An empty range commits to the zero
    /// hash; a lone peak commits to itself.
    pub fn super_peak(&self, hasher: Hasher) -> Hash {
        let mut occupied = self.peaks.iter().flatten();

        let Some(first) = occupied.next() else {
            return ZERO_HASH;
        };

        occupied.fold(*first, |acc, peak| hasher(&[b"peak", &acc, peak]))
    }
}

impl From<Vec<Option<Hash>>> for Mmr {
    fn from(peaks: Vec<Option<Hash>>) -> Self {
        Self { peaks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jam_crypto::keccak_256;

    const H1: Hash = [1u8; 32];
    const H2: Hash = [2u8; 32];
    const H3: Hash = [3u8; 32];

    #[test]
    fn test_append_to_empty() {
        let mmr = Mmr::new().append(H1, keccak_256);
        assert_eq!(mmr.peaks(), &[Some(H1)]);
    }

    #[test]
    fn test_append_combines_single_peak() {
        let mmr = Mmr::from(vec![Some(H1)]).append(H2, keccak_256);
        let pair = keccak_256(&[&H1, &H2]);
        assert_eq!(mmr.peaks(), &[None, Some(pair)]);
    }

    #[test]
    fn test_append_fills_empty_head() {
        let mmr = Mmr::from(vec![None, Some(H1)]).append(H2, keccak_256);
        assert_eq!(mmr.peaks(), &[Some(H2), Some(H1)]);
    }

    #[test]
    fn test_append_carries_through_two_levels() {
        let mmr = Mmr::from(vec![Some(H2), Some(H1)]).append(H3, keccak_256);
        let pair = keccak_256(&[&H2, &H3]);
        let carried = keccak_256(&[&H1, &pair]);
        assert_eq!(mmr.peaks(), &[None, None, Some(carried)]);
    }

    #[test]
    fn test_append_carry_stops_at_gap() {
        let mmr = Mmr::from(vec![Some(H2), None, Some(H1)]).append(H3, keccak_256);
        let pair = keccak_256(&[&H2, &H3]);
        assert_eq!(mmr.peaks(), &[None, Some(pair), Some(H1)]);
    }

    #[test]
    fn test_append_does_not_mutate_original() {
        let mmr = Mmr::from(vec![Some(H1)]);
        let _ = mmr.append(H2, keccak_256);
        assert_eq!(mmr.peaks(), &[Some(H1)]);
    }

    #[test]
    fn test_super_peak_empty_and_single() {
        assert_eq!(Mmr::new().super_peak(keccak_256), ZERO_HASH);
        assert_eq!(
            Mmr::from(vec![None, Some(H1)]).super_peak(keccak_256),
            H1
        );
    }

    #[test]
    fn test_super_peak_folds_ascending() {
        let mmr = Mmr::from(vec![Some(H2), Some(H1), Some(H3)]);
        let step = keccak_256(&[b"peak", &H2, &H1]);
        let expected = keccak_256(&[b"peak", &step, &H3]);
        assert_eq!(mmr.super_peak(keccak_256), expected);
    }

    #[test]
    fn test_eight_leaves_collapse_to_one_peak() {
        let mut mmr = Mmr::new();
        for i in 0..8u8 {
            mmr = mmr.append([i; 32], keccak_256);
        }
        // 8 = 2^3 leaves leave exactly one occupied level.
        assert_eq!(mmr.peaks().iter().flatten().count(), 1);
        assert_eq!(mmr.len(), 4);
    }
}
