//! Validator keys, sets, and the epochal rotation.

use crate::entropy::EntropyPool;
use crate::error::{Result, StfError};
use crate::safrole::{EpochMark, SafroleState, TicketProof, WinningTicketsMark};
use jam_crypto::{BandersnatchPublic, Ed25519Public, RingVrfVerifier, VrfOutput};
use jam_types::params::EPOCH_LENGTH;
use jam_types::time::{epoch_of, in_ticket_submission_period};
use jam_types::TimeSlot;
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

pub const BLS_KEY_SIZE: usize = 144;
pub const VALIDATOR_METADATA_SIZE: usize = 128;

/// A validator's key tuple: bandersnatch for sealing, ed25519 for
/// attestations, BLS for finality, opaque metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorKey {
    pub bandersnatch: BandersnatchPublic,
    pub ed25519: Ed25519Public,
    #[serde(with = "BigArray")]
    pub bls: [u8; BLS_KEY_SIZE],
    #[serde(with = "BigArray")]
    pub metadata: [u8; VALIDATOR_METADATA_SIZE],
}

impl ValidatorKey {
    /// The null key: every component zeroed.
    pub fn null() -> Self {
        Self {
            bandersnatch: BandersnatchPublic::default(),
            ed25519: Ed25519Public::NULL,
            bls: [0u8; BLS_KEY_SIZE],
            metadata: [0u8; VALIDATOR_METADATA_SIZE],
        }
    }

    pub fn is_null(&self) -> bool {
        self.ed25519.is_null()
    }
}

impl Default for ValidatorKey {
    fn default() -> Self {
        Self::null()
    }
}

/// A fixed-size (V) validator key list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidatorSet(pub Vec<ValidatorKey>);

impl ValidatorSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ValidatorKey> {
        self.0.get(index)
    }

    pub fn bandersnatch_keys(&self) -> Vec<BandersnatchPublic> {
        self.0.iter().map(|v| v.bandersnatch).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidatorKey> {
        self.0.iter()
    }

    /// Whether an ed25519 key belongs to this set.
    pub fn contains_ed25519(&self, key: &Ed25519Public) -> bool {
        self.0.iter().any(|v| v.ed25519 == *key)
    }
}

/// The validator rotation ring plus the Safrole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorState {
    /// ι: keys staged for the epoch after next.
    pub staging: ValidatorSet,
    /// κ: the current epoch's active keys.
    pub active: ValidatorSet,
    /// λ: the previous epoch's keys.
    pub archived: ValidatorSet,
    /// γ: the Safrole record, holding the pending (next-epoch) keys.
    pub safrole: SafroleState,
}

impl ValidatorState {
    /// The Safrole/validator sub-transition.
    ///
    /// Folds the seal VRF output into the entropy pool, performs the epoch
    /// boundary work (snapshot rotation, validator promotion with offender
    /// nullification, sealing-key series selection), and accumulates the
    /// block's ticket proofs. Returns the epoch mark and winning-tickets
    /// mark where the boundary conditions emit them.
    pub fn update(
        &mut self,
        current_slot: TimeSlot,
        previous_slot: TimeSlot,
        vrf_output: VrfOutput,
        entropy: &mut EntropyPool,
        ticket_proofs: &[TicketProof],
        offenders: &[Ed25519Public],
        ring: &dyn RingVrfVerifier,
    ) -> Result<(Option<EpochMark>, Option<WinningTicketsMark>)> {
        if current_slot <= previous_slot {
            return Err(StfError::InvalidTimeSlot {
                current: current_slot,
                previous: previous_slot,
            });
        }

        if !in_ticket_submission_period(current_slot) && !ticket_proofs.is_empty() {
            return Err(StfError::InvalidTicketSubmissions(format!(
                "slot {current_slot} is outside the ticket submission period"
            )));
        }

        let prev_epoch = epoch_of(previous_slot);
        let curr_epoch = epoch_of(current_slot);

        // The winning-tickets mark announces the sealed series as soon as the
        // submission deadline passes within an epoch with a saturated
        // accumulator.
        let crossed_deadline = curr_epoch == prev_epoch
            && in_ticket_submission_period(previous_slot)
            && !in_ticket_submission_period(current_slot);
        let winning_mark = if crossed_deadline && self.safrole.accumulator_is_full() {
            Some(self.safrole.outside_in_accumulator())
        } else {
            None
        };

        let mut epoch_mark = None;
        if curr_epoch > prev_epoch {
            entropy.rotate();
            entropy.accumulate(&vrf_output);

            self.rotate_validators(offenders, ring)?;

            // Regular mode only when the ticket contest completed: directly
            // consecutive epochs, deadline passed, accumulator saturated.
            let regular = curr_epoch == prev_epoch + 1
                && !in_ticket_submission_period(previous_slot)
                && self.safrole.accumulator_is_full();
            if regular {
                self.safrole.seal_with_tickets();
                tracing::info!(epoch = curr_epoch, "epoch transition: ticketed sealing series");
            } else {
                self.safrole.seal_with_fallback(&entropy.0[2], &self.active);
                tracing::warn!(epoch = curr_epoch, "epoch transition: fallback sealing series");
            }

            self.safrole.reset_accumulator();

            epoch_mark = Some(EpochMark {
                entropy: entropy.0[0],
                tickets_entropy: entropy.0[1],
                validators: self.safrole.pending.bandersnatch_keys(),
            });
        } else {
            entropy.accumulate(&vrf_output);
        }

        self.safrole
            .accumulate_tickets(ticket_proofs, &entropy.0[2], ring)?;

        Ok((epoch_mark, winning_mark))
    }

    /// Promote the rotation ring: λ ← κ, κ ← γ_k, γ_k ← ι, with any staged
    /// key named in the offenders mark replaced by the null key before
    /// promotion, and the ring commitment recomputed over the new pending
    /// set.
    fn rotate_validators(
        &mut self,
        offenders: &[Ed25519Public],
        ring: &dyn RingVrfVerifier,
    ) -> Result<()> {
        self.archived = std::mem::take(&mut self.active);
        self.active = std::mem::take(&mut self.safrole.pending);

        let mut pending = self.staging.clone();
        for key in pending.0.iter_mut() {
            if offenders.contains(&key.ed25519) {
                *key = ValidatorKey::null();
            }
        }

        self.safrole.epoch_root = ring.ring_commitment(&pending.bandersnatch_keys())?;
        self.safrole.pending = pending;

        Ok(())
    }
}

/// The fallback sealing-key series: for each slot phase i, index the active
/// set by the first four little-endian bytes of blake2b(η[2] ∥ le32(i)),
/// modulo V.
pub fn fallback_key_sequence(
    entropy: &jam_types::Hash,
    validators: &ValidatorSet,
) -> Vec<BandersnatchPublic> {
    (0..EPOCH_LENGTH)
        .map(|slot_phase| {
            let mut preimage = Vec::with_capacity(36);
            preimage.extend_from_slice(entropy);
            preimage.extend_from_slice(&slot_phase.to_le_bytes());
            let digest = jam_crypto::blake2b_256(&preimage);

            let index_bytes: [u8; 4] = digest[..4].try_into().expect("4-byte prefix");
            let index = u32::from_le_bytes(index_bytes) as usize % validators.len();
            validators.0[index].bandersnatch
        })
        .collect()
}
