//! Safrole: the ticket-based slot-sealer lottery.
//!
//! Validators submit anonymous ring-VRF ticket proofs during an epoch's
//! submission period; the best E ticket identifiers (lowest values win)
//! accumulate in γ_a and become the next epoch's sealing-key series,
//! outside-in reordered. If the contest does not complete, the series falls
//! back to bandersnatch keys picked deterministically from epochal entropy.

use crate::error::{Result, StfError};
use crate::statements::ticket_seal_input;
use crate::validators::{fallback_key_sequence, ValidatorSet};
use jam_crypto::{BandersnatchPublic, RingCommitment, RingVrfProof, RingVrfVerifier};
use jam_types::params::{
    EPOCH_LENGTH, MAX_TICKETS_PER_EXTRINSIC, TICKET_ENTRIES_PER_VALIDATOR,
};
use jam_types::{hash_to_hex, Hash};
use serde::{Deserialize, Serialize};

/// A sealing-contest ticket: the VRF output identifier (lower scores
/// better) and the entry index it was submitted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Hash,
    pub entry_index: u8,
}

/// A ticket proof as carried in the tickets extrinsic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TicketProof {
    pub entry_index: u8,
    pub proof: RingVrfProof,
}

/// γ_s: the current epoch's slot-sealer series — a full complement of E
/// tickets in the regular case, or E bandersnatch keys in fallback mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SealingKeys {
    Tickets(Vec<Ticket>),
    Fallback(Vec<BandersnatchPublic>),
}

/// What seals a given slot: the winning ticket, or the fallback key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealKey {
    Ticket(Ticket),
    Fallback(BandersnatchPublic),
}

impl SealingKeys {
    pub fn is_ticketed(&self) -> bool {
        matches!(self, SealingKeys::Tickets(_))
    }

    pub fn len(&self) -> usize {
        match self {
            SealingKeys::Tickets(tickets) => tickets.len(),
            SealingKeys::Fallback(keys) => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sealer of `slot`, by its phase within the epoch. `None` when the
    /// series does not cover the full epoch (pre-genesis states).
    pub fn for_slot(&self, slot: jam_types::TimeSlot) -> Option<SealKey> {
        let index = jam_types::time::slot_in_epoch(slot) as usize;
        match self {
            SealingKeys::Tickets(tickets) => tickets.get(index).copied().map(SealKey::Ticket),
            SealingKeys::Fallback(keys) => keys.get(index).copied().map(SealKey::Fallback),
        }
    }
}

/// The epoch marker announced in the first block of a new epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochMark {
    /// η[0] after rotation: the running accumulator.
    pub entropy: Hash,
    /// η[1] after rotation: the closed epoch's final accumulator value.
    pub tickets_entropy: Hash,
    /// The bandersnatch keys of the pending (next-epoch) validators.
    pub validators: Vec<BandersnatchPublic>,
}

/// The sealed ticket series announced once an epoch's contest closes.
pub type WinningTicketsMark = Vec<Ticket>;

/// γ: the Safrole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafroleState {
    /// γ_k: the keys active in the next epoch, whose bandersnatch
    /// components the epoch root commits to.
    pub pending: ValidatorSet,
    /// γ_z: the bandersnatch ring commitment authorizing tickets.
    pub epoch_root: RingCommitment,
    /// γ_s: the current epoch's sealing-key series.
    pub sealing_keys: SealingKeys,
    /// γ_a: the ticket accumulator, strictly ascending by identifier,
    /// at most E entries.
    pub ticket_accumulator: Vec<Ticket>,
}

impl SafroleState {
    pub fn accumulator_is_full(&self) -> bool {
        self.ticket_accumulator.len() == EPOCH_LENGTH as usize
    }

    /// The accumulator in outside-in sealing order.
    pub fn outside_in_accumulator(&self) -> Vec<Ticket> {
        outside_in(&self.ticket_accumulator)
    }

    /// Enter regular mode: seal the coming epoch with the accumulated
    /// tickets, outside-in.
    pub fn seal_with_tickets(&mut self) {
        self.sealing_keys = SealingKeys::Tickets(self.outside_in_accumulator());
    }

    /// Enter fallback mode: seal with keys drawn from epochal entropy.
    pub fn seal_with_fallback(&mut self, entropy: &Hash, active: &ValidatorSet) {
        self.sealing_keys = SealingKeys::Fallback(fallback_key_sequence(entropy, active));
    }

    /// Reset γ_a on an epoch change.
    pub fn reset_accumulator(&mut self) {
        self.ticket_accumulator.clear();
    }

    /// Verify and merge a block's ticket proofs into γ_a.
    ///
    /// Proofs must verify against the epoch root over the ticket-seal input
    /// for η[2], arrive strictly ascending by the identifier they commit
    /// to, not collide with accumulated tickets, and survive the top-E
    /// truncation.
    pub fn accumulate_tickets(
        &mut self,
        proofs: &[TicketProof],
        epoch_entropy: &Hash,
        ring: &dyn RingVrfVerifier,
    ) -> Result<()> {
        if proofs.is_empty() {
            return Ok(());
        }

        if proofs.len() > MAX_TICKETS_PER_EXTRINSIC {
            return Err(StfError::InvalidTicketSubmissions(format!(
                "{} ticket proofs exceed the per-extrinsic maximum {}",
                proofs.len(),
                MAX_TICKETS_PER_EXTRINSIC
            )));
        }

        let mut incoming = Vec::with_capacity(proofs.len());
        for proof in proofs {
            if proof.entry_index >= TICKET_ENTRIES_PER_VALIDATOR {
                return Err(StfError::InvalidTicketSubmissions(format!(
                    "entry index {} exceeds the per-validator maximum {}",
                    proof.entry_index,
                    TICKET_ENTRIES_PER_VALIDATOR - 1
                )));
            }

            let input = ticket_seal_input(epoch_entropy, proof.entry_index);
            let id = ring
                .verify_ring_proof(&self.epoch_root, &input, b"", &proof.proof)
                .map_err(|_| {
                    StfError::InvalidTicketSubmissions(format!(
                        "ring vrf verification failed for entry index {}",
                        proof.entry_index
                    ))
                })?;

            incoming.push(Ticket { id, entry_index: proof.entry_index });
        }

        for pair in incoming.windows(2) {
            if pair[0].id >= pair[1].id {
                return Err(StfError::InvalidTicketSubmissions(format!(
                    "ticket {} out of order",
                    hash_to_hex(&pair[1].id)
                )));
            }
        }

        for ticket in &incoming {
            if self
                .ticket_accumulator
                .binary_search_by(|t| t.id.cmp(&ticket.id))
                .is_ok()
            {
                return Err(StfError::InvalidTicketSubmissions(format!(
                    "ticket {} already accumulated",
                    hash_to_hex(&ticket.id)
                )));
            }
        }

        self.ticket_accumulator.extend_from_slice(&incoming);
        self.ticket_accumulator.sort_by(|a, b| a.id.cmp(&b.id));
        self.ticket_accumulator.truncate(EPOCH_LENGTH as usize);

        // Every submitted ticket must have made the cut; a ticket that was
        // immediately evicted is useless and the block is invalid.
        for ticket in &incoming {
            if self
                .ticket_accumulator
                .binary_search_by(|t| t.id.cmp(&ticket.id))
                .is_err()
            {
                return Err(StfError::InvalidTicketSubmissions(format!(
                    "ticket {} did not survive accumulator truncation",
                    hash_to_hex(&ticket.id)
                )));
            }
        }

        tracing::debug!(
            accumulated = self.ticket_accumulator.len(),
            capacity = EPOCH_LENGTH,
            "accumulated ticket proofs"
        );

        Ok(())
    }
}

/// Outside-in reordering: [a₀, aₙ₋₁, a₁, aₙ₋₂, …].
pub fn outside_in<T: Clone>(items: &[T]) -> Vec<T> {
    let n = items.len();
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                items[i / 2].clone()
            } else {
                items[n - 1 - i / 2].clone()
            }
        })
        .collect()
}
