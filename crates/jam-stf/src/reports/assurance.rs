//! Availability assurances.
//!
//! Each validator votes a per-core bitfield saying which pending reports'
//! erasure-coded bodies it holds. A report whose core collects a
//! supermajority of set bits becomes available and leaves ρ for
//! accumulation; a report that lingers unassured past its timeout is
//! evicted.

use crate::error::{Result, StfError};
use crate::reports::{PendingReports, WorkReport};
use crate::statements::availability_message;
use crate::validators::ValidatorSet;
use jam_crypto::{ed25519, Ed25519Signature};
use jam_types::codec::encode_bit_sequence;
use jam_types::params::{
    CORE_COUNT, PENDING_REPORT_TIMEOUT, VALIDATOR_COUNT, VALIDATOR_SUPER_MAJORITY,
};
use jam_types::{hash_to_hex, Hash, TimeSlot};
use serde::{Deserialize, Serialize};

/// One validator's availability vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assurance {
    /// Must equal the importing block's parent hash.
    pub anchor_parent_hash: Hash,
    /// One bit per core, set when the report body is held.
    pub bitfield: Vec<bool>,
    pub validator_index: u16,
    pub signature: Ed25519Signature,
}

impl PendingReports {
    /// The assurance sub-transition, ρ† → ρ††.
    ///
    /// Validates the assurances against the posterior current validators,
    /// tallies per-core votes, promotes supermajority-assured reports (the
    /// returned list, in core order) and evicts stale ones.
    pub fn assure_availability(
        &mut self,
        current_slot: TimeSlot,
        assurances: &[Assurance],
        parent_hash: &Hash,
        validators: &ValidatorSet,
    ) -> Result<Vec<WorkReport>> {
        if assurances.len() > VALIDATOR_COUNT {
            return Err(StfError::InvalidAssurance(format!(
                "{} assurances exceed the validator count {}",
                assurances.len(),
                VALIDATOR_COUNT
            )));
        }

        for pair in assurances.windows(2) {
            if pair[0].validator_index >= pair[1].validator_index {
                return Err(StfError::InvalidAssurance(
                    "assurances must be ordered by validator index and unique".into(),
                ));
            }
        }

        for assurance in assurances {
            self.check_assurance(assurance, parent_hash, validators)?;
        }

        let mut votes = vec![0usize; CORE_COUNT];
        for assurance in assurances {
            for (core, assured) in assurance.bitfield.iter().enumerate() {
                if *assured {
                    votes[core] += 1;
                }
            }
        }

        let mut available = Vec::new();
        for (core, slot) in self.0.iter_mut().enumerate() {
            let Some(pending) = slot else { continue };

            if votes[core] >= VALIDATOR_SUPER_MAJORITY {
                tracing::debug!(core, votes = votes[core], "report became available");
                available.push(pending.report.clone());
                *slot = None;
            } else if pending.reported_at + PENDING_REPORT_TIMEOUT <= current_slot {
                tracing::debug!(core, reported_at = pending.reported_at, "evicting stale report");
                *slot = None;
            }
        }

        Ok(available)
    }

    fn check_assurance(
        &self,
        assurance: &Assurance,
        parent_hash: &Hash,
        validators: &ValidatorSet,
    ) -> Result<()> {
        if assurance.anchor_parent_hash != *parent_hash {
            return Err(StfError::InvalidAssurance(format!(
                "anchor {} does not match the parent hash {}",
                hash_to_hex(&assurance.anchor_parent_hash),
                hash_to_hex(parent_hash)
            )));
        }

        let validator = validators
            .get(assurance.validator_index as usize)
            .ok_or_else(|| {
                StfError::InvalidAssurance(format!(
                    "validator index {} out of range {}",
                    assurance.validator_index, VALIDATOR_COUNT
                ))
            })?;

        if assurance.bitfield.len() != CORE_COUNT {
            return Err(StfError::InvalidAssurance(format!(
                "bitfield has {} bits, expected {}",
                assurance.bitfield.len(),
                CORE_COUNT
            )));
        }

        let message =
            availability_message(parent_hash, &encode_bit_sequence(&assurance.bitfield));
        if !ed25519::verify(&validator.ed25519, &message, &assurance.signature) {
            return Err(StfError::InvalidAssurance(format!(
                "signature from validator {} failed",
                assurance.validator_index
            )));
        }

        for (core, assured) in assurance.bitfield.iter().enumerate() {
            if *assured && self.0[core].is_none() {
                return Err(StfError::InvalidAssurance(format!(
                    "validator {} assured core {core} which has no pending report",
                    assurance.validator_index
                )));
            }
        }

        Ok(())
    }
}
