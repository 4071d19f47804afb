//! Block structures: header, markers, and the five-group extrinsic.

use crate::dispute::DisputeExtrinsic;
use crate::encode;
use crate::reports::{Assurance, Guarantee};
use crate::safrole::{EpochMark, TicketProof, WinningTicketsMark};
use crate::service::PreimageRequest;
use jam_crypto::{Ed25519Public, VrfSignature};
use jam_types::{Hash, TimeSlot};
use serde::{Deserialize, Serialize};

/// H: the block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Hp: the parent block's header hash.
    pub parent_hash: Hash,
    /// Hr: the parent block's posterior state root.
    pub prior_state_root: Hash,
    /// Hx: the extrinsic commitment.
    pub extrinsic_hash: Hash,
    /// Ht: τ′, the block's time slot.
    pub time_slot: TimeSlot,
    /// He: present in the first block of each epoch.
    pub epoch_mark: Option<EpochMark>,
    /// Hw: present when the block seals an epoch's ticket contest.
    pub winning_tickets_mark: Option<WinningTicketsMark>,
    /// Ho: the keys punished by this block's disputes.
    pub offenders_mark: Vec<Ed25519Public>,
    /// Hi: the author's index in the active set.
    pub author_index: u16,
    /// Hv: the entropy-contributing VRF signature.
    pub vrf_signature: VrfSignature,
    /// Hs: the block seal.
    pub seal: VrfSignature,
}

impl Header {
    /// blake2b-256 of the header's deterministic encoding.
    pub fn hash(&self) -> Hash {
        encode::header_hash(self)
    }
}

/// E: the block extrinsic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Extrinsic {
    /// ET: ticket proofs for the sealing-key contest.
    pub tickets: Vec<TicketProof>,
    /// EP: preimages being provided to services.
    pub preimages: Vec<PreimageRequest>,
    /// EG: guaranteed work-reports.
    pub guarantees: Vec<Guarantee>,
    /// EA: availability assurances.
    pub assurances: Vec<Assurance>,
    /// ED: verdicts and offence evidence.
    pub disputes: DisputeExtrinsic,
}

/// A complete block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub extrinsic: Extrinsic,
}
