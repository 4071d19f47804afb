//! Service accounts (δ).
//!
//! The execution and mutation of services is a collaborator's concern; the
//! core carries only the read surface. Work-report validation consults it
//! for the code hash and the accumulate-gas minimum, and the historical
//! lookup Λ resolves preimages against their availability history. The
//! preimages extrinsic is routed to the host's integrator untouched
//! (`state::PreimageIntegrator`).

use crate::reports::{Gas, ServiceId};
use jam_types::{Blob, Hash, TimeSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Slots at which a preimage's availability changed, at most three entries:
/// empty = requested, [from] = available, [from, until] = withdrawn,
/// [from, until, again] = re-provided.
pub type AvailabilityHistory = Vec<TimeSlot>;

pub const MAX_AVAILABILITY_HISTORY: usize = 3;

/// A: one service account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub storage: BTreeMap<Hash, Blob>,
    pub preimages: BTreeMap<Hash, Blob>,
    /// (hash, length) → availability history.
    pub preimage_meta: BTreeMap<(Hash, u32), AvailabilityHistory>,
    pub code_hash: Hash,
    pub balance: u64,
    /// g: the minimum gas a work result for this service must carry.
    pub accumulate_gas: Gas,
    /// m: gas allotted to on-transfer handling.
    pub on_transfer_gas: Gas,
}

impl ServiceAccount {
    /// The service code, resolved through the preimage store. A service
    /// whose code preimage is missing is non-functional.
    pub fn code(&self) -> Option<&Blob> {
        self.preimages.get(&self.code_hash)
    }

    /// Λ: whether `preimage_hash` was available for lookup at `slot`, and
    /// if so its preimage.
    pub fn lookup_preimage(&self, preimage_hash: &Hash, slot: TimeSlot) -> Option<&Blob> {
        let preimage = self.preimages.get(preimage_hash)?;
        let history = self
            .preimage_meta
            .get(&(*preimage_hash, preimage.len() as u32))?;

        available_at(history, slot).then_some(preimage)
    }
}

fn available_at(history: &AvailabilityHistory, slot: TimeSlot) -> bool {
    match history[..] {
        [] => false,
        [from] => from <= slot,
        [from, until] => from <= slot && slot < until,
        [from, until, again] => (from <= slot && slot < until) || again <= slot,
        _ => false,
    }
}

/// One entry of the preimages extrinsic: a blob being provided to a
/// service. Ordering and provision rules belong to the host's integrator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PreimageRequest {
    pub service_id: ServiceId,
    pub blob: Blob,
}

/// δ: the service accounts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Services(pub BTreeMap<ServiceId, ServiceAccount>);

impl Services {
    pub fn get(&self, id: ServiceId) -> Option<&ServiceAccount> {
        self.0.get(&id)
    }
}
