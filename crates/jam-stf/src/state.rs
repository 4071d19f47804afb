//! The state record σ and the block-import transition.

use crate::authorizer::{AuthorizerPools, AuthorizerQueues};
use crate::block::Block;
use crate::dispute::DisputeState;
use crate::entropy::EntropyPool;
use crate::error::{Result, StfError};
use crate::reports::{guarantee, CoreIndex, GuaranteeContext, PendingReports, WorkReport};
use crate::safrole::{EpochMark, WinningTicketsMark};
use crate::service::{PreimageRequest, Services};
use crate::validators::ValidatorState;
use jam_crypto::{Ed25519Public, RingVrfVerifier};
use jam_types::{Hash, TimeSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The accumulation engine: an external collaborator which folds newly
/// available work-reports into the service state and yields the
/// accumulation result root committed by recent history.
pub trait Accumulator {
    fn accumulate(&self, slot: TimeSlot, reports: &[WorkReport]) -> Hash;
}

/// The service-account engine: an external collaborator owning δ's
/// mutation rules. Block import hands it the preimages extrinsic and
/// mutable access to the accounts; what provision means for a service's
/// stores is not the core's concern. A rejection aborts the import.
pub trait PreimageIntegrator {
    fn integrate_preimages(
        &self,
        slot: TimeSlot,
        services: &mut Services,
        requests: &[PreimageRequest],
    ) -> Result<()>;
}

/// σ: the on-chain state operated on by block import.
///
/// The remaining protocol surfaces — privileged services χ, validator
/// activity statistics π, and the accumulation queue/history θ/ξ — belong
/// to external collaborators and are reached through [`Accumulator`] and
/// the service surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// α: per-core authorizer pools.
    pub auth_pools: AuthorizerPools,
    /// β: recent blocks.
    pub recent_history: crate::history::RecentHistory,
    /// δ: service accounts.
    pub services: Services,
    /// η: entropy.
    pub entropy: EntropyPool,
    /// ι, κ, λ and γ.
    pub validators: ValidatorState,
    /// ρ: pending work-reports.
    pub pending_reports: PendingReports,
    /// τ: the most recent block's time slot.
    pub time_slot: TimeSlot,
    /// φ: per-core authorizer queues.
    pub auth_queues: AuthorizerQueues,
    /// ψ: past judgements.
    pub disputes: DisputeState,
}

/// Everything a block import yields besides the posterior state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutput {
    pub epoch_mark: Option<EpochMark>,
    pub winning_tickets_mark: Option<WinningTicketsMark>,
    pub offenders_mark: Vec<Ed25519Public>,
    /// Reports promoted to accumulation, in core order.
    pub available_reports: Vec<WorkReport>,
    /// The guarantors credited for this block's reports.
    pub reporters: Vec<Ed25519Public>,
}

impl State {
    /// Apply one block: σ × B → σ′.
    ///
    /// Pure: works on a copy and returns it, so any error leaves `self`
    /// untouched and aborts the whole import. Sub-transitions run in the
    /// canonical order — disputes, Safrole/validators, assurances,
    /// guarantees, authorizer pools, the preimage hand-off, recent history.
    pub fn apply(
        &self,
        block: &Block,
        ring: &dyn RingVrfVerifier,
        accumulator: &dyn Accumulator,
        preimages: &dyn PreimageIntegrator,
    ) -> Result<(State, ApplyOutput)> {
        let current_slot = block.header.time_slot;
        if current_slot <= self.time_slot {
            return Err(StfError::InvalidTimeSlot {
                current: current_slot,
                previous: self.time_slot,
            });
        }

        let mut next = self.clone();

        // Disputes judge against the prior validator sets and feed the
        // offenders mark into this block's rotation.
        let offenders = next.disputes.update(
            &block.extrinsic.disputes,
            &self.validators.active,
            &self.validators.archived,
            current_slot,
        )?;
        next.pending_reports.purge_disputed(&next.disputes.invalidated());

        let vrf_output = ring.vrf_output(&block.header.vrf_signature)?;
        let (epoch_mark, winning_tickets_mark) = next.validators.update(
            current_slot,
            self.time_slot,
            vrf_output,
            &mut next.entropy,
            &block.extrinsic.tickets,
            &offenders,
            ring,
        )?;

        let available_reports = next.pending_reports.assure_availability(
            current_slot,
            &block.extrinsic.assurances,
            &block.header.parent_hash,
            &next.validators.active,
        )?;

        let reporters = guarantee::integrate(
            &mut next.pending_reports,
            &block.extrinsic.guarantees,
            &GuaranteeContext {
                current_slot,
                entropy: &next.entropy,
                active: &next.validators.active,
                archived: &next.validators.archived,
                auth_pools: &next.auth_pools,
                history: &next.recent_history,
                services: &next.services,
            },
        )?;

        let consumed: BTreeMap<CoreIndex, Hash> = block
            .extrinsic
            .guarantees
            .iter()
            .map(|g| (g.report.core_index, g.report.authorizer_hash))
            .collect();
        next.auth_pools.advance(current_slot, &consumed, &next.auth_queues);

        preimages.integrate_preimages(
            current_slot,
            &mut next.services,
            &block.extrinsic.preimages,
        )?;

        let accumulation_root = accumulator.accumulate(current_slot, &available_reports);
        let package_roots: BTreeMap<Hash, Hash> = block
            .extrinsic
            .guarantees
            .iter()
            .map(|g| {
                (
                    g.report.availability_spec.work_package_hash,
                    g.report.availability_spec.segment_root,
                )
            })
            .collect();
        next.recent_history.update(
            block.header.hash(),
            block.header.prior_state_root,
            accumulation_root,
            package_roots,
        );

        next.time_slot = current_slot;

        tracing::debug!(
            slot = current_slot,
            available = available_reports.len(),
            offenders = offenders.len(),
            "block applied"
        );

        Ok((
            next,
            ApplyOutput {
                epoch_mark,
                winning_tickets_mark,
                offenders_mark: offenders,
                available_reports,
                reporters,
            },
        ))
    }
}
