//! Work-report guarantees and guarantor assignment.
//!
//! Each core is guarded by a rotating subset of validators. Assignments
//! spread the cores evenly over the validator indices, shuffle them with
//! epochal entropy, then rotate the whole map once per rotation period. A
//! guarantee carries 2 or 3 credentials from the assigned guarantors of its
//! report's core, signed over the report hash.

use crate::authorizer::AuthorizerPools;
use crate::entropy::EntropyPool;
use crate::error::{Result, StfError};
use crate::history::RecentHistory;
use crate::reports::{CoreIndex, PendingReport, PendingReports, WorkReport};
use crate::service::Services;
use crate::shuffle::shuffle;
use crate::statements::guarantee_message;
use crate::validators::ValidatorSet;
use jam_crypto::{ed25519, Ed25519Public, Ed25519Signature};
use jam_types::params::{
    ACCUMULATE_GAS_LIMIT, CORE_COUNT, GUARANTOR_ROTATION_PERIOD, MAX_LOOKUP_ANCHOR_AGE,
    MAX_REPORT_DEPENDENCIES, MAX_REPORT_OUTPUT_SIZE, MAX_WORK_ITEMS_PER_PACKAGE,
    VALIDATOR_COUNT,
};
use jam_types::time::{epoch_of, slot_in_epoch};
use jam_types::{hash_to_hex, Hash, TimeSlot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const MIN_CREDENTIALS_PER_GUARANTEE: usize = 2;
pub const MAX_CREDENTIALS_PER_GUARANTEE: usize = 3;

/// One guarantor's attestation: their validator index and their signature
/// over the report hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub validator_index: u16,
    pub signature: Ed25519Signature,
}

/// A guaranteed work-report as carried in the guarantees extrinsic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guarantee {
    pub report: WorkReport,
    pub timeslot: TimeSlot,
    /// 2 or 3 credentials, ascending by validator index.
    pub credentials: Vec<Credential>,
}

/// Read-only state the guarantee sub-transition validates against.
pub struct GuaranteeContext<'a> {
    pub current_slot: TimeSlot,
    /// η′: posterior entropy, for the assignment shuffles.
    pub entropy: &'a EntropyPool,
    /// κ′: posterior active validators.
    pub active: &'a ValidatorSet,
    /// λ′: posterior archived validators.
    pub archived: &'a ValidatorSet,
    pub auth_pools: &'a AuthorizerPools,
    pub history: &'a RecentHistory,
    pub services: &'a Services,
}

/// The permutation P: spread core indices evenly over the validators,
/// shuffle with `entropy`, rotate by the slot's rotation index.
pub fn guarantor_assignments(entropy: &Hash, slot: TimeSlot) -> Vec<CoreIndex> {
    let mut cores: Vec<CoreIndex> = (0..VALIDATOR_COUNT)
        .map(|i| (CORE_COUNT * i / VALIDATOR_COUNT) as CoreIndex)
        .collect();

    shuffle(&mut cores, entropy);

    let shift = slot_in_epoch(slot) / GUARANTOR_ROTATION_PERIOD;
    for core in cores.iter_mut() {
        *core = ((u32::from(*core) + shift) % CORE_COUNT as u32) as CoreIndex;
    }

    cores
}

/// The guarantee sub-transition, ρ†† → ρ′.
///
/// Validates every guarantee and its report against the context, binds each
/// report to its core in ρ, and returns the reporter key set.
pub fn integrate(
    pending: &mut PendingReports,
    guarantees: &[Guarantee],
    ctx: &GuaranteeContext<'_>,
) -> Result<Vec<Ed25519Public>> {
    if guarantees.is_empty() {
        return Ok(Vec::new());
    }

    if guarantees.len() > CORE_COUNT {
        return Err(StfError::InvalidGuarantees(format!(
            "{} guarantees exceed the core count {}",
            guarantees.len(),
            CORE_COUNT
        )));
    }

    ensure_core_indices(guarantees)?;
    ensure_unique_packages(guarantees)?;

    // Current-rotation assignments always come from η′[2] at τ′. The
    // previous rotation stays inside the same epoch (same entropy, active
    // set) or reaches back across the boundary (η′[3], archived set).
    let slot = ctx.current_slot;
    let current = guarantor_assignments(&ctx.entropy.0[2], slot);
    let prev_slot = slot.saturating_sub(GUARANTOR_ROTATION_PERIOD);
    let (previous, previous_keys) = if epoch_of(prev_slot) == epoch_of(slot) {
        (guarantor_assignments(&ctx.entropy.0[2], prev_slot), ctx.active)
    } else {
        (guarantor_assignments(&ctx.entropy.0[3], prev_slot), ctx.archived)
    };

    let report_hashes: Vec<Hash> = guarantees.iter().map(|g| g.report.hash()).collect();

    let mut reporters = Vec::new();
    let mut seen_reporters = BTreeSet::new();
    for (guarantee, report_hash) in guarantees.iter().zip(&report_hashes) {
        let (assignments, keys) = if same_rotation(guarantee.timeslot, slot) {
            (&current, ctx.active)
        } else {
            (&previous, previous_keys)
        };

        for key in check_credentials(guarantee, report_hash, assignments, keys, slot)? {
            if seen_reporters.insert(key) {
                reporters.push(key);
            }
        }
    }

    for guarantee in guarantees {
        check_report(&guarantee.report, pending, ctx)?;
    }

    check_dependencies(guarantees, ctx.history)?;

    for guarantee in guarantees {
        let core = guarantee.report.core_index as usize;
        pending.0[core] = Some(PendingReport {
            reported_at: slot,
            report: guarantee.report.clone(),
        });
    }

    tracing::debug!(reports = guarantees.len(), reporters = reporters.len(), "guarantees applied");

    Ok(reporters)
}

fn same_rotation(a: TimeSlot, b: TimeSlot) -> bool {
    a / GUARANTOR_ROTATION_PERIOD == b / GUARANTOR_ROTATION_PERIOD
}

fn ensure_core_indices(guarantees: &[Guarantee]) -> Result<()> {
    for guarantee in guarantees {
        if guarantee.report.core_index as usize >= CORE_COUNT {
            return Err(StfError::InvalidGuarantees(format!(
                "core index {} out of range {}",
                guarantee.report.core_index, CORE_COUNT
            )));
        }
    }
    for pair in guarantees.windows(2) {
        if pair[0].report.core_index >= pair[1].report.core_index {
            return Err(StfError::InvalidGuarantees(
                "guarantees must be ordered by core index and unique".into(),
            ));
        }
    }
    Ok(())
}

fn ensure_unique_packages(guarantees: &[Guarantee]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for guarantee in guarantees {
        let hash = guarantee.report.availability_spec.work_package_hash;
        if !seen.insert(hash) {
            return Err(StfError::InvalidWorkReport(format!(
                "duplicate work package {}",
                hash_to_hex(&hash)
            )));
        }
    }
    Ok(())
}

fn check_credentials(
    guarantee: &Guarantee,
    report_hash: &Hash,
    assignments: &[CoreIndex],
    keys: &ValidatorSet,
    current_slot: TimeSlot,
) -> Result<Vec<Ed25519Public>> {
    let rotation_start =
        (current_slot / GUARANTOR_ROTATION_PERIOD).saturating_sub(1) * GUARANTOR_ROTATION_PERIOD;
    if guarantee.timeslot < rotation_start {
        return Err(StfError::InvalidGuarantee(format!(
            "guarantee timeslot {} precedes the previous rotation start {}",
            guarantee.timeslot, rotation_start
        )));
    }
    if guarantee.timeslot > current_slot {
        return Err(StfError::InvalidGuarantee(format!(
            "guarantee timeslot {} is after the current slot {}",
            guarantee.timeslot, current_slot
        )));
    }

    let count = guarantee.credentials.len();
    if !(MIN_CREDENTIALS_PER_GUARANTEE..=MAX_CREDENTIALS_PER_GUARANTEE).contains(&count) {
        return Err(StfError::InvalidGuarantee(format!(
            "{count} credentials, must be 2 or 3"
        )));
    }
    for pair in guarantee.credentials.windows(2) {
        if pair[0].validator_index >= pair[1].validator_index {
            return Err(StfError::InvalidGuarantee(
                "credentials must be ordered by validator index and unique".into(),
            ));
        }
    }

    let mut reporters = Vec::with_capacity(count);
    for credential in &guarantee.credentials {
        let index = credential.validator_index as usize;
        let validator = keys.get(index).ok_or_else(|| {
            StfError::InvalidGuarantee(format!(
                "credential validator index {} out of range {}",
                credential.validator_index, VALIDATOR_COUNT
            ))
        })?;

        if assignments[index] != guarantee.report.core_index {
            return Err(StfError::InvalidCredential(format!(
                "validator {} guards core {}, report is for core {}",
                credential.validator_index, assignments[index], guarantee.report.core_index
            )));
        }

        let message = guarantee_message(report_hash);
        if !ed25519::verify(&validator.ed25519, &message, &credential.signature) {
            return Err(StfError::InvalidCredential(format!(
                "guarantee signature from validator {} failed for report {}",
                credential.validator_index,
                hash_to_hex(report_hash)
            )));
        }

        reporters.push(validator.ed25519);
    }

    Ok(reporters)
}

fn check_report(
    report: &WorkReport,
    pending: &PendingReports,
    ctx: &GuaranteeContext<'_>,
) -> Result<()> {
    let core = report.core_index;

    if pending.get(core).is_some() {
        return Err(StfError::InvalidWorkReport(format!(
            "core {core} already has a pending report"
        )));
    }

    if report.results.is_empty() || report.results.len() > MAX_WORK_ITEMS_PER_PACKAGE {
        return Err(StfError::InvalidWorkReport(format!(
            "{} work results, must be 1..={}",
            report.results.len(),
            MAX_WORK_ITEMS_PER_PACKAGE
        )));
    }

    if !ctx.auth_pools.contains(core, &report.authorizer_hash) {
        return Err(StfError::InvalidWorkReport(format!(
            "authorizer {} is not in the pool of core {core}",
            hash_to_hex(&report.authorizer_hash)
        )));
    }

    if report.output_size() > MAX_REPORT_OUTPUT_SIZE {
        return Err(StfError::InvalidWorkReport(format!(
            "total output size {} exceeds {}",
            report.output_size(),
            MAX_REPORT_OUTPUT_SIZE
        )));
    }

    let mut total_gas = 0u64;
    for result in &report.results {
        let service = ctx.services.get(result.service_id).ok_or_else(|| {
            StfError::InvalidWorkReport(format!("service {} not found", result.service_id))
        })?;

        if result.gas < service.accumulate_gas {
            return Err(StfError::InvalidWorkReport(format!(
                "result gas {} below the accumulate minimum {} of service {}",
                result.gas, service.accumulate_gas, result.service_id
            )));
        }
        if result.service_code_hash != service.code_hash {
            return Err(StfError::InvalidWorkReport(format!(
                "code hash mismatch for service {}",
                result.service_id
            )));
        }

        total_gas = total_gas.saturating_add(result.gas);
    }
    if total_gas > ACCUMULATE_GAS_LIMIT {
        return Err(StfError::InvalidWorkReport(format!(
            "total gas {total_gas} exceeds the accumulation limit {ACCUMULATE_GAS_LIMIT}"
        )));
    }

    check_refinement_context(report, ctx)?;

    // A package needed both as a prerequisite and as a segment-root import
    // is one dependency, so the cap counts the deduplicated union.
    let dependency_count = report.dependencies().len();
    if dependency_count > MAX_REPORT_DEPENDENCIES {
        return Err(StfError::InvalidWorkReport(format!(
            "{dependency_count} dependencies exceed the maximum {MAX_REPORT_DEPENDENCIES}"
        )));
    }

    Ok(())
}

fn check_refinement_context(report: &WorkReport, ctx: &GuaranteeContext<'_>) -> Result<()> {
    let context = &report.context;

    let anchored = ctx.history.blocks().iter().any(|block| {
        block.header_hash == context.anchor_header_hash
            && block.state_root == context.anchor_state_root
            && block.accumulation_mmr.super_peak(jam_crypto::keccak_256) == context.anchor_beefy_root
    });
    if !anchored {
        return Err(StfError::InvalidRefinementContext(format!(
            "anchor {} not found in recent history",
            hash_to_hex(&context.anchor_header_hash)
        )));
    }

    let oldest_allowed = ctx.current_slot.saturating_sub(MAX_LOOKUP_ANCHOR_AGE);
    if context.lookup_anchor_slot < oldest_allowed {
        return Err(StfError::InvalidRefinementContext(format!(
            "lookup anchor slot {} is older than the allowed {}",
            context.lookup_anchor_slot, oldest_allowed
        )));
    }

    Ok(())
}

/// Dependency closure: every prerequisite and segment-root key must refer
/// to a package in this block or in recent history, and claimed segment
/// roots must match the recorded ones.
fn check_dependencies(guarantees: &[Guarantee], history: &RecentHistory) -> Result<()> {
    let mut known: BTreeMap<Hash, Hash> = BTreeMap::new();
    for block in history.blocks() {
        known.extend(block.work_package_hashes.iter().map(|(k, v)| (*k, *v)));
    }
    for guarantee in guarantees {
        known.insert(
            guarantee.report.availability_spec.work_package_hash,
            guarantee.report.availability_spec.segment_root,
        );
    }

    for guarantee in guarantees {
        for dependency in guarantee.report.dependencies() {
            if !known.contains_key(&dependency) {
                return Err(StfError::InvalidWorkReport(format!(
                    "dependency package {} is neither recent nor in this block",
                    hash_to_hex(&dependency)
                )));
            }
        }

        for (package_hash, segment_root) in &guarantee.report.segment_root_lookup {
            // Presence was just established; compare the recorded root.
            if known.get(package_hash) != Some(segment_root) {
                return Err(StfError::InvalidWorkReport(format!(
                    "segment root mismatch for package {}",
                    hash_to_hex(package_hash)
                )));
            }
        }
    }

    Ok(())
}
