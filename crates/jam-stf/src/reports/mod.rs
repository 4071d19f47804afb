//! Work-reports and their pending-availability state.
//!
//! A work-report is a core's claimed refinement of a work-package. Reports
//! enter ρ through the guarantees extrinsic, leave it when an availability
//! supermajority assures their erasure-coded body (promotion to
//! accumulation), when they time out, or when a dispute judges them bad or
//! wonky.

pub mod assurance;
pub mod guarantee;

use crate::encode;
use jam_types::params::CORE_COUNT;
use jam_types::{Blob, Hash, TimeSlot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub use assurance::Assurance;
pub use guarantee::{Credential, Guarantee, GuaranteeContext};

pub type ServiceId = u32;
pub type Gas = u64;
pub type CoreIndex = u16;

/// s: how a report's work-package was erasure-coded for availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySpec {
    pub work_package_hash: Hash,
    pub bundle_length: u32,
    pub erasure_root: Hash,
    pub segment_root: Hash,
    pub segment_count: u16,
}

/// x: the chain context a report was refined against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementContext {
    pub anchor_header_hash: Hash,
    pub anchor_state_root: Hash,
    pub anchor_beefy_root: Hash,
    pub lookup_anchor_header_hash: Hash,
    pub lookup_anchor_slot: TimeSlot,
    pub prerequisites: Vec<Hash>,
}

/// The refinement error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecError {
    OutOfGas,
    Panic,
    ReportInvalid,
    ServiceUnavailable,
    CodeTooBig,
}

/// o: a work item's refinement output or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecResult {
    Output(Blob),
    Error(ExecError),
}

/// L: one work item's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkResult {
    pub service_id: ServiceId,
    pub service_code_hash: Hash,
    pub payload_hash: Hash,
    pub gas: Gas,
    pub result: ExecResult,
}

/// W: a guaranteed work-report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkReport {
    pub availability_spec: AvailabilitySpec,
    pub context: RefinementContext,
    pub core_index: CoreIndex,
    pub authorizer_hash: Hash,
    pub auth_output: Blob,
    /// Work-package hash → segment root, for imports from other packages.
    pub segment_root_lookup: BTreeMap<Hash, Hash>,
    /// Non-empty, at most I entries.
    pub results: Vec<WorkResult>,
}

impl WorkReport {
    /// blake2b-256 of the report's deterministic encoding; the value
    /// guarantor credentials sign over.
    pub fn hash(&self) -> Hash {
        encode::work_report_hash(self)
    }

    /// Total output size: the authorizer output plus every result output.
    pub fn output_size(&self) -> usize {
        let results: usize = self
            .results
            .iter()
            .map(|r| match &r.result {
                ExecResult::Output(blob) => blob.len(),
                ExecResult::Error(_) => 0,
            })
            .sum();
        self.auth_output.len() + results
    }

    /// Every work-package hash this report depends on: refinement
    /// prerequisites plus segment-root lookup keys.
    pub fn dependencies(&self) -> BTreeSet<Hash> {
        self.context
            .prerequisites
            .iter()
            .chain(self.segment_root_lookup.keys())
            .copied()
            .collect()
    }
}

/// One core's report awaiting availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReport {
    pub reported_at: TimeSlot,
    pub report: WorkReport,
}

/// ρ: the per-core pending reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReports(pub Vec<Option<PendingReport>>);

impl Default for PendingReports {
    fn default() -> Self {
        Self(vec![None; CORE_COUNT])
    }
}

impl PendingReports {
    pub fn get(&self, core: CoreIndex) -> Option<&PendingReport> {
        self.0.get(core as usize).and_then(|slot| slot.as_ref())
    }

    /// ρ → ρ†: drop any pending report a dispute has judged bad or wonky.
    pub fn purge_disputed(&mut self, invalidated: &BTreeSet<Hash>) {
        if invalidated.is_empty() {
            return;
        }
        for slot in self.0.iter_mut() {
            let disputed = slot
                .as_ref()
                .is_some_and(|pending| invalidated.contains(&pending.report.hash()));
            if disputed {
                if let Some(pending) = slot.take() {
                    tracing::debug!(
                        core = pending.report.core_index,
                        "dropping disputed pending report"
                    );
                }
            }
        }
    }
}
