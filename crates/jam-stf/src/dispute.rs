//! Dispute resolution.
//!
//! Verdicts carry a full supermajority of signed judgements over a
//! work-report hash and classify it good (supermajority positive), bad
//! (zero positive) or wonky (exactly the minority positive). Culprits and
//! faults are the attached slashing evidence: guarantors of a bad report
//! and judges who voted against the outcome. ψ accumulates monotonically;
//! offenders can never be punished twice.

use crate::error::{Result, StfError};
use crate::statements::{guarantee_message, judgement_message};
use crate::validators::ValidatorSet;
use jam_crypto::{ed25519, Ed25519Public, Ed25519Signature};
use jam_types::params::{VALIDATOR_COUNT, VALIDATOR_MINORITY, VALIDATOR_SUPER_MAJORITY};
use jam_types::time::epoch_of;
use jam_types::{hash_to_hex, Epoch, Hash, TimeSlot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single validator's vote on a work-report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    pub vote: bool,
    pub validator_index: u16,
    pub signature: Ed25519Signature,
}

/// A supermajority of judgements over one work-report hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub report_hash: Hash,
    pub epoch: Epoch,
    pub judgements: Vec<Judgement>,
}

/// A guarantor of a report judged bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Culprit {
    pub report_hash: Hash,
    pub key: Ed25519Public,
    pub signature: Ed25519Signature,
}

/// A judge who voted against a verdict's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub report_hash: Hash,
    pub vote: bool,
    pub key: Ed25519Public,
    pub signature: Ed25519Signature,
}

/// The disputes extrinsic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisputeExtrinsic {
    pub verdicts: Vec<Verdict>,
    pub culprits: Vec<Culprit>,
    pub faults: Vec<Fault>,
}

impl DisputeExtrinsic {
    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty() && self.culprits.is_empty() && self.faults.is_empty()
    }
}

/// ψ: past judgements on work-reports and validators.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisputeState {
    pub good: Vec<Hash>,
    pub bad: Vec<Hash>,
    pub wonky: Vec<Hash>,
    pub offenders: Vec<Ed25519Public>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    Good,
    Bad,
    Wonky,
}

struct VerdictSummary {
    report_hash: Hash,
    classification: Classification,
    /// Index into the effective-set pair: true = active (κ), false =
    /// archived (λ).
    current_epoch: bool,
}

impl DisputeState {
    /// Hashes judged bad or wonky, for the ρ purge.
    pub fn invalidated(&self) -> BTreeSet<Hash> {
        self.bad.iter().chain(self.wonky.iter()).copied().collect()
    }

    fn past_reported(&self) -> BTreeSet<Hash> {
        self.good
            .iter()
            .chain(self.bad.iter())
            .chain(self.wonky.iter())
            .copied()
            .collect()
    }

    /// The dispute sub-transition. Verifies and classifies all verdicts,
    /// checks the attached culprit/fault evidence, and appends to ψ.
    /// Returns the offenders mark: the new culprit then fault keys, in
    /// extrinsic order.
    pub fn update(
        &mut self,
        extrinsic: &DisputeExtrinsic,
        active: &ValidatorSet,
        archived: &ValidatorSet,
        current_slot: TimeSlot,
    ) -> Result<Vec<Ed25519Public>> {
        ensure_sorted_verdicts(&extrinsic.verdicts)?;
        ensure_sorted_culprits(&extrinsic.culprits)?;
        ensure_sorted_faults(&extrinsic.faults)?;

        let past = self.past_reported();
        for verdict in &extrinsic.verdicts {
            if past.contains(&verdict.report_hash) {
                return Err(StfError::InvalidVerdicts(format!(
                    "report {} was already judged",
                    hash_to_hex(&verdict.report_hash)
                )));
            }
        }

        let current_epoch = epoch_of(current_slot);
        let summaries = summarize_verdicts(&extrinsic.verdicts, current_epoch, active, archived)?;

        let by_hash: BTreeMap<Hash, &VerdictSummary> =
            summaries.iter().map(|s| (s.report_hash, s)).collect();

        let culprits_by_hash = group_and_verify_culprits(&extrinsic.culprits, &by_hash)?;
        let faults_by_hash = group_and_verify_faults(&extrinsic.faults, &by_hash)?;

        for summary in &summaries {
            let effective = if summary.current_epoch { active } else { archived };
            let culprits = culprits_by_hash
                .get(&summary.report_hash)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let faults = faults_by_hash
                .get(&summary.report_hash)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            match summary.classification {
                Classification::Good => {
                    if faults.is_empty() {
                        return Err(StfError::InvalidFaults(format!(
                            "no faults for good report {}",
                            hash_to_hex(&summary.report_hash)
                        )));
                    }
                }
                Classification::Bad => {
                    if culprits.len() < 2 {
                        return Err(StfError::InvalidCulprits(format!(
                            "{} culprits for bad report {}, need at least 2",
                            culprits.len(),
                            hash_to_hex(&summary.report_hash)
                        )));
                    }
                }
                Classification::Wonky => {}
            }

            for culprit in culprits {
                if !effective.contains_ed25519(&culprit.key) {
                    return Err(StfError::InvalidCulprits(format!(
                        "culprit key for report {} is not in the effective validator set",
                        hash_to_hex(&summary.report_hash)
                    )));
                }
            }
            for fault in faults {
                if !effective.contains_ed25519(&fault.key) {
                    return Err(StfError::InvalidFaults(format!(
                        "fault key for report {} is not in the effective validator set",
                        hash_to_hex(&summary.report_hash)
                    )));
                }
            }
        }

        // Offender monotonicity: no key may be punished twice, in past
        // blocks or within this one.
        let mut punished: BTreeSet<Ed25519Public> = self.offenders.iter().copied().collect();
        let mut offenders = Vec::with_capacity(extrinsic.culprits.len() + extrinsic.faults.len());
        for key in extrinsic
            .culprits
            .iter()
            .map(|c| c.key)
            .chain(extrinsic.faults.iter().map(|f| f.key))
        {
            if !punished.insert(key) {
                return Err(StfError::OffenderAlreadyPunished(hex::encode(key.0)));
            }
            offenders.push(key);
        }

        let mut good = 0usize;
        let mut bad = 0usize;
        let mut wonky = 0usize;
        for summary in &summaries {
            match summary.classification {
                Classification::Good => {
                    self.good.push(summary.report_hash);
                    good += 1;
                }
                Classification::Bad => {
                    self.bad.push(summary.report_hash);
                    bad += 1;
                }
                Classification::Wonky => {
                    self.wonky.push(summary.report_hash);
                    wonky += 1;
                }
            }
        }
        self.offenders.extend_from_slice(&offenders);

        if !extrinsic.is_empty() {
            tracing::debug!(good, bad, wonky, offenders = offenders.len(), "disputes applied");
        }

        Ok(offenders)
    }
}

fn ensure_sorted_verdicts(verdicts: &[Verdict]) -> Result<()> {
    for pair in verdicts.windows(2) {
        if pair[0].report_hash >= pair[1].report_hash {
            return Err(StfError::InvalidVerdicts(
                "verdicts are not sorted by report hash or contain duplicates".into(),
            ));
        }
    }
    Ok(())
}

fn ensure_sorted_culprits(culprits: &[Culprit]) -> Result<()> {
    for pair in culprits.windows(2) {
        if pair[0].key >= pair[1].key {
            return Err(StfError::InvalidCulprits(
                "culprits are not sorted by key or contain duplicates".into(),
            ));
        }
    }
    Ok(())
}

fn ensure_sorted_faults(faults: &[Fault]) -> Result<()> {
    for pair in faults.windows(2) {
        if pair[0].key >= pair[1].key {
            return Err(StfError::InvalidFaults(
                "faults are not sorted by key or contain duplicates".into(),
            ));
        }
    }
    Ok(())
}

fn summarize_verdicts(
    verdicts: &[Verdict],
    current_epoch: Epoch,
    active: &ValidatorSet,
    archived: &ValidatorSet,
) -> Result<Vec<VerdictSummary>> {
    let mut summaries = Vec::with_capacity(verdicts.len());

    for verdict in verdicts {
        if verdict.epoch != current_epoch && verdict.epoch + 1 != current_epoch {
            return Err(StfError::InvalidVerdicts(format!(
                "verdict for report {} is from epoch {}, expected {} or {}",
                hash_to_hex(&verdict.report_hash),
                verdict.epoch,
                current_epoch,
                current_epoch.saturating_sub(1)
            )));
        }
        let is_current = verdict.epoch == current_epoch;
        let effective = if is_current { active } else { archived };

        if verdict.judgements.len() != VALIDATOR_SUPER_MAJORITY {
            return Err(StfError::InvalidVerdicts(format!(
                "verdict for report {} has {} judgements, expected {}",
                hash_to_hex(&verdict.report_hash),
                verdict.judgements.len(),
                VALIDATOR_SUPER_MAJORITY
            )));
        }

        for pair in verdict.judgements.windows(2) {
            if pair[0].validator_index >= pair[1].validator_index {
                return Err(StfError::InvalidVerdicts(
                    "judgements are not sorted by validator index or contain duplicates".into(),
                ));
            }
        }

        let mut positive = 0usize;
        for judgement in &verdict.judgements {
            let validator = effective
                .get(judgement.validator_index as usize)
                .ok_or_else(|| {
                    StfError::InvalidVerdicts(format!(
                        "judgement validator index {} out of range {}",
                        judgement.validator_index, VALIDATOR_COUNT
                    ))
                })?;

            let message = judgement_message(judgement.vote, &verdict.report_hash);
            if !ed25519::verify(&validator.ed25519, &message, &judgement.signature) {
                return Err(StfError::InvalidVerdicts(format!(
                    "judgement signature from validator {} failed for report {}",
                    judgement.validator_index,
                    hash_to_hex(&verdict.report_hash)
                )));
            }

            if judgement.vote {
                positive += 1;
            }
        }

        let classification = if positive == 0 {
            Classification::Bad
        } else if positive == VALIDATOR_MINORITY {
            Classification::Wonky
        } else if positive == VALIDATOR_SUPER_MAJORITY {
            Classification::Good
        } else {
            return Err(StfError::InvalidVerdicts(format!(
                "verdict for report {} has {} positive votes, must be 0, {} or {}",
                hash_to_hex(&verdict.report_hash),
                positive,
                VALIDATOR_MINORITY,
                VALIDATOR_SUPER_MAJORITY
            )));
        };

        summaries.push(VerdictSummary {
            report_hash: verdict.report_hash,
            classification,
            current_epoch: is_current,
        });
    }

    Ok(summaries)
}

fn group_and_verify_culprits<'a>(
    culprits: &'a [Culprit],
    verdicts: &BTreeMap<Hash, &VerdictSummary>,
) -> Result<BTreeMap<Hash, Vec<&'a Culprit>>> {
    let mut grouped: BTreeMap<Hash, Vec<&Culprit>> = BTreeMap::new();

    for culprit in culprits {
        let summary = verdicts.get(&culprit.report_hash).ok_or_else(|| {
            StfError::InvalidCulprits(format!(
                "culprit references unknown report {}",
                hash_to_hex(&culprit.report_hash)
            ))
        })?;

        // A wonky outcome establishes no wrongdoing to attach evidence to.
        if summary.classification == Classification::Wonky {
            return Err(StfError::InvalidCulprits(format!(
                "culprit attached to wonky report {}",
                hash_to_hex(&culprit.report_hash)
            )));
        }

        let message = guarantee_message(&culprit.report_hash);
        if !ed25519::verify(&culprit.key, &message, &culprit.signature) {
            return Err(StfError::InvalidCulprits(format!(
                "culprit signature failed for report {}",
                hash_to_hex(&culprit.report_hash)
            )));
        }

        grouped.entry(culprit.report_hash).or_default().push(culprit);
    }

    Ok(grouped)
}

fn group_and_verify_faults<'a>(
    faults: &'a [Fault],
    verdicts: &BTreeMap<Hash, &VerdictSummary>,
) -> Result<BTreeMap<Hash, Vec<&'a Fault>>> {
    let mut grouped: BTreeMap<Hash, Vec<&Fault>> = BTreeMap::new();

    for fault in faults {
        let summary = verdicts.get(&fault.report_hash).ok_or_else(|| {
            StfError::InvalidFaults(format!(
                "fault references unknown report {}",
                hash_to_hex(&fault.report_hash)
            ))
        })?;

        let valid_vote = match summary.classification {
            Classification::Good => true,
            Classification::Bad => false,
            Classification::Wonky => {
                return Err(StfError::InvalidFaults(format!(
                    "fault attached to wonky report {}",
                    hash_to_hex(&fault.report_hash)
                )));
            }
        };

        // A fault is a vote against the outcome; agreeing with it is no
        // offence.
        if fault.vote == valid_vote {
            return Err(StfError::InvalidFaults(format!(
                "fault vote for report {} matches the verdict outcome",
                hash_to_hex(&fault.report_hash)
            )));
        }

        let message = judgement_message(fault.vote, &fault.report_hash);
        if !ed25519::verify(&fault.key, &message, &fault.signature) {
            return Err(StfError::InvalidFaults(format!(
                "fault signature failed for report {}",
                hash_to_hex(&fault.report_hash)
            )));
        }

        grouped.entry(fault.report_hash).or_default().push(fault);
    }

    Ok(grouped)
}
