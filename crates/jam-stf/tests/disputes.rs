//! Dispute state-transition tests.

mod common;

use common::{test_report, Keyring};
use jam_stf::dispute::{Culprit, DisputeExtrinsic, DisputeState, Fault, Judgement, Verdict};
use jam_stf::error::StfError;
use jam_stf::reports::{PendingReport, PendingReports};
use jam_stf::statements::{guarantee_message, judgement_message};
use jam_types::params::{
    EPOCH_LENGTH, VALIDATOR_COUNT, VALIDATOR_MINORITY, VALIDATOR_SUPER_MAJORITY,
};
use jam_types::{Hash, TimeSlot};

const SLOT: TimeSlot = 5;

/// A validator outside the judgement range, free to play the fault.
const FAULTY: usize = VALIDATOR_COUNT - 1;

/// A verdict with `positive` leading positive votes out of the
/// supermajority-sized judgement array, signed by the keyring.
fn signed_verdict(keyring: &Keyring, report_hash: Hash, epoch: u32, positive: usize) -> Verdict {
    let judgements = (0..VALIDATOR_SUPER_MAJORITY)
        .map(|i| {
            let vote = i < positive;
            Judgement {
                vote,
                validator_index: i as u16,
                signature: keyring.sign(i, &judgement_message(vote, &report_hash)),
            }
        })
        .collect();

    Verdict { report_hash, epoch, judgements }
}

fn signed_fault(keyring: &Keyring, index: usize, report_hash: Hash, vote: bool) -> Fault {
    Fault {
        report_hash,
        vote,
        key: keyring.public(index),
        signature: keyring.sign(index, &judgement_message(vote, &report_hash)),
    }
}

fn signed_culprits(keyring: &Keyring, indices: &[usize], report_hash: Hash) -> Vec<Culprit> {
    let mut culprits: Vec<Culprit> = indices
        .iter()
        .map(|i| Culprit {
            report_hash,
            key: keyring.public(*i),
            signature: keyring.sign(*i, &guarantee_message(&report_hash)),
        })
        .collect();
    culprits.sort_by(|a, b| a.key.cmp(&b.key));
    culprits
}

#[test]
fn test_good_verdict_with_one_fault() {
    let keyring = Keyring::generate(10);
    let mut state = DisputeState::default();
    let report_hash = [7u8; 32];

    let extrinsic = DisputeExtrinsic {
        verdicts: vec![signed_verdict(&keyring, report_hash, 0, VALIDATOR_SUPER_MAJORITY)],
        culprits: vec![],
        faults: vec![signed_fault(&keyring, FAULTY, report_hash, false)],
    };

    let offenders = state
        .update(&extrinsic, &keyring.set, &keyring.set, SLOT)
        .unwrap();

    assert_eq!(state.good, vec![report_hash]);
    assert!(state.bad.is_empty() && state.wonky.is_empty());
    assert_eq!(offenders, vec![keyring.public(FAULTY)]);
    assert_eq!(state.offenders, vec![keyring.public(FAULTY)]);
}

#[test]
fn test_good_verdict_requires_a_fault() {
    let keyring = Keyring::generate(10);
    let mut state = DisputeState::default();

    let extrinsic = DisputeExtrinsic {
        verdicts: vec![signed_verdict(&keyring, [7u8; 32], 0, VALIDATOR_SUPER_MAJORITY)],
        culprits: vec![],
        faults: vec![],
    };

    let err = state
        .update(&extrinsic, &keyring.set, &keyring.set, SLOT)
        .unwrap_err();
    assert!(matches!(err, StfError::InvalidFaults(_)));
}

#[test]
fn test_bad_verdict_requires_two_culprits() {
    let keyring = Keyring::generate(11);
    let report_hash = [9u8; 32];

    // One culprit is below the threshold.
    let mut state = DisputeState::default();
    let extrinsic = DisputeExtrinsic {
        verdicts: vec![signed_verdict(&keyring, report_hash, 0, 0)],
        culprits: signed_culprits(&keyring, &[3], report_hash),
        faults: vec![],
    };
    let err = state
        .update(&extrinsic, &keyring.set, &keyring.set, SLOT)
        .unwrap_err();
    assert!(matches!(err, StfError::InvalidCulprits(_)));

    // Two valid culprits convict.
    let mut state = DisputeState::default();
    let culprits = signed_culprits(&keyring, &[3, 4], report_hash);
    let extrinsic = DisputeExtrinsic {
        verdicts: vec![signed_verdict(&keyring, report_hash, 0, 0)],
        culprits: culprits.clone(),
        faults: vec![],
    };
    let offenders = state
        .update(&extrinsic, &keyring.set, &keyring.set, SLOT)
        .unwrap();

    assert_eq!(state.bad, vec![report_hash]);
    assert_eq!(offenders, culprits.iter().map(|c| c.key).collect::<Vec<_>>());
}

#[test]
fn test_wonky_verdict_carries_no_evidence() {
    let keyring = Keyring::generate(12);
    let report_hash = [13u8; 32];

    // A bare wonky verdict is accepted.
    let mut state = DisputeState::default();
    let extrinsic = DisputeExtrinsic {
        verdicts: vec![signed_verdict(&keyring, report_hash, 0, VALIDATOR_MINORITY)],
        culprits: vec![],
        faults: vec![],
    };
    state
        .update(&extrinsic, &keyring.set, &keyring.set, SLOT)
        .unwrap();
    assert_eq!(state.wonky, vec![report_hash]);

    // Attaching a culprit to it is invalid.
    let mut state = DisputeState::default();
    let extrinsic = DisputeExtrinsic {
        verdicts: vec![signed_verdict(&keyring, report_hash, 0, VALIDATOR_MINORITY)],
        culprits: signed_culprits(&keyring, &[3, 4], report_hash),
        faults: vec![],
    };
    let err = state
        .update(&extrinsic, &keyring.set, &keyring.set, SLOT)
        .unwrap_err();
    assert!(matches!(err, StfError::InvalidCulprits(_)));
}

#[test]
fn test_illegal_vote_tally_rejected() {
    let keyring = Keyring::generate(13);
    let mut state = DisputeState::default();

    let extrinsic = DisputeExtrinsic {
        verdicts: vec![signed_verdict(&keyring, [1u8; 32], 0, 1)],
        culprits: vec![],
        faults: vec![],
    };

    let err = state
        .update(&extrinsic, &keyring.set, &keyring.set, SLOT)
        .unwrap_err();
    assert!(matches!(err, StfError::InvalidVerdicts(_)));
}

#[test]
fn test_previous_epoch_verdict_uses_archived_set() {
    let active = Keyring::generate(14);
    let archived = Keyring::generate(15);
    let report_hash = [3u8; 32];
    let slot = EPOCH_LENGTH + 1;

    // Judged by the archived set at epoch 0, imported during epoch 1.
    let verdict = signed_verdict(&archived, report_hash, 0, VALIDATOR_SUPER_MAJORITY);
    let fault = signed_fault(&archived, FAULTY, report_hash, false);

    let mut state = DisputeState::default();
    state
        .update(
            &DisputeExtrinsic {
                verdicts: vec![verdict.clone()],
                culprits: vec![],
                faults: vec![fault.clone()],
            },
            &active.set,
            &archived.set,
            slot,
        )
        .unwrap();
    assert_eq!(state.good, vec![report_hash]);

    // The same verdict claiming the current epoch fails signature checks
    // against the active set.
    let mut state = DisputeState::default();
    let mut wrong_epoch = verdict;
    wrong_epoch.epoch = 1;
    let err = state
        .update(
            &DisputeExtrinsic {
                verdicts: vec![wrong_epoch],
                culprits: vec![],
                faults: vec![fault],
            },
            &active.set,
            &archived.set,
            slot,
        )
        .unwrap_err();
    assert!(matches!(err, StfError::InvalidVerdicts(_)));
}

#[test]
fn test_stale_epoch_verdict_rejected() {
    let keyring = Keyring::generate(16);
    let mut state = DisputeState::default();
    let slot = 3 * EPOCH_LENGTH;

    let extrinsic = DisputeExtrinsic {
        verdicts: vec![signed_verdict(&keyring, [1u8; 32], 0, VALIDATOR_SUPER_MAJORITY)],
        culprits: vec![],
        faults: vec![],
    };

    let err = state
        .update(&extrinsic, &keyring.set, &keyring.set, slot)
        .unwrap_err();
    assert!(matches!(err, StfError::InvalidVerdicts(_)));
}

#[test]
fn test_rejudging_a_report_rejected() {
    let keyring = Keyring::generate(17);
    let report_hash = [5u8; 32];

    let mut state = DisputeState { good: vec![report_hash], ..Default::default() };
    let extrinsic = DisputeExtrinsic {
        verdicts: vec![signed_verdict(&keyring, report_hash, 0, VALIDATOR_SUPER_MAJORITY)],
        culprits: vec![],
        faults: vec![signed_fault(&keyring, FAULTY, report_hash, false)],
    };

    let err = state
        .update(&extrinsic, &keyring.set, &keyring.set, SLOT)
        .unwrap_err();
    assert!(matches!(err, StfError::InvalidVerdicts(_)));
}

#[test]
fn test_offender_cannot_be_punished_twice() {
    let keyring = Keyring::generate(18);
    let report_hash = [6u8; 32];

    let mut state = DisputeState {
        offenders: vec![keyring.public(FAULTY)],
        ..Default::default()
    };
    let extrinsic = DisputeExtrinsic {
        verdicts: vec![signed_verdict(&keyring, report_hash, 0, VALIDATOR_SUPER_MAJORITY)],
        culprits: vec![],
        faults: vec![signed_fault(&keyring, FAULTY, report_hash, false)],
    };

    let err = state
        .update(&extrinsic, &keyring.set, &keyring.set, SLOT)
        .unwrap_err();
    assert!(matches!(err, StfError::OffenderAlreadyPunished(_)));
}

#[test]
fn test_unsorted_judgements_rejected() {
    let keyring = Keyring::generate(19);
    let mut state = DisputeState::default();

    let mut verdict = signed_verdict(&keyring, [2u8; 32], 0, VALIDATOR_SUPER_MAJORITY);
    verdict.judgements.swap(0, 1);

    let err = state
        .update(
            &DisputeExtrinsic { verdicts: vec![verdict], culprits: vec![], faults: vec![] },
            &keyring.set,
            &keyring.set,
            SLOT,
        )
        .unwrap_err();
    assert!(matches!(err, StfError::InvalidVerdicts(_)));
}

#[test]
fn test_fault_agreeing_with_outcome_rejected() {
    let keyring = Keyring::generate(20);
    let mut state = DisputeState::default();
    let report_hash = [8u8; 32];

    let extrinsic = DisputeExtrinsic {
        verdicts: vec![signed_verdict(&keyring, report_hash, 0, VALIDATOR_SUPER_MAJORITY)],
        culprits: vec![],
        // Votes with the majority: not a fault.
        faults: vec![signed_fault(&keyring, FAULTY, report_hash, true)],
    };

    let err = state
        .update(&extrinsic, &keyring.set, &keyring.set, SLOT)
        .unwrap_err();
    assert!(matches!(err, StfError::InvalidFaults(_)));
}

#[test]
fn test_bad_verdict_purges_pending_report() {
    let keyring = Keyring::generate(21);
    let report = test_report(0, 40);
    let report_hash = report.hash();

    let mut pending = PendingReports::default();
    pending.0[0] = Some(PendingReport { reported_at: 1, report });
    // A second core's report stays untouched.
    pending.0[1] = Some(PendingReport { reported_at: 1, report: test_report(1, 41) });

    let mut state = DisputeState::default();
    state
        .update(
            &DisputeExtrinsic {
                verdicts: vec![signed_verdict(&keyring, report_hash, 0, 0)],
                culprits: signed_culprits(&keyring, &[3, 4], report_hash),
                faults: vec![],
            },
            &keyring.set,
            &keyring.set,
            SLOT,
        )
        .unwrap();

    pending.purge_disputed(&state.invalidated());

    assert!(pending.0[0].is_none());
    assert!(pending.0[1].is_some());
}
