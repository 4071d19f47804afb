//! End-to-end block-import tests.

mod common;

use common::{empty_block, genesis_state, Keyring, NullAccumulator, NullPreimages};
use jam_crypto::testing::TestRingVrf;
use jam_stf::error::StfError;
use jam_stf::safrole::TicketProof;
use jam_stf::statements::ticket_seal_input;
use jam_types::params::EPOCH_LENGTH;
use jam_types::ZERO_HASH;

#[test]
fn test_empty_block_advances_state() {
    let keyring = Keyring::generate(80);
    let state = genesis_state(&keyring);

    let block = empty_block([0u8; 32], [1u8; 32], 1);
    let (next, output) = state.apply(&block, &TestRingVrf, &NullAccumulator, &NullPreimages).unwrap();

    assert_eq!(next.time_slot, 1);
    assert_ne!(next.entropy.0[0], state.entropy.0[0]);
    assert_eq!(next.entropy.0[1..], state.entropy.0[1..]);

    let history = next.recent_history.blocks();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].header_hash, block.header.hash());
    assert_eq!(history[0].state_root, ZERO_HASH);

    assert!(output.epoch_mark.is_none());
    assert!(output.winning_tickets_mark.is_none());
    assert!(output.offenders_mark.is_empty());
    assert!(output.available_reports.is_empty());
    assert!(output.reporters.is_empty());

    // The input state is untouched.
    assert_eq!(state.time_slot, 0);
    assert!(state.recent_history.blocks().is_empty());
}

#[test]
fn test_state_root_patched_one_block_late() {
    let keyring = Keyring::generate(81);
    let state = genesis_state(&keyring);

    let first = empty_block([0u8; 32], [1u8; 32], 1);
    let (state, _) = state.apply(&first, &TestRingVrf, &NullAccumulator, &NullPreimages).unwrap();

    let declared_root = [0xabu8; 32];
    let second = empty_block(first.header.hash(), declared_root, 2);
    let (state, _) = state.apply(&second, &TestRingVrf, &NullAccumulator, &NullPreimages).unwrap();

    let history = state.recent_history.blocks();
    assert_eq!(history.len(), 2);
    // The second block's declared prior state root lands on the first entry.
    assert_eq!(history[0].state_root, declared_root);
    assert_eq!(history[1].state_root, ZERO_HASH);
}

#[test]
fn test_stale_slot_rejected() {
    let keyring = Keyring::generate(82);
    let state = genesis_state(&keyring);

    let block = empty_block([0u8; 32], [1u8; 32], 1);
    let (state, _) = state.apply(&block, &TestRingVrf, &NullAccumulator, &NullPreimages).unwrap();

    let stale = empty_block(block.header.hash(), [2u8; 32], 1);
    let err = state.apply(&stale, &TestRingVrf, &NullAccumulator, &NullPreimages).unwrap_err();
    assert_eq!(err, StfError::InvalidTimeSlot { current: 1, previous: 1 });
}

#[test]
fn test_ticket_proofs_accumulate() {
    let keyring = Keyring::generate(83);
    let state = genesis_state(&keyring);

    // Same-epoch import: η[2] is unrotated, so proofs bind to the genesis
    // snapshot.
    let entropy = state.entropy.0[2];
    let mut block = empty_block([0u8; 32], [1u8; 32], 1);
    block.extrinsic.tickets = vec![
        TicketProof {
            entry_index: 0,
            proof: TestRingVrf::prove(&ticket_seal_input(&entropy, 0), [1u8; 32]),
        },
        TicketProof {
            entry_index: 1,
            proof: TestRingVrf::prove(&ticket_seal_input(&entropy, 1), [2u8; 32]),
        },
    ];

    let (next, _) = state.apply(&block, &TestRingVrf, &NullAccumulator, &NullPreimages).unwrap();

    let accumulator = &next.validators.safrole.ticket_accumulator;
    assert_eq!(accumulator.len(), 2);
    assert_eq!(accumulator[0].id, [1u8; 32]);
    assert_eq!(accumulator[1].id, [2u8; 32]);
}

#[test]
fn test_epoch_boundary_emits_mark_through_apply() {
    let keyring = Keyring::generate(84);
    let mut state = genesis_state(&keyring);
    state.time_slot = EPOCH_LENGTH - 1;

    let block = empty_block([0u8; 32], [1u8; 32], EPOCH_LENGTH);
    let (next, output) = state.apply(&block, &TestRingVrf, &NullAccumulator, &NullPreimages).unwrap();

    let mark = output.epoch_mark.expect("epoch mark on the boundary block");
    assert_eq!(mark.validators, next.validators.safrole.pending.bandersnatch_keys());
    assert!(!next.validators.safrole.sealing_keys.is_ticketed());
}

#[test]
fn test_history_window_stays_bounded() {
    use jam_types::params::RECENT_BLOCK_COUNT;

    let keyring = Keyring::generate(85);
    let mut state = genesis_state(&keyring);
    let mut parent = [0u8; 32];

    for slot in 1..=(RECENT_BLOCK_COUNT as u32 + 4) {
        let block = empty_block(parent, [slot as u8; 32], slot);
        parent = block.header.hash();
        let (next, _) = state.apply(&block, &TestRingVrf, &NullAccumulator, &NullPreimages).unwrap();
        state = next;
    }

    assert_eq!(state.recent_history.blocks().len(), RECENT_BLOCK_COUNT);
}
