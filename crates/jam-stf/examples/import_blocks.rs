//! Drive a short chain of empty blocks through the state transition.
//!
//! Uses the deterministic test ring-VRF backend and a stub accumulation
//! engine, so it runs without a real bandersnatch setup:
//!
//! ```text
//! RUST_LOG=debug cargo run --example import_blocks
//! ```

use ed25519_consensus::SigningKey;
use jam_crypto::testing::TestRingVrf;
use jam_crypto::{blake2b_256, BandersnatchPublic, Ed25519Public, RingVrfVerifier};
use jam_stf::block::{Block, Extrinsic, Header};
use jam_stf::entropy::EntropyPool;
use jam_stf::safrole::{SafroleState, SealingKeys};
use jam_stf::service::{PreimageRequest, Services};
use jam_stf::state::{Accumulator, PreimageIntegrator, State};
use jam_stf::validators::{ValidatorKey, ValidatorSet, ValidatorState};
use jam_types::params::{EPOCH_LENGTH, VALIDATOR_COUNT};
use jam_types::{Hash, TimeSlot};
use rand::rngs::StdRng;
use rand::SeedableRng;

struct StubAccumulator;

impl Accumulator for StubAccumulator {
    fn accumulate(&self, slot: TimeSlot, reports: &[jam_stf::reports::WorkReport]) -> Hash {
        let mut preimage = slot.to_le_bytes().to_vec();
        for report in reports {
            preimage.extend_from_slice(&report.hash());
        }
        blake2b_256(&preimage)
    }
}

struct StubPreimages;

impl PreimageIntegrator for StubPreimages {
    fn integrate_preimages(
        &self,
        _slot: TimeSlot,
        _services: &mut Services,
        _requests: &[PreimageRequest],
    ) -> jam_stf::error::Result<()> {
        Ok(())
    }
}

fn demo_validators() -> ValidatorSet {
    let mut rng = StdRng::seed_from_u64(0);
    ValidatorSet(
        (0..VALIDATOR_COUNT)
            .map(|i| {
                let signer = SigningKey::new(&mut rng);
                let mut bandersnatch = [0u8; 32];
                bandersnatch[..8].copy_from_slice(&(i as u64).to_le_bytes());
                ValidatorKey {
                    bandersnatch: BandersnatchPublic(bandersnatch),
                    ed25519: Ed25519Public(signer.verification_key().to_bytes()),
                    bls: [0u8; 144],
                    metadata: [0u8; 128],
                }
            })
            .collect(),
    )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let validators = demo_validators();
    let epoch_root = TestRingVrf
        .ring_commitment(&validators.bandersnatch_keys())
        .expect("test backend commitment");

    let mut state = State {
        auth_pools: Default::default(),
        recent_history: Default::default(),
        services: Default::default(),
        entropy: EntropyPool::new([7u8; 32]),
        validators: ValidatorState {
            staging: validators.clone(),
            active: validators.clone(),
            archived: validators.clone(),
            safrole: SafroleState {
                pending: validators,
                epoch_root,
                sealing_keys: SealingKeys::Fallback(vec![]),
                ticket_accumulator: vec![],
            },
        },
        pending_reports: Default::default(),
        time_slot: EPOCH_LENGTH - 3,
        auth_queues: Default::default(),
        disputes: Default::default(),
    };

    let mut parent_hash = [0u8; 32];
    // Walk across an epoch boundary so the run shows an epoch mark.
    for slot in (EPOCH_LENGTH - 2)..=(EPOCH_LENGTH + 2) {
        let mut vrf_entropy = [0u8; 32];
        vrf_entropy[..4].copy_from_slice(&slot.to_le_bytes());

        let block = Block {
            header: Header {
                parent_hash,
                prior_state_root: blake2b_256(&slot.to_le_bytes()),
                extrinsic_hash: [0u8; 32],
                time_slot: slot,
                epoch_mark: None,
                winning_tickets_mark: None,
                offenders_mark: vec![],
                author_index: 0,
                vrf_signature: TestRingVrf::seal(vrf_entropy),
                seal: TestRingVrf::seal(vrf_entropy),
            },
            extrinsic: Extrinsic::default(),
        };

        let (next, output) = state
            .apply(&block, &TestRingVrf, &StubAccumulator, &StubPreimages)
            .expect("empty block import");

        println!(
            "slot {slot}: epoch_mark={} retained_blocks={} ticketed={}",
            output.epoch_mark.is_some(),
            next.recent_history.blocks().len(),
            next.validators.safrole.sealing_keys.is_ticketed(),
        );

        parent_hash = block.header.hash();
        state = next;
    }
}
