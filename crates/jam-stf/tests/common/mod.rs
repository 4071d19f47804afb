//! Shared fixtures for the state-transition tests.

#![allow(dead_code)]

use ed25519_consensus::SigningKey;
use jam_crypto::testing::TestRingVrf;
use jam_crypto::{
    blake2b_256, BandersnatchPublic, Ed25519Public, Ed25519Signature, RingVrfVerifier,
};
use jam_stf::authorizer::{AuthorizerPools, AuthorizerQueues};
use jam_stf::block::{Block, Extrinsic, Header};
use jam_stf::dispute::DisputeState;
use jam_stf::entropy::EntropyPool;
use jam_stf::reports::{
    AvailabilitySpec, CoreIndex, ExecResult, PendingReports, RefinementContext, WorkReport,
    WorkResult,
};
use jam_stf::safrole::{SafroleState, SealingKeys};
use jam_stf::service::{PreimageRequest, ServiceAccount, Services};
use jam_stf::state::{Accumulator, PreimageIntegrator, State};
use jam_stf::validators::{ValidatorKey, ValidatorSet, ValidatorState};
use jam_types::params::VALIDATOR_COUNT;
use jam_types::{Hash, TimeSlot};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// A validator set together with its ed25519 signing keys.
pub struct Keyring {
    pub signers: Vec<SigningKey>,
    pub set: ValidatorSet,
}

impl Keyring {
    pub fn generate(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let signers: Vec<SigningKey> =
            (0..VALIDATOR_COUNT).map(|_| SigningKey::new(&mut rng)).collect();

        let set = ValidatorSet(
            signers
                .iter()
                .enumerate()
                .map(|(i, signer)| {
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
        );

        Self { signers, set }
    }

    pub fn sign(&self, index: usize, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signers[index].sign(message).to_bytes())
    }

    pub fn public(&self, index: usize) -> Ed25519Public {
        self.set.0[index].ed25519
    }
}

/// Accumulation engine stub: commits to the promoted report hashes.
pub struct NullAccumulator;

impl Accumulator for NullAccumulator {
    fn accumulate(&self, slot: TimeSlot, reports: &[WorkReport]) -> Hash {
        let mut preimage = slot.to_le_bytes().to_vec();
        for report in reports {
            preimage.extend_from_slice(&report.hash());
        }
        blake2b_256(&preimage)
    }
}

/// Preimage-integration stub: accepts every request without touching δ.
pub struct NullPreimages;

impl PreimageIntegrator for NullPreimages {
    fn integrate_preimages(
        &self,
        _slot: TimeSlot,
        _services: &mut Services,
        _requests: &[PreimageRequest],
    ) -> jam_stf::error::Result<()> {
        Ok(())
    }
}

/// A genesis-like state where all four validator slots hold the keyring.
pub fn genesis_state(keyring: &Keyring) -> State {
    let epoch_root = TestRingVrf
        .ring_commitment(&keyring.set.bandersnatch_keys())
        .unwrap();

    State {
        auth_pools: AuthorizerPools::default(),
        recent_history: Default::default(),
        services: Services::default(),
        entropy: EntropyPool::new([41u8; 32]),
        validators: ValidatorState {
            staging: keyring.set.clone(),
            active: keyring.set.clone(),
            archived: keyring.set.clone(),
            safrole: SafroleState {
                pending: keyring.set.clone(),
                epoch_root,
                sealing_keys: SealingKeys::Fallback(vec![]),
                ticket_accumulator: vec![],
            },
        },
        pending_reports: PendingReports::default(),
        time_slot: 0,
        auth_queues: AuthorizerQueues::default(),
        disputes: DisputeState::default(),
    }
}

/// A block with no extrinsics, sealed with slot-derived test entropy.
pub fn empty_block(parent_hash: Hash, prior_state_root: Hash, slot: TimeSlot) -> Block {
    let mut vrf_entropy = [0u8; 32];
    vrf_entropy[..4].copy_from_slice(&slot.to_le_bytes());

    Block {
        header: Header {
            parent_hash,
            prior_state_root,
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
    }
}

/// A minimal self-contained work-report for a core.
pub fn test_report(core: CoreIndex, package_id: u8) -> WorkReport {
    WorkReport {
        availability_spec: AvailabilitySpec {
            work_package_hash: [package_id; 32],
            bundle_length: 1_000,
            erasure_root: [2u8; 32],
            segment_root: [3u8; 32],
            segment_count: 1,
        },
        context: RefinementContext {
            anchor_header_hash: [4u8; 32],
            anchor_state_root: [5u8; 32],
            anchor_beefy_root: [6u8; 32],
            lookup_anchor_header_hash: [7u8; 32],
            lookup_anchor_slot: 0,
            prerequisites: vec![],
        },
        core_index: core,
        authorizer_hash: [8u8; 32],
        auth_output: vec![],
        segment_root_lookup: BTreeMap::new(),
        results: vec![WorkResult {
            service_id: 1,
            service_code_hash: [9u8; 32],
            payload_hash: [10u8; 32],
            gas: 1_000,
            result: ExecResult::Output(vec![1, 2, 3]),
        }],
    }
}

/// A service table where service 1 accepts `test_report` results.
pub fn test_services() -> Services {
    let account = ServiceAccount {
        code_hash: [9u8; 32],
        accumulate_gas: 100,
        ..Default::default()
    };
    Services(BTreeMap::from([(1, account)]))
}
