//! Authorizer pools and queues.
//!
//! Each core holds a sliding pool of up to O authorizer hashes a
//! work-package may be signed off against. Every slot the pool consumes the
//! hash used by any report guaranteed on that core, appends the queue entry
//! scheduled for the slot, and trims its oldest entries down to O. The
//! queues themselves (φ) are refilled by privileged services outside the
//! core.

use crate::reports::CoreIndex;
use jam_types::params::{AUTH_QUEUE_SIZE, CORE_COUNT, MAX_AUTH_POOL_SIZE};
use jam_types::{Hash, TimeSlot, ZERO_HASH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// φ: per-core fixed-length authorizer queues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerQueues(pub Vec<Vec<Hash>>);

impl Default for AuthorizerQueues {
    fn default() -> Self {
        Self(vec![vec![ZERO_HASH; AUTH_QUEUE_SIZE]; CORE_COUNT])
    }
}

/// α: per-core authorizer pools, each at most O entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerPools(pub Vec<Vec<Hash>>);

impl Default for AuthorizerPools {
    fn default() -> Self {
        Self(vec![Vec::new(); CORE_COUNT])
    }
}

impl AuthorizerPools {
    pub fn contains(&self, core: CoreIndex, authorizer_hash: &Hash) -> bool {
        self.0
            .get(core as usize)
            .is_some_and(|pool| pool.contains(authorizer_hash))
    }

    /// Advance every core's pool for the new slot: consume the authorizer
    /// hash used by this block's guarantee on that core (first occurrence,
    /// stable), append the queue entry for `slot`, trim from the front to O.
    pub fn advance(
        &mut self,
        slot: TimeSlot,
        consumed: &BTreeMap<CoreIndex, Hash>,
        queues: &AuthorizerQueues,
    ) {
        for (core, pool) in self.0.iter_mut().enumerate() {
            if let Some(hash) = consumed.get(&(core as CoreIndex)) {
                if let Some(position) = pool.iter().position(|h| h == hash) {
                    pool.remove(position);
                }
            }

            pool.push(queues.0[core][slot as usize % AUTH_QUEUE_SIZE]);
            if pool.len() > MAX_AUTH_POOL_SIZE {
                let excess = pool.len() - MAX_AUTH_POOL_SIZE;
                pool.drain(..excess);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(id: u8) -> Hash {
        [id; 32]
    }

    #[test]
    fn test_consume_and_append() {
        let mut pools = AuthorizerPools::default();
        pools.0[0] = vec![hash(1), hash(2), hash(3)];

        let mut queues = AuthorizerQueues::default();
        let slot: TimeSlot = 42;
        queues.0[0][slot as usize % AUTH_QUEUE_SIZE] = hash(9);

        let consumed = BTreeMap::from([(0u16, hash(2))]);
        pools.advance(slot, &consumed, &queues);

        assert_eq!(pools.0[0], vec![hash(1), hash(3), hash(9)]);
    }

    #[test]
    fn test_full_pool_drops_oldest() {
        let mut pools = AuthorizerPools::default();
        pools.0[0] = (1..=MAX_AUTH_POOL_SIZE as u8).map(hash).collect();

        let mut queues = AuthorizerQueues::default();
        queues.0[0][0] = hash(100);

        pools.advance(0, &BTreeMap::new(), &queues);

        assert_eq!(pools.0[0].len(), MAX_AUTH_POOL_SIZE);
        assert_eq!(pools.0[0][0], hash(2));
        assert_eq!(pools.0[0][MAX_AUTH_POOL_SIZE - 1], hash(100));
    }

    #[test]
    fn test_consume_removes_only_first_occurrence() {
        let mut pools = AuthorizerPools::default();
        pools.0[1] = vec![hash(5), hash(6), hash(5)];

        let queues = AuthorizerQueues::default();
        let consumed = BTreeMap::from([(1u16, hash(5))]);
        pools.advance(7, &consumed, &queues);

        assert_eq!(pools.0[1], vec![hash(6), hash(5), ZERO_HASH]);
    }

    #[test]
    fn test_missing_consumed_hash_is_ignored() {
        let mut pools = AuthorizerPools::default();
        pools.0[0] = vec![hash(1)];

        let queues = AuthorizerQueues::default();
        let consumed = BTreeMap::from([(0u16, hash(99))]);
        pools.advance(0, &consumed, &queues);

        assert_eq!(pools.0[0], vec![hash(1), ZERO_HASH]);
    }
}
