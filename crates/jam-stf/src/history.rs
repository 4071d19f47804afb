//! Recent-history ring.
//!
//! β retains the last H imported blocks: header hash, posterior state root,
//! the keccak mountain range of accumulation result roots, and the
//! work-package → segment-root map its guarantees introduced. A block's own
//! state root is unknowable while importing it, so each entry is created
//! with a zero root that the next block patches retroactively.

use jam_mmr::Mmr;
use jam_types::params::RECENT_BLOCK_COUNT;
use jam_types::{Hash, ZERO_HASH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One retained block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentBlock {
    pub header_hash: Hash,
    /// Zero until the next block patches it.
    pub state_root: Hash,
    pub accumulation_mmr: Mmr,
    /// Work-package hash → segment root, from this block's guarantees.
    pub work_package_hashes: BTreeMap<Hash, Hash>,
}

/// β: the most recent blocks, oldest first, at most H.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecentHistory(Vec<RecentBlock>);

impl RecentHistory {
    pub fn blocks(&self) -> &[RecentBlock] {
        &self.0
    }

    pub fn last(&self) -> Option<&RecentBlock> {
        self.0.last()
    }

    /// The history sub-transition.
    ///
    /// Patches the previous entry's state root with this block's declared
    /// prior state root, extends the accumulation range with the new result
    /// root, appends the new block, and trims the window to H.
    pub fn update(
        &mut self,
        header_hash: Hash,
        prior_state_root: Hash,
        accumulation_root: Hash,
        work_package_hashes: BTreeMap<Hash, Hash>,
    ) {
        if let Some(last) = self.0.last_mut() {
            last.state_root = prior_state_root;
        }

        let accumulation_mmr = self
            .0
            .last()
            .map(|block| &block.accumulation_mmr)
            .cloned()
            .unwrap_or_default()
            .append(accumulation_root, jam_crypto::keccak_256);

        self.0.push(RecentBlock {
            header_hash,
            state_root: ZERO_HASH,
            accumulation_mmr,
            work_package_hashes,
        });

        if self.0.len() > RECENT_BLOCK_COUNT {
            let excess = self.0.len() - RECENT_BLOCK_COUNT;
            self.0.drain(..excess);
        }
    }
}
