//! Protocol parameters.
//!
//! The full-chain values are the default; the `tiny` feature swaps in the
//! reduced test-chain profile. Everything downstream sizes itself off these
//! constants, so the two profiles compile to structurally identical code.

#[cfg(not(feature = "tiny"))]
mod values {
    /// V: the total number of validators.
    pub const VALIDATOR_COUNT: usize = 1023;
    /// C: the number of cores.
    pub const CORE_COUNT: usize = 341;
    /// E: the number of time slots per epoch.
    pub const EPOCH_LENGTH: u32 = 600;
    /// Y: the last slot phase of an epoch open for ticket submission.
    pub const TICKET_SUBMISSION_DEADLINE: u32 = 500;
    /// R: the guarantor rotation period in slots.
    pub const GUARANTOR_ROTATION_PERIOD: u32 = 10;
    /// K: the maximum number of tickets in a single extrinsic.
    pub const MAX_TICKETS_PER_EXTRINSIC: usize = 16;
    /// N: the number of ticket entries per validator.
    pub const TICKET_ENTRIES_PER_VALIDATOR: u8 = 2;
}

#[cfg(feature = "tiny")]
mod values {
    pub const VALIDATOR_COUNT: usize = 6;
    pub const CORE_COUNT: usize = 2;
    pub const EPOCH_LENGTH: u32 = 12;
    pub const TICKET_SUBMISSION_DEADLINE: u32 = 10;
    pub const GUARANTOR_ROTATION_PERIOD: u32 = 4;
    pub const MAX_TICKETS_PER_EXTRINSIC: usize = 3;
    pub const TICKET_ENTRIES_PER_VALIDATOR: u8 = 3;
}

pub use values::*;

/// ⌊2V/3⌋ + 1: validators required for a supermajority verdict or an
/// availability promotion.
pub const VALIDATOR_SUPER_MAJORITY: usize = VALIDATOR_COUNT * 2 / 3 + 1;

/// ⌊V/3⌋: the wonky-verdict vote count.
pub const VALIDATOR_MINORITY: usize = VALIDATOR_COUNT / 3;

/// P: slot duration in seconds.
pub const SLOT_DURATION_SECS: u64 = 6;

/// O: the maximum number of items in a per-core authorizer pool.
pub const MAX_AUTH_POOL_SIZE: usize = 8;

/// Q: the number of items in a per-core authorizer queue.
pub const AUTH_QUEUE_SIZE: usize = 80;

/// H: the number of recent blocks retained in history.
pub const RECENT_BLOCK_COUNT: usize = 8;

/// I: the maximum number of work items in a package.
pub const MAX_WORK_ITEMS_PER_PACKAGE: usize = 4;

/// J: the maximum number of dependency items in a work-report.
pub const MAX_REPORT_DEPENDENCIES: usize = 8;

/// U: slots before an unassured pending report is evicted.
pub const PENDING_REPORT_TIMEOUT: u32 = 5;

/// L: the maximum age in slots of a lookup anchor.
pub const MAX_LOOKUP_ANCHOR_AGE: u32 = 14_400;

/// G_A: gas allocated to a work-report's Accumulation logic.
pub const ACCUMULATE_GAS_LIMIT: u64 = 10_000_000;

/// G_I: gas allocated to a work-package's Is-Authorized logic.
pub const IS_AUTHORIZED_GAS_LIMIT: u64 = 50_000_000;

/// G_R: gas allocated to a work-package's Refine logic.
pub const REFINE_GAS_LIMIT: u64 = 5_000_000_000;

/// W_R: the maximum total size of all output blobs in a work-report.
pub const MAX_REPORT_OUTPUT_SIZE: usize = 48 * (1 << 10);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_derivation() {
        #[cfg(not(feature = "tiny"))]
        {
            assert_eq!(VALIDATOR_SUPER_MAJORITY, 683);
            assert_eq!(VALIDATOR_MINORITY, 341);
        }
        #[cfg(feature = "tiny")]
        {
            assert_eq!(VALIDATOR_SUPER_MAJORITY, 5);
            assert_eq!(VALIDATOR_MINORITY, 2);
        }
    }

    #[test]
    fn test_submission_deadline_within_epoch() {
        assert!(TICKET_SUBMISSION_DEADLINE < EPOCH_LENGTH);
        assert_eq!(EPOCH_LENGTH % GUARANTOR_ROTATION_PERIOD, 0);
    }
}
