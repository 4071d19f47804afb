//! JAM time.
//!
//! Chain time is a 32-bit count of 6-second slots since the JAM Common Era,
//! 1200 UTC on January 1, 2025. The state-transition core only ever sees the
//! slot number carried in a block; `JamTime` exists for hosts that need to
//! map wall-clock instants onto slots.

use crate::params::{EPOCH_LENGTH, SLOT_DURATION_SECS, TICKET_SUBMISSION_DEADLINE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// τ: a slot index since the JAM Common Era.
pub type TimeSlot = u32;

/// e: an epoch index, `τ / E`.
pub type Epoch = u32;

/// Unix timestamp of the JAM Common Era (2025-01-01T12:00:00Z).
pub const JAM_COMMON_ERA_UNIX: u64 = 1_735_732_800;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    #[error("time before the JAM common era is invalid")]
    BeforeCommonEra,
}

/// Seconds elapsed since the JAM Common Era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JamTime {
    seconds: u64,
}

impl JamTime {
    /// Build from a Unix timestamp.
    pub fn from_unix(unix_secs: u64) -> Result<Self, TimeError> {
        if unix_secs < JAM_COMMON_ERA_UNIX {
            return Err(TimeError::BeforeCommonEra);
        }
        Ok(Self { seconds: unix_secs - JAM_COMMON_ERA_UNIX })
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn time_slot(&self) -> TimeSlot {
        (self.seconds / SLOT_DURATION_SECS) as TimeSlot
    }

    pub fn unix(&self) -> u64 {
        JAM_COMMON_ERA_UNIX + self.seconds
    }
}

/// The epoch a slot belongs to.
pub fn epoch_of(slot: TimeSlot) -> Epoch {
    slot / EPOCH_LENGTH
}

/// Slot phase within its epoch, `0..EPOCH_LENGTH`.
pub fn slot_in_epoch(slot: TimeSlot) -> u32 {
    slot % EPOCH_LENGTH
}

/// Whether tickets may still be submitted at this slot.
pub fn in_ticket_submission_period(slot: TimeSlot) -> bool {
    slot_in_epoch(slot) < TICKET_SUBMISSION_DEADLINE
}

/// Wall-clock start of a slot, as a Unix timestamp.
pub fn slot_start_unix(slot: TimeSlot) -> u64 {
    JAM_COMMON_ERA_UNIX + u64::from(slot) * SLOT_DURATION_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_era_is_slot_zero() {
        let t = JamTime::from_unix(JAM_COMMON_ERA_UNIX).unwrap();
        assert_eq!(t.seconds(), 0);
        assert_eq!(t.time_slot(), 0);
    }

    #[test]
    fn test_pre_era_rejected() {
        assert_eq!(
            JamTime::from_unix(JAM_COMMON_ERA_UNIX - 1),
            Err(TimeError::BeforeCommonEra)
        );
    }

    #[test]
    fn test_slot_boundaries() {
        // One second short of a full slot still maps to the previous slot.
        let t = JamTime::from_unix(JAM_COMMON_ERA_UNIX + SLOT_DURATION_SECS - 1).unwrap();
        assert_eq!(t.time_slot(), 0);

        let t = JamTime::from_unix(JAM_COMMON_ERA_UNIX + SLOT_DURATION_SECS).unwrap();
        assert_eq!(t.time_slot(), 1);
    }

    #[test]
    fn test_epoch_math() {
        assert_eq!(epoch_of(0), 0);
        assert_eq!(epoch_of(EPOCH_LENGTH - 1), 0);
        assert_eq!(epoch_of(EPOCH_LENGTH), 1);
        assert_eq!(slot_in_epoch(EPOCH_LENGTH + 3), 3);
    }

    #[test]
    fn test_submission_period() {
        assert!(in_ticket_submission_period(0));
        assert!(in_ticket_submission_period(TICKET_SUBMISSION_DEADLINE - 1));
        assert!(!in_ticket_submission_period(TICKET_SUBMISSION_DEADLINE));
        assert!(!in_ticket_submission_period(EPOCH_LENGTH - 1));
        // Next epoch reopens submission.
        assert!(in_ticket_submission_period(EPOCH_LENGTH));
    }

    #[test]
    fn test_slot_start_round_trip() {
        let slot = 12_345;
        let t = JamTime::from_unix(slot_start_unix(slot)).unwrap();
        assert_eq!(t.time_slot(), slot);
    }
}
