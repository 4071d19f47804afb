//! Error taxonomy of the state transition.
//!
//! Errors are typed, terminal, and non-retryable within a block: any of
//! these aborts the whole transition and leaves σ unchanged. Messages carry
//! the offending hash, index, or slot for the caller's log.

use jam_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StfError {
    #[error("invalid time slot: current {current} must be after previous {previous}")]
    InvalidTimeSlot { current: u32, previous: u32 },

    #[error("invalid ticket submissions: {0}")]
    InvalidTicketSubmissions(String),

    #[error("invalid verdicts: {0}")]
    InvalidVerdicts(String),

    #[error("invalid culprits: {0}")]
    InvalidCulprits(String),

    #[error("invalid faults: {0}")]
    InvalidFaults(String),

    #[error("offender already punished: {0}")]
    OffenderAlreadyPunished(String),

    #[error("invalid assurance: {0}")]
    InvalidAssurance(String),

    #[error("invalid guarantees: {0}")]
    InvalidGuarantees(String),

    #[error("invalid guarantee: {0}")]
    InvalidGuarantee(String),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("invalid work report: {0}")]
    InvalidWorkReport(String),

    #[error("invalid refinement context: {0}")]
    InvalidRefinementContext(String),

    /// Raised by the host's preimage integrator; the core only defines the
    /// channel.
    #[error("invalid preimage: {0}")]
    InvalidPreimage(String),

    #[error("crypto backend: {0}")]
    Crypto(#[from] CryptoError),
}

pub type Result<T> = std::result::Result<T, StfError>;
