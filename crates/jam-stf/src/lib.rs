//! Block-import state transition core.
//!
//! A pure, single-threaded function from a prior chain state σ and a block
//! to the posterior state σ′ plus the block markers. The sub-transitions
//! run in a fixed order over the shared state record:
//!
//! 1. disputes — verdict classification, offender accumulation, purge of
//!    disputed pending reports (ρ → ρ†),
//! 2. Safrole and validator rotation — entropy, sealing-key series,
//!    epoch/winning-ticket markers,
//! 3. availability assurances — supermajority tally and stale eviction
//!    (ρ† → ρ††),
//! 4. work-report guarantees — guarantor credentials, authorizer and anchor
//!    checks (ρ†† → ρ′),
//! 5. authorizer pool advancement,
//! 6. recent-history ring with deferred state-root patching.
//!
//! Failure is a typed error that aborts the whole transition; the prior
//! state is never partially committed. All cryptography is reached through
//! `jam-crypto`; the bandersnatch ring backend, the accumulation engine,
//! and the service-account preimage integrator are host collaborators
//! passed into [`State::apply`].

pub mod authorizer;
pub mod block;
pub mod dispute;
pub mod encode;
pub mod entropy;
pub mod error;
pub mod history;
pub mod reports;
pub mod safrole;
pub mod service;
pub mod shuffle;
pub mod state;
pub mod statements;
pub mod validators;

pub use block::{Block, Extrinsic, Header};
pub use error::{Result, StfError};
pub use state::{Accumulator, ApplyOutput, PreimageIntegrator, State};
