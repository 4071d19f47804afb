//! Signed-statement construction.
//!
//! Domain-separation constants are raw ASCII, concatenated with their
//! payload without length framing. Changing any of these is a breaking
//! protocol change.

use jam_crypto::blake2b_256;
use jam_types::Hash;

/// Ring-VRF input prefix for tickets.
pub const TICKET_SEAL_CONTEXT: &[u8] = b"jam_ticket_seal";

/// Judgement statement for a positive vote.
pub const VALID_STATEMENT: &[u8] = b"jam_valid";

/// Judgement statement for a negative vote.
pub const INVALID_STATEMENT: &[u8] = b"jam_invalid";

/// Guarantor/culprit statement.
pub const GUARANTEE_STATEMENT: &[u8] = b"jam_guarantee";

/// Availability assurance statement.
pub const AVAILABLE_STATEMENT: &[u8] = b"jam_available";

/// Message signed by a dispute judgement (or fault) with the given vote.
pub fn judgement_message(vote: bool, report_hash: &Hash) -> Vec<u8> {
    let statement = if vote { VALID_STATEMENT } else { INVALID_STATEMENT };
    [statement, report_hash.as_slice()].concat()
}

/// Message signed by a guarantor credential or a culprit.
pub fn guarantee_message(report_hash: &Hash) -> Vec<u8> {
    [GUARANTEE_STATEMENT, report_hash.as_slice()].concat()
}

/// Message signed by an availability assurance: the statement over the
/// blake2b hash of the anchor parent and the byte-packed bitfield.
pub fn availability_message(parent_hash: &Hash, bitfield_bytes: &[u8]) -> Vec<u8> {
    let inner = blake2b_256(&[parent_hash.as_slice(), bitfield_bytes].concat());
    [AVAILABLE_STATEMENT, inner.as_slice()].concat()
}

/// Ring-VRF input for a ticket proof at the given entry index.
pub fn ticket_seal_input(epoch_entropy: &Hash, entry_index: u8) -> Vec<u8> {
    let mut input = Vec::with_capacity(TICKET_SEAL_CONTEXT.len() + 33);
    input.extend_from_slice(TICKET_SEAL_CONTEXT);
    input.extend_from_slice(epoch_entropy);
    input.push(entry_index);
    input
}
