//! Deterministic signing encodings.
//!
//! The full wire codec is a collaborator's concern; the core fixes only the
//! encodings that feed signed or hashed statements: little-endian
//! fixed-width integers, u32-length-prefixed sequences, raw 32-byte hashes,
//! maps in ascending key order. Work-report hashes (guarantor credentials,
//! dispute statements) and header hashes (the recent-history ring) are
//! blake2b-256 over these encodings.

use crate::block::Header;
use crate::reports::{ExecResult, RefinementContext, WorkReport, WorkResult};
use jam_crypto::blake2b_256;
use jam_types::Hash;

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_hash(out: &mut Vec<u8>, hash: &Hash) {
    out.extend_from_slice(hash);
}

fn put_blob(out: &mut Vec<u8>, blob: &[u8]) {
    put_u32(out, blob.len() as u32);
    out.extend_from_slice(blob);
}

fn put_context(out: &mut Vec<u8>, context: &RefinementContext) {
    put_hash(out, &context.anchor_header_hash);
    put_hash(out, &context.anchor_state_root);
    put_hash(out, &context.anchor_beefy_root);
    put_hash(out, &context.lookup_anchor_header_hash);
    put_u32(out, context.lookup_anchor_slot);
    put_u32(out, context.prerequisites.len() as u32);
    for hash in &context.prerequisites {
        put_hash(out, hash);
    }
}

fn put_work_result(out: &mut Vec<u8>, result: &WorkResult) {
    put_u32(out, result.service_id);
    put_hash(out, &result.service_code_hash);
    put_hash(out, &result.payload_hash);
    put_u64(out, result.gas);
    match &result.result {
        ExecResult::Output(blob) => {
            out.push(0);
            put_blob(out, blob);
        }
        ExecResult::Error(error) => {
            out.push(1);
            out.push(*error as u8);
        }
    }
}

/// The deterministic encoding of a work-report.
pub fn work_report(report: &WorkReport) -> Vec<u8> {
    let mut out = Vec::with_capacity(512);

    put_hash(&mut out, &report.availability_spec.work_package_hash);
    put_u32(&mut out, report.availability_spec.bundle_length);
    put_hash(&mut out, &report.availability_spec.erasure_root);
    put_hash(&mut out, &report.availability_spec.segment_root);
    put_u16(&mut out, report.availability_spec.segment_count);

    put_context(&mut out, &report.context);

    put_u16(&mut out, report.core_index);
    put_hash(&mut out, &report.authorizer_hash);
    put_blob(&mut out, &report.auth_output);

    put_u32(&mut out, report.segment_root_lookup.len() as u32);
    for (package_hash, segment_root) in &report.segment_root_lookup {
        put_hash(&mut out, package_hash);
        put_hash(&mut out, segment_root);
    }

    put_u32(&mut out, report.results.len() as u32);
    for result in &report.results {
        put_work_result(&mut out, result);
    }

    out
}

/// blake2b-256 of a work-report's encoding.
pub fn work_report_hash(report: &WorkReport) -> Hash {
    blake2b_256(&work_report(report))
}

/// The deterministic encoding of a block header.
pub fn header(header: &Header) -> Vec<u8> {
    let mut out = Vec::with_capacity(512);

    put_hash(&mut out, &header.parent_hash);
    put_hash(&mut out, &header.prior_state_root);
    put_hash(&mut out, &header.extrinsic_hash);
    put_u32(&mut out, header.time_slot);

    match &header.epoch_mark {
        None => out.push(0),
        Some(mark) => {
            out.push(1);
            put_hash(&mut out, &mark.entropy);
            put_hash(&mut out, &mark.tickets_entropy);
            put_u32(&mut out, mark.validators.len() as u32);
            for key in &mark.validators {
                out.extend_from_slice(&key.0);
            }
        }
    }

    match &header.winning_tickets_mark {
        None => out.push(0),
        Some(tickets) => {
            out.push(1);
            put_u32(&mut out, tickets.len() as u32);
            for ticket in tickets {
                put_hash(&mut out, &ticket.id);
                out.push(ticket.entry_index);
            }
        }
    }

    put_u32(&mut out, header.offenders_mark.len() as u32);
    for key in &header.offenders_mark {
        out.extend_from_slice(&key.0);
    }

    put_u16(&mut out, header.author_index);
    out.extend_from_slice(&header.vrf_signature.0);
    out.extend_from_slice(&header.seal.0);

    out
}

/// blake2b-256 of a header's encoding.
pub fn header_hash(h: &Header) -> Hash {
    blake2b_256(&header(h))
}
