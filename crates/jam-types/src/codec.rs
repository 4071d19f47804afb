//! Bit-sequence codec.
//!
//! Availability bitfields are signed over their byte-packed form: LSB-first
//! within each byte, little-endian byte order, ⌈n/8⌉ bytes total.

/// Pack a bit sequence, LSB-first within each byte.
pub fn encode_bit_sequence(bits: &[bool]) -> Vec<u8> {
    let mut encoded = vec![0u8; bits.len().div_ceil(8)];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            encoded[i / 8] |= 1 << (i % 8);
        }
    }
    encoded
}

/// Unpack `bit_count` bits from a byte-packed sequence.
///
/// The byte slice must hold at least ⌈bit_count/8⌉ bytes.
pub fn decode_bit_sequence(bytes: &[u8], bit_count: usize) -> Vec<bool> {
    (0..bit_count)
        .map(|i| (bytes[i / 8] >> (i % 8)) & 1 == 1)
        .collect()
}
