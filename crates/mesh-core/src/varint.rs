//! Golang-compatible unsigned varints (`encoding/binary.Uvarint`).
//!
//! Seven payload bits per byte, least significant group first, high bit set
//! on every byte except the last. A u64 needs at most ten bytes and the
//! tenth byte may only carry a single bit.

use crate::error::VarintError;

/// Longest encoding of a u64.
pub const MAX_VARINT_LEN64: usize = 10;

/// Decode a varint from the front of `buf`.
///
/// Returns the value and the number of bytes consumed. Bytes after the
/// terminating byte are ignored.
pub fn decode(buf: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut x: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &b) in buf.iter().enumerate() {
        if i == MAX_VARINT_LEN64 {
            return Err(VarintError::Overflow);
        }
        if b < 0x80 {
            if i == MAX_VARINT_LEN64 - 1 && b > 1 {
                return Err(VarintError::Underflow { byte: b, position: i });
            }
            return Ok((x | (b as u64) << shift, i + 1));
        }
        x |= ((b & 0x7f) as u64) << shift;
        shift += 7;
    }

    if buf.len() >= MAX_VARINT_LEN64 {
        Err(VarintError::Overflow)
    } else {
        Err(VarintError::Incomplete { read: buf.len() })
    }
}

/// Encode `value` into the front of `out`; returns bytes written.
pub fn encode(mut value: u64, out: &mut [u8]) -> Result<usize, VarintError> {
    let mut i = 0;
    while value >= 0x80 {
        let Some(slot) = out.get_mut(i) else {
            return Err(VarintError::ShortBuffer { written: i });
        };
        *slot = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    let Some(slot) = out.get_mut(i) else {
        return Err(VarintError::ShortBuffer { written: i });
    };
    *slot = value as u8;
    Ok(i + 1)
}

/// Bytes `encode` will write for `value`.
#[inline]
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}
