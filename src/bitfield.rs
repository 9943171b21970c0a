//! Bit-level pack/unpack for control bytes.
//!
//! Several KNXnet/IP fields pack multiple sub-byte values into one or two
//! bytes, MSB first. The cEMI control fields are the canonical case:
//!
//! ```text
//! control field 1 (1 byte):
//!   +---+---+---+---+---+---+---+---+
//!   | FT| r |REP| SB| priority |ACK|C|
//!   +---+---+---+---+---+---+---+---+
//!     1   1   1   1      2      1  1   bits
//! ```
//!
//! `unpack` splits such a span into per-subfield integers; `pack` is the
//! exact inverse. Widths must sum to the bit length of the span, which is
//! at most 64 bits.

use crate::error::{DecodeError, EncodeError};

/// Maximum number of subfields in one packed span.
pub const MAX_SUBFIELDS: usize = 16;

/// Split a packed byte span into subfield values, MSB first.
///
/// The widths must be non-zero, at most 63 bits each, and sum to exactly
/// `data.len() * 8` (at most 64). Anything else is a `BitWidthMismatch`.
pub fn unpack(
    data: &[u8],
    widths: &[u8],
) -> Result<heapless::Vec<u64, MAX_SUBFIELDS>, DecodeError> {
    let total_bits = data.len() * 8;
    if total_bits > 64 || widths.len() > MAX_SUBFIELDS {
        return Err(DecodeError::bit_width_mismatch());
    }
    let mut sum = 0usize;
    for &w in widths {
        if w == 0 || w > 63 {
            return Err(DecodeError::bit_width_mismatch());
        }
        sum += w as usize;
    }
    if sum != total_bits {
        return Err(DecodeError::bit_width_mismatch());
    }

    let mut packed = 0u64;
    for &b in data {
        packed = (packed << 8) | u64::from(b);
    }

    let mut out = heapless::Vec::new();
    let mut shift = total_bits;
    for &w in widths {
        shift -= w as usize;
        let mask = (1u64 << w) - 1;
        // Width-checked above; capacity matches MAX_SUBFIELDS.
        let _ = out.push((packed >> shift) & mask);
    }
    Ok(out)
}

/// Pack subfield values into a byte span, MSB first.
///
/// `values` and `widths` must have equal length, widths must sum to a whole
/// number of bytes (at most 64 bits), and each value must fit its width.
pub fn pack(values: &[u64], widths: &[u8]) -> Result<heapless::Vec<u8, 8>, EncodeError> {
    if values.len() != widths.len() || widths.len() > MAX_SUBFIELDS {
        return Err(EncodeError::bit_width_mismatch());
    }
    let mut sum = 0usize;
    for &w in widths {
        if w == 0 || w > 63 {
            return Err(EncodeError::bit_width_mismatch());
        }
        sum += w as usize;
    }
    if sum == 0 || sum % 8 != 0 || sum > 64 {
        return Err(EncodeError::bit_width_mismatch());
    }

    let mut packed = 0u64;
    for (&v, &w) in values.iter().zip(widths) {
        if v >= 1u64 << w {
            return Err(EncodeError::value_out_of_range());
        }
        packed = (packed << w) | v;
    }

    let mut out = heapless::Vec::new();
    let bytes = sum / 8;
    for i in (0..bytes).rev() {
        let _ = out.push(((packed >> (i * 8)) & 0xFF) as u8);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeErrorKind, EncodeErrorKind};

    #[test]
    fn test_unpack_cemi_control_field_1() {
        // 0xBC = 1011_1100: standard frame, no repeat, system broadcast,
        // low priority, no ack, no confirm error.
        let values = unpack(&[0xBC], &[1, 1, 1, 1, 2, 1, 1]).unwrap();
        assert_eq!(&values[..], &[1, 0, 1, 1, 3, 0, 0]);
    }

    #[test]
    fn test_unpack_cemi_control_field_2() {
        // 0xE0: group address, hop count 6, standard frame format.
        let values = unpack(&[0xE0], &[1, 3, 4]).unwrap();
        assert_eq!(&values[..], &[1, 6, 0]);
    }

    #[test]
    fn test_unpack_two_byte_span() {
        // DP_cEMI element count / start index share a 16-bit span.
        let values = unpack(&[0x10, 0x01], &[4, 12]).unwrap();
        assert_eq!(&values[..], &[1, 1]);
    }

    #[test]
    fn test_pack_is_inverse_of_unpack() {
        let widths = [1, 1, 1, 1, 2, 1, 1];
        let values = [1, 0, 1, 1, 2, 1, 1];
        let packed = pack(&values, &widths).unwrap();
        assert_eq!(&packed[..], &[0xBB]);
        let unpacked = unpack(&packed, &widths).unwrap();
        assert_eq!(&unpacked[..], &values[..]);
    }

    #[test]
    fn test_unpack_rejects_width_sum_mismatch() {
        let err = unpack(&[0xBC], &[1, 1, 1]).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::BitWidthMismatch);
    }

    #[test]
    fn test_unpack_rejects_zero_width() {
        let err = unpack(&[0xBC], &[0, 8]).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::BitWidthMismatch);
    }

    #[test]
    fn test_pack_rejects_oversized_value() {
        let err = pack(&[4, 0], &[2, 6]).unwrap_err();
        assert_eq!(err.kind(), EncodeErrorKind::ValueOutOfRange);
    }

    #[test]
    fn test_pack_rejects_count_mismatch() {
        let err = pack(&[1, 2, 3], &[4, 4]).unwrap_err();
        assert_eq!(err.kind(), EncodeErrorKind::BitWidthMismatch);
    }

    #[test]
    fn test_pack_rejects_partial_byte() {
        let err = pack(&[1, 2], &[3, 4]).unwrap_err();
        assert_eq!(err.kind(), EncodeErrorKind::BitWidthMismatch);
    }
}
