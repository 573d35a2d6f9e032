//! # Packed Integer Arithmetic
//!
//! Variable-length integer encoding used by every packed write.
//!
//! ```text
//! value            header      extra bytes
//! 0..=240          value       -
//! 241..=2287       241..=248   (v-240) & 0xFF
//! 2288..=67823     249         (v-2288) >> 8, (v-2288) & 0xFF
//! larger           250..=255   header-247 bytes of v, little-endian
//! ```
//!
//! Signed values are zig-zag mapped first so small magnitudes stay small.

use bitwire_shared::constants::{
    PACKED_DIRECT_MAX, PACKED_MAX_LEN, PACKED_ONE_EXTRA_HEADER, PACKED_ONE_EXTRA_MAX,
    PACKED_TWO_EXTRA_HEADER, PACKED_TWO_EXTRA_MAX, PACKED_WIDE_HEADER,
};

/// Maps a signed value onto an unsigned one: 0, -1, 1, -2 ... -> 0, 1, 2, 3 ...
#[inline]
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
#[inline]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Number of bytes following `header`.
#[inline]
#[must_use]
pub const fn extra_bytes(header: u8) -> usize {
    if header as u64 <= PACKED_DIRECT_MAX {
        0
    } else if header < PACKED_TWO_EXTRA_HEADER {
        1
    } else if header == PACKED_TWO_EXTRA_HEADER {
        2
    } else {
        (header - 247) as usize
    }
}

/// Encoded size of `value`, header included.
#[inline]
#[must_use]
pub const fn encoded_len(value: u64) -> usize {
    if value <= PACKED_DIRECT_MAX {
        1
    } else if value <= PACKED_ONE_EXTRA_MAX {
        2
    } else if value <= PACKED_TWO_EXTRA_MAX {
        3
    } else {
        1 + extra_bytes(wide_header(value))
    }
}

/// Smallest wide header whose byte count holds `value`.
const fn wide_header(value: u64) -> u8 {
    let mut header = 255u8;
    let mut limit = 0x00FF_FFFF_FFFF_FFFFu64;
    while header > PACKED_WIDE_HEADER && value <= limit {
        header -= 1;
        limit >>= 8;
    }
    header
}

/// Encodes `value` into `out`, returning the number of bytes used.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode(value: u64, out: &mut [u8; PACKED_MAX_LEN]) -> usize {
    if value <= PACKED_DIRECT_MAX {
        out[0] = value as u8;
        1
    } else if value <= PACKED_ONE_EXTRA_MAX {
        let rest = value - PACKED_DIRECT_MAX;
        out[0] = (rest >> 8) as u8 + PACKED_ONE_EXTRA_HEADER;
        out[1] = rest as u8;
        2
    } else if value <= PACKED_TWO_EXTRA_MAX {
        let rest = value - (PACKED_ONE_EXTRA_MAX + 1);
        out[0] = PACKED_TWO_EXTRA_HEADER;
        out[1] = (rest >> 8) as u8;
        out[2] = rest as u8;
        3
    } else {
        let header = wide_header(value);
        let count = extra_bytes(header);
        out[0] = header;
        out[1..=count].copy_from_slice(&value.to_le_bytes()[..count]);
        count + 1
    }
}

/// Decodes a value from its header and the `extra_bytes(header)` bytes after it.
#[must_use]
pub fn decode(header: u8, extra: &[u8]) -> u64 {
    debug_assert_eq!(extra.len(), extra_bytes(header));
    let h = u64::from(header);
    match extra_bytes(header) {
        0 => h,
        1 => {
            PACKED_DIRECT_MAX
                + ((h - u64::from(PACKED_ONE_EXTRA_HEADER)) << 8)
                + u64::from(extra[0])
        }
        2 => PACKED_ONE_EXTRA_MAX + 1 + (u64::from(extra[0]) << 8) + u64::from(extra[1]),
        _ => {
            let mut bytes = [0u8; 8];
            bytes[..extra.len()].copy_from_slice(extra);
            u64::from_le_bytes(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: u64) -> Vec<u8> {
        let mut out = [0u8; PACKED_MAX_LEN];
        let len = encode(value, &mut out);
        assert_eq!(len, encoded_len(value));
        assert_eq!(extra_bytes(out[0]), len - 1);
        assert_eq!(decode(out[0], &out[1..len]), value);
        out[..len].to_vec()
    }

    #[test]
    fn test_tier_bytes() {
        assert_eq!(roundtrip(0), vec![0]);
        assert_eq!(roundtrip(240), vec![240]);
        assert_eq!(roundtrip(241), vec![241, 1]);
        assert_eq!(roundtrip(2287), vec![248, 255]);
        assert_eq!(roundtrip(2288), vec![249, 0, 0]);
        assert_eq!(roundtrip(67823), vec![249, 255, 255]);
        assert_eq!(roundtrip(67824), vec![250, 0xF0, 0x08, 0x01]);
        assert_eq!(roundtrip(0x00FF_FFFF), vec![250, 0xFF, 0xFF, 0xFF]);
        assert_eq!(roundtrip(0x0100_0000), vec![251, 0, 0, 0, 1]);
        assert_eq!(roundtrip(u64::MAX), vec![255, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_wide_headers_pick_smallest() {
        for bytes in 3..=8u32 {
            let max = if bytes == 8 { u64::MAX } else { (1u64 << (bytes * 8)) - 1 };
            let encoded = roundtrip(max);
            assert_eq!(encoded.len() as u32, bytes + 1);
            if bytes < 8 {
                assert_eq!(roundtrip(max + 1).len() as u32, bytes + 2);
            }
        }
    }

    #[test]
    fn test_zigzag() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(i64::MAX), u64::MAX - 1);
        assert_eq!(zigzag_encode(i64::MIN), u64::MAX);
        for v in [0, 1, -1, 1000, -31934, i64::MIN, i64::MAX] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
    }
}
