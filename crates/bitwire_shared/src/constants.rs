//! # Wire Constants
//!
//! Boundaries of the packed integer encoding and buffer sizing defaults.
//!
//! **CRITICAL:** The packed boundaries are part of the wire format.
//! Changing any of them breaks compatibility with every deployed peer.

// =============================================================================
// PACKED INTEGER TIERS
// =============================================================================

/// Largest value stored directly in the header byte.
pub const PACKED_DIRECT_MAX: u64 = 240;

/// Largest value stored as a header (241..=248) plus one extra byte.
pub const PACKED_ONE_EXTRA_MAX: u64 = 2287;

/// Largest value stored as header 249 plus two extra bytes.
pub const PACKED_TWO_EXTRA_MAX: u64 = 67823;

/// First header byte of the one-extra-byte tier.
pub const PACKED_ONE_EXTRA_HEADER: u8 = 241;

/// Header byte of the two-extra-byte tier.
pub const PACKED_TWO_EXTRA_HEADER: u8 = 249;

/// Headers at or above this value carry `header - 247` little-endian bytes.
pub const PACKED_WIDE_HEADER: u8 = 250;

/// Worst-case encoded size of a packed `u64` (header + 8 bytes).
pub const PACKED_MAX_LEN: usize = 9;

// =============================================================================
// BUFFER SIZING
// =============================================================================

/// Default capacity of an internally allocated bit buffer, in bytes.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// A growing buffer never grows to less than this many bytes.
pub const MIN_GROWTH_CAPACITY: usize = 256;

/// Length prefix written for an absent (null) array or string.
pub const NULL_LENGTH: i32 = -1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries_are_contiguous() {
        // one-extra tier covers 241..=2287: 8 headers * 256 values
        assert_eq!(PACKED_ONE_EXTRA_MAX - PACKED_DIRECT_MAX, 8 * 256 - 1);
        // two-extra tier covers 2288..=67823: 65536 values
        assert_eq!(PACKED_TWO_EXTRA_MAX - PACKED_ONE_EXTRA_MAX, 65536);
        assert_eq!(PACKED_TWO_EXTRA_HEADER, PACKED_ONE_EXTRA_HEADER + 8);
    }
}
