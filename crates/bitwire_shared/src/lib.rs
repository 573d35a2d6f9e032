//! # Bitwire Shared
//!
//! Value types and wire constants used by every codec tier.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER contain encode/decode logic. The bit-level codec in
//! `bitwire_core` and the native writer both depend on these layouts; if the
//! field order of a type changes here, the wire format changes everywhere.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{
    PACKED_DIRECT_MAX, PACKED_ONE_EXTRA_MAX, PACKED_TWO_EXTRA_MAX, PACKED_MAX_LEN,
    MIN_GROWTH_CAPACITY, DEFAULT_INITIAL_CAPACITY, NULL_LENGTH,
};
pub use math::{Color, Color32, Quaternion, Ray, Ray2D, Vector2, Vector3, Vector4};
