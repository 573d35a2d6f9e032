//! # Codec Error Types
//!
//! All errors that can occur while encoding or decoding.

use thiserror::Error;

/// Errors that can occur in the codec layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A read needed more data than the buffer holds.
    #[error("truncated input: needed {needed_bits} bits, {available_bits} available")]
    Truncated {
        /// Bits the read required.
        needed_bits: usize,
        /// Bits left between the cursor and the written length.
        available_bits: usize,
    },

    /// The buffer cannot perform the operation (growth of a fixed buffer).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// A length or position lies outside the addressable range.
    #[error("out of range: {what} = {value}, limit {limit}")]
    OutOfRange {
        /// What was out of range.
        what: &'static str,
        /// The offending value.
        value: u64,
        /// The largest accepted value.
        limit: u64,
    },

    /// A caller-supplied argument violates a precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// No codec exists for the type.
    #[error("unsupported type: {type_name}")]
    UnsupportedType {
        /// Name of the rejected type.
        type_name: &'static str,
    },

    /// Decoded bytes do not form a valid value.
    #[error("invalid data: {0}")]
    InvalidData(&'static str),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while loading a [`CodecConfig`](crate::CodecConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A parsed value is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}
