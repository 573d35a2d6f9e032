//! # Bitwire Core
//!
//! Bit-level buffer and binary codecs for game state replication:
//! - Bit-addressable growable buffer with misaligned byte I/O
//! - Compact variable-length ("packed") integer encoding
//! - Symmetric writer/reader pairs for primitives, math types, strings, arrays
//! - Delta encoding of arrays and strings against a previous value
//! - Fixed-capacity byte writer for hot paths
//!
//! ## Wire Rules
//!
//! 1. **Little-endian** - Multi-byte fixed values go low byte first
//! 2. **No padding** - Values start at whatever bit the previous one ended on
//! 3. **No type tags** - Reader and writer must issue the same call sequence
//!
//! ## Example
//!
//! ```rust
//! use bitwire_core::{BitBuffer, BitReader, BitWriter};
//!
//! let mut buffer = BitBuffer::new();
//! let mut writer = BitWriter::new(&mut buffer);
//! writer.write_bool(true).unwrap();
//! writer.write_i32_packed(-31934).unwrap();
//!
//! buffer.set_bit_position(0);
//! let mut reader = BitReader::new(&mut buffer);
//! assert!(reader.read_bool().unwrap());
//! assert_eq!(reader.read_i32_packed().unwrap(), -31934);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
pub mod native;
pub mod packed;

pub use buffer::BitBuffer;
pub use codec::{BitReader, BitWriter, WireElement};
pub use config::{CodecConfig, DiffLayout, ReadMode};
pub use error::{CodecError, CodecResult, ConfigError};
pub use native::NativeWriter;
