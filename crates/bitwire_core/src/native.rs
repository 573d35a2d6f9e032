//! # Native Writer
//!
//! Byte-granular writer over a pre-allocated region, for hot paths that
//! never need sub-byte positioning.

// SAFETY: The unchecked writers in this module skip bounds checks.
// Callers prove capacity with `try_reserve` before using them.
#![allow(unsafe_code)]
//!
//! ## Two tiers
//!
//! ```text
//! write_*             one capacity check per call, then a raw copy
//! write_*_unchecked   no checks; caller reserved the bytes up front
//! ```
//!
//! A batch of `n` small writes can be covered by a single
//! [`NativeWriter::try_reserve`] call and then issued unchecked.
//!
//! The packed family produces exactly the bytes of
//! [`BitWriter`](crate::BitWriter) at a byte-aligned cursor.

use std::ptr;

use bytemuck::Pod;

use bitwire_shared::constants::PACKED_MAX_LEN;

use crate::error::{CodecError, CodecResult};
use crate::packed;

/// Fixed-capacity byte writer. Never grows.
#[derive(Clone, Debug)]
pub struct NativeWriter {
    buffer: Box<[u8]>,
    position: usize,
}

macro_rules! packed_family {
    ($($(#[$doc:meta])* $name:ident: $ty:ty => $convert:expr;)*) => {
        $(
            $(#[$doc])*
            ///
            /// # Errors
            ///
            /// [`CodecError::UnsupportedOperation`] when the encoding does
            /// not fit; nothing is written.
            #[inline]
            pub fn $name(&mut self, value: $ty) -> CodecResult<()> {
                let convert: fn($ty) -> u64 = $convert;
                self.write_u64_packed(convert(value))
            }
        )*
    };
}

impl NativeWriter {
    /// Allocates a zeroed region of `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity].into_boxed_slice(),
            position: 0,
        }
    }

    /// Region size in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes written so far (the cursor).
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Bytes left before the region is full.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Moves the cursor, clamped to the capacity.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.buffer.len());
    }

    /// Rewinds the cursor to zero. Contents are not cleared.
    #[inline]
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Bytes from the start of the region up to the cursor.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    /// Copies the consumed region out.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Proves that `bytes` more bytes fit after the cursor.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedOperation`] when they do not.
    #[inline]
    pub fn try_reserve(&self, bytes: usize) -> CodecResult<()> {
        if bytes > self.remaining() {
            tracing::warn!(
                "Native writer full: {} bytes requested, {} remaining",
                bytes,
                self.remaining()
            );
            return Err(CodecError::UnsupportedOperation("native writer capacity exceeded"));
        }
        Ok(())
    }

    // =========================================================================
    // Checked writes
    // =========================================================================

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedOperation`] when the region is full.
    #[inline]
    pub fn write_byte(&mut self, value: u8) -> CodecResult<()> {
        self.try_reserve(1)?;
        // SAFETY: one byte reserved above
        unsafe { self.write_byte_unchecked(value) };
        Ok(())
    }

    /// Writes a byte slice.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedOperation`] when the slice does not fit;
    /// nothing is written.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.try_reserve(bytes.len())?;
        // SAFETY: `bytes.len()` bytes reserved above
        unsafe { self.write_bytes_unchecked(bytes) };
        Ok(())
    }

    /// Writes the in-memory representation of a plain-old-data value.
    ///
    /// The bytes are in native endianness and include no length.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedOperation`] when the value does not fit.
    #[inline]
    pub fn write_value<T: Pod>(&mut self, value: &T) -> CodecResult<()> {
        self.write_bytes(bytemuck::bytes_of(value))
    }

    /// Writes a `u64` in the packed encoding.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedOperation`] when the encoding does not fit;
    /// nothing is written.
    #[inline]
    pub fn write_u64_packed(&mut self, value: u64) -> CodecResult<()> {
        let mut scratch = [0u8; PACKED_MAX_LEN];
        let len = packed::encode(value, &mut scratch);
        self.write_bytes(&scratch[..len])
    }

    packed_family! {
        /// Writes a `u16` packed.
        write_u16_packed: u16 => u64::from;
        /// Writes a `u32` packed.
        write_u32_packed: u32 => u64::from;
        /// Writes an `i16` zig-zag mapped, then packed.
        write_i16_packed: i16 => |v| packed::zigzag_encode(i64::from(v));
        /// Writes an `i32` zig-zag mapped, then packed.
        write_i32_packed: i32 => |v| packed::zigzag_encode(i64::from(v));
        /// Writes an `i64` zig-zag mapped, then packed.
        write_i64_packed: i64 => packed::zigzag_encode;
        /// Writes an `f32` bit pattern packed.
        write_f32_packed: f32 => |v| u64::from(v.to_bits());
        /// Writes an `f64` bit pattern packed.
        write_f64_packed: f64 => f64::to_bits;
        /// Writes a character's scalar value packed.
        write_char_packed: char => |c| u64::from(u32::from(c));
    }

    // =========================================================================
    // Unchecked writes
    // =========================================================================

    /// Writes one byte without a bounds check.
    ///
    /// # Safety
    ///
    /// At least one byte must remain, e.g. proven by `try_reserve(1)`.
    #[inline]
    pub unsafe fn write_byte_unchecked(&mut self, value: u8) {
        debug_assert!(self.position < self.buffer.len());
        // SAFETY: caller guarantees position < capacity
        unsafe { *self.buffer.get_unchecked_mut(self.position) = value };
        self.position += 1;
    }

    /// Writes a byte slice without a bounds check.
    ///
    /// # Safety
    ///
    /// At least `bytes.len()` bytes must remain.
    #[inline]
    pub unsafe fn write_bytes_unchecked(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= self.remaining());
        // SAFETY: caller guarantees the destination range is inside the
        // region; `bytes` is a distinct borrow so the ranges cannot overlap
        unsafe {
            ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                self.buffer.as_mut_ptr().add(self.position),
                bytes.len(),
            );
        }
        self.position += bytes.len();
    }

    /// Writes a plain-old-data value without a bounds check.
    ///
    /// # Safety
    ///
    /// At least `size_of::<T>()` bytes must remain.
    #[inline]
    pub unsafe fn write_value_unchecked<T: Pod>(&mut self, value: &T) {
        // SAFETY: forwarded contract
        unsafe { self.write_bytes_unchecked(bytemuck::bytes_of(value)) };
    }

    /// Writes a packed `u64` without a bounds check.
    ///
    /// # Safety
    ///
    /// At least [`packed::encoded_len`]`(value)` bytes must remain;
    /// reserving [`PACKED_MAX_LEN`] always suffices.
    #[inline]
    pub unsafe fn write_u64_packed_unchecked(&mut self, value: u64) {
        let mut scratch = [0u8; PACKED_MAX_LEN];
        let len = packed::encode(value, &mut scratch);
        // SAFETY: forwarded contract, `len == encoded_len(value)`
        unsafe { self.write_bytes_unchecked(&scratch[..len]) };
    }

    /// Writes a zig-zag packed `i64` without a bounds check.
    ///
    /// # Safety
    ///
    /// As [`write_u64_packed_unchecked`](Self::write_u64_packed_unchecked)
    /// for the zig-zag mapped value.
    #[inline]
    pub unsafe fn write_i64_packed_unchecked(&mut self, value: i64) {
        // SAFETY: forwarded contract
        unsafe { self.write_u64_packed_unchecked(packed::zigzag_encode(value)) };
    }

    // =========================================================================
    // Copies between writers
    // =========================================================================

    /// Appends this writer's consumed region to `target`.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedOperation`] when `target` lacks room.
    pub fn copy_to(&self, target: &mut NativeWriter) -> CodecResult<()> {
        target.write_bytes(self.as_slice())
    }

    /// Appends `source`'s consumed region to this writer.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedOperation`] when this writer lacks room.
    pub fn copy_from(&mut self, source: &NativeWriter) -> CodecResult<()> {
        self.write_bytes(source.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BitBuffer;
    use crate::codec::BitWriter;
    use bitwire_shared::Vector3;

    #[test]
    fn test_packed_matches_bit_writer() {
        let values = [0u64, 240, 241, 2287, 2288, 67823, 67824, 1 << 40, u64::MAX];
        let mut native = NativeWriter::new(values.len() * PACKED_MAX_LEN + 64);
        let mut buffer = BitBuffer::new();
        let mut writer = BitWriter::new(&mut buffer);
        for &v in &values {
            native.write_u64_packed(v).unwrap();
            writer.write_u64_packed(v).unwrap();
        }
        native.write_i32_packed(-31934).unwrap();
        writer.write_i32_packed(-31934).unwrap();
        native.write_f32_packed(1.5).unwrap();
        writer.write_f32_packed(1.5).unwrap();
        native.write_char_packed('\u{e9}').unwrap();
        writer.write_char_packed('\u{e9}').unwrap();
        assert_eq!(native.as_slice(), buffer.as_slice());
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut native = NativeWriter::new(3);
        native.write_byte(1).unwrap();
        assert!(native.write_u64_packed(67824).is_err());
        assert_eq!(native.position(), 1);
        native.write_u64_packed(67823).unwrap();
        assert_eq!(native.remaining(), 0);
        assert!(native.write_byte(0).is_err());
    }

    #[test]
    fn test_reserve_then_unchecked() {
        let mut native = NativeWriter::new(32);
        native.try_reserve(1 + PACKED_MAX_LEN + 12).unwrap();
        // SAFETY: reserved above
        unsafe {
            native.write_byte_unchecked(0xAA);
            native.write_i64_packed_unchecked(-1);
            native.write_value_unchecked(&Vector3::new(1.0, 2.0, 3.0));
        }
        assert_eq!(native.position(), 1 + 1 + 12);
        assert_eq!(&native.as_slice()[..2], &[0xAA, 1]);
        assert_eq!(&native.as_slice()[2..], bytemuck::bytes_of(&Vector3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_copy_between_writers() {
        let mut a = NativeWriter::new(8);
        a.write_bytes(&[1, 2, 3]).unwrap();
        let mut b = NativeWriter::new(8);
        b.write_byte(9).unwrap();
        a.copy_to(&mut b).unwrap();
        assert_eq!(b.to_vec(), vec![9, 1, 2, 3]);

        let mut c = NativeWriter::new(4);
        c.copy_from(&b).unwrap();
        assert!(c.copy_from(&a).is_err());
        assert_eq!(c.position(), 4);
    }

    #[test]
    fn test_seek_clamps() {
        let mut native = NativeWriter::new(4);
        native.seek(10);
        assert_eq!(native.position(), 4);
        native.reset();
        assert_eq!(native.position(), 0);
    }
}
