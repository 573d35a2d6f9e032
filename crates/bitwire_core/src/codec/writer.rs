//! # Bit Writer
//!
//! Encodes primitives, packed integers, strings, math types and arrays into
//! a [`BitBuffer`]. Every method has a mirror on [`BitReader`](super::BitReader).
//!
//! Fixed-width values are little-endian and need no alignment. Single
//! primitive writes are all-or-nothing on a fixed buffer.

use bitwire_shared::constants::PACKED_MAX_LEN;
use bitwire_shared::{Color, Color32, Quaternion, Ray, Ray2D, Vector2, Vector3, Vector4};

use crate::buffer::BitBuffer;
use crate::config::{CodecConfig, DiffLayout};
use crate::error::{CodecError, CodecResult};
use crate::packed;

use super::element::WireElement;
use super::reader::BitReader;

/// Largest quantized value of a ranged float stored in `bytes` bytes.
#[inline]
pub(crate) const fn ranged_steps(bytes: usize) -> u64 {
    if bytes >= 8 {
        u64::MAX
    } else {
        (1u64 << (bytes * 8)) - 1
    }
}

/// Validates a ranged-float range and byte count.
pub(crate) fn check_range(min: f64, max: f64, bytes: usize, max_bytes: usize) -> CodecResult<()> {
    if bytes == 0 || bytes > max_bytes {
        return Err(CodecError::InvalidArgument("ranged value byte count out of bounds"));
    }
    if min.is_nan() || max.is_nan() || min >= max {
        return Err(CodecError::InvalidArgument("range minimum must be below its maximum"));
    }
    Ok(())
}

/// Encoder over a borrowed [`BitBuffer`].
pub struct BitWriter<'a> {
    buffer: &'a mut BitBuffer,
    diff_layout: DiffLayout,
}

macro_rules! fixed_writes {
    ($($(#[$doc:meta])* $name:ident: $ty:ty;)*) => {
        $(
            $(#[$doc])*
            ///
            /// # Errors
            ///
            /// Fails when a fixed buffer cannot hold the value.
            #[inline]
            pub fn $name(&mut self, value: $ty) -> CodecResult<()> {
                self.buffer.write_bytes(&value.to_le_bytes())
            }
        )*
    };
}

macro_rules! packed_writes {
    ($($(#[$doc:meta])* $name:ident: $ty:ty => $via:ident;)*) => {
        $(
            $(#[$doc])*
            ///
            /// # Errors
            ///
            /// Fails when a fixed buffer cannot hold the encoding.
            #[inline]
            pub fn $name(&mut self, value: $ty) -> CodecResult<()> {
                self.$via(value.into())
            }
        )*
    };
}

macro_rules! float_group_writes {
    ($($(#[$doc:meta])* $ty:ident => $fixed:ident / $packed:ident [$($($field:ident).+),+];)*) => {
        $(
            $(#[$doc])*
            /// Fixed floats.
            ///
            /// # Errors
            ///
            /// Fails when a fixed buffer cannot hold the value.
            pub fn $fixed(&mut self, value: $ty) -> CodecResult<()> {
                self.write_f32s([$(value.$($field).+),+])
            }

            $(#[$doc])*
            /// Packed floats.
            ///
            /// # Errors
            ///
            /// Fails when a fixed buffer is full.
            pub fn $packed(&mut self, value: $ty) -> CodecResult<()> {
                $(self.write_f32_packed(value.$($field).+)?;)+
                Ok(())
            }
        )*
    };
}

impl<'a> BitWriter<'a> {
    /// Creates a writer with the default configuration.
    #[must_use]
    pub fn new(buffer: &'a mut BitBuffer) -> Self {
        Self {
            buffer,
            diff_layout: DiffLayout::default(),
        }
    }

    /// Creates a writer using `config`'s diff layout.
    #[must_use]
    pub fn with_config(buffer: &'a mut BitBuffer, config: &CodecConfig) -> Self {
        Self {
            buffer,
            diff_layout: config.diff_layout,
        }
    }

    /// The underlying buffer.
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &BitBuffer {
        self.buffer
    }

    /// The underlying buffer, mutably.
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut BitBuffer {
        self.buffer
    }

    /// Diff layout used by the diff writers.
    #[inline]
    #[must_use]
    pub const fn diff_layout(&self) -> DiffLayout {
        self.diff_layout
    }

    // =========================================================================
    // Bits and bytes
    // =========================================================================

    /// Writes a boolean as a single bit.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    #[inline]
    pub fn write_bool(&mut self, value: bool) -> CodecResult<()> {
        self.buffer.write_bit(value)
    }

    /// Writes the low `count` bits of `value`.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidArgument`] for more than 64 bits; fails when a
    /// fixed buffer is full.
    #[inline]
    pub fn write_bits(&mut self, value: u64, count: usize) -> CodecResult<()> {
        self.buffer.write_bits(value, count)
    }

    /// Writes the low four bits of `value`.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    #[inline]
    pub fn write_nibble(&mut self, value: u8) -> CodecResult<()> {
        self.buffer.write_bits(u64::from(value & 0x0F), 4)
    }

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    #[inline]
    pub fn write_byte(&mut self, value: u8) -> CodecResult<()> {
        self.buffer.write_byte(value)
    }

    /// Writes raw bytes with no length prefix.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer cannot hold every byte.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.buffer.write_bytes(bytes)
    }

    /// Writes an unsigned byte.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> CodecResult<()> {
        self.buffer.write_byte(value)
    }

    /// Writes a signed byte (two's complement).
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    #[inline]
    pub fn write_i8(&mut self, value: i8) -> CodecResult<()> {
        self.buffer.write_byte(value.to_le_bytes()[0])
    }

    /// Writes zero bits up to the next byte boundary.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    #[inline]
    pub fn pad(&mut self) -> CodecResult<()> {
        self.buffer.pad_buffer()
    }

    fixed_writes! {
        /// Writes an `i16`, little-endian.
        write_i16: i16;
        /// Writes a `u16`, little-endian.
        write_u16: u16;
        /// Writes an `i32`, little-endian.
        write_i32: i32;
        /// Writes a `u32`, little-endian.
        write_u32: u32;
        /// Writes an `i64`, little-endian.
        write_i64: i64;
        /// Writes a `u64`, little-endian.
        write_u64: u64;
        /// Writes an `f32` as its IEEE-754 bits, little-endian.
        write_f32: f32;
        /// Writes an `f64` as its IEEE-754 bits, little-endian.
        write_f64: f64;
    }

    // =========================================================================
    // Packed integers
    // =========================================================================

    /// Writes a `u64` in the packed encoding.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer cannot hold the encoding. Nothing is
    /// written in that case.
    pub fn write_u64_packed(&mut self, value: u64) -> CodecResult<()> {
        let mut scratch = [0u8; PACKED_MAX_LEN];
        let len = packed::encode(value, &mut scratch);
        self.buffer.write_bytes(&scratch[..len])
    }

    /// Writes an `i64` zig-zag mapped, then packed.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer cannot hold the encoding.
    #[inline]
    pub fn write_i64_packed(&mut self, value: i64) -> CodecResult<()> {
        self.write_u64_packed(packed::zigzag_encode(value))
    }

    packed_writes! {
        /// Writes a `u16` packed.
        write_u16_packed: u16 => write_u64_packed;
        /// Writes a `u32` packed.
        write_u32_packed: u32 => write_u64_packed;
        /// Writes an `i16` zig-zag mapped, then packed.
        write_i16_packed: i16 => write_i64_packed;
        /// Writes an `i32` zig-zag mapped, then packed.
        write_i32_packed: i32 => write_i64_packed;
    }

    /// Writes an `f32` as its bit pattern, packed.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer cannot hold the encoding.
    #[inline]
    pub fn write_f32_packed(&mut self, value: f32) -> CodecResult<()> {
        self.write_u32_packed(value.to_bits())
    }

    /// Writes an `f64` as its bit pattern, packed.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer cannot hold the encoding.
    #[inline]
    pub fn write_f64_packed(&mut self, value: f64) -> CodecResult<()> {
        self.write_u64_packed(value.to_bits())
    }

    /// Writes a character's scalar value, packed.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer cannot hold the encoding.
    #[inline]
    pub fn write_char_packed(&mut self, value: char) -> CodecResult<()> {
        self.write_u32_packed(u32::from(value))
    }

    // =========================================================================
    // Ranged floats
    // =========================================================================

    /// Quantizes `value` within `[min, max]` into `bytes` bytes (1 to 4).
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidArgument`] when `bytes` is out of bounds, the
    /// range is empty or `value` lies outside it.
    pub fn write_ranged_f32(&mut self, value: f32, min: f32, max: f32, bytes: usize) -> CodecResult<()> {
        self.write_ranged(f64::from(value), f64::from(min), f64::from(max), bytes, 4)
    }

    /// Quantizes `value` within `[min, max]` into `bytes` bytes (1 to 8).
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidArgument`] when `bytes` is out of bounds, the
    /// range is empty or `value` lies outside it.
    pub fn write_ranged_f64(&mut self, value: f64, min: f64, max: f64, bytes: usize) -> CodecResult<()> {
        self.write_ranged(value, min, max, bytes, 8)
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn write_ranged(&mut self, value: f64, min: f64, max: f64, bytes: usize, max_bytes: usize) -> CodecResult<()> {
        check_range(min, max, bytes, max_bytes)?;
        if !(min..=max).contains(&value) {
            return Err(CodecError::InvalidArgument("ranged value outside its range"));
        }
        let steps = ranged_steps(bytes);
        // saturating cast: the top of the range maps onto `steps`
        let quantized = ((value - min) / (max - min) * steps as f64).round() as u64;
        self.buffer.write_bytes(&quantized.min(steps).to_le_bytes()[..bytes])
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Writes a packed UTF-16 length followed by the code units: two bytes
    /// each, or one byte each when `one_byte_chars` is set.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidArgument`] when `one_byte_chars` is set and a
    /// code unit exceeds `0xFF`; [`CodecError::OutOfRange`] for strings
    /// longer than `u32::MAX` units.
    pub fn write_string(&mut self, value: &str, one_byte_chars: bool) -> CodecResult<()> {
        if one_byte_chars {
            check_one_byte_units(value)?;
        }
        self.write_utf16_len(value)?;
        for unit in value.encode_utf16() {
            if one_byte_chars {
                self.buffer.write_byte(unit.to_le_bytes()[0])?;
            } else {
                self.write_u16(unit)?;
            }
        }
        Ok(())
    }

    /// Writes a packed UTF-16 length followed by packed code units.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfRange`] for strings longer than `u32::MAX` units.
    pub fn write_string_packed(&mut self, value: &str) -> CodecResult<()> {
        self.write_utf16_len(value)?;
        for unit in value.encode_utf16() {
            self.write_u16_packed(unit)?;
        }
        Ok(())
    }

    fn write_utf16_len(&mut self, value: &str) -> CodecResult<()> {
        let units = value.encode_utf16().count();
        let len = u32::try_from(units).map_err(|_| CodecError::OutOfRange {
            what: "string length",
            value: units as u64,
            limit: u64::from(u32::MAX),
        })?;
        self.write_u32_packed(len)
    }

    // =========================================================================
    // Math types
    // =========================================================================

    float_group_writes! {
        /// Writes x, y.
        Vector2 => write_vector2 / write_vector2_packed [x, y];
        /// Writes x, y, z.
        Vector3 => write_vector3 / write_vector3_packed [x, y, z];
        /// Writes x, y, z, w.
        Vector4 => write_vector4 / write_vector4_packed [x, y, z, w];
        /// Writes r, g, b, a.
        Color => write_color / write_color_packed [r, g, b, a];
        /// Writes origin then direction.
        Ray => write_ray / write_ray_packed
            [origin.x, origin.y, origin.z, direction.x, direction.y, direction.z];
        /// Writes origin then direction.
        Ray2D => write_ray2d / write_ray2d_packed [origin.x, origin.y, direction.x, direction.y];
    }

    /// Writes r, g, b, a as one byte each.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer cannot hold the value.
    pub fn write_color32(&mut self, value: Color32) -> CodecResult<()> {
        self.buffer.write_bytes(&[value.r, value.g, value.b, value.a])
    }

    /// Writes x, y, z, w as fixed floats.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer cannot hold the value.
    pub fn write_quaternion(&mut self, value: Quaternion) -> CodecResult<()> {
        self.write_f32s([value.x, value.y, value.z, value.w])
    }

    /// Consecutive fixed floats, all-or-nothing on a fixed buffer.
    fn write_f32s<const N: usize>(&mut self, values: [f32; N]) -> CodecResult<()> {
        self.buffer.reserve_bits(N * 32)?;
        values.into_iter().try_for_each(|value| self.write_f32(value))
    }

    /// Writes a unit rotation as three packed floats.
    ///
    /// `w` is dropped and rebuilt by the reader, so the rotation must be
    /// normalized. Rotations with a negative `w` are sent as their negation.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    pub fn write_rotation_packed(&mut self, value: Quaternion) -> CodecResult<()> {
        let rotation = value.canonical();
        self.write_f32_packed(rotation.x)?;
        self.write_f32_packed(rotation.y)?;
        self.write_f32_packed(rotation.z)
    }

    // =========================================================================
    // Arrays
    // =========================================================================

    /// Writes the length prefix of an array unless the reader already knows
    /// it. Returns the element count to write.
    pub(crate) fn write_length_prefix(&mut self, len: usize, known_len: Option<usize>) -> CodecResult<usize> {
        match known_len {
            Some(count) if count > len => Err(CodecError::OutOfRange {
                what: "known length",
                value: count as u64,
                limit: len as u64,
            }),
            Some(count) => Ok(count),
            None => {
                self.write_u64_packed(len as u64)?;
                Ok(len)
            }
        }
    }

    /// Writes a packed length (omitted when `known_len` is given) and then
    /// each element at fixed width.
    ///
    /// With a known length only the first `known_len` elements are written.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfRange`] when `known_len` exceeds the slice; fails
    /// when a fixed buffer is full.
    pub fn write_array<T: WireElement>(&mut self, values: &[T], known_len: Option<usize>) -> CodecResult<()> {
        let count = self.write_length_prefix(values.len(), known_len)?;
        values[..count].iter().try_for_each(|&value| value.write_fixed(self))
    }

    /// Like [`write_array`](Self::write_array) with packed elements.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfRange`] when `known_len` exceeds the slice; fails
    /// when a fixed buffer is full.
    pub fn write_array_packed<T: WireElement>(&mut self, values: &[T], known_len: Option<usize>) -> CodecResult<()> {
        let count = self.write_length_prefix(values.len(), known_len)?;
        values[..count].iter().try_for_each(|&value| value.write_packed(self))
    }

    /// Writes a packed length (omitted when `known_len` is given) and the
    /// raw bytes.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfRange`] when `known_len` exceeds the slice; fails
    /// when a fixed buffer is full.
    pub fn write_byte_array(&mut self, bytes: &[u8], known_len: Option<usize>) -> CodecResult<()> {
        let count = self.write_length_prefix(bytes.len(), known_len)?;
        self.buffer.write_bytes(&bytes[..count])
    }

    /// Moves up to `count` whole bytes from `reader` into this writer and
    /// returns how many were moved.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full; bytes already moved stay written.
    pub fn read_and_write(&mut self, reader: &mut BitReader<'_>, count: usize) -> CodecResult<usize> {
        let mut chunk = [0u8; 64];
        let mut moved = 0;
        while moved < count {
            let want = (count - moved).min(chunk.len());
            let got = reader.read_available(&mut chunk[..want]);
            if got == 0 {
                break;
            }
            self.buffer.write_bytes(&chunk[..got])?;
            moved += got;
        }
        Ok(moved)
    }
}

/// One-byte character mode keeps only the low byte of each code unit.
pub(crate) fn check_one_byte_units(value: &str) -> CodecResult<()> {
    if value.encode_utf16().any(|unit| unit > 0xFF) {
        return Err(CodecError::InvalidArgument("one-byte characters require code units up to 0xFF"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_little_endian() {
        let mut buffer = BitBuffer::new();
        let mut writer = BitWriter::new(&mut buffer);
        writer.write_u16(0x1234).unwrap();
        writer.write_i32(-2).unwrap();
        assert_eq!(buffer.as_slice(), &[0x34, 0x12, 0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_packed_signed_values() {
        let mut buffer = BitBuffer::new();
        let mut writer = BitWriter::new(&mut buffer);
        writer.write_i16_packed(-31934).unwrap();
        writer.write_u16_packed(64893).unwrap();
        // zigzag(-31934) = 63867, both land in the two-extra-byte tier
        assert_eq!(&buffer.as_slice()[..3], &[249, 0xF0, 0x8B]);
        assert_eq!(&buffer.as_slice()[3..], &[249, 0xF4, 0x8D]);
    }

    #[test]
    fn test_ranged_rejects_bad_arguments() {
        let mut buffer = BitBuffer::new();
        let mut writer = BitWriter::new(&mut buffer);
        assert!(writer.write_ranged_f32(0.5, 0.0, 1.0, 0).is_err());
        assert!(writer.write_ranged_f32(0.5, 0.0, 1.0, 5).is_err());
        assert!(writer.write_ranged_f64(0.5, 0.0, 1.0, 9).is_err());
        assert!(writer.write_ranged_f32(1.5, 0.0, 1.0, 2).is_err());
        assert!(writer.write_ranged_f32(f32::NAN, 0.0, 1.0, 2).is_err());
        assert!(writer.write_ranged_f32(0.0, 1.0, 1.0, 2).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_ranged_extremes() {
        let mut buffer = BitBuffer::new();
        let mut writer = BitWriter::new(&mut buffer);
        writer.write_ranged_f32(-10.0, -10.0, 10.0, 2).unwrap();
        writer.write_ranged_f32(10.0, -10.0, 10.0, 2).unwrap();
        writer.write_ranged_f64(1.0, 0.0, 1.0, 8).unwrap();
        assert_eq!(&buffer.as_slice()[..4], &[0, 0, 0xFF, 0xFF]);
        assert_eq!(&buffer.as_slice()[4..], &[0xFF; 8]);
    }

    #[test]
    fn test_one_byte_strings_reject_wide_units() {
        let mut buffer = BitBuffer::new();
        let mut writer = BitWriter::new(&mut buffer);
        assert!(writer.write_string("snow \u{2744}", true).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_known_length_omits_prefix() {
        let mut buffer = BitBuffer::new();
        let mut writer = BitWriter::new(&mut buffer);
        writer.write_byte_array(&[7, 8, 9], Some(2)).unwrap();
        assert_eq!(buffer.as_slice(), &[7, 8]);

        let mut buffer = BitBuffer::new();
        let mut writer = BitWriter::new(&mut buffer);
        assert!(writer.write_array(&[1i32, 2], Some(3)).is_err());
    }
}
