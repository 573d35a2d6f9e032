//! # Bit Reader
//!
//! Decodes everything [`BitWriter`](super::BitWriter) encodes.
//!
//! ## Truncated input
//!
//! Availability is checked before a value is consumed. When the input ends
//! mid-value the reader counts a failed read and then, depending on its
//! [`ReadMode`]:
//!
//! - `Strict`: returns [`CodecError::Truncated`]
//! - `Permissive`: returns zero (or the type's default)
//!
//! In both modes the cursor is returned to the start of the value.

use bitwire_shared::{Color, Color32, Quaternion, Ray, Ray2D, Vector2, Vector3, Vector4};

use crate::buffer::BitBuffer;
use crate::config::{CodecConfig, DiffLayout, ReadMode};
use crate::error::{CodecError, CodecResult};
use crate::packed;

use super::element::WireElement;
use super::writer::{check_range, ranged_steps};

/// Decoder over a borrowed [`BitBuffer`].
pub struct BitReader<'a> {
    buffer: &'a mut BitBuffer,
    read_mode: ReadMode,
    diff_layout: DiffLayout,
    failed_reads: u32,
}

macro_rules! fixed_reads {
    ($($(#[$doc:meta])* $name:ident: $ty:ty;)*) => {
        $(
            $(#[$doc])*
            ///
            /// # Errors
            ///
            /// [`CodecError::Truncated`] in strict mode when the input ends.
            #[inline]
            pub fn $name(&mut self) -> CodecResult<$ty> {
                self.read_le().map(<$ty>::from_le_bytes)
            }
        )*
    };
}

macro_rules! packed_reads {
    ($($(#[$doc:meta])* $name:ident: $ty:ty => $via:ident;)*) => {
        $(
            $(#[$doc])*
            ///
            /// # Errors
            ///
            /// [`CodecError::Truncated`] in strict mode when the input ends;
            /// [`CodecError::InvalidData`] when the value does not fit.
            #[inline]
            pub fn $name(&mut self) -> CodecResult<$ty> {
                let wide = self.$via()?;
                <$ty>::try_from(wide)
                    .map_err(|_| CodecError::InvalidData("packed value exceeds its declared width"))
            }
        )*
    };
}

macro_rules! float_group_reads {
    ($($(#[$doc:meta])* $ty:ident => $fixed:ident / $packed:ident [$($part:ident),+; $n:literal] => $build:expr;)*) => {
        $(
            $(#[$doc])*
            /// Fixed floats.
            ///
            /// # Errors
            ///
            /// [`CodecError::Truncated`] in strict mode when the input ends.
            pub fn $fixed(&mut self) -> CodecResult<$ty> {
                let [$($part),+] = self.read_f32s::<$n>()?;
                Ok($build)
            }

            $(#[$doc])*
            /// Packed floats.
            ///
            /// # Errors
            ///
            /// [`CodecError::Truncated`] in strict mode when the input ends.
            pub fn $packed(&mut self) -> CodecResult<$ty> {
                self.atomic(|reader| {
                    $(let $part = reader.read_f32_packed()?;)+
                    Ok($build)
                })
            }
        )*
    };
}

impl<'a> BitReader<'a> {
    /// Creates a strict reader with the default diff layout.
    #[must_use]
    pub fn new(buffer: &'a mut BitBuffer) -> Self {
        Self::with_config(buffer, &CodecConfig::default())
    }

    /// Creates a reader using `config`'s read mode and diff layout.
    #[must_use]
    pub fn with_config(buffer: &'a mut BitBuffer, config: &CodecConfig) -> Self {
        Self {
            buffer,
            read_mode: config.read_mode,
            diff_layout: config.diff_layout,
            failed_reads: 0,
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

    /// Truncated-read policy.
    #[inline]
    #[must_use]
    pub const fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    /// Diff layout expected by the diff readers.
    #[inline]
    #[must_use]
    pub const fn diff_layout(&self) -> DiffLayout {
        self.diff_layout
    }

    /// Number of reads that ran past the end of the input.
    #[inline]
    #[must_use]
    pub const fn failed_reads(&self) -> u32 {
        self.failed_reads
    }

    /// Whether any read ran past the end of the input.
    #[inline]
    #[must_use]
    pub const fn has_failed_reads(&self) -> bool {
        self.failed_reads > 0
    }

    /// Clears the failed-read counter.
    pub fn reset_failed_reads(&mut self) {
        self.failed_reads = 0;
    }

    // =========================================================================
    // Failure handling
    // =========================================================================

    /// Records a truncated read of `needed_bits` starting at `start` and
    /// rewinds there. Layered decoders call this when a length they read
    /// cannot be satisfied by the remaining input.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode; permissive mode only counts.
    pub fn truncated(&mut self, start: usize, needed_bits: usize) -> CodecResult<()> {
        self.buffer.set_bit_position(start);
        let available_bits = self.buffer.remaining_bits();
        self.failed_reads = self.failed_reads.saturating_add(1);
        tracing::warn!(
            "Truncated read at bit {}: needed {} bits, {} available",
            start,
            needed_bits,
            available_bits
        );
        match self.read_mode {
            ReadMode::Strict => Err(CodecError::Truncated { needed_bits, available_bits }),
            ReadMode::Permissive => Ok(()),
        }
    }

    /// Runs a multi-part read. If any part fails the cursor is rewound to
    /// where the read began; in permissive mode the default value is
    /// returned instead of a partial one.
    pub(crate) fn atomic<T: Default>(
        &mut self,
        read: impl FnOnce(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<T> {
        self.atomic_or_else(T::default, read)
    }

    /// As [`atomic`](Self::atomic), with `fallback` producing the permissive
    /// result.
    pub(crate) fn atomic_or_else<T>(
        &mut self,
        fallback: impl FnOnce() -> T,
        read: impl FnOnce(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<T> {
        let start = self.buffer.bit_position();
        let failures = self.failed_reads;
        match read(self) {
            Ok(value) if self.failed_reads == failures => Ok(value),
            Ok(_) => {
                self.buffer.set_bit_position(start);
                Ok(fallback())
            }
            Err(err) => {
                self.buffer.set_bit_position(start);
                Err(err)
            }
        }
    }

    fn read_le<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut bytes = [0u8; N];
        if self.buffer.remaining_bits() < N * 8 {
            let start = self.buffer.bit_position();
            self.truncated(start, N * 8)?;
            return Ok(bytes);
        }
        self.buffer.read(&mut bytes);
        Ok(bytes)
    }

    // =========================================================================
    // Bits and bytes
    // =========================================================================

    /// Reads a single-bit boolean.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.buffer.read_bit() {
            Some(bit) => Ok(bit),
            None => {
                let start = self.buffer.bit_position();
                self.truncated(start, 1)?;
                Ok(false)
            }
        }
    }

    /// Reads `count` bits (at most 64).
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidArgument`] for more than 64 bits;
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    pub fn read_bits(&mut self, count: usize) -> CodecResult<u64> {
        if count > 64 {
            return Err(CodecError::InvalidArgument("cannot read more than 64 bits"));
        }
        match self.buffer.read_bits(count) {
            Some(value) => Ok(value),
            None => {
                let start = self.buffer.bit_position();
                self.truncated(start, count)?;
                Ok(0)
            }
        }
    }

    /// Reads four bits.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_nibble(&mut self) -> CodecResult<u8> {
        self.read_bits(4).map(|nibble| nibble as u8)
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    #[inline]
    pub fn read_byte(&mut self) -> CodecResult<u8> {
        self.read_le::<1>().map(|[byte]| byte)
    }

    /// Fills `out` completely, or not at all.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when fewer bytes remain;
    /// permissive mode zero-fills `out`.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> CodecResult<()> {
        if self.buffer.remaining_bits() < out.len() * 8 {
            let start = self.buffer.bit_position();
            self.truncated(start, out.len() * 8)?;
            out.fill(0);
            return Ok(());
        }
        self.buffer.read(out);
        Ok(())
    }

    /// Reads as many whole bytes as remain, up to `out.len()`. Never fails.
    pub fn read_available(&mut self, out: &mut [u8]) -> usize {
        self.buffer.read(out)
    }

    /// Reads an unsigned byte.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    #[inline]
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        self.read_byte()
    }

    /// Reads a signed byte.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    #[inline]
    pub fn read_i8(&mut self) -> CodecResult<i8> {
        self.read_le().map(i8::from_le_bytes)
    }

    /// Skips to the next byte boundary.
    #[inline]
    pub fn skip_pad_bits(&mut self) {
        self.buffer.skip_pad_bits();
    }

    fixed_reads! {
        /// Reads a little-endian `i16`.
        read_i16: i16;
        /// Reads a little-endian `u16`.
        read_u16: u16;
        /// Reads a little-endian `i32`.
        read_i32: i32;
        /// Reads a little-endian `u32`.
        read_u32: u32;
        /// Reads a little-endian `i64`.
        read_i64: i64;
        /// Reads a little-endian `u64`.
        read_u64: u64;
        /// Reads a little-endian `f32`.
        read_f32: f32;
        /// Reads a little-endian `f64`.
        read_f64: f64;
    }

    // =========================================================================
    // Packed integers
    // =========================================================================

    /// Reads a packed `u64`.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the header or any of its
    /// extra bytes is missing.
    pub fn read_u64_packed(&mut self) -> CodecResult<u64> {
        let start = self.buffer.bit_position();
        let Some(header) = self.buffer.read_byte() else {
            self.truncated(start, 8)?;
            return Ok(0);
        };
        let extra = packed::extra_bytes(header);
        if self.buffer.remaining_bits() < extra * 8 {
            self.truncated(start, (extra + 1) * 8)?;
            return Ok(0);
        }
        let mut tail = [0u8; 8];
        self.buffer.read(&mut tail[..extra]);
        Ok(packed::decode(header, &tail[..extra]))
    }

    /// Reads a zig-zag packed `i64`.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    #[inline]
    pub fn read_i64_packed(&mut self) -> CodecResult<i64> {
        self.read_u64_packed().map(packed::zigzag_decode)
    }

    packed_reads! {
        /// Reads a packed `u16`.
        read_u16_packed: u16 => read_u64_packed;
        /// Reads a packed `u32`.
        read_u32_packed: u32 => read_u64_packed;
        /// Reads a zig-zag packed `i16`.
        read_i16_packed: i16 => read_i64_packed;
        /// Reads a zig-zag packed `i32`.
        read_i32_packed: i32 => read_i64_packed;
    }

    /// Reads a packed `f32` bit pattern.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    #[inline]
    pub fn read_f32_packed(&mut self) -> CodecResult<f32> {
        self.read_u32_packed().map(f32::from_bits)
    }

    /// Reads a packed `f64` bit pattern.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    #[inline]
    pub fn read_f64_packed(&mut self) -> CodecResult<f64> {
        self.read_u64_packed().map(f64::from_bits)
    }

    /// Reads a packed character scalar value.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidData`] for values that are not Unicode scalars.
    pub fn read_char_packed(&mut self) -> CodecResult<char> {
        let scalar = self.read_u32_packed()?;
        char::from_u32(scalar).ok_or(CodecError::InvalidData("not a unicode scalar value"))
    }

    // =========================================================================
    // Ranged floats
    // =========================================================================

    /// Reads a float quantized by [`write_ranged_f32`](super::BitWriter::write_ranged_f32).
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidArgument`] for a bad range or byte count;
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_ranged_f32(&mut self, min: f32, max: f32, bytes: usize) -> CodecResult<f32> {
        self.read_ranged(f64::from(min), f64::from(max), bytes, 4)
            .map(|value| value as f32)
    }

    /// Reads a float quantized by [`write_ranged_f64`](super::BitWriter::write_ranged_f64).
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidArgument`] for a bad range or byte count;
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    pub fn read_ranged_f64(&mut self, min: f64, max: f64, bytes: usize) -> CodecResult<f64> {
        self.read_ranged(min, max, bytes, 8)
    }

    #[allow(clippy::cast_precision_loss)]
    fn read_ranged(&mut self, min: f64, max: f64, bytes: usize, max_bytes: usize) -> CodecResult<f64> {
        check_range(min, max, bytes, max_bytes)?;
        let mut raw = [0u8; 8];
        self.read_bytes(&mut raw[..bytes])?;
        let quantized = u64::from_le_bytes(raw);
        Ok(min + quantized as f64 / ranged_steps(bytes) as f64 * (max - min))
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Reads a string written by [`write_string`](super::BitWriter::write_string).
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends;
    /// [`CodecError::InvalidData`] for unpaired surrogates.
    pub fn read_string(&mut self, one_byte_chars: bool) -> CodecResult<String> {
        let mut out = String::new();
        self.read_string_into(&mut out, one_byte_chars)?;
        Ok(out)
    }

    /// Like [`read_string`](Self::read_string), reusing `out`'s allocation.
    ///
    /// # Errors
    ///
    /// As [`read_string`](Self::read_string). `out` is empty on failure.
    pub fn read_string_into(&mut self, out: &mut String, one_byte_chars: bool) -> CodecResult<()> {
        self.read_units_into(out, |reader| {
            if one_byte_chars {
                reader.read_byte().map(u16::from)
            } else {
                reader.read_u16()
            }
        })
    }

    /// Reads a string written by [`write_string_packed`](super::BitWriter::write_string_packed).
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends;
    /// [`CodecError::InvalidData`] for unpaired surrogates.
    pub fn read_string_packed(&mut self) -> CodecResult<String> {
        let mut out = String::new();
        self.read_string_packed_into(&mut out)?;
        Ok(out)
    }

    /// Like [`read_string_packed`](Self::read_string_packed), reusing `out`.
    ///
    /// # Errors
    ///
    /// As [`read_string_packed`](Self::read_string_packed). `out` is empty on
    /// failure.
    pub fn read_string_packed_into(&mut self, out: &mut String) -> CodecResult<()> {
        self.read_units_into(out, Self::read_u16_packed)
    }

    fn read_units_into(
        &mut self,
        out: &mut String,
        mut read_unit: impl FnMut(&mut Self) -> CodecResult<u16>,
    ) -> CodecResult<()> {
        out.clear();
        let units = self.atomic(|reader| {
            let start = reader.buffer.bit_position();
            let len = reader.read_length(None)?;
            if !reader.check_count(start, len, 0)? {
                return Ok(Vec::new());
            }
            let mut units = Vec::with_capacity(len);
            for _ in 0..len {
                units.push(read_unit(reader)?);
            }
            Ok(units)
        })?;
        decode_utf16_into(&units, out)
    }

    // =========================================================================
    // Math types
    // =========================================================================

    fn read_f32s<const N: usize>(&mut self) -> CodecResult<[f32; N]> {
        let mut values = [0f32; N];
        if self.buffer.remaining_bits() < N * 32 {
            let start = self.buffer.bit_position();
            self.truncated(start, N * 32)?;
            return Ok(values);
        }
        for value in &mut values {
            *value = self.read_f32()?;
        }
        Ok(values)
    }

    float_group_reads! {
        /// Reads x, y.
        Vector2 => read_vector2 / read_vector2_packed [x, y; 2] => Vector2::new(x, y);
        /// Reads x, y, z.
        Vector3 => read_vector3 / read_vector3_packed [x, y, z; 3] => Vector3::new(x, y, z);
        /// Reads x, y, z, w.
        Vector4 => read_vector4 / read_vector4_packed [x, y, z, w; 4] => Vector4::new(x, y, z, w);
        /// Reads r, g, b, a.
        Color => read_color / read_color_packed [r, g, b, a; 4] => Color::new(r, g, b, a);
        /// Reads origin then direction.
        Ray => read_ray / read_ray_packed [ox, oy, oz, dx, dy, dz; 6]
            => Ray::new(Vector3::new(ox, oy, oz), Vector3::new(dx, dy, dz));
        /// Reads origin then direction.
        Ray2D => read_ray2d / read_ray2d_packed [ox, oy, dx, dy; 4]
            => Ray2D::new(Vector2::new(ox, oy), Vector2::new(dx, dy));
    }

    /// Reads a four-byte color.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    pub fn read_color32(&mut self) -> CodecResult<Color32> {
        let [r, g, b, a] = self.read_le::<4>()?;
        Ok(Color32::new(r, g, b, a))
    }

    /// Reads a fixed-float quaternion.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    pub fn read_quaternion(&mut self) -> CodecResult<Quaternion> {
        let [x, y, z, w] = self.read_f32s::<4>()?;
        Ok(Quaternion::new(x, y, z, w))
    }

    /// Reads a packed rotation and rebuilds `w = sqrt(1 - x² - y² - z²)`.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    pub fn read_rotation_packed(&mut self) -> CodecResult<Quaternion> {
        self.atomic(|r| {
            let x = r.read_f32_packed()?;
            let y = r.read_f32_packed()?;
            let z = r.read_f32_packed()?;
            let w = (1.0 - x * x - y * y - z * z).max(0.0).sqrt();
            Ok(Quaternion::new(x, y, z, w))
        })
    }

    // =========================================================================
    // Arrays
    // =========================================================================

    /// Reads a packed length prefix, or returns `known_len` without reading.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends;
    /// [`CodecError::OutOfRange`] for lengths not addressable here.
    pub(crate) fn read_length(&mut self, known_len: Option<usize>) -> CodecResult<usize> {
        if let Some(len) = known_len {
            return Ok(len);
        }
        let len = self.read_u64_packed()?;
        usize::try_from(len).map_err(|_| CodecError::OutOfRange {
            what: "array length",
            value: len,
            limit: usize::MAX as u64,
        })
    }

    /// Every element takes at least one bit, so a count beyond the remaining
    /// bits cannot be satisfied.
    fn check_count(&mut self, start: usize, count: usize, free: usize) -> CodecResult<bool> {
        if count > free.saturating_add(self.buffer.remaining_bits()) {
            self.truncated(start, count - free)?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Reads an array written by [`write_array`](super::BitWriter::write_array).
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    pub fn read_array<T: WireElement>(&mut self, known_len: Option<usize>) -> CodecResult<Vec<T>> {
        self.read_array_by(known_len, T::read_fixed)
    }

    /// Reads an array written by [`write_array_packed`](super::BitWriter::write_array_packed).
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends;
    /// [`CodecError::InvalidData`] for out-of-width elements.
    pub fn read_array_packed<T: WireElement>(&mut self, known_len: Option<usize>) -> CodecResult<Vec<T>> {
        self.read_array_by(known_len, T::read_packed)
    }

    fn read_array_by<T>(
        &mut self,
        known_len: Option<usize>,
        mut read_one: impl FnMut(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<Vec<T>> {
        self.atomic(|reader| {
            let start = reader.buffer.bit_position();
            let len = reader.read_length(known_len)?;
            if !reader.check_count(start, len, 0)? {
                return Ok(Vec::new());
            }
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(read_one(reader)?);
            }
            Ok(values)
        })
    }

    /// Reads a byte array written by [`write_byte_array`](super::BitWriter::write_byte_array).
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] in strict mode when the input ends.
    pub fn read_byte_array(&mut self, known_len: Option<usize>) -> CodecResult<Vec<u8>> {
        self.atomic(|reader| {
            let start = reader.buffer.bit_position();
            let len = reader.read_length(known_len)?;
            if reader.buffer.remaining_bits() / 8 < len {
                reader.truncated(start, len.saturating_mul(8))?;
                return Ok(Vec::new());
            }
            let mut bytes = vec![0; len];
            reader.buffer.read(&mut bytes);
            Ok(bytes)
        })
    }
}

/// Appends UTF-16 `units` to `out`.
pub(crate) fn decode_utf16_into(units: &[u16], out: &mut String) -> CodecResult<()> {
    for decoded in char::decode_utf16(units.iter().copied()) {
        match decoded {
            Ok(c) => out.push(c),
            Err(_) => {
                out.clear();
                return Err(CodecError::InvalidData("unpaired utf-16 surrogate"));
            }
        }
    }
    Ok(())
}
