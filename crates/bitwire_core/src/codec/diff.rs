//! # Diff Codec
//!
//! Encodes an array (or string) against a previous version of itself.
//!
//! ```text
//! premap:       [len][b0 b1 .. b(k-1)][payloads of changed / appended]
//! interleaved:  [len][b0 p0?][b1 p1?] .. [b(k-1) p(k-1)?][appended payloads]
//!
//! k = min(new.len, old.len), bit set = element changed
//! ```
//!
//! Elements past the old length are always sent. Unchanged arrays cost the
//! length plus `k` bits. The length is omitted when both sides know it.

use crate::config::DiffLayout;
use crate::error::CodecResult;

use super::element::WireElement;
use super::reader::{decode_utf16_into, BitReader};
use super::writer::{check_one_byte_units, BitWriter};

/// Payload encoding of UTF-16 code units in string diffs.
#[derive(Clone, Copy)]
enum UnitCodec {
    Fixed,
    OneByte,
    Packed,
}

impl UnitCodec {
    const fn new(one_byte_chars: bool) -> Self {
        if one_byte_chars {
            Self::OneByte
        } else {
            Self::Fixed
        }
    }

    fn write(self, writer: &mut BitWriter<'_>, unit: u16) -> CodecResult<()> {
        match self {
            Self::Fixed => writer.write_u16(unit),
            Self::OneByte => writer.write_byte(unit.to_le_bytes()[0]),
            Self::Packed => writer.write_u16_packed(unit),
        }
    }

    fn read(self, reader: &mut BitReader<'_>) -> CodecResult<u16> {
        match self {
            Self::Fixed => reader.read_u16(),
            Self::OneByte => reader.read_byte().map(u16::from),
            Self::Packed => reader.read_u16_packed(),
        }
    }
}

// =============================================================================
// Writing
// =============================================================================

impl BitWriter<'_> {
    /// Writes `new` as a diff against `old` with fixed-width payloads.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfRange`](crate::CodecError::OutOfRange) when
    /// `known_len` exceeds `new`; fails when a fixed buffer is full.
    pub fn write_array_diff<T: WireElement>(
        &mut self,
        new: &[T],
        old: &[T],
        known_len: Option<usize>,
    ) -> CodecResult<()> {
        self.write_diff_by(new, old, known_len, |writer, value| value.write_fixed(writer))
    }

    /// Writes `new` as a diff against `old` with packed payloads.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfRange`](crate::CodecError::OutOfRange) when
    /// `known_len` exceeds `new`; fails when a fixed buffer is full.
    pub fn write_array_packed_diff<T: WireElement>(
        &mut self,
        new: &[T],
        old: &[T],
        known_len: Option<usize>,
    ) -> CodecResult<()> {
        self.write_diff_by(new, old, known_len, |writer, value| value.write_packed(writer))
    }

    /// Writes `new` as a diff against `old` over UTF-16 code units, two
    /// bytes per changed unit or one when `one_byte_chars` is set.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidArgument`](crate::CodecError::InvalidArgument)
    /// when `one_byte_chars` is set and `new` holds a unit above `0xFF`;
    /// fails when a fixed buffer is full.
    pub fn write_string_diff(&mut self, new: &str, old: &str, one_byte_chars: bool) -> CodecResult<()> {
        if one_byte_chars {
            check_one_byte_units(new)?;
        }
        self.write_units_diff(new, old, UnitCodec::new(one_byte_chars))
    }

    /// Writes `new` as a diff against `old` with packed code units.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    pub fn write_string_packed_diff(&mut self, new: &str, old: &str) -> CodecResult<()> {
        self.write_units_diff(new, old, UnitCodec::Packed)
    }

    fn write_units_diff(&mut self, new: &str, old: &str, codec: UnitCodec) -> CodecResult<()> {
        let new: Vec<u16> = new.encode_utf16().collect();
        let old: Vec<u16> = old.encode_utf16().collect();
        self.write_diff_by(&new, &old, None, |writer, unit| codec.write(writer, unit))
    }

    fn write_diff_by<T: Copy + PartialEq>(
        &mut self,
        new: &[T],
        old: &[T],
        known_len: Option<usize>,
        mut write_one: impl FnMut(&mut Self, T) -> CodecResult<()>,
    ) -> CodecResult<()> {
        let count = self.write_length_prefix(new.len(), known_len)?;
        let new = &new[..count];
        let shared = count.min(old.len());
        let changed = |i: usize| i >= old.len() || new[i] != old[i];

        match self.diff_layout() {
            DiffLayout::Premap => {
                for i in 0..shared {
                    self.write_bool(changed(i))?;
                }
                for (i, &value) in new.iter().enumerate() {
                    if changed(i) {
                        write_one(self, value)?;
                    }
                }
            }
            DiffLayout::Interleaved => {
                for (i, &value) in new.iter().enumerate() {
                    let is_changed = changed(i);
                    if i < shared {
                        self.write_bool(is_changed)?;
                    }
                    if is_changed {
                        write_one(self, value)?;
                    }
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Reading
// =============================================================================

impl BitReader<'_> {
    /// Rebuilds an array from a fixed-width diff against `old`.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`](crate::CodecError::Truncated) in strict mode
    /// when the input ends. A permissive reader returns `old` unchanged.
    pub fn read_array_diff<T: WireElement>(&mut self, old: &[T], known_len: Option<usize>) -> CodecResult<Vec<T>> {
        self.atomic_or_else(
            || old.to_vec(),
            |reader| {
                let mut values = old.to_vec();
                reader.read_diff_into_by(&mut values, known_len, T::read_fixed)?;
                Ok(values)
            },
        )
    }

    /// Applies a fixed-width diff to `values` in place. `values` holds the
    /// old array on entry and the new one on success.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`](crate::CodecError::Truncated) in strict mode
    /// when the input ends; `values` is then partially updated.
    pub fn read_array_diff_into<T: WireElement>(
        &mut self,
        values: &mut Vec<T>,
        known_len: Option<usize>,
    ) -> CodecResult<()> {
        self.read_diff_into_by(values, known_len, T::read_fixed)
    }

    /// Rebuilds an array from a packed diff against `old`.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`](crate::CodecError::Truncated) in strict mode
    /// when the input ends. A permissive reader returns `old` unchanged.
    pub fn read_array_packed_diff<T: WireElement>(
        &mut self,
        old: &[T],
        known_len: Option<usize>,
    ) -> CodecResult<Vec<T>> {
        self.atomic_or_else(
            || old.to_vec(),
            |reader| {
                let mut values = old.to_vec();
                reader.read_diff_into_by(&mut values, known_len, T::read_packed)?;
                Ok(values)
            },
        )
    }

    /// Applies a packed diff to `values` in place.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`](crate::CodecError::Truncated) in strict mode
    /// when the input ends; `values` is then partially updated.
    pub fn read_array_packed_diff_into<T: WireElement>(
        &mut self,
        values: &mut Vec<T>,
        known_len: Option<usize>,
    ) -> CodecResult<()> {
        self.read_diff_into_by(values, known_len, T::read_packed)
    }

    /// Rebuilds a string from a diff against `old`.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`](crate::CodecError::Truncated) in strict mode
    /// when the input ends; [`CodecError::InvalidData`](crate::CodecError::InvalidData)
    /// when the result is not valid UTF-16.
    pub fn read_string_diff(&mut self, old: &str, one_byte_chars: bool) -> CodecResult<String> {
        let mut text = old.to_owned();
        self.read_string_diff_in_place(&mut text, one_byte_chars)?;
        Ok(text)
    }

    /// Applies a string diff to `text`, reusing its allocation.
    ///
    /// # Errors
    ///
    /// As [`read_string_diff`](Self::read_string_diff). `text` is left
    /// unchanged when the diff cannot be read.
    pub fn read_string_diff_in_place(&mut self, text: &mut String, one_byte_chars: bool) -> CodecResult<()> {
        self.read_units_diff(text, UnitCodec::new(one_byte_chars))
    }

    /// Rebuilds a string from a packed diff against `old`.
    ///
    /// # Errors
    ///
    /// As [`read_string_diff`](Self::read_string_diff).
    pub fn read_string_packed_diff(&mut self, old: &str) -> CodecResult<String> {
        let mut text = old.to_owned();
        self.read_string_packed_diff_in_place(&mut text)?;
        Ok(text)
    }

    /// Applies a packed string diff to `text`, reusing its allocation.
    ///
    /// # Errors
    ///
    /// As [`read_string_diff`](Self::read_string_diff). `text` is left
    /// unchanged when the diff cannot be read.
    pub fn read_string_packed_diff_in_place(&mut self, text: &mut String) -> CodecResult<()> {
        self.read_units_diff(text, UnitCodec::Packed)
    }

    fn read_units_diff(&mut self, text: &mut String, codec: UnitCodec) -> CodecResult<()> {
        let old: Vec<u16> = text.encode_utf16().collect();
        let read = self.atomic(|reader| {
            let mut units = old.clone();
            reader.read_diff_into_by(&mut units, None, |r| codec.read(r))?;
            Ok(Some(units))
        })?;
        // permissive failure
        let Some(units) = read else {
            return Ok(());
        };
        if units == old {
            return Ok(());
        }
        let mut decoded = String::with_capacity(units.len());
        decode_utf16_into(&units, &mut decoded)?;
        text.clear();
        text.push_str(&decoded);
        Ok(())
    }

    fn read_diff_into_by<T: Copy + Default>(
        &mut self,
        values: &mut Vec<T>,
        known_len: Option<usize>,
        mut read_one: impl FnMut(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<()> {
        let start = self.buffer().bit_position();
        let old_len = values.len();
        let count = self.read_length(known_len)?;
        let shared = count.min(old_len);
        if !self.check_diff_count(start, count, old_len)? {
            values.clear();
            return Ok(());
        }

        match self.diff_layout() {
            DiffLayout::Premap => {
                let map_start = self.buffer().bit_position();
                if self.buffer().remaining_bits() < shared {
                    self.truncated(start, map_start - start + shared)?;
                    values.clear();
                    return Ok(());
                }
                let mut data = map_start + shared;
                for i in 0..count {
                    let changed = i >= old_len || self.buffer().bit_at(map_start + i) == Some(true);
                    if changed {
                        self.buffer_mut().set_bit_position(data);
                        let value = read_one(self)?;
                        data = self.buffer().bit_position();
                        store(values, i, value);
                    }
                }
                self.buffer_mut().set_bit_position(data);
            }
            DiffLayout::Interleaved => {
                for i in 0..count {
                    let changed = i >= old_len || self.read_bool()?;
                    if changed {
                        let value = read_one(self)?;
                        store(values, i, value);
                    }
                }
            }
        }
        values.truncate(count);
        Ok(())
    }

    /// Unchanged elements cost one bit and appended ones at least one, so
    /// `count` is bounded by the old length plus the remaining bits.
    fn check_diff_count(&mut self, start: usize, count: usize, old_len: usize) -> CodecResult<bool> {
        let bound = old_len.saturating_add(self.buffer().remaining_bits());
        if count > bound {
            self.truncated(start, count - old_len)?;
            return Ok(false);
        }
        Ok(true)
    }
}

#[inline]
fn store<T>(values: &mut Vec<T>, index: usize, value: T) {
    if index < values.len() {
        values[index] = value;
    } else {
        values.push(value);
    }
}
