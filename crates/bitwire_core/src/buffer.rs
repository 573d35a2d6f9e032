//! # Bit Buffer
//!
//! Seekable, bit-addressable byte store. Every codec in this crate writes
//! through a [`BitBuffer`].
//!
//! ## Layout
//!
//! Bits are filled least-significant first. A byte written at a misaligned
//! cursor straddles two stored bytes:
//!
//! ```text
//! cursor = 8*p + 3
//!
//!  target[p]          target[p+1]
//! ┌────────┬───┐     ┌───┬────────┐
//! │ v << 3 │old│     │old│ v >> 5 │
//! └────────┴───┘     └───┴────────┘
//!   bits 3..8  0..3    3..8  0..3
//! ```
//!
//! Bits outside the written range are preserved.
//!
//! ## Ownership
//!
//! Resizability is fixed at construction. Buffers created by [`BitBuffer::new`]
//! or [`BitBuffer::with_capacity`] grow geometrically; buffers over caller
//! memory ([`BitBuffer::from_fixed`], [`BitBuffer::fixed_capacity`]) never grow
//! and reject writes past their capacity.

use std::io::{self, SeekFrom};

use bitwire_shared::constants::{DEFAULT_INITIAL_CAPACITY, MIN_GROWTH_CAPACITY};

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};

/// Growable or fixed, bit-addressable byte buffer.
#[derive(Clone, Debug)]
pub struct BitBuffer {
    /// Backing storage. Its length is the capacity.
    target: Vec<u8>,
    /// Cursor, in bits.
    bit_position: usize,
    /// Highest bit position reached by a write, or set by `set_length`.
    bit_length: usize,
    /// Whether `target` may be reallocated.
    resizable: bool,
}

impl BitBuffer {
    /// Creates a growable buffer with the default initial capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_CAPACITY)
    }

    /// Creates a growable buffer with `capacity` bytes preallocated.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            target: vec![0; capacity],
            bit_position: 0,
            bit_length: 0,
            resizable: true,
        }
    }

    /// Creates a growable buffer sized by `config`.
    #[must_use]
    pub fn from_config(config: &CodecConfig) -> Self {
        Self::with_capacity(config.initial_capacity)
    }

    /// Wraps caller bytes. The buffer never grows and its length is the full
    /// slice, so the contents are immediately readable.
    #[must_use]
    pub fn from_fixed(bytes: Vec<u8>) -> Self {
        let bit_length = bytes.len() * 8;
        Self {
            target: bytes,
            bit_position: 0,
            bit_length,
            resizable: false,
        }
    }

    /// Creates an empty buffer that never grows past `capacity` bytes.
    #[must_use]
    pub fn fixed_capacity(capacity: usize) -> Self {
        Self {
            target: vec![0; capacity],
            bit_position: 0,
            bit_length: 0,
            resizable: false,
        }
    }

    // =========================================================================
    // Cursor and size accessors
    // =========================================================================

    /// Capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.target.len()
    }

    /// Whether the buffer grows on demand.
    #[inline]
    #[must_use]
    pub const fn is_resizable(&self) -> bool {
        self.resizable
    }

    /// Cursor position in whole bytes (rounded down).
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.bit_position >> 3
    }

    /// Cursor position in bits.
    #[inline]
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_position
    }

    /// Moves the cursor to byte `position`, clamped to the capacity.
    pub fn set_position(&mut self, position: usize) {
        self.set_bit_position(position.saturating_mul(8));
    }

    /// Moves the cursor to bit `bit_position`, clamped to the capacity.
    #[inline]
    pub fn set_bit_position(&mut self, bit_position: usize) {
        self.bit_position = bit_position.min(self.capacity_bits());
    }

    /// Written length in bytes (rounded up).
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bit_length.div_ceil(8)
    }

    /// Returns true if nothing has been written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bit_length == 0
    }

    /// Written length in bits.
    #[inline]
    #[must_use]
    pub const fn bit_length(&self) -> usize {
        self.bit_length
    }

    /// Whether the cursor sits on a byte boundary.
    #[inline]
    #[must_use]
    pub const fn bit_aligned(&self) -> bool {
        self.bit_position & 7 == 0
    }

    /// Whether any written bits remain after the cursor.
    #[inline]
    #[must_use]
    pub const fn has_data_to_read(&self) -> bool {
        self.bit_position < self.bit_length
    }

    /// Written bits remaining after the cursor.
    #[inline]
    #[must_use]
    pub const fn remaining_bits(&self) -> usize {
        self.bit_length.saturating_sub(self.bit_position)
    }

    /// Written bytes, including a trailing partial byte.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.target[..self.len()]
    }

    /// Copies the written bytes out.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    #[inline]
    fn capacity_bits(&self) -> usize {
        self.target.len() * 8
    }

    // =========================================================================
    // Sizing
    // =========================================================================

    /// Sets the written length in bytes, growing if needed. The cursor is
    /// pulled back when it lies past the new length.
    ///
    /// # Errors
    ///
    /// Fails with [`CodecError::UnsupportedOperation`] when `length` exceeds a
    /// fixed buffer's capacity and with [`CodecError::OutOfRange`] when it is
    /// not addressable in bits.
    pub fn set_length(&mut self, length: usize) -> CodecResult<()> {
        let bits = length.checked_mul(8).ok_or(CodecError::OutOfRange {
            what: "length",
            value: length as u64,
            limit: (usize::MAX / 8) as u64,
        })?;
        if length > self.capacity() {
            self.grow(length - self.capacity())?;
        }
        self.bit_length = bits;
        self.bit_position = self.bit_position.min(bits);
        Ok(())
    }

    /// Reallocates the backing storage to exactly `capacity` bytes.
    /// Shrinking truncates the written length and the cursor.
    ///
    /// # Errors
    ///
    /// Fails with [`CodecError::UnsupportedOperation`] on a fixed buffer.
    pub fn set_capacity(&mut self, capacity: usize) -> CodecResult<()> {
        if !self.resizable {
            tracing::warn!("Rejected resize of fixed buffer to {} bytes", capacity);
            return Err(CodecError::UnsupportedOperation("cannot resize a fixed buffer"));
        }
        self.target.resize(capacity, 0);
        let bits = self.capacity_bits();
        self.bit_length = self.bit_length.min(bits);
        self.bit_position = self.bit_position.min(bits);
        Ok(())
    }

    /// Rewinds for reuse: cursor and length return to zero and the contents
    /// are cleared. Capacity is kept.
    pub fn reset(&mut self) {
        self.target.fill(0);
        self.bit_position = 0;
        self.bit_length = 0;
    }

    /// Makes room for `bits` more bits after the cursor.
    ///
    /// # Errors
    ///
    /// Fails with [`CodecError::UnsupportedOperation`] when a fixed buffer is
    /// too small. Nothing is written in that case.
    pub fn reserve_bits(&mut self, bits: usize) -> CodecResult<()> {
        let end = self.bit_position.checked_add(bits).ok_or(CodecError::OutOfRange {
            what: "bit position",
            value: bits as u64,
            limit: (usize::MAX - self.bit_position) as u64,
        })?;
        let needed = end.div_ceil(8);
        if needed > self.capacity() {
            self.grow(needed - self.capacity())?;
        }
        Ok(())
    }

    fn grow(&mut self, additional: usize) -> CodecResult<()> {
        if !self.resizable {
            tracing::warn!(
                "Rejected growth of fixed buffer: capacity {}, {} more bytes needed",
                self.capacity(),
                additional
            );
            return Err(CodecError::UnsupportedOperation("cannot grow a fixed buffer"));
        }
        let capacity = self.capacity();
        let new_capacity = (capacity + additional)
            .max(MIN_GROWTH_CAPACITY)
            .max(capacity.saturating_mul(2));
        tracing::debug!("Buffer grown: {} -> {} bytes", capacity, new_capacity);
        self.target.resize(new_capacity, 0);
        Ok(())
    }

    #[inline]
    fn update_length(&mut self) {
        if self.bit_position > self.bit_length {
            self.bit_length = self.bit_position;
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Writes one bit.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    pub fn write_bit(&mut self, bit: bool) -> CodecResult<()> {
        self.reserve_bits(1)?;
        self.put_bit(bit);
        Ok(())
    }

    /// Writes one byte at any bit offset.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    pub fn write_byte(&mut self, value: u8) -> CodecResult<()> {
        self.reserve_bits(8)?;
        self.put_byte(value);
        Ok(())
    }

    /// Writes a byte slice at any bit offset. Either all bytes are written
    /// or none are.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer cannot hold the whole slice.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.reserve_bits(bytes.len() * 8)?;
        if self.bit_aligned() {
            let start = self.position();
            self.target[start..start + bytes.len()].copy_from_slice(bytes);
            self.bit_position += bytes.len() * 8;
            self.update_length();
        } else {
            for &byte in bytes {
                self.put_byte(byte);
            }
        }
        Ok(())
    }

    /// Writes the low `count` bits of `value`, least significant first.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidArgument`] when `count > 64`; fails when a fixed
    /// buffer is full.
    pub fn write_bits(&mut self, value: u64, count: usize) -> CodecResult<()> {
        if count > 64 {
            return Err(CodecError::InvalidArgument("cannot write more than 64 bits"));
        }
        self.reserve_bits(count)?;
        let mut done = 0;
        while count - done >= 8 {
            self.put_byte((value >> done) as u8);
            done += 8;
        }
        while done < count {
            self.put_bit((value >> done) & 1 == 1);
            done += 1;
        }
        Ok(())
    }

    /// Writes zero bits until the cursor is byte aligned.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    pub fn pad_buffer(&mut self) -> CodecResult<()> {
        let pad = (8 - (self.bit_position & 7)) & 7;
        self.reserve_bits(pad)?;
        for _ in 0..pad {
            self.put_bit(false);
        }
        Ok(())
    }

    /// Capacity must already be reserved.
    #[inline]
    fn put_bit(&mut self, bit: bool) {
        let index = self.bit_position >> 3;
        let mask = 1u8 << (self.bit_position & 7);
        if bit {
            self.target[index] |= mask;
        } else {
            self.target[index] &= !mask;
        }
        self.bit_position += 1;
        self.update_length();
    }

    /// Capacity must already be reserved.
    #[inline]
    fn put_byte(&mut self, value: u8) {
        let index = self.bit_position >> 3;
        let offset = (self.bit_position & 7) as u32;
        if offset == 0 {
            self.target[index] = value;
        } else {
            let low = &mut self.target[index];
            *low = (*low & (0xFF >> (8 - offset))) | (value << offset);
            let high = &mut self.target[index + 1];
            *high = (*high & (0xFF << offset)) | (value >> (8 - offset));
        }
        self.bit_position += 8;
        self.update_length();
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Reads one bit, or `None` past the written length.
    pub fn read_bit(&mut self) -> Option<bool> {
        let bit = self.bit_at(self.bit_position)?;
        self.bit_position += 1;
        Some(bit)
    }

    /// Reads one byte, or `None` when fewer than 8 written bits remain.
    ///
    /// `None` is the "no data" sentinel and is distinct from a stored zero.
    pub fn read_byte(&mut self) -> Option<u8> {
        let byte = self.peek_byte()?;
        self.bit_position += 8;
        Some(byte)
    }

    /// Reads the byte at the cursor without advancing.
    #[must_use]
    pub fn peek_byte(&self) -> Option<u8> {
        if self.remaining_bits() < 8 {
            return None;
        }
        Some(self.byte_at(self.bit_position))
    }

    /// Fills `out` with as many whole bytes as remain, returning the count.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.remaining_bits() / 8);
        if self.bit_aligned() {
            let start = self.position();
            out[..count].copy_from_slice(&self.target[start..start + count]);
        } else {
            for (i, slot) in out[..count].iter_mut().enumerate() {
                *slot = self.byte_at(self.bit_position + i * 8);
            }
        }
        self.bit_position += count * 8;
        count
    }

    /// Reads `count` bits (least significant first), or `None` if fewer
    /// remain. The cursor does not move on `None`.
    pub fn read_bits(&mut self, count: usize) -> Option<u64> {
        if count > 64 || self.remaining_bits() < count {
            return None;
        }
        let mut value = 0u64;
        let mut done = 0;
        while count - done >= 8 {
            value |= u64::from(self.byte_at(self.bit_position)) << done;
            self.bit_position += 8;
            done += 8;
        }
        while done < count {
            if self.bit_at(self.bit_position) == Some(true) {
                value |= 1 << done;
            }
            self.bit_position += 1;
            done += 1;
        }
        Some(value)
    }

    /// Advances to the next byte boundary.
    pub fn skip_pad_bits(&mut self) {
        let aligned = self.bit_position.next_multiple_of(8);
        self.bit_position = aligned.min(self.capacity_bits());
    }

    /// Written bit at an absolute index, without moving the cursor.
    #[inline]
    #[must_use]
    pub fn bit_at(&self, bit_index: usize) -> Option<bool> {
        if bit_index >= self.bit_length {
            return None;
        }
        Some(self.target[bit_index >> 3] & (1 << (bit_index & 7)) != 0)
    }

    /// Caller guarantees 8 written bits from `bit_index`.
    #[inline]
    fn byte_at(&self, bit_index: usize) -> u8 {
        let index = bit_index >> 3;
        let offset = (bit_index & 7) as u32;
        if offset == 0 {
            self.target[index]
        } else {
            (self.target[index] >> offset) | (self.target[index + 1] << (8 - offset))
        }
    }

    // =========================================================================
    // Seeking
    // =========================================================================

    /// Moves the cursor by whole bytes and returns the new byte position.
    ///
    /// `End` is relative to the written length. Targets before the start
    /// clamp to 0, targets past the capacity clamp to the capacity. The
    /// resulting cursor is always byte aligned.
    pub fn seek(&mut self, target: SeekFrom) -> usize {
        let capacity = self.capacity() as i128;
        let wanted = match target {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => self.position() as i128 + i128::from(delta),
            SeekFrom::End(delta) => self.len() as i128 + i128::from(delta),
        };
        // clamped into 0..=capacity, so the cast back is lossless
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let position = wanted.clamp(0, capacity) as usize;
        tracing::trace!("Seek {:?} -> byte {}", target, position);
        self.bit_position = position * 8;
        position
    }

    // =========================================================================
    // Bulk copies
    // =========================================================================

    /// Appends the first `count` written bytes of `source` (all of them when
    /// `None`) at the cursor.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfRange`] when `count` exceeds the source length;
    /// fails when a fixed buffer is full.
    pub fn copy_from(&mut self, source: &BitBuffer, count: Option<usize>) -> CodecResult<()> {
        let count = count.unwrap_or_else(|| source.len());
        if count > source.len() {
            return Err(CodecError::OutOfRange {
                what: "copy length",
                value: count as u64,
                limit: source.len() as u64,
            });
        }
        self.write_bytes(&source.target[..count])
    }

    /// Appends the first `bit_count` written bits of `source` (all of them
    /// when `None`) at the cursor, preserving sub-byte lengths.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfRange`] when `bit_count` exceeds the source's bit
    /// length; fails when a fixed buffer is full.
    pub fn copy_bits_from(&mut self, source: &BitBuffer, bit_count: Option<usize>) -> CodecResult<()> {
        let bit_count = bit_count.unwrap_or(source.bit_length);
        if bit_count > source.bit_length {
            return Err(CodecError::OutOfRange {
                what: "copy bit length",
                value: bit_count as u64,
                limit: source.bit_length as u64,
            });
        }
        self.reserve_bits(bit_count)?;
        let whole = bit_count >> 3;
        for &byte in &source.target[..whole] {
            self.put_byte(byte);
        }
        for bit_index in whole * 8..bit_count {
            self.put_bit(source.target[bit_index >> 3] & (1 << (bit_index & 7)) != 0);
        }
        Ok(())
    }

    /// Appends whole bytes from `source`'s cursor onward, up to `count`
    /// bytes when given. The source cursor is left untouched.
    ///
    /// # Errors
    ///
    /// Fails when a fixed buffer is full.
    pub fn copy_unread_from(&mut self, source: &BitBuffer, count: Option<usize>) -> CodecResult<()> {
        let available = source.remaining_bits() / 8;
        let count = count.map_or(available, |c| c.min(available));
        self.reserve_bits(count * 8)?;
        for i in 0..count {
            self.put_byte(source.byte_at(source.bit_position + i * 8));
        }
        Ok(())
    }

    /// Appends the written bytes to `out`.
    pub fn copy_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_slice());
    }
}

impl Default for BitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for BitBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)
            .map(|()| buf.len())
            .map_err(|e| io::Error::new(io::ErrorKind::WriteZero, e))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for BitBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(BitBuffer::read(self, buf))
    }
}

impl io::Seek for BitBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(BitBuffer::seek(self, pos) as u64)
    }
}
