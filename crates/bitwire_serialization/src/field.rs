//! # Field Codecs
//!
//! The encoding each supported type gets when it passes through a
//! [`Serializer`](crate::Serializer) or a schema field:
//!
//! | Type                         | Encoding                                  |
//! |------------------------------|-------------------------------------------|
//! | `bool`                       | one bit                                   |
//! | `u8`, `i8`                   | raw byte                                  |
//! | other integers, floats, char | packed                                    |
//! | `Option<String>`             | is-set bit, then packed string            |
//! | vectors, colors, rays        | packed components                         |
//! | `Color32`                    | four raw bytes                            |
//! | `Quaternion`                 | packed rotation (w dropped)               |
//! | `Option<Vec<T>>`             | packed `i32` length, `-1` for `None`      |

use bitwire_core::{BitReader, BitWriter, CodecError, CodecResult};
use bitwire_shared::{Color, Color32, Quaternion, Ray, Ray2D, Vector2, Vector3, Vector4, NULL_LENGTH};

/// A value with a fixed structured-serializer encoding.
pub trait NetworkField: Sized {
    /// Writes the value.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    fn write_to(&self, writer: &mut BitWriter<'_>) -> CodecResult<()>;

    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Propagates reader failures.
    fn read_from(reader: &mut BitReader<'_>) -> CodecResult<Self>;
}

macro_rules! impl_network_field {
    ($($ty:ty => $write:ident / $read:ident;)*) => {
        $(
            impl NetworkField for $ty {
                #[inline]
                fn write_to(&self, writer: &mut BitWriter<'_>) -> CodecResult<()> {
                    writer.$write(*self)
                }

                #[inline]
                fn read_from(reader: &mut BitReader<'_>) -> CodecResult<Self> {
                    reader.$read()
                }
            }
        )*
    };
}

impl_network_field! {
    bool => write_bool / read_bool;
    char => write_char_packed / read_char_packed;
    u8 => write_u8 / read_u8;
    i8 => write_i8 / read_i8;
    i16 => write_i16_packed / read_i16_packed;
    u16 => write_u16_packed / read_u16_packed;
    i32 => write_i32_packed / read_i32_packed;
    u32 => write_u32_packed / read_u32_packed;
    i64 => write_i64_packed / read_i64_packed;
    u64 => write_u64_packed / read_u64_packed;
    f32 => write_f32_packed / read_f32_packed;
    f64 => write_f64_packed / read_f64_packed;
    Vector2 => write_vector2_packed / read_vector2_packed;
    Vector3 => write_vector3_packed / read_vector3_packed;
    Vector4 => write_vector4_packed / read_vector4_packed;
    Color => write_color_packed / read_color_packed;
    Color32 => write_color32 / read_color32;
    Quaternion => write_rotation_packed / read_rotation_packed;
    Ray => write_ray_packed / read_ray_packed;
    Ray2D => write_ray2d_packed / read_ray2d_packed;
}

impl NetworkField for Option<String> {
    fn write_to(&self, writer: &mut BitWriter<'_>) -> CodecResult<()> {
        writer.write_bool(self.is_some())?;
        match self {
            Some(value) => writer.write_string_packed(value),
            None => Ok(()),
        }
    }

    fn read_from(reader: &mut BitReader<'_>) -> CodecResult<Self> {
        if reader.read_bool()? {
            reader.read_string_packed().map(Some)
        } else {
            Ok(None)
        }
    }
}

impl<T: NetworkField> NetworkField for Option<Vec<T>> {
    fn write_to(&self, writer: &mut BitWriter<'_>) -> CodecResult<()> {
        write_nullable_array(writer, self.as_deref(), T::write_to)
    }

    fn read_from(reader: &mut BitReader<'_>) -> CodecResult<Self> {
        read_nullable_array(reader, T::read_from)
    }
}

// =============================================================================
// Nullable arrays
// =============================================================================

/// Writes a packed `i32` length (or `-1`) followed by each element.
pub(crate) fn write_nullable_array<T>(
    writer: &mut BitWriter<'_>,
    values: Option<&[T]>,
    mut write_one: impl FnMut(&T, &mut BitWriter<'_>) -> CodecResult<()>,
) -> CodecResult<()> {
    let Some(values) = values else {
        return writer.write_i32_packed(NULL_LENGTH);
    };
    writer.write_i32_packed(array_length(values.len())?)?;
    for value in values {
        write_one(value, writer)?;
    }
    Ok(())
}

/// Reads what [`write_nullable_array`] wrote. Any negative length is null.
pub(crate) fn read_nullable_array<T>(
    reader: &mut BitReader<'_>,
    mut read_one: impl FnMut(&mut BitReader<'_>) -> CodecResult<T>,
) -> CodecResult<Option<Vec<T>>> {
    let Some(len) = read_array_length(reader)? else {
        return Ok(None);
    };
    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        values.push(read_one(reader)?);
    }
    Ok(Some(values))
}

pub(crate) fn array_length(len: usize) -> CodecResult<i32> {
    i32::try_from(len).map_err(|_| CodecError::OutOfRange {
        what: "array length",
        value: len as u64,
        limit: u64::from(i32::MAX.unsigned_abs()),
    })
}

/// Reads a packed `i32` length; `None` for negative values.
///
/// A length larger than the remaining bits is reported as truncation, since
/// every element costs at least one bit.
pub(crate) fn read_array_length(reader: &mut BitReader<'_>) -> CodecResult<Option<usize>> {
    let start = reader.buffer().bit_position();
    let len = reader.read_i32_packed()?;
    let Ok(len) = usize::try_from(len) else {
        return Ok(None);
    };
    if len > reader.buffer().remaining_bits() {
        reader.truncated(start, len)?;
        return Ok(Some(0));
    }
    Ok(Some(len))
}
