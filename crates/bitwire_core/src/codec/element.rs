//! Element codecs shared by the array and diff writers.

use bitwire_shared::{Color, Color32, Quaternion, Ray, Ray2D, Vector2, Vector3, Vector4};

use crate::error::CodecResult;

use super::reader::BitReader;
use super::writer::BitWriter;

/// A value that can be an array element, with a fixed-width and a packed
/// encoding.
///
/// Equality drives change detection in diffs.
pub trait WireElement: Copy + PartialEq + Default {
    /// Writes the fixed-width encoding.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    fn write_fixed(self, writer: &mut BitWriter<'_>) -> CodecResult<()>;

    /// Writes the packed encoding.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    fn write_packed(self, writer: &mut BitWriter<'_>) -> CodecResult<()>;

    /// Reads the fixed-width encoding.
    ///
    /// # Errors
    ///
    /// Propagates reader failures.
    fn read_fixed(reader: &mut BitReader<'_>) -> CodecResult<Self>;

    /// Reads the packed encoding.
    ///
    /// # Errors
    ///
    /// Propagates reader failures.
    fn read_packed(reader: &mut BitReader<'_>) -> CodecResult<Self>;
}

macro_rules! impl_wire_element {
    ($($ty:ty => $write:ident / $read:ident, $write_packed:ident / $read_packed:ident;)*) => {
        $(
            impl WireElement for $ty {
                #[inline]
                fn write_fixed(self, writer: &mut BitWriter<'_>) -> CodecResult<()> {
                    writer.$write(self)
                }

                #[inline]
                fn write_packed(self, writer: &mut BitWriter<'_>) -> CodecResult<()> {
                    writer.$write_packed(self)
                }

                #[inline]
                fn read_fixed(reader: &mut BitReader<'_>) -> CodecResult<Self> {
                    reader.$read()
                }

                #[inline]
                fn read_packed(reader: &mut BitReader<'_>) -> CodecResult<Self> {
                    reader.$read_packed()
                }
            }
        )*
    };
}

// bytes and booleans have no smaller form
impl_wire_element! {
    bool => write_bool / read_bool, write_bool / read_bool;
    u8 => write_u8 / read_u8, write_u8 / read_u8;
    i8 => write_i8 / read_i8, write_i8 / read_i8;
    i16 => write_i16 / read_i16, write_i16_packed / read_i16_packed;
    u16 => write_u16 / read_u16, write_u16_packed / read_u16_packed;
    i32 => write_i32 / read_i32, write_i32_packed / read_i32_packed;
    u32 => write_u32 / read_u32, write_u32_packed / read_u32_packed;
    i64 => write_i64 / read_i64, write_i64_packed / read_i64_packed;
    u64 => write_u64 / read_u64, write_u64_packed / read_u64_packed;
    f32 => write_f32 / read_f32, write_f32_packed / read_f32_packed;
    f64 => write_f64 / read_f64, write_f64_packed / read_f64_packed;
    Vector2 => write_vector2 / read_vector2, write_vector2_packed / read_vector2_packed;
    Vector3 => write_vector3 / read_vector3, write_vector3_packed / read_vector3_packed;
    Vector4 => write_vector4 / read_vector4, write_vector4_packed / read_vector4_packed;
    Color => write_color / read_color, write_color_packed / read_color_packed;
    Color32 => write_color32 / read_color32, write_color32 / read_color32;
    Quaternion => write_quaternion / read_quaternion, write_rotation_packed / read_rotation_packed;
    Ray => write_ray / read_ray, write_ray_packed / read_ray_packed;
    Ray2D => write_ray2d / read_ray2d, write_ray2d_packed / read_ray2d_packed;
}
