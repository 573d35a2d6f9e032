//! # Tagged Values
//!
//! A closed union over every type the generic write path accepts. Nothing
//! on the wire says which variant follows, so the reader names the expected
//! shape with a [`ValueKind`].
//!
//! Nullable values carry a leading bit: `1` for [`Value::Null`], `0` for a
//! [`Value::NonNull`] payload. Arrays carry a packed `i32` length.

use std::mem::{discriminant, Discriminant};

use bitwire_core::{BitReader, BitWriter, CodecError, CodecResult};
use bitwire_shared::{Color, Color32, Quaternion, Ray, Ray2D, Vector2, Vector3, Vector4};

use crate::field::{array_length, read_array_length};
use crate::reference::{read_object_id, write_behaviour_ref, write_object_ref};

/// A value on the generic write path.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Absent nullable value.
    Null,
    /// Present nullable value.
    NonNull(Box<Value>),
    /// One bit.
    Bool(bool),
    /// Packed scalar value.
    Char(char),
    /// Raw byte.
    U8(u8),
    /// Raw byte.
    I8(i8),
    /// Packed.
    U16(u16),
    /// Zig-zag packed.
    I16(i16),
    /// Packed.
    U32(u32),
    /// Zig-zag packed.
    I32(i32),
    /// Packed.
    U64(u64),
    /// Zig-zag packed.
    I64(i64),
    /// Packed bit pattern.
    F32(f32),
    /// Packed bit pattern.
    F64(f64),
    /// Packed UTF-16 string.
    String(String),
    /// Packed components.
    Vector2(Vector2),
    /// Packed components.
    Vector3(Vector3),
    /// Packed components.
    Vector4(Vector4),
    /// Packed components.
    Color(Color),
    /// Four raw bytes.
    Color32(Color32),
    /// Packed rotation.
    Quaternion(Quaternion),
    /// Packed origin and direction.
    Ray(Ray),
    /// Packed origin and direction.
    Ray2D(Ray2D),
    /// Enum discriminant, zig-zag packed as `i32`.
    Enum(i32),
    /// Spawned object id.
    ObjectRef(u64),
    /// Behaviour on a spawned object.
    BehaviourRef {
        /// Owning object id.
        object_id: u64,
        /// Behaviour index on the object.
        behaviour_id: u16,
    },
    /// Elements of one kind.
    Array(Vec<Value>),
}

/// The shape a reader expects next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Null flag, then the inner kind when present.
    Nullable(Box<ValueKind>),
    /// See [`Value::Bool`].
    Bool,
    /// See [`Value::Char`].
    Char,
    /// See [`Value::U8`].
    U8,
    /// See [`Value::I8`].
    I8,
    /// See [`Value::U16`].
    U16,
    /// See [`Value::I16`].
    I16,
    /// See [`Value::U32`].
    U32,
    /// See [`Value::I32`].
    I32,
    /// See [`Value::U64`].
    U64,
    /// See [`Value::I64`].
    I64,
    /// See [`Value::F32`].
    F32,
    /// See [`Value::F64`].
    F64,
    /// See [`Value::String`].
    String,
    /// See [`Value::Vector2`].
    Vector2,
    /// See [`Value::Vector3`].
    Vector3,
    /// See [`Value::Vector4`].
    Vector4,
    /// See [`Value::Color`].
    Color,
    /// See [`Value::Color32`].
    Color32,
    /// See [`Value::Quaternion`].
    Quaternion,
    /// See [`Value::Ray`].
    Ray,
    /// See [`Value::Ray2D`].
    Ray2D,
    /// See [`Value::Enum`].
    Enum,
    /// See [`Value::ObjectRef`].
    ObjectRef,
    /// See [`Value::BehaviourRef`].
    BehaviourRef,
    /// Packed length, then elements of the inner kind.
    Array(Box<ValueKind>),
}

impl Value {
    /// Nullable elements compare equal whether present or not.
    fn shape(&self) -> Discriminant<Value> {
        match self {
            Value::NonNull(_) => discriminant(&Value::Null),
            other => discriminant(other),
        }
    }
}

/// Writes `value` in its variant's encoding.
///
/// # Errors
///
/// [`CodecError::InvalidArgument`] for arrays mixing element variants;
/// [`CodecError::OutOfRange`] for arrays longer than `i32::MAX`; otherwise
/// propagates writer failures.
pub fn write_value(writer: &mut BitWriter<'_>, value: &Value) -> CodecResult<()> {
    match value {
        Value::Null => writer.write_bool(true),
        Value::NonNull(inner) => {
            writer.write_bool(false)?;
            write_value(writer, inner)
        }
        Value::Bool(v) => writer.write_bool(*v),
        Value::Char(v) => writer.write_char_packed(*v),
        Value::U8(v) => writer.write_u8(*v),
        Value::I8(v) => writer.write_i8(*v),
        Value::U16(v) => writer.write_u16_packed(*v),
        Value::I16(v) => writer.write_i16_packed(*v),
        Value::U32(v) => writer.write_u32_packed(*v),
        Value::I32(v) | Value::Enum(v) => writer.write_i32_packed(*v),
        Value::U64(v) => writer.write_u64_packed(*v),
        Value::I64(v) => writer.write_i64_packed(*v),
        Value::F32(v) => writer.write_f32_packed(*v),
        Value::F64(v) => writer.write_f64_packed(*v),
        Value::String(v) => writer.write_string_packed(v),
        Value::Vector2(v) => writer.write_vector2_packed(*v),
        Value::Vector3(v) => writer.write_vector3_packed(*v),
        Value::Vector4(v) => writer.write_vector4_packed(*v),
        Value::Color(v) => writer.write_color_packed(*v),
        Value::Color32(v) => writer.write_color32(*v),
        Value::Quaternion(v) => writer.write_rotation_packed(*v),
        Value::Ray(v) => writer.write_ray_packed(*v),
        Value::Ray2D(v) => writer.write_ray2d_packed(*v),
        Value::ObjectRef(id) => write_object_ref(writer, *id),
        Value::BehaviourRef { object_id, behaviour_id } => write_behaviour_ref(writer, *object_id, *behaviour_id),
        Value::Array(values) => {
            if let Some(first) = values.first() {
                let shape = first.shape();
                if values.iter().any(|v| v.shape() != shape) {
                    return Err(CodecError::InvalidArgument("array elements must share one variant"));
                }
            }
            writer.write_i32_packed(array_length(values.len())?)?;
            values.iter().try_for_each(|v| write_value(writer, v))
        }
    }
}

/// Reads a value of the given kind.
///
/// References come back as raw ids; resolve them with
/// [`SpawnedObjectResolver`](crate::SpawnedObjectResolver).
///
/// # Errors
///
/// [`CodecError::InvalidData`] for a negative array length; otherwise
/// propagates reader failures.
pub fn read_value(reader: &mut BitReader<'_>, kind: &ValueKind) -> CodecResult<Value> {
    Ok(match kind {
        ValueKind::Nullable(inner) => {
            if reader.read_bool()? {
                Value::Null
            } else {
                Value::NonNull(Box::new(read_value(reader, inner)?))
            }
        }
        ValueKind::Bool => Value::Bool(reader.read_bool()?),
        ValueKind::Char => Value::Char(reader.read_char_packed()?),
        ValueKind::U8 => Value::U8(reader.read_u8()?),
        ValueKind::I8 => Value::I8(reader.read_i8()?),
        ValueKind::U16 => Value::U16(reader.read_u16_packed()?),
        ValueKind::I16 => Value::I16(reader.read_i16_packed()?),
        ValueKind::U32 => Value::U32(reader.read_u32_packed()?),
        ValueKind::I32 => Value::I32(reader.read_i32_packed()?),
        ValueKind::U64 => Value::U64(reader.read_u64_packed()?),
        ValueKind::I64 => Value::I64(reader.read_i64_packed()?),
        ValueKind::F32 => Value::F32(reader.read_f32_packed()?),
        ValueKind::F64 => Value::F64(reader.read_f64_packed()?),
        ValueKind::String => Value::String(reader.read_string_packed()?),
        ValueKind::Vector2 => Value::Vector2(reader.read_vector2_packed()?),
        ValueKind::Vector3 => Value::Vector3(reader.read_vector3_packed()?),
        ValueKind::Vector4 => Value::Vector4(reader.read_vector4_packed()?),
        ValueKind::Color => Value::Color(reader.read_color_packed()?),
        ValueKind::Color32 => Value::Color32(reader.read_color32()?),
        ValueKind::Quaternion => Value::Quaternion(reader.read_rotation_packed()?),
        ValueKind::Ray => Value::Ray(reader.read_ray_packed()?),
        ValueKind::Ray2D => Value::Ray2D(reader.read_ray2d_packed()?),
        ValueKind::Enum => Value::Enum(reader.read_i32_packed()?),
        ValueKind::ObjectRef => Value::ObjectRef(read_object_id(reader)?),
        ValueKind::BehaviourRef => Value::BehaviourRef {
            object_id: reader.read_u64_packed()?,
            behaviour_id: reader.read_u16_packed()?,
        },
        ValueKind::Array(element) => {
            let len = read_array_length(reader)?
                .ok_or(CodecError::InvalidData("negative array length"))?;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(read_value(reader, element)?);
            }
            Value::Array(values)
        }
    })
}
