//! # Structured Serializer
//!
//! One `network_serialize` body drives both directions:
//!
//! ```rust
//! use bitwire_serialization::{NetworkSerializable, Serializer};
//! use bitwire_core::CodecResult;
//! use bitwire_shared::Vector3;
//!
//! #[derive(Default)]
//! struct Spawn {
//!     prefab: u32,
//!     position: Vector3,
//!     owner: Option<String>,
//! }
//!
//! impl NetworkSerializable for Spawn {
//!     fn network_serialize<S: Serializer>(&mut self, serializer: &mut S) -> CodecResult<()> {
//!         serializer.serialize(&mut self.prefab)?;
//!         serializer.serialize(&mut self.position)?;
//!         serializer.serialize(&mut self.owner)
//!     }
//! }
//! ```
//!
//! The direction is fixed by the type: [`WriteSerializer`] only writes and
//! [`ReadSerializer`] only reads.

use std::any::type_name;
use std::fmt::Debug;

use bitwire_core::{BitReader, BitWriter, CodecResult};

use crate::field::{read_nullable_array, write_nullable_array, NetworkField};
use crate::reference::{
    read_nullable_behaviour_ref, read_nullable_object_ref, write_nullable_behaviour_ref,
    write_nullable_object_ref, SpawnedObjectResolver,
};

/// Bidirectional serializer bound to one reader or one writer.
pub trait Serializer {
    /// `true` for [`ReadSerializer`].
    const IS_READING: bool;

    /// Writes `value`, or overwrites it with the value read.
    ///
    /// # Errors
    ///
    /// Propagates codec failures.
    fn serialize<T: NetworkField>(&mut self, value: &mut T) -> CodecResult<()>;

    /// Serializes an enum through its backing integer.
    ///
    /// # Errors
    ///
    /// Propagates codec failures. An unknown discriminant is not an error; it
    /// reads as `E::default()`.
    fn serialize_enum<E: NetworkEnum>(&mut self, value: &mut E) -> CodecResult<()>;

    /// Serializes a nullable enum array.
    ///
    /// # Errors
    ///
    /// Propagates codec failures.
    fn serialize_enum_array<E: NetworkEnum>(&mut self, values: &mut Option<Vec<E>>) -> CodecResult<()>;

    /// Serializes a nullable reference to a spawned object. Reading resolves
    /// the id through `resolver`; an unknown id reads as `None`.
    ///
    /// # Errors
    ///
    /// Propagates codec failures.
    fn serialize_object_ref<R: SpawnedObjectResolver>(
        &mut self,
        value: &mut Option<R::Object>,
        resolver: &R,
    ) -> CodecResult<()>;

    /// Serializes a nullable reference to a behaviour on a spawned object.
    ///
    /// # Errors
    ///
    /// Propagates codec failures.
    fn serialize_behaviour_ref<R: SpawnedObjectResolver>(
        &mut self,
        value: &mut Option<R::Behaviour>,
        resolver: &R,
    ) -> CodecResult<()>;

    /// Serializes a nested user type.
    ///
    /// # Errors
    ///
    /// Propagates failures from the nested body.
    fn serialize_object<T: NetworkSerializable>(&mut self, value: &mut T) -> CodecResult<()>
    where
        Self: Sized,
    {
        value.network_serialize(self)
    }

    /// Runtime view of [`Self::IS_READING`].
    #[inline]
    fn is_reading(&self) -> bool {
        Self::IS_READING
    }
}

/// A user type with a single symmetric serialization body.
pub trait NetworkSerializable {
    /// Serializes every replicated field, in a fixed order.
    ///
    /// # Errors
    ///
    /// Propagates codec failures.
    fn network_serialize<S: Serializer>(&mut self, serializer: &mut S) -> CodecResult<()>;
}

// =============================================================================
// Enums
// =============================================================================

mod sealed {
    pub trait Sealed {}
}

/// Backing integer of a [`NetworkEnum`]. One-byte reprs travel raw, wider
/// ones are reinterpreted as signed and zig-zag packed.
pub trait EnumRepr: Copy + Debug + sealed::Sealed {
    /// Writes the discriminant.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    fn write_repr(self, writer: &mut BitWriter<'_>) -> CodecResult<()>;

    /// Reads a discriminant.
    ///
    /// # Errors
    ///
    /// Propagates reader failures.
    fn read_repr(reader: &mut BitReader<'_>) -> CodecResult<Self>;
}

macro_rules! impl_enum_repr {
    (reinterpret $($ty:ty as $signed:ty;)*) => {
        $(
            impl sealed::Sealed for $ty {}

            #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
            impl EnumRepr for $ty {
                #[inline]
                fn write_repr(self, writer: &mut BitWriter<'_>) -> CodecResult<()> {
                    (self as $signed).write_repr(writer)
                }

                #[inline]
                fn read_repr(reader: &mut BitReader<'_>) -> CodecResult<Self> {
                    <$signed>::read_repr(reader).map(|value| value as $ty)
                }
            }
        )*
    };
    ($($ty:ty => $write:ident / $read:ident;)*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl EnumRepr for $ty {
                #[inline]
                fn write_repr(self, writer: &mut BitWriter<'_>) -> CodecResult<()> {
                    writer.$write(self)
                }

                #[inline]
                fn read_repr(reader: &mut BitReader<'_>) -> CodecResult<Self> {
                    reader.$read()
                }
            }
        )*
    };
}

impl_enum_repr! {
    u8 => write_u8 / read_u8;
    i8 => write_i8 / read_i8;
    i16 => write_i16_packed / read_i16_packed;
    i32 => write_i32_packed / read_i32_packed;
    i64 => write_i64_packed / read_i64_packed;
}

impl_enum_repr! {
    reinterpret
    u16 as i16;
    u32 as i32;
    u64 as i64;
}

/// A fieldless enum with an integer discriminant.
///
/// Usually implemented with [`network_enum!`](crate::network_enum).
pub trait NetworkEnum: Copy + Default {
    /// Backing integer; its width selects the wire encoding.
    type Repr: EnumRepr;

    /// The discriminant of `self`.
    fn to_repr(self) -> Self::Repr;

    /// The variant for `repr`, if any.
    fn from_repr(repr: Self::Repr) -> Option<Self>;
}

/// Implements [`NetworkEnum`] for a fieldless enum.
///
/// ```rust
/// use bitwire_serialization::network_enum;
///
/// #[derive(Clone, Copy, Default, Debug, PartialEq)]
/// enum Team {
///     #[default]
///     Red,
///     Blue,
/// }
///
/// network_enum!(Team: u8 { Red = 0, Blue = 1 });
/// ```
#[macro_export]
macro_rules! network_enum {
    ($ty:ty : $repr:ty { $($variant:ident = $value:expr),+ $(,)? }) => {
        impl $crate::NetworkEnum for $ty {
            type Repr = $repr;

            fn to_repr(self) -> $repr {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            fn from_repr(repr: $repr) -> Option<Self> {
                $(
                    if repr == $value {
                        return Some(Self::$variant);
                    }
                )+
                None
            }
        }
    };
}

fn write_enum<E: NetworkEnum>(value: E, writer: &mut BitWriter<'_>) -> CodecResult<()> {
    value.to_repr().write_repr(writer)
}

fn read_enum<E: NetworkEnum>(reader: &mut BitReader<'_>) -> CodecResult<E> {
    let repr = E::Repr::read_repr(reader)?;
    Ok(E::from_repr(repr).unwrap_or_else(|| {
        tracing::debug!("Unknown discriminant {:?} for {}, using default", repr, type_name::<E>());
        E::default()
    }))
}

// =============================================================================
// Directions
// =============================================================================

/// Serializer that writes every visited value.
pub struct WriteSerializer<'a> {
    writer: BitWriter<'a>,
}

impl<'a> WriteSerializer<'a> {
    /// Binds a serializer to `writer`.
    #[must_use]
    pub fn new(writer: BitWriter<'a>) -> Self {
        Self { writer }
    }

    /// The underlying writer.
    #[inline]
    pub fn writer(&mut self) -> &mut BitWriter<'a> {
        &mut self.writer
    }

    /// Releases the writer.
    #[must_use]
    pub fn into_inner(self) -> BitWriter<'a> {
        self.writer
    }
}

impl Serializer for WriteSerializer<'_> {
    const IS_READING: bool = false;

    #[inline]
    fn serialize<T: NetworkField>(&mut self, value: &mut T) -> CodecResult<()> {
        value.write_to(&mut self.writer)
    }

    #[inline]
    fn serialize_enum<E: NetworkEnum>(&mut self, value: &mut E) -> CodecResult<()> {
        write_enum(*value, &mut self.writer)
    }

    fn serialize_enum_array<E: NetworkEnum>(&mut self, values: &mut Option<Vec<E>>) -> CodecResult<()> {
        write_nullable_array(&mut self.writer, values.as_deref(), |value, writer| write_enum(*value, writer))
    }

    fn serialize_object_ref<R: SpawnedObjectResolver>(
        &mut self,
        value: &mut Option<R::Object>,
        resolver: &R,
    ) -> CodecResult<()> {
        let object_id = value.as_ref().map(|object| resolver.object_id(object));
        write_nullable_object_ref(&mut self.writer, object_id)
    }

    fn serialize_behaviour_ref<R: SpawnedObjectResolver>(
        &mut self,
        value: &mut Option<R::Behaviour>,
        resolver: &R,
    ) -> CodecResult<()> {
        let ids = value.as_ref().map(|behaviour| resolver.behaviour_ids(behaviour));
        write_nullable_behaviour_ref(&mut self.writer, ids)
    }
}

/// Serializer that overwrites every visited value with what it reads.
pub struct ReadSerializer<'a> {
    reader: BitReader<'a>,
}

impl<'a> ReadSerializer<'a> {
    /// Binds a serializer to `reader`.
    #[must_use]
    pub fn new(reader: BitReader<'a>) -> Self {
        Self { reader }
    }

    /// The underlying reader, e.g. to check
    /// [`has_failed_reads`](BitReader::has_failed_reads).
    #[inline]
    pub fn reader(&mut self) -> &mut BitReader<'a> {
        &mut self.reader
    }

    /// Releases the reader.
    #[must_use]
    pub fn into_inner(self) -> BitReader<'a> {
        self.reader
    }
}

impl Serializer for ReadSerializer<'_> {
    const IS_READING: bool = true;

    #[inline]
    fn serialize<T: NetworkField>(&mut self, value: &mut T) -> CodecResult<()> {
        *value = T::read_from(&mut self.reader)?;
        Ok(())
    }

    #[inline]
    fn serialize_enum<E: NetworkEnum>(&mut self, value: &mut E) -> CodecResult<()> {
        *value = read_enum(&mut self.reader)?;
        Ok(())
    }

    fn serialize_enum_array<E: NetworkEnum>(&mut self, values: &mut Option<Vec<E>>) -> CodecResult<()> {
        *values = read_nullable_array(&mut self.reader, read_enum::<E>)?;
        Ok(())
    }

    fn serialize_object_ref<R: SpawnedObjectResolver>(
        &mut self,
        value: &mut Option<R::Object>,
        resolver: &R,
    ) -> CodecResult<()> {
        *value = read_nullable_object_ref(&mut self.reader, resolver)?;
        Ok(())
    }

    fn serialize_behaviour_ref<R: SpawnedObjectResolver>(
        &mut self,
        value: &mut Option<R::Behaviour>,
        resolver: &R,
    ) -> CodecResult<()> {
        *value = read_nullable_behaviour_ref(&mut self.reader, resolver)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitwire_core::BitBuffer;
    use bitwire_shared::{Quaternion, Vector3};

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    enum Stance {
        #[default]
        Standing,
        Crouching,
        Prone,
    }

    network_enum!(Stance: i32 { Standing = 0, Crouching = 1, Prone = -7 });

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    enum Flag {
        #[default]
        Off,
        On,
    }

    network_enum!(Flag: u8 { Off = 0, On = 200 });

    #[derive(Debug, Default, PartialEq)]
    struct Player {
        alive: bool,
        health: i16,
        name: Option<String>,
        position: Vector3,
        rotation: Quaternion,
        stance: Stance,
        flags: Option<Vec<Flag>>,
        scores: Option<Vec<u32>>,
    }

    impl NetworkSerializable for Player {
        fn network_serialize<S: Serializer>(&mut self, serializer: &mut S) -> CodecResult<()> {
            serializer.serialize(&mut self.alive)?;
            serializer.serialize(&mut self.health)?;
            serializer.serialize(&mut self.name)?;
            serializer.serialize(&mut self.position)?;
            serializer.serialize(&mut self.rotation)?;
            serializer.serialize_enum(&mut self.stance)?;
            serializer.serialize_enum_array(&mut self.flags)?;
            serializer.serialize(&mut self.scores)
        }
    }

    #[test]
    fn test_one_body_both_directions() {
        let mut sent = Player {
            alive: true,
            health: -31934,
            name: Some("runner".to_string()),
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: Quaternion::IDENTITY,
            stance: Stance::Prone,
            flags: Some(vec![Flag::On, Flag::Off]),
            scores: None,
        };

        let mut buffer = BitBuffer::new();
        let mut serializer = WriteSerializer::new(BitWriter::new(&mut buffer));
        assert!(!serializer.is_reading());
        serializer.serialize_object(&mut sent).unwrap();

        buffer.set_bit_position(0);
        let mut received = Player::default();
        let mut serializer = ReadSerializer::new(BitReader::new(&mut buffer));
        assert!(serializer.is_reading());
        serializer.serialize_object(&mut received).unwrap();
        assert!(!serializer.reader().has_failed_reads());
        assert_eq!(received, sent);
    }

    #[test]
    fn test_one_byte_enum_is_raw() {
        let mut buffer = BitBuffer::new();
        let mut serializer = WriteSerializer::new(BitWriter::new(&mut buffer));
        serializer.serialize_enum(&mut Flag::On).unwrap();
        assert_eq!(buffer.as_slice(), &[200]);
    }

    #[test]
    fn test_unknown_discriminant_reads_default() {
        let mut buffer = BitBuffer::new();
        BitWriter::new(&mut buffer).write_i32_packed(99).unwrap();
        buffer.set_bit_position(0);

        let mut stance = Stance::Crouching;
        let mut serializer = ReadSerializer::new(BitReader::new(&mut buffer));
        serializer.serialize_enum(&mut stance).unwrap();
        assert_eq!(stance, Stance::Standing);
    }

    struct Doors;

    impl SpawnedObjectResolver for Doors {
        type Object = u64;
        type Behaviour = (u64, u16);

        fn resolve(&self, object_id: u64) -> Option<u64> {
            (object_id < 100).then_some(object_id)
        }

        fn resolve_behaviour(&self, object: &u64, behaviour_id: u16) -> Option<(u64, u16)> {
            Some((*object, behaviour_id))
        }

        fn object_id(&self, object: &u64) -> u64 {
            *object
        }

        fn behaviour_ids(&self, behaviour: &(u64, u16)) -> (u64, u16) {
            *behaviour
        }
    }

    #[test]
    fn test_reference_fields() {
        let mut sent = [Some(12), None, Some(500)];
        let mut sent_behaviours = [Some((40, 3)), None];

        let mut buffer = BitBuffer::new();
        let mut serializer = WriteSerializer::new(BitWriter::new(&mut buffer));
        for object in &mut sent {
            serializer.serialize_object_ref(object, &Doors).unwrap();
        }
        for behaviour in &mut sent_behaviours {
            serializer.serialize_behaviour_ref(behaviour, &Doors).unwrap();
        }

        buffer.set_bit_position(0);
        let mut serializer = ReadSerializer::new(BitReader::new(&mut buffer));
        let mut received = [Some(1), Some(1), Some(1)];
        for object in &mut received {
            serializer.serialize_object_ref(object, &Doors).unwrap();
        }
        let mut received_behaviours = [None, Some((1, 1))];
        for behaviour in &mut received_behaviours {
            serializer.serialize_behaviour_ref(behaviour, &Doors).unwrap();
        }
        // 500 was never spawned
        assert_eq!(received, [Some(12), None, None]);
        assert_eq!(received_behaviours, sent_behaviours);
        assert!(!serializer.reader().buffer().has_data_to_read());
    }

    #[test]
    fn test_unsigned_repr_matches_signed_wire() {
        #[derive(Clone, Copy, Default)]
        enum Wide {
            #[default]
            Max,
        }
        network_enum!(Wide: u16 { Max = u16::MAX });

        let mut buffer = BitBuffer::new();
        WriteSerializer::new(BitWriter::new(&mut buffer))
            .serialize_enum(&mut Wide::Max)
            .unwrap();
        // u16::MAX reinterprets as -1, zig-zag 1
        assert_eq!(buffer.as_slice(), &[1]);
    }
}
