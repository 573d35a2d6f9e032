//! # Bitwire Serialization
//!
//! Structured layers over the `bitwire_core` codecs:
//!
//! - [`Serializer`]: one body serializes both directions
//!   ([`WriteSerializer`] / [`ReadSerializer`])
//! - [`Value`]: closed tagged union for the generic write path
//! - Object and behaviour references resolved through a
//!   [`SpawnedObjectResolver`]
//! - [`TypeRegistry`]: cached, name-ordered field lists for
//!   [`SchemaObject`] types, plus custom codecs
//!
//! ## Contract
//!
//! Writer and reader must visit the same fields in the same order with the
//! same types. Nothing on the wire detects a mismatch.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod field;
pub mod reference;
pub mod registry;
pub mod schema;
pub mod serializer;
pub mod value;

pub use field::NetworkField;
pub use reference::{
    read_behaviour_ref, read_nullable_behaviour_ref, read_nullable_object_ref, read_object_id,
    read_object_ref, write_behaviour_ref, write_nullable_behaviour_ref, write_nullable_object_ref,
    write_object_ref, SpawnedObjectResolver,
};
pub use registry::TypeRegistry;
pub use schema::{FieldCodec, FieldDescriptor, SchemaObject, Visibility};
pub use serializer::{
    EnumRepr, NetworkEnum, NetworkSerializable, ReadSerializer, Serializer, WriteSerializer,
};
pub use value::{read_value, write_value, Value, ValueKind};
