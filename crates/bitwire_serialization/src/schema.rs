//! # Field Schemas
//!
//! Types opt into reflection-free serialization by listing their fields
//! once. Each field carries its name, a visibility, and how to reach it:
//!
//! ```rust
//! use bitwire_serialization::{FieldDescriptor, SchemaObject, Visibility};
//!
//! #[derive(Default)]
//! struct Door {
//!     open: bool,
//!     angle: f32,
//!     cached_mesh: u32,
//! }
//!
//! impl SchemaObject for Door {
//!     fn schema() -> Vec<FieldDescriptor<Self>> {
//!         vec![
//!             FieldDescriptor::builtin("open", Visibility::Public, |d| &d.open, |d| &mut d.open),
//!             FieldDescriptor::builtin("angle", Visibility::Marked, |d| &d.angle, |d| &mut d.angle),
//!             FieldDescriptor::builtin("cached_mesh", Visibility::Hidden, |d| &d.cached_mesh, |d| &mut d.cached_mesh),
//!         ]
//!     }
//! }
//! ```
//!
//! Builtin fields must be a [`NetworkField`]; any other type goes through a
//! codec registered on the [`TypeRegistry`](crate::TypeRegistry).

use std::any::type_name;
use std::fmt;

use bitwire_core::{BitReader, BitWriter, CodecResult};

use crate::field::NetworkField;
use crate::registry::TypeRegistry;

/// Whether a field takes part in serialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Publicly visible; serialized.
    Public,
    /// Private but explicitly marked for serialization.
    Marked,
    /// Private and unmarked; skipped.
    Hidden,
}

impl Visibility {
    /// Public and marked fields are serialized.
    #[inline]
    #[must_use]
    pub const fn is_serialized(self) -> bool {
        matches!(self, Self::Public | Self::Marked)
    }
}

/// How a field's value is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldCodec {
    /// One of the supported builtin types.
    Builtin,
    /// A type served by a registered custom codec.
    Custom {
        /// Name of the field's type, for diagnostics.
        type_name: &'static str,
    },
}

type WriteFn<T> = Box<dyn Fn(&T, &TypeRegistry, &mut BitWriter<'_>) -> CodecResult<()> + Send + Sync>;
type ReadFn<T> = Box<dyn Fn(&mut T, &TypeRegistry, &mut BitReader<'_>) -> CodecResult<()> + Send + Sync>;

/// One field of a [`SchemaObject`].
pub struct FieldDescriptor<T> {
    name: &'static str,
    visibility: Visibility,
    codec: FieldCodec,
    write: WriteFn<T>,
    read: ReadFn<T>,
}

impl<T: 'static> FieldDescriptor<T> {
    /// A field of a builtin type.
    pub fn builtin<F: NetworkField + 'static>(
        name: &'static str,
        visibility: Visibility,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        Self {
            name,
            visibility,
            codec: FieldCodec::Builtin,
            write: Box::new(move |instance: &T, _: &TypeRegistry, writer: &mut BitWriter<'_>| {
                get(instance).write_to(writer)
            }),
            read: Box::new(move |instance: &mut T, _: &TypeRegistry, reader: &mut BitReader<'_>| {
                *get_mut(instance) = F::read_from(reader)?;
                Ok(())
            }),
        }
    }

    /// A field whose type needs a custom codec on the registry.
    pub fn custom<F: 'static>(
        name: &'static str,
        visibility: Visibility,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        Self {
            name,
            visibility,
            codec: FieldCodec::Custom { type_name: type_name::<F>() },
            write: Box::new(move |instance: &T, registry: &TypeRegistry, writer: &mut BitWriter<'_>| {
                registry.write_custom(get(instance), writer)
            }),
            read: Box::new(move |instance: &mut T, registry: &TypeRegistry, reader: &mut BitReader<'_>| {
                *get_mut(instance) = registry.read_custom::<F>(reader)?;
                Ok(())
            }),
        }
    }
}

impl<T> FieldDescriptor<T> {
    /// Field name; fixes the serialization order.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Field visibility.
    #[inline]
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Builtin or custom encoding.
    #[inline]
    #[must_use]
    pub const fn codec(&self) -> FieldCodec {
        self.codec
    }

    pub(crate) fn write(&self, instance: &T, registry: &TypeRegistry, writer: &mut BitWriter<'_>) -> CodecResult<()> {
        (self.write)(instance, registry, writer)
    }

    pub(crate) fn read(&self, instance: &mut T, registry: &TypeRegistry, reader: &mut BitReader<'_>) -> CodecResult<()> {
        (self.read)(instance, registry, reader)
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

/// A type with a declared field list.
pub trait SchemaObject: Sized + 'static {
    /// Every field of the type, in any order, hidden ones included.
    fn schema() -> Vec<FieldDescriptor<Self>>;
}
