//! # Type Registry
//!
//! Owns the per-type field list cache and the custom codec table.
//!
//! ## Concurrency
//!
//! Both maps sit behind [`ArcSwap`]: lookups are a single atomic load and
//! never block. Insertion clones the current map, adds the entry and swaps
//! the new map in, serialized by one [`Mutex`] so two racing inserts cannot
//! drop each other's entry.
//!
//! ## Field order
//!
//! A type's field list is built on first use: hidden fields dropped, the
//! rest sorted by name. The cached list is reused for every later call, so
//! both peers see the same order regardless of declaration order.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use bitwire_core::{BitReader, BitWriter, CodecError, CodecResult};

use crate::schema::{FieldDescriptor, SchemaObject};

type ErasedMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

type CustomWriteFn<F> = Box<dyn Fn(&F, &mut BitWriter<'_>) -> CodecResult<()> + Send + Sync>;
type CustomReadFn<F> = Box<dyn Fn(&mut BitReader<'_>) -> CodecResult<F> + Send + Sync>;

struct CustomCodec<F> {
    write: CustomWriteFn<F>,
    read: CustomReadFn<F>,
}

/// Field list cache plus custom codecs. Construct one per context and pass
/// it down; independent registries share nothing.
pub struct TypeRegistry {
    field_lists: ArcSwap<ErasedMap>,
    custom_codecs: ArcSwap<ErasedMap>,
    insert_lock: Mutex<()>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            field_lists: ArcSwap::from_pointee(HashMap::new()),
            custom_codecs: ArcSwap::from_pointee(HashMap::new()),
            insert_lock: Mutex::new(()),
        }
    }

    // =========================================================================
    // Custom codecs
    // =========================================================================

    /// Registers a codec for `F`, replacing any earlier one.
    pub fn register_custom<F: 'static>(
        &self,
        write: impl Fn(&F, &mut BitWriter<'_>) -> CodecResult<()> + Send + Sync + 'static,
        read: impl Fn(&mut BitReader<'_>) -> CodecResult<F> + Send + Sync + 'static,
    ) {
        let codec: Arc<dyn Any + Send + Sync> = Arc::new(CustomCodec::<F> {
            write: Box::new(write),
            read: Box::new(read),
        });
        let _guard = self.insert_lock.lock();
        let mut codecs = ErasedMap::clone(&self.custom_codecs.load());
        if codecs.insert(TypeId::of::<F>(), codec).is_some() {
            tracing::debug!("Replaced custom codec for {}", type_name::<F>());
        } else {
            tracing::debug!("Registered custom codec for {}", type_name::<F>());
        }
        self.custom_codecs.store(Arc::new(codecs));
    }

    /// Whether `F` has a custom codec.
    #[must_use]
    pub fn has_custom<F: 'static>(&self) -> bool {
        self.custom_codecs.load().contains_key(&TypeId::of::<F>())
    }

    /// Writes `value` with its registered codec.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedType`] when `F` has no codec; otherwise
    /// whatever the codec returns.
    pub fn write_custom<F: 'static>(&self, value: &F, writer: &mut BitWriter<'_>) -> CodecResult<()> {
        let codecs = self.custom_codecs.load();
        let codec = Self::codec_for::<F>(&codecs)?;
        (codec.write)(value, writer)
    }

    /// Reads a value with its registered codec.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedType`] when `F` has no codec; otherwise
    /// whatever the codec returns.
    pub fn read_custom<F: 'static>(&self, reader: &mut BitReader<'_>) -> CodecResult<F> {
        let codecs = self.custom_codecs.load();
        let codec = Self::codec_for::<F>(&codecs)?;
        (codec.read)(reader)
    }

    fn codec_for<F: 'static>(codecs: &ErasedMap) -> CodecResult<&CustomCodec<F>> {
        codecs
            .get(&TypeId::of::<F>())
            .and_then(|codec| (**codec).downcast_ref::<CustomCodec<F>>())
            .ok_or(CodecError::UnsupportedType { type_name: type_name::<F>() })
    }

    // =========================================================================
    // Field lists
    // =========================================================================

    /// The serialized fields of `T`, sorted by name. Built once per registry.
    pub fn field_list<T: SchemaObject>(&self) -> Arc<Vec<FieldDescriptor<T>>> {
        if let Some(list) = Self::cached::<T>(&self.field_lists.load()) {
            return list;
        }

        let _guard = self.insert_lock.lock();
        // another thread may have populated it while we waited
        if let Some(list) = Self::cached::<T>(&self.field_lists.load()) {
            return list;
        }

        let mut fields = T::schema();
        let declared = fields.len();
        fields.retain(|field| field.visibility().is_serialized());
        fields.sort_by(|a, b| a.name().cmp(b.name()));
        let list = Arc::new(fields);

        let mut lists = ErasedMap::clone(&self.field_lists.load());
        lists.insert(TypeId::of::<T>(), Arc::clone(&list) as Arc<dyn Any + Send + Sync>);
        self.field_lists.store(Arc::new(lists));
        tracing::debug!(
            "Cached field list for {}: {} of {} fields serialized",
            type_name::<T>(),
            list.len(),
            declared
        );
        list
    }

    fn cached<T: SchemaObject>(lists: &ErasedMap) -> Option<Arc<Vec<FieldDescriptor<T>>>> {
        let entry = lists.get(&TypeId::of::<T>())?;
        Arc::clone(entry).downcast::<Vec<FieldDescriptor<T>>>().ok()
    }

    /// Number of types with a cached field list.
    #[must_use]
    pub fn cached_types(&self) -> usize {
        self.field_lists.load().len()
    }

    /// Writes every serialized field of `instance`, in cached order.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedType`] for a custom field without a codec;
    /// otherwise propagates writer failures.
    pub fn write_fields<T: SchemaObject>(&self, instance: &T, writer: &mut BitWriter<'_>) -> CodecResult<()> {
        self.field_list::<T>()
            .iter()
            .try_for_each(|field| field.write(instance, self, writer))
    }

    /// Reads every serialized field into `instance`, in cached order. Hidden
    /// fields keep their current values.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedType`] for a custom field without a codec;
    /// otherwise propagates reader failures.
    pub fn read_fields<T: SchemaObject>(&self, instance: &mut T, reader: &mut BitReader<'_>) -> CodecResult<()> {
        self.field_list::<T>()
            .iter()
            .try_for_each(|field| field.read(instance, self, reader))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("field_lists", &self.field_lists.load().len())
            .field("custom_codecs", &self.custom_codecs.load().len())
            .finish()
    }
}
