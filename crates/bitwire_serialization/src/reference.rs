//! # Spawned Object References
//!
//! Objects travel as their numeric network id; behaviours as the owning
//! object's id plus the behaviour's index on it. Both ids are packed.
//!
//! Resolution is delegated to a [`SpawnedObjectResolver`] owned by the
//! caller. An id that no longer resolves decodes to `None`; the rest of the
//! message is unaffected.
//!
//! The nullable forms put an is-set bit in front of the ids:
//!
//! ```text
//! null:       [0]
//! object:     [1][object id]
//! behaviour:  [1][object id][behaviour id]
//! ```

use std::any::type_name;

use bitwire_core::{BitReader, BitWriter, CodecResult};

/// Lookup into the spawned-object registry.
pub trait SpawnedObjectResolver {
    /// Handle returned for a spawned object.
    type Object;
    /// Handle returned for a behaviour on a spawned object.
    type Behaviour;

    /// The spawned object with `object_id`, if any.
    fn resolve(&self, object_id: u64) -> Option<Self::Object>;

    /// Behaviour number `behaviour_id` on `object`, if any.
    fn resolve_behaviour(&self, object: &Self::Object, behaviour_id: u16) -> Option<Self::Behaviour>;

    /// Network id of a spawned object.
    fn object_id(&self, object: &Self::Object) -> u64;

    /// Owning object id and index of a behaviour.
    fn behaviour_ids(&self, behaviour: &Self::Behaviour) -> (u64, u16);
}

/// Writes an object reference.
///
/// # Errors
///
/// Fails when a fixed buffer cannot hold the id.
#[inline]
pub fn write_object_ref(writer: &mut BitWriter<'_>, object_id: u64) -> CodecResult<()> {
    writer.write_u64_packed(object_id)
}

/// Writes a behaviour reference.
///
/// # Errors
///
/// Fails when a fixed buffer cannot hold the ids.
pub fn write_behaviour_ref(writer: &mut BitWriter<'_>, object_id: u64, behaviour_id: u16) -> CodecResult<()> {
    writer.write_u64_packed(object_id)?;
    writer.write_u16_packed(behaviour_id)
}

/// Reads an object id without resolving it.
///
/// # Errors
///
/// Propagates reader failures.
#[inline]
pub fn read_object_id(reader: &mut BitReader<'_>) -> CodecResult<u64> {
    reader.read_u64_packed()
}

/// Reads and resolves an object reference.
///
/// # Errors
///
/// Propagates reader failures. A miss is `Ok(None)`.
pub fn read_object_ref<R: SpawnedObjectResolver>(
    reader: &mut BitReader<'_>,
    resolver: &R,
) -> CodecResult<Option<R::Object>> {
    let object_id = read_object_id(reader)?;
    let object = resolver.resolve(object_id);
    if object.is_none() {
        tracing::warn!(
            "Object {} not spawned, reference decoded as absent ({})",
            object_id,
            type_name::<R::Object>()
        );
    }
    Ok(object)
}

/// Reads and resolves a behaviour reference.
///
/// Both ids are always consumed, so the cursor stays in step with the
/// writer even when the object is gone.
///
/// # Errors
///
/// Propagates reader failures. A miss is `Ok(None)`.
pub fn read_behaviour_ref<R: SpawnedObjectResolver>(
    reader: &mut BitReader<'_>,
    resolver: &R,
) -> CodecResult<Option<R::Behaviour>> {
    let object_id = reader.read_u64_packed()?;
    let behaviour_id = reader.read_u16_packed()?;
    let Some(object) = resolver.resolve(object_id) else {
        tracing::warn!(
            "Object {} not spawned, behaviour {} decoded as absent",
            object_id,
            behaviour_id
        );
        return Ok(None);
    };
    let behaviour = resolver.resolve_behaviour(&object, behaviour_id);
    if behaviour.is_none() {
        tracing::warn!("Object {} has no behaviour {}", object_id, behaviour_id);
    }
    Ok(behaviour)
}

/// Writes an object reference that may be null.
///
/// # Errors
///
/// Fails when a fixed buffer cannot hold the flag and id.
pub fn write_nullable_object_ref(writer: &mut BitWriter<'_>, object_id: Option<u64>) -> CodecResult<()> {
    writer.write_bool(object_id.is_some())?;
    match object_id {
        Some(object_id) => write_object_ref(writer, object_id),
        None => Ok(()),
    }
}

/// Writes a behaviour reference that may be null.
///
/// # Errors
///
/// Fails when a fixed buffer cannot hold the flag and ids.
pub fn write_nullable_behaviour_ref(writer: &mut BitWriter<'_>, ids: Option<(u64, u16)>) -> CodecResult<()> {
    writer.write_bool(ids.is_some())?;
    match ids {
        Some((object_id, behaviour_id)) => write_behaviour_ref(writer, object_id, behaviour_id),
        None => Ok(()),
    }
}

/// Reads a nullable object reference and resolves it.
///
/// # Errors
///
/// Propagates reader failures. Null and misses are both `Ok(None)`.
pub fn read_nullable_object_ref<R: SpawnedObjectResolver>(
    reader: &mut BitReader<'_>,
    resolver: &R,
) -> CodecResult<Option<R::Object>> {
    if reader.read_bool()? {
        read_object_ref(reader, resolver)
    } else {
        Ok(None)
    }
}

/// Reads a nullable behaviour reference and resolves it.
///
/// # Errors
///
/// Propagates reader failures. Null and misses are both `Ok(None)`.
pub fn read_nullable_behaviour_ref<R: SpawnedObjectResolver>(
    reader: &mut BitReader<'_>,
    resolver: &R,
) -> CodecResult<Option<R::Behaviour>> {
    if reader.read_bool()? {
        read_behaviour_ref(reader, resolver)
    } else {
        Ok(None)
    }
}
