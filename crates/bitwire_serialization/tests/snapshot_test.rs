//! # Snapshot Message Tests
//!
//! A full state message built from every layer: structured header, schema
//! fields, tagged values and object references, read back by a peer with its
//! own registry.
//!
//! Run with: cargo test -p bitwire_serialization --test snapshot_test

use std::collections::HashMap;

use bitwire_core::{BitBuffer, BitReader, BitWriter, CodecConfig, CodecResult, ReadMode};
use bitwire_serialization::{
    network_enum, read_object_ref, read_value, write_object_ref, write_value, FieldDescriptor,
    NetworkSerializable, ReadSerializer, SchemaObject, Serializer, SpawnedObjectResolver,
    TypeRegistry, Value, ValueKind, Visibility, WriteSerializer,
};
use bitwire_shared::{Color32, Quaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// FIXTURES
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Phase {
    #[default]
    Lobby,
    Running,
    Ended,
}

network_enum!(Phase: i16 { Lobby = 0, Running = 1, Ended = 2 });

#[derive(Debug, Default, PartialEq)]
struct Header {
    tick: u32,
    phase: Phase,
    map: Option<String>,
    players: Option<Vec<u64>>,
}

impl NetworkSerializable for Header {
    fn network_serialize<S: Serializer>(&mut self, serializer: &mut S) -> CodecResult<()> {
        serializer.serialize(&mut self.tick)?;
        serializer.serialize_enum(&mut self.phase)?;
        serializer.serialize(&mut self.map)?;
        serializer.serialize(&mut self.players)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct TeamColor(Color32);

#[derive(Debug, Default, PartialEq)]
struct Avatar {
    position: Vector3,
    rotation: Quaternion,
    team: TeamColor,
    health: i16,
    local_only: bool,
}

impl SchemaObject for Avatar {
    fn schema() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::builtin("rotation", Visibility::Public, |a| &a.rotation, |a| &mut a.rotation),
            FieldDescriptor::builtin("position", Visibility::Public, |a| &a.position, |a| &mut a.position),
            FieldDescriptor::custom("team", Visibility::Marked, |a| &a.team, |a| &mut a.team),
            FieldDescriptor::builtin("health", Visibility::Marked, |a| &a.health, |a| &mut a.health),
            FieldDescriptor::builtin("local_only", Visibility::Hidden, |a| &a.local_only, |a| &mut a.local_only),
        ]
    }
}

fn registry() -> TypeRegistry {
    let registry = TypeRegistry::new();
    registry.register_custom::<TeamColor>(
        |value, writer| writer.write_color32(value.0),
        |reader| reader.read_color32().map(TeamColor),
    );
    registry
}

struct World(HashMap<u64, &'static str>);

impl SpawnedObjectResolver for World {
    type Object = &'static str;
    type Behaviour = ();

    fn resolve(&self, object_id: u64) -> Option<Self::Object> {
        self.0.get(&object_id).copied()
    }

    fn resolve_behaviour(&self, _: &Self::Object, _: u16) -> Option<Self::Behaviour> {
        None
    }

    fn object_id(&self, object: &Self::Object) -> u64 {
        self.0
            .iter()
            .find_map(|(&id, name)| (name == object).then_some(id))
            .unwrap_or_default()
    }

    fn behaviour_ids(&self, _: &Self::Behaviour) -> (u64, u16) {
        (0, 0)
    }
}

// ============================================================================
// FULL MESSAGE
// ============================================================================

#[test]
fn snapshot_round_trip() {
    let mut header = Header {
        tick: 90_210,
        phase: Phase::Running,
        map: Some("harbor".into()),
        players: Some(vec![1, 2, 70_000]),
    };
    let avatar = Avatar {
        position: Vector3::new(10.0, 0.5, -3.25),
        rotation: Quaternion::from_axis_angle(Vector3::UP, -2.0),
        team: TeamColor(Color32::new(255, 64, 0, 255)),
        health: 87,
        local_only: true,
    };
    let extra = Value::Array(vec![Value::F32(0.5), Value::F32(-8.0)]);
    let world = World(HashMap::from([(70_000, "flag")]));

    let mut buffer = BitBuffer::new();
    {
        let sender_registry = registry();
        let mut serializer = WriteSerializer::new(BitWriter::new(&mut buffer));
        serializer.serialize_object(&mut header).unwrap();
        serializer.serialize_object_ref(&mut Some("flag"), &world).unwrap();
        serializer.serialize_object_ref(&mut None, &world).unwrap();
        let writer = serializer.writer();
        sender_registry.write_fields(&avatar, writer).unwrap();
        write_value(writer, &extra).unwrap();
        write_object_ref(writer, 70_000).unwrap();
        write_object_ref(writer, 404).unwrap();
    }

    buffer.set_bit_position(0);
    let receiver_registry = registry();
    let mut serializer = ReadSerializer::new(BitReader::new(&mut buffer));

    let mut received_header = Header::default();
    serializer.serialize_object(&mut received_header).unwrap();
    assert_eq!(received_header, header);
    let mut carried = None;
    serializer.serialize_object_ref(&mut carried, &world).unwrap();
    assert_eq!(carried, Some("flag"));
    serializer.serialize_object_ref(&mut carried, &world).unwrap();
    assert_eq!(carried, None);

    let reader = serializer.reader();
    let mut received_avatar = Avatar::default();
    receiver_registry.read_fields(&mut received_avatar, reader).unwrap();
    assert_eq!(received_avatar.position, avatar.position);
    assert_eq!(received_avatar.team, avatar.team);
    assert_eq!(received_avatar.health, avatar.health);
    assert!(!received_avatar.local_only);
    let expected_rotation = avatar.rotation.canonical();
    assert!((received_avatar.rotation.dot(expected_rotation) - 1.0).abs() < 1e-5);

    let kind = ValueKind::Array(Box::new(ValueKind::F32));
    assert_eq!(read_value(reader, &kind).unwrap(), extra);
    assert_eq!(read_object_ref(reader, &world).unwrap(), Some("flag"));
    assert_eq!(read_object_ref(reader, &world).unwrap(), None);
    assert!(!reader.has_failed_reads());
    assert!(!reader.buffer().has_data_to_read());
}

#[test]
fn permissive_peer_survives_short_message() {
    let mut header = Header {
        tick: 5,
        phase: Phase::Ended,
        map: Some("a much longer map name".into()),
        players: None,
    };
    let mut buffer = BitBuffer::new();
    WriteSerializer::new(BitWriter::new(&mut buffer))
        .serialize_object(&mut header)
        .unwrap();
    // cut the message inside the map name
    let cut = buffer.len() / 2;
    buffer.set_length(cut).unwrap();
    buffer.set_bit_position(0);

    let config = CodecConfig::default().with_read_mode(ReadMode::Permissive);
    let mut serializer = ReadSerializer::new(BitReader::with_config(&mut buffer, &config));
    let mut received = Header::default();
    serializer.serialize_object(&mut received).unwrap();
    assert_eq!(received.tick, 5);
    assert_eq!(received.phase, Phase::Ended);
    assert!(serializer.reader().has_failed_reads());
}

#[test]
fn strict_peer_rejects_short_message() {
    let mut header = Header {
        tick: 5,
        phase: Phase::Lobby,
        map: None,
        players: Some(vec![u64::MAX; 4]),
    };
    let mut buffer = BitBuffer::new();
    WriteSerializer::new(BitWriter::new(&mut buffer))
        .serialize_object(&mut header)
        .unwrap();
    let cut = buffer.len() - 3;
    buffer.set_length(cut).unwrap();
    buffer.set_bit_position(0);

    let mut serializer = ReadSerializer::new(BitReader::new(&mut buffer));
    assert!(serializer.serialize_object(&mut Header::default()).is_err());
}

// ============================================================================
// RANDOMIZED
// ============================================================================

#[test]
fn seeded_value_sweep() {
    let mut rng = StdRng::seed_from_u64(7);
    let values: Vec<Value> = (0..500)
        .map(|i| match i % 4 {
            0 => Value::I64(rng.gen()),
            1 => Value::U16(rng.gen()),
            2 => Value::Bool(rng.gen()),
            _ => Value::F64(rng.gen_range(-1e6..1e6)),
        })
        .collect();
    let kinds: Vec<ValueKind> = (0..500)
        .map(|i| match i % 4 {
            0 => ValueKind::I64,
            1 => ValueKind::U16,
            2 => ValueKind::Bool,
            _ => ValueKind::F64,
        })
        .collect();

    let mut buffer = BitBuffer::new();
    let mut writer = BitWriter::new(&mut buffer);
    for value in &values {
        write_value(&mut writer, value).unwrap();
    }

    buffer.set_bit_position(0);
    let mut reader = BitReader::new(&mut buffer);
    for (value, kind) in values.iter().zip(&kinds) {
        assert_eq!(&read_value(&mut reader, kind).unwrap(), value);
    }
}
