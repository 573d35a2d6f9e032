//! # Wire Round-Trip Tests
//!
//! Writes mixed sequences at arbitrary bit offsets and reads them back
//! through a fresh reader on the same buffer.
//!
//! Run with: cargo test -p bitwire_core --test wire_roundtrip_test

use bitwire_core::{
    packed, BitBuffer, BitReader, BitWriter, CodecConfig, CodecError, DiffLayout, NativeWriter,
    ReadMode,
};
use bitwire_shared::{Quaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// MIXED SEQUENCES
// ============================================================================

#[test]
fn misaligned_mixed_sequence() {
    let mut buffer = BitBuffer::new();
    let mut writer = BitWriter::new(&mut buffer);
    writer.write_bool(true).unwrap();
    writer.write_bool(false).unwrap();
    writer.write_byte(0xA5).unwrap();
    writer.write_byte(0x0F).unwrap();
    writer.write_i16(-12345).unwrap();
    writer.write_u64(0xDEAD_BEEF_CAFE_F00D).unwrap();
    writer.write_u64_packed(67824).unwrap();
    writer.write_i64_packed(-9_000_000_000).unwrap();
    writer.write_bool(true).unwrap();
    writer.write_byte(0xFF).unwrap();
    writer.write_byte(0x00).unwrap();

    let bits = buffer.bit_length();
    assert_eq!(bits, 2 + 8 + 8 + 16 + 64 + 4 * 8 + 6 * 8 + 1 + 8 + 8);

    buffer.set_bit_position(0);
    let mut reader = BitReader::new(&mut buffer);
    assert!(reader.read_bool().unwrap());
    assert!(!reader.read_bool().unwrap());
    assert_eq!(reader.read_byte().unwrap(), 0xA5);
    assert_eq!(reader.read_byte().unwrap(), 0x0F);
    assert_eq!(reader.read_i16().unwrap(), -12345);
    assert_eq!(reader.read_u64().unwrap(), 0xDEAD_BEEF_CAFE_F00D);
    assert_eq!(reader.read_u64_packed().unwrap(), 67824);
    assert_eq!(reader.read_i64_packed().unwrap(), -9_000_000_000);
    assert!(reader.read_bool().unwrap());
    assert_eq!(reader.read_byte().unwrap(), 0xFF);
    assert_eq!(reader.read_byte().unwrap(), 0x00);
    assert_eq!(reader.buffer().bit_position(), bits);
    assert!(!reader.has_failed_reads());
}

#[test]
fn packed_tier_boundaries() {
    let unsigned = [0u64, 240, 241, 2287, 2288, 67823, 67824, 1 << 24, 1 << 32, 1 << 48, u64::MAX];
    let signed = [0i64, -1, 1, -120, 120, -1144, 1144, -33912, 33912, i64::MIN, i64::MAX];

    let mut buffer = BitBuffer::new();
    let mut writer = BitWriter::new(&mut buffer);
    // offset everything by three bits
    writer.write_bits(0b101, 3).unwrap();
    for &v in &unsigned {
        writer.write_u64_packed(v).unwrap();
    }
    for &v in &signed {
        writer.write_i64_packed(v).unwrap();
    }

    let expected_bits = 3
        + unsigned.iter().map(|&v| packed::encoded_len(v) * 8).sum::<usize>()
        + signed
            .iter()
            .map(|&v| packed::encoded_len(packed::zigzag_encode(v)) * 8)
            .sum::<usize>();
    assert_eq!(buffer.bit_length(), expected_bits);

    buffer.set_bit_position(0);
    let mut reader = BitReader::new(&mut buffer);
    assert_eq!(reader.read_bits(3).unwrap(), 0b101);
    for &v in &unsigned {
        assert_eq!(reader.read_u64_packed().unwrap(), v);
    }
    for &v in &signed {
        assert_eq!(reader.read_i64_packed().unwrap(), v);
    }
}

#[test]
fn consecutive_arrays() {
    let bytes: Vec<u8> = (0..=255).step_by(7).collect();
    let ints = vec![i32::MIN, -1, 0, 1, 1 << 20, i32::MAX];
    let doubles = vec![0.0, -1.5, std::f64::consts::PI, f64::MAX];

    let mut buffer = BitBuffer::new();
    let mut writer = BitWriter::new(&mut buffer);
    writer.write_bool(true).unwrap();
    writer.write_byte_array(&bytes, None).unwrap();
    writer.write_array(&ints, None).unwrap();
    writer.write_array_packed(&doubles, None).unwrap();

    buffer.set_bit_position(0);
    let mut reader = BitReader::new(&mut buffer);
    assert!(reader.read_bool().unwrap());
    assert_eq!(reader.read_byte_array(None).unwrap(), bytes);
    assert_eq!(reader.read_array::<i32>(None).unwrap(), ints);
    assert_eq!(reader.read_array_packed::<f64>(None).unwrap(), doubles);
    assert!(!reader.buffer().has_data_to_read());
}

#[test]
fn byte_int_double_arrays_in_order() {
    let bytes = [1u8, 2, 13, 37, 69];
    let ints = [1337i32, 69420, 12345, 0, 0, 5];
    let doubles = [0.02f64, 0.06, 1e40, 256.0];

    let mut buffer = BitBuffer::new();
    let mut writer = BitWriter::new(&mut buffer);
    writer.write_byte_array(&bytes, None).unwrap();
    writer.write_array(&ints, None).unwrap();
    writer.write_array(&doubles, None).unwrap();

    buffer.set_bit_position(0);
    let mut reader = BitReader::new(&mut buffer);
    assert_eq!(reader.read_byte_array(None).unwrap(), bytes);
    assert_eq!(reader.read_array::<i32>(None).unwrap(), ints);
    assert_eq!(reader.read_array::<f64>(None).unwrap(), doubles);
    assert!(!reader.buffer().has_data_to_read());
}

#[test]
fn strings_and_math_at_odd_offsets() {
    let mut buffer = BitBuffer::new();
    let mut writer = BitWriter::new(&mut buffer);
    writer.write_bool(false).unwrap();
    writer.write_string("h\u{e9}llo w\u{f6}rld", false).unwrap();
    writer.write_string_packed("\u{1F600} ok").unwrap();
    writer.write_vector3_packed(Vector3::new(1.0, -2.5, 1e9)).unwrap();
    writer
        .write_rotation_packed(Quaternion::from_axis_angle(Vector3::UP, 1.0))
        .unwrap();
    writer.write_ranged_f32(0.5, 0.0, 1.0, 2).unwrap();

    buffer.set_bit_position(0);
    let mut reader = BitReader::new(&mut buffer);
    assert!(!reader.read_bool().unwrap());
    assert_eq!(reader.read_string(false).unwrap(), "h\u{e9}llo w\u{f6}rld");
    assert_eq!(reader.read_string_packed().unwrap(), "\u{1F600} ok");
    assert_eq!(reader.read_vector3_packed().unwrap(), Vector3::new(1.0, -2.5, 1e9));
    let rotation = reader.read_rotation_packed().unwrap();
    let expected = Quaternion::from_axis_angle(Vector3::UP, 1.0).canonical();
    assert!((rotation.dot(expected) - 1.0).abs() < 1e-5);
    assert!((reader.read_ranged_f32(0.0, 1.0, 2).unwrap() - 0.5).abs() <= 1.0 / 65535.0);
}

// ============================================================================
// FIXED CAPACITY
// ============================================================================

#[test]
fn fixed_capacity_rejects_overflow() {
    let mut buffer = BitBuffer::fixed_capacity(9);
    let mut writer = BitWriter::new(&mut buffer);
    writer.write_i32(1).unwrap();
    writer.write_i32(2).unwrap();
    assert!(matches!(
        writer.write_i32(3),
        Err(CodecError::UnsupportedOperation(_))
    ));
    assert_eq!(writer.buffer().len(), 8);
    writer.write_byte(7).unwrap();
    assert_eq!(writer.buffer().len(), 9);
    assert!(writer.write_bool(true).is_err());
    assert!(writer.write_byte(0).is_err());
    assert_eq!(buffer.capacity(), 9);
}

#[test]
fn growth_never_loses_data() {
    let mut buffer = BitBuffer::with_capacity(1);
    let mut writer = BitWriter::new(&mut buffer);
    for i in 0..10_000u32 {
        writer.write_u32_packed(i).unwrap();
    }
    assert!(buffer.capacity() >= buffer.len());

    buffer.set_bit_position(0);
    let mut reader = BitReader::new(&mut buffer);
    for i in 0..10_000u32 {
        assert_eq!(reader.read_u32_packed().unwrap(), i);
    }
}

// ============================================================================
// TRUNCATION
// ============================================================================

#[test]
fn permissive_reader_counts_failures() {
    let mut buffer = BitBuffer::new();
    BitWriter::new(&mut buffer).write_u16(0xBEEF).unwrap();
    buffer.set_bit_position(0);

    let config = CodecConfig::default().with_read_mode(ReadMode::Permissive);
    let mut reader = BitReader::with_config(&mut buffer, &config);
    assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
    assert_eq!(reader.read_u32().unwrap(), 0);
    assert_eq!(reader.read_string_packed().unwrap(), "");
    assert_eq!(reader.failed_reads(), 2);
}

#[test]
fn strict_reader_rewinds_on_truncation() {
    let mut buffer = BitBuffer::new();
    BitWriter::new(&mut buffer).write_bytes(&[250, 1]).unwrap();
    buffer.set_bit_position(0);

    let mut reader = BitReader::new(&mut buffer);
    assert!(matches!(
        reader.read_u64_packed(),
        Err(CodecError::Truncated { .. })
    ));
    assert_eq!(reader.buffer().bit_position(), 0);
}

// ============================================================================
// RANDOMIZED SWEEPS
// ============================================================================

#[test]
fn seeded_sweep_matches_native_writer() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let values: Vec<u64> = (0..2_000)
        .map(|_| {
            let shift = rng.gen_range(0..64);
            rng.gen::<u64>() >> shift
        })
        .collect();

    let mut buffer = BitBuffer::new();
    let mut writer = BitWriter::new(&mut buffer);
    let mut native = NativeWriter::new(values.len() * 9);
    for &v in &values {
        writer.write_u64_packed(v).unwrap();
        native.write_u64_packed(v).unwrap();
    }
    assert_eq!(buffer.as_slice(), native.as_slice());

    buffer.set_bit_position(0);
    let mut reader = BitReader::new(&mut buffer);
    for &v in &values {
        assert_eq!(reader.read_u64_packed().unwrap(), v);
    }
}

#[test]
fn seeded_sweep_mixed_offsets() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut expected = Vec::new();

    let mut buffer = BitBuffer::new();
    let mut writer = BitWriter::new(&mut buffer);
    for _ in 0..1_000 {
        let flag: bool = rng.gen();
        let signed: i32 = rng.gen();
        let float: f32 = rng.gen_range(-1000.0..1000.0);
        writer.write_bool(flag).unwrap();
        writer.write_i32_packed(signed).unwrap();
        writer.write_f32(float).unwrap();
        expected.push((flag, signed, float));
    }

    buffer.set_bit_position(0);
    let mut reader = BitReader::new(&mut buffer);
    for (flag, signed, float) in expected {
        assert_eq!(reader.read_bool().unwrap(), flag);
        assert_eq!(reader.read_i32_packed().unwrap(), signed);
        assert_eq!(reader.read_f32().unwrap().to_bits(), float.to_bits());
    }
    assert!(!reader.buffer().has_data_to_read());
}

#[test]
fn seeded_diff_sweep_all_layouts_and_offsets() {
    // mostly small values so that many elements repeat
    fn random_array(rng: &mut StdRng) -> Vec<i32> {
        let len = rng.gen_range(0..24);
        (0..len)
            .map(|_| if rng.gen_bool(0.8) { rng.gen_range(-3..3) } else { rng.gen() })
            .collect()
    }

    let mut rng = StdRng::seed_from_u64(0xD1FF);

    for layout in [DiffLayout::Premap, DiffLayout::Interleaved] {
        let config = CodecConfig::default().with_diff_layout(layout);
        for round in 0..500 {
            let old = random_array(&mut rng);
            let new = random_array(&mut rng);
            let offset = round % 8;

            let mut buffer = BitBuffer::new();
            let mut writer = BitWriter::with_config(&mut buffer, &config);
            writer.write_bits(0, offset).unwrap();
            writer.write_array_diff(&new, &old, None).unwrap();
            writer.write_array_packed_diff(&new, &old, None).unwrap();

            buffer.set_bit_position(0);
            let mut reader = BitReader::with_config(&mut buffer, &config);
            assert_eq!(reader.read_bits(offset).unwrap(), 0);
            assert_eq!(reader.read_array_diff(&old, None).unwrap(), new);
            assert_eq!(reader.read_array_packed_diff(&old, None).unwrap(), new);
            assert!(!reader.buffer().has_data_to_read());
        }
    }
}
