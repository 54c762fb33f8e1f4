use bytes::{Bytes, BytesMut};
use pcml_codec::{CCSID_ASCII, CCSID_LATIN1, CCSID_UTF8, CCSID_UTF16, HostCodec};
use pcml_core::{BidiStringType, CodecError, DataType, Decimal, NativeValue, PrimitiveCodec, ScalarFormat, TrimMode};

// ── helpers ──────────────────────────────────────────────────────────────────

fn encode(format: &ScalarFormat, value: impl Into<NativeValue>) -> Result<Vec<u8>, CodecError> {
    let mut out = BytesMut::new();
    HostCodec.encode(format, &value.into(), &mut out)?;
    assert_eq!(out.len(), HostCodec.size_of(format), "encoded size");
    Ok(out.to_vec())
}

fn round_trip(format: &ScalarFormat, value: impl Into<NativeValue>) -> NativeValue {
    let bytes = encode(format, value).expect("encode");
    HostCodec.decode(format, &bytes).expect("decode")
}

fn int(length: usize) -> ScalarFormat {
    ScalarFormat::new(DataType::Int, length)
}

fn unsigned(length: usize) -> ScalarFormat {
    ScalarFormat::new(DataType::Int, length).with_precision(length as i32 * 8)
}

fn char_field(length: usize, ccsid: u32) -> ScalarFormat {
    ScalarFormat::new(DataType::Char, length).with_ccsid(ccsid)
}

// ── integers and floats ──────────────────────────────────────────────────────

#[test]
fn integers_are_big_endian() {
    assert_eq!(encode(&int(4), 5).unwrap(), vec![0, 0, 0, 5]);
    assert_eq!(encode(&int(2), -2).unwrap(), vec![0xFF, 0xFE]);
    assert_eq!(encode(&unsigned(2), 0xABCD_i32).unwrap(), vec![0xAB, 0xCD]);
}

#[test]
fn integer_extremes_round_trip() {
    assert_eq!(round_trip(&int(2), i16::MIN), NativeValue::I16(i16::MIN));
    assert_eq!(round_trip(&int(4), i32::MAX), NativeValue::I32(i32::MAX));
    assert_eq!(round_trip(&int(8), i64::MIN), NativeValue::I64(i64::MIN));
    assert_eq!(round_trip(&unsigned(2), u16::MAX), NativeValue::U16(u16::MAX));
    assert_eq!(round_trip(&unsigned(4), u32::MAX), NativeValue::U32(u32::MAX));
    assert_eq!(round_trip(&unsigned(8), u64::MAX), NativeValue::U64(u64::MAX));
}

#[test]
fn integer_out_of_range_is_rejected() {
    let err = encode(&int(2), 40_000).expect_err("does not fit in i16");
    assert!(matches!(err, CodecError::Value(_)));
    let err = encode(&unsigned(4), -1).expect_err("negative unsigned");
    assert!(matches!(err, CodecError::Value(_)));
}

#[test]
fn unsupported_int_length_is_reported() {
    let err = encode(&int(3), 1).expect_err("3-byte int");
    assert!(matches!(err, CodecError::UnsupportedFormat { .. }));
}

#[test]
fn floats_round_trip() {
    let f4 = ScalarFormat::new(DataType::Float, 4);
    let f8 = ScalarFormat::new(DataType::Float, 8);
    assert_eq!(round_trip(&f4, 1.5f32), NativeValue::F32(1.5));
    assert_eq!(round_trip(&f8, -2.25f64), NativeValue::F64(-2.25));
    assert_eq!(encode(&f4, 1.0f32).unwrap(), vec![0x3F, 0x80, 0, 0]);
}

// ── decimals ─────────────────────────────────────────────────────────────────

#[test]
fn packed_and_zoned_round_trip_all_lengths() {
    for length in 1..=31usize {
        let scale = (length / 2) as u32;
        let max = "9".repeat(length);
        let unscaled: i128 = max.parse().unwrap();
        for data_type in [DataType::Packed, DataType::Zoned] {
            let format = ScalarFormat::new(data_type, length).with_precision(scale as i32);
            for v in [unscaled, -unscaled, 0, 1] {
                let d = Decimal::new(v, scale);
                assert_eq!(
                    round_trip(&format, d),
                    NativeValue::Decimal(d),
                    "{data_type} length {length} value {d}"
                );
            }
        }
    }
}

#[test]
fn packed_layout_uses_c_and_d_signs() {
    let format = ScalarFormat::new(DataType::Packed, 5).with_precision(2);
    assert_eq!(
        encode(&format, Decimal::new(12345, 2)).unwrap(),
        vec![0x12, 0x34, 0x5C]
    );
    assert_eq!(
        encode(&format, Decimal::new(-5, 2)).unwrap(),
        vec![0x00, 0x00, 0x5D]
    );
}

#[test]
fn alternate_sign_nibbles_decode() {
    let format = ScalarFormat::new(DataType::Packed, 3);
    assert_eq!(
        HostCodec.decode(&format, &[0x12, 0x3F]).unwrap(),
        NativeValue::Decimal(Decimal::new(123, 0))
    );
    assert_eq!(
        HostCodec.decode(&format, &[0x12, 0x3B]).unwrap(),
        NativeValue::Decimal(Decimal::new(-123, 0))
    );
}

#[test]
fn decimal_overflow_and_inexact_scale_are_rejected() {
    let format = ScalarFormat::new(DataType::Packed, 3).with_precision(1);
    let err = encode(&format, Decimal::new(12345, 1)).expect_err("too many digits");
    assert!(matches!(err, CodecError::ValueOverflow { .. }));
    let err = encode(&format, Decimal::new(125, 2)).expect_err("scale would lose digits");
    assert!(matches!(err, CodecError::Value(_)));
}

#[test]
fn integers_and_strings_feed_decimals() {
    let format = ScalarFormat::new(DataType::Zoned, 6).with_precision(2);
    assert_eq!(
        round_trip(&format, 42),
        NativeValue::Decimal(Decimal::new(4200, 2))
    );
    assert_eq!(
        round_trip(&format, "-3.5"),
        NativeValue::Decimal(Decimal::new(-350, 2))
    );
}

// ── text and bytes ───────────────────────────────────────────────────────────

#[test]
fn one_byte_text_is_blank_padded_and_trimmed() {
    let format = char_field(8, CCSID_UTF8);
    assert_eq!(encode(&format, "ABCDE").unwrap(), b"ABCDE   ".to_vec());
    assert_eq!(round_trip(&format, "ABCDE"), NativeValue::string("ABCDE"));

    let keep = format.clone().with_trim(TrimMode::None);
    assert_eq!(round_trip(&keep, "AB"), NativeValue::string("AB      "));
    let both = format.with_trim(TrimMode::Both);
    assert_eq!(round_trip(&both, "  AB"), NativeValue::string("AB"));
}

#[test]
fn bidi_string_type_leaves_text_unchanged() {
    let format = char_field(4, CCSID_UTF8).with_bidi_string_type(BidiStringType::St5);
    assert_eq!(format.bidi_string_type, BidiStringType::St5);
    assert_eq!(encode(&format, "AB").unwrap(), b"AB  ".to_vec());
}

#[test]
fn two_byte_text_counts_length_in_bytes() {
    let format = char_field(6, CCSID_UTF16);
    assert_eq!(encode(&format, "hé").unwrap(), vec![0, b'h', 0, 0xE9, 0, b' ']);
    assert_eq!(round_trip(&format, "hé"), NativeValue::string("hé"));
    assert!(matches!(
        encode(&format, "four"),
        Err(CodecError::ValueOverflow { .. })
    ));
}

#[test]
fn single_byte_tables_reject_unmappable_characters() {
    assert!(matches!(
        encode(&char_field(4, CCSID_ASCII), "é"),
        Err(CodecError::ValueOverflow { .. })
    ));
    assert_eq!(encode(&char_field(1, CCSID_LATIN1), "é").unwrap(), vec![0xE9]);
}

#[test]
fn numbers_are_written_as_text_in_char_fields() {
    assert_eq!(round_trip(&char_field(4, CCSID_UTF8), 42), NativeValue::string("42"));
}

#[test]
fn ebcdic_ccsids_are_not_supported() {
    let err = encode(&char_field(4, 37), "AB").expect_err("no EBCDIC tables");
    assert_eq!(err, CodecError::UnsupportedCcsid { ccsid: 37 });
}

#[test]
fn bytes_are_zero_padded() {
    let format = ScalarFormat::new(DataType::Byte, 4);
    assert_eq!(
        encode(&format, Bytes::from_static(&[1, 2])).unwrap(),
        vec![1, 2, 0, 0]
    );
    assert_eq!(
        round_trip(&format, vec![9u8, 8, 7, 6]),
        NativeValue::bytes(vec![9u8, 8, 7, 6])
    );
    assert!(matches!(
        encode(&format, vec![0u8; 5]),
        Err(CodecError::ValueOverflow { .. })
    ));
    assert!(matches!(encode(&format, "text"), Err(CodecError::Value(_))));
}

#[test]
fn decode_checks_buffer_length() {
    let err = HostCodec.decode(&int(4), &[0, 1]).expect_err("short buffer");
    assert_eq!(err, CodecError::Length { expected: 4, actual: 2 });
}

#[test]
fn struct_has_no_scalar_size() {
    let format = ScalarFormat::new(DataType::Struct, 0);
    assert_eq!(HostCodec.size_of(&format), 0);
    assert!(matches!(
        encode(&format, 1),
        Err(CodecError::UnsupportedFormat { .. })
    ));
}
