//! Packed (two digits per byte, trailing sign nibble) and zoned (one digit per
//! byte, sign in the zone of the last byte) decimals.

use bytes::{BufMut, BytesMut};
use pcml_core::{
    CodecError, Decimal, MAX_DECIMAL_LENGTH, NativeKind, NativeValue, ScalarFormat,
};

const PACKED_POSITIVE: u8 = 0xC;
const ZONED_POSITIVE: u8 = 0xF;
const NEGATIVE: u8 = 0xD;
const ZONE: u8 = 0xF;

pub(crate) fn packed_size(digits: usize) -> usize {
    digits / 2 + 1
}

pub(crate) fn encode_packed(
    format: &ScalarFormat,
    value: &NativeValue,
    out: &mut BytesMut,
) -> Result<(), CodecError> {
    let (negative, digits) = split_digits(format, value)?;
    // odd digit count plus the sign nibble fills whole bytes
    let mut nibbles = Vec::with_capacity(packed_size(format.length) * 2);
    if format.length % 2 == 0 {
        nibbles.push(0);
    }
    nibbles.extend_from_slice(&digits);
    nibbles.push(if negative { NEGATIVE } else { PACKED_POSITIVE });
    for pair in nibbles.chunks_exact(2) {
        out.put_u8((pair[0] << 4) | pair[1]);
    }
    Ok(())
}

pub(crate) fn decode_packed(format: &ScalarFormat, data: &[u8]) -> Result<NativeValue, CodecError> {
    check_format(format)?;
    let (last, body) = data.split_last().ok_or_else(|| CodecError::Length {
        expected: packed_size(format.length),
        actual: 0,
    })?;
    let mut unscaled: i128 = 0;
    let digits = body
        .iter()
        .flat_map(|b| [b >> 4, b & 0x0F])
        .chain(std::iter::once(last >> 4));
    for nibble in digits {
        unscaled = unscaled * 10 + i128::from(digit(nibble, data)?);
    }
    let negative = sign(last & 0x0F, data)?;
    Ok(decimal_value(format, unscaled, negative))
}

pub(crate) fn encode_zoned(
    format: &ScalarFormat,
    value: &NativeValue,
    out: &mut BytesMut,
) -> Result<(), CodecError> {
    let (negative, digits) = split_digits(format, value)?;
    let last = digits.len() - 1;
    for (i, d) in digits.iter().enumerate() {
        let zone = match (i == last, negative) {
            (true, true) => NEGATIVE,
            (true, false) => ZONED_POSITIVE,
            (false, _) => ZONE,
        };
        out.put_u8((zone << 4) | d);
    }
    Ok(())
}

pub(crate) fn decode_zoned(format: &ScalarFormat, data: &[u8]) -> Result<NativeValue, CodecError> {
    check_format(format)?;
    let mut unscaled: i128 = 0;
    for b in data {
        unscaled = unscaled * 10 + i128::from(digit(b & 0x0F, data)?);
    }
    let negative = match data.last() {
        Some(b) => sign(b >> 4, data)?,
        None => false,
    };
    Ok(decimal_value(format, unscaled, negative))
}

fn check_format(format: &ScalarFormat) -> Result<(), CodecError> {
    let max = MAX_DECIMAL_LENGTH as usize;
    if format.length == 0 || format.length > max {
        return Err(CodecError::UnsupportedFormat {
            detail: format!("{} digits (expected 1..={max})", format.length),
        });
    }
    if format.precision < 0 || format.precision as usize > format.length {
        return Err(CodecError::UnsupportedFormat {
            detail: format!(
                "scale {} for {} digits",
                format.precision, format.length
            ),
        });
    }
    Ok(())
}

/// Sign flag plus exactly `format.length` decimal digits, most significant first.
fn split_digits(format: &ScalarFormat, value: &NativeValue) -> Result<(bool, Vec<u8>), CodecError> {
    check_format(format)?;
    let scale = format.precision as u32;
    let decimal = match value.coerce(NativeKind::Decimal { scale })? {
        NativeValue::Decimal(d) => d,
        other => return Err(other.type_mismatch("Decimal").into()),
    };
    if decimal.digits() as usize > format.length {
        return Err(CodecError::ValueOverflow {
            detail: format!("{decimal} needs more than {} digits", format.length),
        });
    }
    let negative = decimal.unscaled() < 0;
    let mut magnitude = decimal.unscaled().unsigned_abs();
    let mut digits = vec![0u8; format.length];
    for slot in digits.iter_mut().rev() {
        *slot = (magnitude % 10) as u8;
        magnitude /= 10;
    }
    Ok((negative, digits))
}

fn decimal_value(format: &ScalarFormat, unscaled: i128, negative: bool) -> NativeValue {
    let unscaled = if negative { -unscaled } else { unscaled };
    NativeValue::Decimal(Decimal::new(unscaled, format.precision as u32))
}

fn digit(nibble: u8, data: &[u8]) -> Result<u8, CodecError> {
    if nibble <= 9 {
        Ok(nibble)
    } else {
        Err(malformed(format!("invalid digit nibble {nibble:X}"), data))
    }
}

/// `true` for a negative sign nibble.
fn sign(nibble: u8, data: &[u8]) -> Result<bool, CodecError> {
    match nibble {
        0xA | 0xC | 0xE | 0xF => Ok(false),
        0xB | 0xD => Ok(true),
        _ => Err(malformed(format!("invalid sign nibble {nibble:X}"), data)),
    }
}

fn malformed(reason: String, data: &[u8]) -> CodecError {
    let hex: String = data.iter().map(|b| format!("{b:02X}")).collect();
    CodecError::Malformed {
        detail: format!("{reason} in {hex}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcml_core::DataType;

    fn packed(length: usize, scale: i32) -> ScalarFormat {
        ScalarFormat::new(DataType::Packed, length).with_precision(scale)
    }

    #[test]
    fn packed_size_rounds_up_to_whole_bytes() {
        assert_eq!(packed_size(1), 1);
        assert_eq!(packed_size(2), 2);
        assert_eq!(packed_size(5), 3);
        assert_eq!(packed_size(31), 16);
    }

    #[test]
    fn even_digit_counts_get_a_leading_zero_nibble() {
        let mut out = BytesMut::new();
        let value = NativeValue::Decimal(Decimal::new(-1234, 2));
        encode_packed(&packed(4, 2), &value, &mut out).expect("encode");
        assert_eq!(&out[..], &[0x01, 0x23, 0x4D]);
    }

    #[test]
    fn zoned_sign_lives_in_last_zone() {
        let mut out = BytesMut::new();
        let format = ScalarFormat::new(DataType::Zoned, 3);
        encode_zoned(&format, &NativeValue::I32(-42), &mut out).expect("encode");
        assert_eq!(&out[..], &[0xF0, 0xF4, 0xD2]);

        out.clear();
        encode_zoned(&format, &NativeValue::I32(42), &mut out).expect("encode");
        assert_eq!(&out[..], &[0xF0, 0xF4, 0xF2]);
    }

    #[test]
    fn rejects_bad_nibbles() {
        assert!(matches!(
            decode_packed(&packed(3, 0), &[0x1A, 0x3C]),
            Err(CodecError::Malformed { .. })
        ));
        assert!(matches!(
            decode_packed(&packed(3, 0), &[0x12, 0x37]),
            Err(CodecError::Malformed { .. })
        ));
    }
}
