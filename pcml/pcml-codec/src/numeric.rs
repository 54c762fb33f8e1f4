//! Big-endian binary integers and IEEE floats.

use bytes::{Buf, BufMut, BytesMut};
use pcml_core::{CodecError, NativeKind, NativeValue, ScalarFormat};

fn kind_of(format: &ScalarFormat) -> Result<NativeKind, CodecError> {
    format
        .native_kind()
        .ok_or_else(|| CodecError::UnsupportedFormat {
            detail: format!(
                "{} of length {} and precision {}",
                format.data_type, format.length, format.precision
            ),
        })
}

pub(crate) fn encode_int(
    format: &ScalarFormat,
    value: &NativeValue,
    out: &mut BytesMut,
) -> Result<(), CodecError> {
    match value.coerce(kind_of(format)?)? {
        NativeValue::I16(v) => out.put_i16(v),
        NativeValue::U16(v) => out.put_u16(v),
        NativeValue::I32(v) => out.put_i32(v),
        NativeValue::U32(v) => out.put_u32(v),
        NativeValue::I64(v) => out.put_i64(v),
        NativeValue::U64(v) => out.put_u64(v),
        other => return Err(other.type_mismatch("integer").into()),
    }
    Ok(())
}

pub(crate) fn decode_int(format: &ScalarFormat, mut data: &[u8]) -> Result<NativeValue, CodecError> {
    Ok(match kind_of(format)? {
        NativeKind::I16 => NativeValue::I16(data.get_i16()),
        NativeKind::U16 => NativeValue::U16(data.get_u16()),
        NativeKind::I32 => NativeValue::I32(data.get_i32()),
        NativeKind::U32 => NativeValue::U32(data.get_u32()),
        NativeKind::I64 => NativeValue::I64(data.get_i64()),
        NativeKind::U64 => NativeValue::U64(data.get_u64()),
        kind => {
            return Err(CodecError::UnsupportedFormat {
                detail: format!("integer field stored as {}", kind.type_name()),
            });
        }
    })
}

pub(crate) fn encode_float(
    format: &ScalarFormat,
    value: &NativeValue,
    out: &mut BytesMut,
) -> Result<(), CodecError> {
    match value.coerce(kind_of(format)?)? {
        NativeValue::F32(v) => out.put_f32(v),
        NativeValue::F64(v) => out.put_f64(v),
        other => return Err(other.type_mismatch("float").into()),
    }
    Ok(())
}

pub(crate) fn decode_float(
    format: &ScalarFormat,
    mut data: &[u8],
) -> Result<NativeValue, CodecError> {
    Ok(match kind_of(format)? {
        NativeKind::F32 => NativeValue::F32(data.get_f32()),
        _ => NativeValue::F64(data.get_f64()),
    })
}
