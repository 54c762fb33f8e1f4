//! Default [`PrimitiveCodec`] for program-call parameters.
//!
//! Integers and floats are big-endian, packed and zoned decimals use the
//! classic nibble layouts, and character data is converted for the Unicode,
//! ASCII and Latin-1 coded character sets listed in [`SUPPORTED_CCSIDS`].

mod decimal;
mod numeric;
mod text;

use bytes::{Bytes, BytesMut};
use pcml_core::{CodecError, DataType, NativeValue, PrimitiveCodec, ScalarFormat};

pub use text::{
    CCSID_ASCII, CCSID_LATIN1, CCSID_UTF8, CCSID_UTF16, CCSID_UTF16_MIXED, SUPPORTED_CCSIDS,
};

/// Stateless codec covering every scalar data type.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCodec;

impl HostCodec {
    pub fn new() -> Self {
        Self
    }
}

impl PrimitiveCodec for HostCodec {
    fn size_of(&self, format: &ScalarFormat) -> usize {
        match format.data_type {
            DataType::Char | DataType::Byte | DataType::Int | DataType::Float => format.length,
            DataType::Packed => decimal::packed_size(format.length),
            DataType::Zoned => format.length,
            DataType::Struct => 0,
        }
    }

    fn encode(
        &self,
        format: &ScalarFormat,
        value: &NativeValue,
        out: &mut BytesMut,
    ) -> Result<(), CodecError> {
        match format.data_type {
            DataType::Int => numeric::encode_int(format, value, out),
            DataType::Float => numeric::encode_float(format, value, out),
            DataType::Packed => decimal::encode_packed(format, value, out),
            DataType::Zoned => decimal::encode_zoned(format, value, out),
            DataType::Char => text::encode_char(format, value, out),
            DataType::Byte => encode_byte(format, value, out),
            DataType::Struct => Err(struct_format()),
        }
    }

    fn decode(&self, format: &ScalarFormat, data: &[u8]) -> Result<NativeValue, CodecError> {
        let expected = self.size_of(format);
        if data.len() != expected {
            return Err(CodecError::Length {
                expected,
                actual: data.len(),
            });
        }
        match format.data_type {
            DataType::Int => numeric::decode_int(format, data),
            DataType::Float => numeric::decode_float(format, data),
            DataType::Packed => decimal::decode_packed(format, data),
            DataType::Zoned => decimal::decode_zoned(format, data),
            DataType::Char => text::decode_char(format, data),
            DataType::Byte => Ok(NativeValue::Bytes(Bytes::copy_from_slice(data))),
            DataType::Struct => Err(struct_format()),
        }
    }
}

/// Raw bytes, zero-padded on the right.
fn encode_byte(
    format: &ScalarFormat,
    value: &NativeValue,
    out: &mut BytesMut,
) -> Result<(), CodecError> {
    let raw = value.try_bytes()?;
    if raw.len() > format.length {
        return Err(CodecError::ValueOverflow {
            detail: format!("{} bytes do not fit in {}", raw.len(), format.length),
        });
    }
    out.extend_from_slice(raw);
    out.resize(out.len() + format.length - raw.len(), 0);
    Ok(())
}

fn struct_format() -> CodecError {
    CodecError::UnsupportedFormat {
        detail: "struct fields have no scalar encoding".to_string(),
    }
}
