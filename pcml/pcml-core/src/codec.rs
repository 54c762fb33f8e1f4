//! Contract for converting single scalar values to and from host bytes.

use bytes::BytesMut;

use crate::{
    error::CodecError,
    schema::{BidiStringType, CharWidth, DataType, TrimMode},
    value::{NativeKind, NativeValue},
};

/// Fully resolved description of one scalar element.
///
/// Every length, precision and ccsid has already been resolved against the
/// current field values, so a codec never looks at the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarFormat {
    pub data_type: DataType,
    /// Declared length: bytes for char/byte/int/float, digits for packed/zoned.
    pub length: usize,
    /// Scale for packed/zoned; 8×length or 8×length−1 for unsigned/signed int.
    pub precision: i32,
    pub ccsid: u32,
    pub char_width: CharWidth,
    pub trim: TrimMode,
    /// Carried for codecs that reorder bidirectional text; `HostCodec` ignores it.
    pub bidi_string_type: BidiStringType,
}

impl ScalarFormat {
    pub fn new(data_type: DataType, length: usize) -> Self {
        let precision = match data_type {
            DataType::Int => (length * 8) as i32 - 1,
            _ => 0,
        };
        Self {
            data_type,
            length,
            precision,
            ccsid: 0,
            char_width: CharWidth::OneByte,
            trim: TrimMode::default(),
            bidi_string_type: BidiStringType::Default,
        }
    }

    pub fn with_precision(mut self, precision: i32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_ccsid(mut self, ccsid: u32) -> Self {
        self.ccsid = ccsid;
        self
    }

    pub fn with_char_width(mut self, char_width: CharWidth) -> Self {
        self.char_width = char_width;
        self
    }

    pub fn with_trim(mut self, trim: TrimMode) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_bidi_string_type(mut self, bidi_string_type: BidiStringType) -> Self {
        self.bidi_string_type = bidi_string_type;
        self
    }

    pub fn is_unsigned(&self) -> bool {
        self.data_type == DataType::Int && self.precision as usize == self.length * 8
    }

    /// Variant a decoded value of this format has.
    pub fn native_kind(&self) -> Option<NativeKind> {
        Some(match self.data_type {
            DataType::Char => NativeKind::String,
            DataType::Byte => NativeKind::Bytes,
            DataType::Packed | DataType::Zoned => NativeKind::Decimal {
                scale: self.precision.max(0) as u32,
            },
            DataType::Float if self.length == 4 => NativeKind::F32,
            DataType::Float => NativeKind::F64,
            DataType::Int => match (self.length, self.is_unsigned()) {
                (2, false) => NativeKind::I16,
                (2, true) => NativeKind::U16,
                (4, false) => NativeKind::I32,
                (4, true) => NativeKind::U32,
                (8, false) => NativeKind::I64,
                (8, true) => NativeKind::U64,
                _ => return None,
            },
            DataType::Struct => return None,
        })
    }
}

/// Converts scalars between [`NativeValue`]s and their host byte form.
pub trait PrimitiveCodec: Send + Sync {
    /// Bytes one element of `format` occupies.
    fn size_of(&self, format: &ScalarFormat) -> usize;

    /// Append exactly `size_of(format)` bytes encoding `value`.
    fn encode(
        &self,
        format: &ScalarFormat,
        value: &NativeValue,
        out: &mut BytesMut,
    ) -> Result<(), CodecError>;

    /// Decode one element from `data`, which is `size_of(format)` bytes long.
    fn decode(&self, format: &ScalarFormat, data: &[u8]) -> Result<NativeValue, CodecError>;
}
