//! Fixed-width character fields.
//!
//! `length` is always a byte count. Values shorter than the field are padded
//! with blanks in the field's encoding; longer values are rejected.

use bytes::{BufMut, BytesMut};
use pcml_core::{CodecError, NativeKind, NativeValue, ScalarFormat};
use tracing::trace;

pub const CCSID_ASCII: u32 = 367;
pub const CCSID_LATIN1: u32 = 819;
pub const CCSID_UTF16: u32 = 1200;
pub const CCSID_UTF8: u32 = 1208;
/// Two-byte host default; carried as UTF-16 big-endian.
pub const CCSID_UTF16_MIXED: u32 = 13488;

pub const SUPPORTED_CCSIDS: &[u32] = &[
    CCSID_ASCII,
    CCSID_LATIN1,
    CCSID_UTF16,
    CCSID_UTF8,
    CCSID_UTF16_MIXED,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ascii,
    Latin1,
    Utf8,
    Utf16Be,
}

impl Encoding {
    fn for_ccsid(ccsid: u32) -> Result<Self, CodecError> {
        match ccsid {
            CCSID_ASCII => Ok(Encoding::Ascii),
            CCSID_LATIN1 => Ok(Encoding::Latin1),
            CCSID_UTF8 => Ok(Encoding::Utf8),
            CCSID_UTF16 | CCSID_UTF16_MIXED => Ok(Encoding::Utf16Be),
            _ => Err(CodecError::UnsupportedCcsid { ccsid }),
        }
    }

    /// Largest code point a single-byte table can hold.
    fn single_byte_limit(&self) -> Option<u32> {
        match self {
            Encoding::Ascii => Some(0x7F),
            Encoding::Latin1 => Some(0xFF),
            _ => None,
        }
    }
}

pub(crate) fn encode_char(
    format: &ScalarFormat,
    value: &NativeValue,
    out: &mut BytesMut,
) -> Result<(), CodecError> {
    let encoding = Encoding::for_ccsid(format.ccsid)?;
    let text = match value.coerce(NativeKind::String)? {
        NativeValue::String(s) => s,
        other => return Err(other.type_mismatch("String").into()),
    };

    let mut encoded = Vec::with_capacity(format.length);
    match encoding {
        Encoding::Utf8 => encoded.extend_from_slice(text.as_bytes()),
        Encoding::Utf16Be => {
            for unit in text.encode_utf16() {
                encoded.extend_from_slice(&unit.to_be_bytes());
            }
        }
        Encoding::Ascii | Encoding::Latin1 => {
            let limit = encoding.single_byte_limit().unwrap_or(0x7F);
            for ch in text.chars() {
                let code = ch as u32;
                if code > limit {
                    return Err(CodecError::ValueOverflow {
                        detail: format!("'{ch}' has no mapping in ccsid {}", format.ccsid),
                    });
                }
                encoded.push(code as u8);
            }
        }
    }

    if encoded.len() > format.length {
        return Err(CodecError::ValueOverflow {
            detail: format!(
                "text of {} bytes does not fit in {} bytes",
                encoded.len(),
                format.length
            ),
        });
    }
    trace!(ccsid = format.ccsid, bytes = encoded.len(), "encoded text");

    out.extend_from_slice(&encoded);
    let mut pad = format.length - encoded.len();
    if encoding == Encoding::Utf16Be {
        while pad >= 2 {
            out.put_u16(0x0020);
            pad -= 2;
        }
        out.put_bytes(0, pad);
    } else {
        out.put_bytes(b' ', pad);
    }
    Ok(())
}

pub(crate) fn decode_char(format: &ScalarFormat, data: &[u8]) -> Result<NativeValue, CodecError> {
    let text = match Encoding::for_ccsid(format.ccsid)? {
        Encoding::Utf8 => std::str::from_utf8(data)
            .map_err(|e| CodecError::Malformed {
                detail: format!("invalid UTF-8: {e}"),
            })?
            .to_string(),
        Encoding::Utf16Be => {
            // a trailing odd byte is padding
            let units: Vec<u16> = data
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).map_err(|e| CodecError::Malformed {
                detail: format!("invalid UTF-16: {e}"),
            })?
        }
        Encoding::Ascii => {
            if let Some(b) = data.iter().find(|b| !b.is_ascii()) {
                return Err(CodecError::Malformed {
                    detail: format!("byte {b:02X} is not ASCII"),
                });
            }
            data.iter().map(|&b| b as char).collect()
        }
        Encoding::Latin1 => data.iter().map(|&b| b as char).collect(),
    };
    Ok(NativeValue::String(format.trim.apply(&text).to_string()))
}
