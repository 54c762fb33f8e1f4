//! Host-neutral values exchanged with the layout engine.

use std::fmt;

use bytes::Bytes;

use crate::{decimal::Decimal, error::ValueError};

/// Value stored in, or read from, a data field.
///
/// Struct fields carry no scalar value and have no variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    String(String),
    Bytes(Bytes),
    I16(i16),
    I32(i32),
    I64(i64),
    U16(u16),
    U32(u32),
    U64(u64),
    Decimal(Decimal),
    F32(f32),
    F64(f64),
}

/// Canonical variant a field stores, derived from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    String,
    Bytes,
    I16,
    I32,
    I64,
    U16,
    U32,
    U64,
    Decimal { scale: u32 },
    F32,
    F64,
}

impl NativeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NativeKind::String => "String",
            NativeKind::Bytes => "Bytes",
            NativeKind::I16 => "I16",
            NativeKind::I32 => "I32",
            NativeKind::I64 => "I64",
            NativeKind::U16 => "U16",
            NativeKind::U32 => "U32",
            NativeKind::U64 => "U64",
            NativeKind::Decimal { .. } => "Decimal",
            NativeKind::F32 => "F32",
            NativeKind::F64 => "F64",
        }
    }
}

impl NativeValue {
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn bytes(b: impl Into<Bytes>) -> Self {
        Self::Bytes(b.into())
    }

    pub fn kind(&self) -> NativeKind {
        match self {
            NativeValue::String(_) => NativeKind::String,
            NativeValue::Bytes(_) => NativeKind::Bytes,
            NativeValue::I16(_) => NativeKind::I16,
            NativeValue::I32(_) => NativeKind::I32,
            NativeValue::I64(_) => NativeKind::I64,
            NativeValue::U16(_) => NativeKind::U16,
            NativeValue::U32(_) => NativeKind::U32,
            NativeValue::U64(_) => NativeKind::U64,
            NativeValue::Decimal(d) => NativeKind::Decimal { scale: d.scale() },
            NativeValue::F32(_) => NativeKind::F32,
            NativeValue::F64(_) => NativeKind::F64,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, NativeValue::String(_) | NativeValue::Bytes(_))
    }

    /// Integer view of the value; fractions are truncated toward zero and
    /// strings must hold a plain integer.
    pub fn to_i64(&self) -> Result<i64, ValueError> {
        let wide = self.to_i128()?;
        i64::try_from(wide).map_err(|_| self.out_of_range("I64"))
    }

    pub fn to_f64(&self) -> Result<f64, ValueError> {
        Ok(match self {
            NativeValue::I16(v) => *v as f64,
            NativeValue::I32(v) => *v as f64,
            NativeValue::I64(v) => *v as f64,
            NativeValue::U16(v) => *v as f64,
            NativeValue::U32(v) => *v as f64,
            NativeValue::U64(v) => *v as f64,
            NativeValue::Decimal(d) => d.to_f64(),
            NativeValue::F32(v) => *v as f64,
            NativeValue::F64(v) => *v,
            NativeValue::String(s) => s.trim().parse().map_err(|_| ValueError::NotANumber {
                value: s.clone(),
            })?,
            NativeValue::Bytes(_) => return Err(self.type_mismatch("F64")),
        })
    }

    pub fn to_decimal(&self) -> Result<Decimal, ValueError> {
        match self {
            NativeValue::Decimal(d) => Ok(*d),
            NativeValue::F32(v) => Decimal::from_f64(*v as f64),
            NativeValue::F64(v) => Decimal::from_f64(*v),
            NativeValue::String(s) => s.parse(),
            NativeValue::Bytes(_) => Err(self.type_mismatch("Decimal")),
            _ => Ok(Decimal::new(self.to_i128()?, 0)),
        }
    }

    /// Convert to the variant `kind` names, checking ranges.
    pub fn coerce(&self, kind: NativeKind) -> Result<NativeValue, ValueError> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        let expected = kind.type_name();
        Ok(match kind {
            NativeKind::String => match self {
                NativeValue::Bytes(_) => return Err(self.type_mismatch(expected)),
                other => NativeValue::String(other.to_string()),
            },
            NativeKind::Bytes => return Err(self.type_mismatch(expected)),
            NativeKind::I16 => NativeValue::I16(self.narrow(expected)?),
            NativeKind::I32 => NativeValue::I32(self.narrow(expected)?),
            NativeKind::I64 => NativeValue::I64(self.narrow(expected)?),
            NativeKind::U16 => NativeValue::U16(self.narrow(expected)?),
            NativeKind::U32 => NativeValue::U32(self.narrow(expected)?),
            NativeKind::U64 => NativeValue::U64(self.narrow(expected)?),
            NativeKind::Decimal { scale } => {
                let d = self.to_decimal()?;
                NativeValue::Decimal(d.rescale(scale).ok_or_else(|| {
                    ValueError::OutOfRange {
                        value: d.to_string(),
                        expected: format!("Decimal with scale {scale}"),
                    }
                })?)
            }
            NativeKind::F32 => {
                let wide = self.to_f64()?;
                if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
                    return Err(self.out_of_range(expected));
                }
                NativeValue::F32(wide as f32)
            }
            NativeKind::F64 => NativeValue::F64(self.to_f64()?),
        })
    }

    pub fn try_str(&self) -> Result<&str, ValueError> {
        match self {
            NativeValue::String(s) => Ok(s),
            _ => Err(self.type_mismatch("String")),
        }
    }

    pub fn try_bytes(&self) -> Result<&Bytes, ValueError> {
        match self {
            NativeValue::Bytes(b) => Ok(b),
            _ => Err(self.type_mismatch("Bytes")),
        }
    }

    pub fn type_mismatch(&self, expected: impl Into<String>) -> ValueError {
        ValueError::TypeMismatch {
            expected: expected.into(),
            actual: self.kind().type_name().to_string(),
        }
    }

    fn out_of_range(&self, expected: &str) -> ValueError {
        ValueError::OutOfRange {
            value: self.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Exact integer conversion; a fractional part is out of range.
    fn narrow<T: TryFrom<i128>>(&self, expected: &str) -> Result<T, ValueError> {
        let integral = match self {
            NativeValue::F32(v) => v.is_nan() || v.fract() == 0.0,
            NativeValue::F64(v) => v.is_nan() || v.fract() == 0.0,
            NativeValue::Decimal(d) => d.rescale(0).is_some(),
            _ => true,
        };
        if !integral {
            return Err(self.out_of_range(expected));
        }
        let wide = self.to_i128()?;
        T::try_from(wide).map_err(|_| self.out_of_range(expected))
    }

    fn to_i128(&self) -> Result<i128, ValueError> {
        Ok(match self {
            NativeValue::I16(v) => *v as i128,
            NativeValue::I32(v) => *v as i128,
            NativeValue::I64(v) => *v as i128,
            NativeValue::U16(v) => *v as i128,
            NativeValue::U32(v) => *v as i128,
            NativeValue::U64(v) => *v as i128,
            NativeValue::Decimal(d) => d.trunc(),
            NativeValue::F32(v) => float_to_i128(*v as f64, self)?,
            NativeValue::F64(v) => float_to_i128(*v, self)?,
            NativeValue::String(s) => s.trim().parse().map_err(|_| ValueError::NotANumber {
                value: s.clone(),
            })?,
            NativeValue::Bytes(_) => return Err(self.type_mismatch("integer")),
        })
    }
}

fn float_to_i128(v: f64, original: &NativeValue) -> Result<i128, ValueError> {
    if v.is_nan() {
        return Err(ValueError::NotANumber {
            value: original.to_string(),
        });
    }
    let t = v.trunc();
    if t < i128::MIN as f64 || t > i128::MAX as f64 {
        return Err(original.out_of_range("integer"));
    }
    Ok(t as i128)
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::String(s) => f.write_str(s),
            NativeValue::Bytes(b) => {
                for byte in b.iter() {
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
            NativeValue::I16(v) => write!(f, "{v}"),
            NativeValue::I32(v) => write!(f, "{v}"),
            NativeValue::I64(v) => write!(f, "{v}"),
            NativeValue::U16(v) => write!(f, "{v}"),
            NativeValue::U32(v) => write!(f, "{v}"),
            NativeValue::U64(v) => write!(f, "{v}"),
            NativeValue::Decimal(d) => write!(f, "{d}"),
            NativeValue::F32(v) => write!(f, "{v}"),
            NativeValue::F64(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i16> for NativeValue {
    fn from(value: i16) -> Self {
        Self::I16(value)
    }
}

impl From<i32> for NativeValue {
    fn from(value: i32) -> Self {
        Self::I32(value)
    }
}

impl From<i64> for NativeValue {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<u16> for NativeValue {
    fn from(value: u16) -> Self {
        Self::U16(value)
    }
}

impl From<u32> for NativeValue {
    fn from(value: u32) -> Self {
        Self::U32(value)
    }
}

impl From<u64> for NativeValue {
    fn from(value: u64) -> Self {
        Self::U64(value)
    }
}

impl From<f32> for NativeValue {
    fn from(value: f32) -> Self {
        Self::F32(value)
    }
}

impl From<f64> for NativeValue {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<Decimal> for NativeValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<Bytes> for NativeValue {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for NativeValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}
