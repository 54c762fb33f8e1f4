use std::fmt;

use pcml_core::{CodecError, DataType, Dimensions, ValueError};

/// Why a reference attribute could not be followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// No node has the referenced name in any enclosing scope.
    ElementNotFound,
    /// The referenced node is a struct or program, not a data field.
    WrongElementType,
    /// The referenced data field is neither numeric nor character.
    WrongDataType,
    /// Resolving the reference requires the value being resolved.
    CircularReference,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferenceKind::ElementNotFound => "element not found",
            ReferenceKind::WrongElementType => "wrong element type",
            ReferenceKind::WrongDataType => "wrong data type",
            ReferenceKind::CircularReference => "circular reference",
        })
    }
}

/// Error returned by [`Document`](crate::Document) operations.
///
/// Every variant names the qualified field it concerns.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("{kind}: '{name}' referenced by '{referenced_by}'")]
    SchemaReference {
        kind: ReferenceKind,
        name: String,
        referenced_by: String,
    },

    #[error("no value set for '{field}' at {indices}")]
    ValueNotSet { field: String, indices: Dimensions },

    #[error("'{field}' needs {expected} indices, got {actual}")]
    TooFewIndices {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} is out of bounds for dimension {dimension} of '{field}' (max index {max_index})")]
    IndexOutOfBounds {
        field: String,
        dimension: usize,
        index: usize,
        max_index: i64,
    },

    /// `offsetfrom` names a node that does not enclose the field being processed.
    #[error("'{field}' has offsetfrom '{offset_from}', which is not an enclosing element")]
    OffsetFromNotFound { field: String, offset_from: String },

    /// A program or document node was reached inside a parameter tree.
    #[error("'{field}' is a {kind} node, which has no binary layout")]
    BadNodeType { field: String, kind: &'static str },

    /// A data type with no scalar encoding reached the codec.
    #[error("'{field}' has data type {data_type}, which has no scalar encoding")]
    BadDataType { field: String, data_type: DataType },

    #[error("cannot convert value of '{field}'")]
    Conversion {
        field: String,
        #[source]
        source: ValueError,
    },

    #[error("cannot encode or decode '{field}'")]
    Codec {
        field: String,
        #[source]
        source: CodecError,
    },

    #[error("'{field}' needs {needed} bytes at offset {offset}, buffer has {available}")]
    BufferTooShort {
        field: String,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("no field named '{field}'")]
    UnknownField { field: String },

    #[error("'{field}' is not a data field")]
    NotALeaf { field: String },
}

impl LayoutError {
    /// Qualified name of the field the error concerns.
    pub fn field(&self) -> &str {
        match self {
            LayoutError::SchemaReference { referenced_by, .. } => referenced_by,
            LayoutError::ValueNotSet { field, .. }
            | LayoutError::TooFewIndices { field, .. }
            | LayoutError::IndexOutOfBounds { field, .. }
            | LayoutError::OffsetFromNotFound { field, .. }
            | LayoutError::BadNodeType { field, .. }
            | LayoutError::BadDataType { field, .. }
            | LayoutError::Conversion { field, .. }
            | LayoutError::Codec { field, .. }
            | LayoutError::BufferTooShort { field, .. }
            | LayoutError::UnknownField { field }
            | LayoutError::NotALeaf { field } => field,
        }
    }
}
