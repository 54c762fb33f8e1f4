//! Error types shared by the schema model and its collaborators.

/// Error returned while turning a declaration tree into a [`SchemaTree`](crate::SchemaTree).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The root declaration is not a `pcml` element.
    #[error("expected a 'pcml' root element, found '{found}'")]
    MissingRoot { found: String },

    /// An element tag that has no meaning in a program-call document.
    #[error("unknown element '{tag}' inside '{parent}'")]
    UnknownElement { tag: String, parent: String },

    /// An element appears somewhere it is not allowed (e.g. `program` inside `struct`).
    #[error("element '{tag}' is not allowed inside '{parent}'")]
    MisplacedElement { tag: String, parent: String },

    /// A required attribute is absent.
    #[error("element '{element}' is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// An attribute value could not be interpreted.
    #[error("invalid value '{value}' for attribute '{attribute}' on '{element}': {reason}")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
        reason: String,
    },

    /// Two named nodes share the same qualified name.
    #[error("duplicate qualified name '{qualified_name}'")]
    DuplicateName { qualified_name: String },

    /// A `struct` attribute names a struct that is not declared at document level.
    #[error("'{element}' refers to undeclared struct '{struct_name}'")]
    UnknownStruct { element: String, struct_name: String },

    /// A chain of `struct` attributes leads back to a struct being expanded.
    #[error("circular struct reference: {}", chain.join(" -> "))]
    CircularStructRef { chain: Vec<String> },
}

/// Error returned when a [`NativeValue`](crate::NativeValue) cannot be coerced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// A string did not parse as the requested number.
    #[error("'{value}' is not a number")]
    NotANumber { value: String },

    /// The value variant has no conversion to the requested kind.
    #[error("cannot convert {actual} to {expected}")]
    TypeMismatch { expected: String, actual: String },

    /// The numeric value does not fit the requested kind.
    #[error("value {value} is out of range for {expected}")]
    OutOfRange { value: String, expected: String },
}

/// Error returned by [`PrimitiveCodec`](crate::PrimitiveCodec) implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The codec has no converter for this coded character set.
    #[error("unsupported ccsid {ccsid}")]
    UnsupportedCcsid { ccsid: u32 },

    /// The format cannot be encoded (bad length/precision combination, struct type, ...).
    #[error("unsupported format: {detail}")]
    UnsupportedFormat { detail: String },

    /// The value handed to `encode` does not match the format.
    #[error("value does not fit the field: {detail}")]
    ValueOverflow { detail: String },

    /// The value variant handed to `encode` is not the one the format stores.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// The byte slice handed to `decode` is malformed.
    #[error("malformed data: {detail}")]
    Malformed { detail: String },

    /// The byte slice handed to `decode` has the wrong length.
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

/// Error returned by [`Transport`](crate::Transport) implementations.
#[derive(Debug, thiserror::Error)]
#[error("transport failed for program '{program}': {source}")]
pub struct TransportError {
    pub program: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl TransportError {
    pub fn new(
        program: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            program: program.into(),
            source: source.into(),
        }
    }
}
