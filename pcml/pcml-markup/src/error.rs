use pcml_core::SchemaError;

/// Error returned while reading program-call markup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    /// The text is not well-formed markup.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// The markup is well-formed but does not describe a valid schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
