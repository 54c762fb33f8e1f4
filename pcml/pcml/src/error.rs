//! Error types for program calls.

use pcml_core::TransportError;
use pcml_layout::LayoutError;

/// Errors produced by [`ProgramCall`](crate::ProgramCall).
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// [`ProgramCallBuilder::build`](crate::ProgramCallBuilder::build) was
    /// called without a schema.
    #[error("no schema was given to the program call builder")]
    MissingSchema,

    /// No primitive codec was registered and the built-in one is not enabled.
    #[error("no primitive codec was given to the program call builder")]
    MissingCodec,

    /// The schema declares no program with this name.
    #[error("program '{program}' is not declared in the schema")]
    UnknownProgram { program: String },

    /// Sizing, serializing or parsing a parameter failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// The transport could not run the program.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The reply does not carry one output entry per request parameter.
    #[error("reply for program '{program}' has {actual} output buffers, expected {expected}")]
    ReplyShape {
        program: String,
        expected: usize,
        actual: usize,
    },

    /// An output-capable parameter came back without bytes.
    #[error("no output returned for parameter '{parameter}' of program '{program}'")]
    MissingOutput { program: String, parameter: String },
}
