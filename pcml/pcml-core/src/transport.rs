//! Contract for the component that actually runs a program on the host.

use bytes::Bytes;

use crate::{error::TransportError, schema::Usage};

/// One parameter as handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterData {
    pub name: String,
    pub usage: Usage,
    /// Serialized input bytes; `None` for output-only parameters.
    pub input: Option<Bytes>,
    /// Bytes the host is expected to return; 0 for input-only parameters.
    pub output_size: usize,
}

/// Everything a transport needs to run one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub program: String,
    pub path: String,
    pub entry_point: Option<String>,
    pub thread_safe: bool,
    pub parameters: Vec<ParameterData>,
}

/// Diagnostic message the host attached to a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMessage {
    pub id: String,
    pub text: String,
}

impl HostMessage {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Result of a completed call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallReply {
    pub success: bool,
    /// Output bytes, one entry per request parameter (`None` for input-only).
    pub outputs: Vec<Option<Bytes>>,
    pub messages: Vec<HostMessage>,
    /// Integer returned by a service-program entry point.
    pub return_value: Option<i32>,
}

/// Sends serialized parameters to the host and returns its output buffers.
pub trait Transport: Send + Sync {
    fn invoke(&self, request: &CallRequest) -> Result<CallReply, TransportError>;
}
