//! Running one declared program through a [`Transport`].

use std::sync::Arc;

use pcml_core::{
    CallRequest, HostMessage, HostVersion, NativeValue, NodeId, ParameterData, PrimitiveCodec,
    SchemaTree, Transport, Usage,
};
use pcml_layout::{Document, FieldRef, LayoutError, LayoutOptions};
use tracing::debug;

use crate::error::CallError;

/// Parameter values for the programs of one schema, plus the results of the
/// last call.
pub struct ProgramCall {
    document: Document,
    host_version: Option<Arc<dyn HostVersion>>,
    messages: Vec<HostMessage>,
    return_value: Option<i32>,
}

/// Builder for configuring [`ProgramCall`].
pub struct ProgramCallBuilder {
    schema: Option<Arc<SchemaTree>>,
    codec: Option<Arc<dyn PrimitiveCodec>>,
    host_version: Option<Arc<dyn HostVersion>>,
    options: LayoutOptions,
}

/// A program parameter that passed the version gate.
struct Parameter {
    id: NodeId,
    usage: Usage,
}

impl ProgramCall {
    /// Create a builder for [`ProgramCall`].
    pub fn builder() -> ProgramCallBuilder {
        ProgramCallBuilder {
            schema: None,
            codec: None,
            host_version: None,
            options: LayoutOptions::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Messages the host attached to the last call.
    pub fn messages(&self) -> &[HostMessage] {
        &self.messages
    }

    /// Integer returned by the last service-program call, if any.
    pub fn return_value(&self) -> Option<i32> {
        self.return_value
    }

    pub fn set_value(
        &mut self,
        field: impl FieldRef,
        indices: &[usize],
        value: impl Into<NativeValue>,
    ) -> Result<(), LayoutError> {
        self.document.set_value(field, indices, value)
    }

    pub fn value(&mut self, field: impl FieldRef, indices: &[usize]) -> Result<NativeValue, LayoutError> {
        self.document.value(field, indices)
    }

    /// Serialize the parameters of `program`, run it, and parse what it
    /// returned. Returns the host's success flag; on failure no output is
    /// parsed, but [`messages`](Self::messages) are still recorded.
    pub fn call(&mut self, program: &str, transport: &dyn Transport) -> Result<bool, CallError> {
        let tree = Arc::clone(self.document.tree());
        let unknown = || CallError::UnknownProgram {
            program: program.to_string(),
        };
        let program_id = tree.program(program).ok_or_else(unknown)?;
        let attrs = tree.node(program_id).program().ok_or_else(unknown)?;

        if let Some(host) = &self.host_version {
            self.document.options_mut().host_vrm = Some(host.current_vrm());
        }
        self.messages.clear();
        self.return_value = None;

        let mut parameters = Vec::new();
        let mut data = Vec::new();
        for &id in tree.node(program_id).children() {
            if !self.document.is_supported(id)? {
                continue;
            }
            let usage = tree.effective_usage(id);
            let input = if usage.has_input() {
                Some(self.document.serialize(id, &[])?)
            } else {
                None
            };
            let output_size = if usage.has_output() {
                self.document.output_size(id, &[])?
            } else {
                0
            };
            parameters.push(Parameter { id, usage });
            data.push(ParameterData {
                name: tree.node(id).name.clone(),
                usage,
                input,
                output_size,
            });
        }

        let request = CallRequest {
            program: program.to_string(),
            path: attrs.path.clone(),
            entry_point: attrs.entry_point.clone(),
            thread_safe: attrs.thread_safe,
            parameters: data,
        };
        debug!(
            program,
            path = %attrs.path,
            parameters = request.parameters.len(),
            "calling program"
        );
        let reply = transport.invoke(&request)?;
        if reply.outputs.len() != parameters.len() {
            return Err(CallError::ReplyShape {
                program: program.to_string(),
                expected: parameters.len(),
                actual: reply.outputs.len(),
            });
        }
        self.messages = reply.messages;
        self.return_value = reply.return_value;
        if !reply.success {
            debug!(program, messages = self.messages.len(), "program reported failure");
            return Ok(false);
        }

        for index in parse_order(&tree, &attrs.parse_order, &parameters) {
            let id = parameters[index].id;
            let output = reply.outputs[index].clone().ok_or_else(|| CallError::MissingOutput {
                program: program.to_string(),
                parameter: tree.node(id).name.clone(),
            })?;
            self.document.parse(id, output, &[])?;
        }
        debug!(program, "program call complete");
        Ok(true)
    }
}

/// Positions of the output-capable `parameters` in the order they are
/// parsed: names listed in `order` first, then declaration order. Listed
/// parameters that were gated out are skipped.
fn parse_order(tree: &SchemaTree, order: &[String], parameters: &[Parameter]) -> Vec<usize> {
    let named = order
        .iter()
        .filter_map(|name| parameters.iter().position(|p| tree.node(p.id).name == *name));
    let mut sequence: Vec<usize> = Vec::with_capacity(parameters.len());
    for index in named.chain(0..parameters.len()) {
        if parameters[index].usage.has_output() && !sequence.contains(&index) {
            sequence.push(index);
        }
    }
    sequence
}

impl ProgramCallBuilder {
    pub fn with_schema(mut self, schema: Arc<SchemaTree>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Load the schema from program-call markup.
    #[cfg(feature = "markup")]
    pub fn with_markup(self, text: &str) -> Result<Self, pcml_markup::MarkupError> {
        let schema = pcml_markup::load_schema(text)?;
        Ok(self.with_schema(Arc::new(schema)))
    }

    pub fn with_codec(mut self, codec: Arc<dyn PrimitiveCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Use the built-in [`HostCodec`](pcml_codec::HostCodec).
    #[cfg(feature = "host-codec")]
    pub fn with_default_codec(self) -> Self {
        self.with_codec(Arc::new(pcml_codec::HostCodec::new()))
    }

    /// Gate fields by the level this reports, read at the start of every call.
    pub fn with_host_version(mut self, host_version: Arc<dyn HostVersion>) -> Self {
        self.host_version = Some(host_version);
        self
    }

    /// CCSID for one-byte char fields that declare none (default: 1208).
    pub fn with_default_ccsid(mut self, ccsid: u32) -> Self {
        self.options = self.options.with_default_ccsid(ccsid);
        self
    }

    /// CCSID for two-byte char fields that declare none (default: 13488).
    pub fn with_default_two_byte_ccsid(mut self, ccsid: u32) -> Self {
        self.options = self.options.with_default_two_byte_ccsid(ccsid);
        self
    }

    /// Build the call. A schema is required; without a codec the built-in one
    /// is used when the `host-codec` feature is enabled.
    pub fn build(self) -> Result<ProgramCall, CallError> {
        let schema = self.schema.ok_or(CallError::MissingSchema)?;
        #[cfg(feature = "host-codec")]
        let codec = self
            .codec
            .unwrap_or_else(|| Arc::new(pcml_codec::HostCodec::new()) as Arc<dyn PrimitiveCodec>);
        #[cfg(not(feature = "host-codec"))]
        let codec = self.codec.ok_or(CallError::MissingCodec)?;

        Ok(ProgramCall {
            document: Document::new(schema, codec).with_options(self.options),
            host_version: self.host_version,
            messages: Vec::new(),
            return_value: None,
        })
    }
}
