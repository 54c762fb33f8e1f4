//! Schema model and collaborator contracts for program-call parameter layouts.
//!
//! This crate holds everything that does not depend on run-time values:
//!
//! - [`SchemaTree`]: the immutable field/structure arena built from an
//!   [`ElementDecl`] tree, with struct references expanded and names indexed
//! - [`NativeValue`] / [`Decimal`]: host-neutral values
//! - [`PrimitiveCodec`], [`Transport`], [`HostVersion`]: the seams the layout
//!   engine and the program-call facade are plugged into

mod codec;
mod decimal;
mod dimensions;
mod error;
mod schema;
mod transport;
mod value;
mod version;

pub use codec::{PrimitiveCodec, ScalarFormat};
pub use decimal::{Decimal, MAX_DECIMAL_DIGITS};
pub use dimensions::Dimensions;
pub use error::{CodecError, SchemaError, TransportError, ValueError};
pub use schema::{
    BidiStringType, CharWidth, DataAttrs, DataType, ElementDecl, FieldNode, IntAttr,
    MAX_DECIMAL_LENGTH, NodeId, NodeKind, ProgramAttrs, ReturnValue, SchemaTree, TrimMode, Usage,
};
pub use transport::{CallReply, CallRequest, HostMessage, ParameterData, Transport};
pub use value::{NativeKind, NativeValue};
pub use version::{FixedHostVersion, HostVersion, VersionRange, Vrm};
