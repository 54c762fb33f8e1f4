//! Field/structure tree built once from a declaration tree.

mod decl;
mod loader;
mod tree;
mod types;

pub use decl::ElementDecl;
pub use loader::MAX_DECIMAL_LENGTH;
pub use tree::SchemaTree;
pub use types::{
    BidiStringType, CharWidth, DataAttrs, DataType, FieldNode, IntAttr, NodeId, NodeKind,
    ProgramAttrs, ReturnValue, TrimMode, Usage,
};
