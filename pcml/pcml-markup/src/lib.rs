//! Program-call markup reader.
//!
//! ```text
//! markup text
//!   └─ parse_declaration        – nom-based reader → ElementDecl tree
//!       └─ SchemaTree::from_declaration – attribute interpretation, struct expansion
//! ```

mod error;
mod parser;

use pcml_core::SchemaTree;

pub use error::MarkupError;
pub use parser::parse_declaration;

/// Read markup text and build the schema tree it declares.
pub fn load_schema(text: &str) -> Result<SchemaTree, MarkupError> {
    let root = parse_declaration(text)?;
    Ok(SchemaTree::from_declaration(&root)?)
}
