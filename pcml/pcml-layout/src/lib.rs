//! Schema-driven binary layout engine.
//!
//! A [`Document`] pairs a shared [`SchemaTree`](pcml_core::SchemaTree) with
//! the values of one call. Attributes such as `count`, `length` or `offset`
//! may name another field; they are resolved against that field's current
//! value every time they are needed, so setting or parsing a field changes
//! the layout of everything that refers to it.
//!
//! ```text
//! set_value ──► ValueStore ◄── parse (captures bytes, decodes on read)
//!                   │
//!          attribute resolution
//!                   │
//!      output_size / serialize / parse walks ──► PrimitiveCodec
//! ```

mod clock;
mod document;
mod engine;
mod error;
mod layout;
mod options;
mod resolve;
mod store;

pub use document::{Document, FieldRef};
pub use error::{LayoutError, ReferenceKind};
pub use layout::FALLBACK_OUTPUT_SIZE;
pub use options::LayoutOptions;
pub use resolve::Attribute;
pub use store::{DimensionVector, DimensionedValue, ScalarSlot, SlotValue, ValueStore};
