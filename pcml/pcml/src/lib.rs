mod call;
mod error;

pub use call::{ProgramCall, ProgramCallBuilder};
pub use error::CallError;
#[cfg(feature = "host-codec")]
pub use pcml_codec as codec;
pub use pcml_core as core;
pub use pcml_layout as layout;
#[cfg(feature = "markup")]
pub use pcml_markup as markup;
