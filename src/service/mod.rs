//! Service layer sitting between the HTTP handlers and the stores.

mod metadata;
mod release_notes;

pub use metadata::*;
pub use release_notes::*;
