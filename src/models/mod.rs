//! Data models for the release notes backend.
//!
//! JSON field names are camelCase throughout.

mod metadata;
mod release;
mod webhook;

pub use metadata::*;
pub use release::*;
pub use webhook::*;
