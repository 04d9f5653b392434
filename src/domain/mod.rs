//! Domain types for the contract REST gateway.
//!
//! Contract metadata as reported by the ledger, and the interface document
//! synthesized from it.

mod document;
mod metadata;
mod schema;

pub use document::*;
pub use metadata::*;
pub use schema::*;
