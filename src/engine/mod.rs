//! Synthesis engine for the contract REST gateway.
//!
//! - Namespacer: moves a document fragment under an identifier and keeps its
//!   schema references pointing at the renamed definitions
//! - Dispatcher: turns a request body into a ledger call and classifies the
//!   result

mod dispatch;
mod namespace;

pub use dispatch::*;
pub use namespace::*;
