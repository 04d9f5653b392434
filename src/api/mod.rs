//! HTTP API layer for the contract REST gateway.
//!
//! Synthesizes one POST route per contract operation and serves the merged
//! interface document next to a handful of service endpoints.

pub mod handlers;
mod routes;
mod synthesis;
mod types;

pub use routes::{build_router, RESERVED_SEGMENTS};
pub use synthesis::synthesize;
