//! HTTP protocol layer module
//!
//! JSON envelopes and hyper response builders, decoupled from the handlers
//! that fill them.

pub mod envelope;
pub mod response;

// Re-export commonly used types
pub use envelope::{timestamp, Reply};
pub use response::build_json_response;
