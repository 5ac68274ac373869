//! Request handler module
//!
//! Request dispatch plus the handler functions behind each route: service
//! metadata endpoints and the deliberate error simulations.

pub mod error;
pub mod faults;
pub mod router;
pub mod service;

// Re-export main entry point
pub use error::HandlerResult;
pub use router::{handle_request, RequestContext};
