//! Routing module
//!
//! Static route table and path pattern matching.

pub mod matcher;
pub mod table;

pub use matcher::PathParams;
pub use table::RouteTable;
