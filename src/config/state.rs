// Application state module
// Immutable configuration and route table shared by every connection

use super::types::Config;
use crate::routing::RouteTable;

/// Application state
///
/// Built once before the listener starts accepting and never mutated, so it
/// is shared across connection tasks behind a plain `Arc`.
pub struct AppState {
    pub config: Config,
    pub routes: RouteTable,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            config: config.clone(),
            routes: RouteTable::standard()?,
        })
    }
}
