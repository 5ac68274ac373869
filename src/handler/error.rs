//! Handler error types
//!
//! `SimulatedFault` is what the error endpoints raise on purpose and always
//! catch themselves. `HandlerError` is anything else; the router turns it
//! into the generic 500 envelope.

use std::backtrace::Backtrace;
use thiserror::Error;

/// Failures the error endpoints trigger deliberately
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulatedFault {
    #[error("cannot read attribute '{attribute}' through an absent reference")]
    NullPointer { attribute: &'static str },

    #[error("division by zero")]
    DivisionByZero,
}

/// A simulated fault together with the stack captured where it surfaced
#[derive(Debug)]
pub struct TracedFault {
    pub fault: SimulatedFault,
    pub trace: Backtrace,
}

impl From<SimulatedFault> for TracedFault {
    fn from(fault: SimulatedFault) -> Self {
        Self {
            fault,
            trace: Backtrace::force_capture(),
        }
    }
}

/// Failures no handler expects
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Unexpected(String),
}

pub type HandlerResult = Result<crate::http::Reply, HandlerError>;
