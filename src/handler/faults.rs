//! Error simulation endpoints
//!
//! Each handler provokes one class of failure, catches it at its own
//! boundary and answers with a fixed envelope. The log lines (including the
//! captured stack) are what monitoring pipelines key on, so each fault keeps
//! its own signature.

use std::fmt;

use hyper::StatusCode;
use serde::Serialize;
use serde_json::{Number, Value};

use super::error::{HandlerError, SimulatedFault, TracedFault};
use super::{HandlerResult, RequestContext};
use crate::http::{timestamp, Reply};
use crate::logger;
use crate::routing::PathParams;

/// Numerator used when the request does not supply one
pub const DEFAULT_NUMERATOR: i64 = 100;
const DENOMINATOR: i64 = 0;

/// Status and message for one `/error/custom/<error_type>` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorTypeConfig {
    pub key: &'static str,
    pub status: StatusCode,
    pub message: &'static str,
}

/// Supported custom error types, in the order they are advertised
pub static ERROR_TYPES: [ErrorTypeConfig; 5] = [
    ErrorTypeConfig {
        key: "timeout",
        status: StatusCode::REQUEST_TIMEOUT,
        message: "Request timeout",
    },
    ErrorTypeConfig {
        key: "forbidden",
        status: StatusCode::FORBIDDEN,
        message: "Access forbidden",
    },
    ErrorTypeConfig {
        key: "not_found",
        status: StatusCode::NOT_FOUND,
        message: "Resource not found",
    },
    ErrorTypeConfig {
        key: "bad_request",
        status: StatusCode::BAD_REQUEST,
        message: "Bad request format",
    },
    ErrorTypeConfig {
        key: "unauthorized",
        status: StatusCode::UNAUTHORIZED,
        message: "Unauthorized access",
    },
];

pub fn lookup_error_type(key: &str) -> Option<&'static ErrorTypeConfig> {
    ERROR_TYPES.iter().find(|config| config.key == key)
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct DivisionDetails {
    numerator: Numerator,
    denominator: i64,
}

#[derive(Serialize)]
struct DivisionBody {
    error: &'static str,
    message: &'static str,
    details: DivisionDetails,
    timestamp: String,
}

#[derive(Serialize)]
struct UnknownTypeBody {
    error: &'static str,
    message: String,
    supported_types: Vec<&'static str>,
    timestamp: String,
}

/// Stand-in for an object whose attribute gets read
struct Sample {
    some_attribute: u32,
}

fn read_attribute(target: Option<&Sample>) -> Result<u32, SimulatedFault> {
    target
        .map(|sample| sample.some_attribute)
        .ok_or(SimulatedFault::NullPointer {
            attribute: "some_attribute",
        })
}

fn dereference_absent() -> Result<u32, TracedFault> {
    let absent: Option<&Sample> = None;
    Ok(read_attribute(absent)?)
}

pub fn null_pointer_error(_ctx: &RequestContext<'_>, _params: &PathParams<'_>) -> HandlerResult {
    logger::log_info("Triggering null pointer error for testing");

    let TracedFault { fault, trace } = match dereference_absent() {
        Ok(value) => {
            return Err(HandlerError::Unexpected(format!(
                "absent reference yielded {value}"
            )))
        }
        Err(traced) => traced,
    };

    let message = fault.to_string();
    logger::log_error(&format!("NULL_POINTER_ERROR: {message}"));
    logger::log_error(&format!("Stack trace: {trace}"));
    let body = ErrorBody {
        error: "null_pointer",
        message: &message,
        timestamp: timestamp(),
    };
    Ok(Reply::json(StatusCode::INTERNAL_SERVER_ERROR, &body)?)
}

pub fn generic_server_error(
    _ctx: &RequestContext<'_>,
    _params: &PathParams<'_>,
) -> HandlerResult {
    logger::log_error("GENERIC_SERVER_ERROR: Simulated internal server error");
    let body = ErrorBody {
        error: "internal_server_error",
        message: "Something went wrong on the server",
        timestamp: timestamp(),
    };
    Ok(Reply::json(StatusCode::INTERNAL_SERVER_ERROR, &body)?)
}

/// Numerator echoed back in the division details
///
/// Booleans divide like the integers 0 and 1, so they reach the zero check
/// too and keep their JSON type in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Numerator {
    Number(Number),
    Bool(bool),
}

impl Numerator {
    fn as_f64(&self) -> f64 {
        match self {
            Self::Number(n) => n.as_f64().unwrap_or_default(),
            Self::Bool(b) => f64::from(u8::from(*b)),
        }
    }
}

impl Default for Numerator {
    fn default() -> Self {
        Self::Number(Number::from(DEFAULT_NUMERATOR))
    }
}

impl fmt::Display for Numerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// `application/json` or any `application/*+json` type, parameters ignored
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Pull `numerator` out of an optional JSON body
///
/// Bodies without a JSON content type, bodies that are not a JSON object,
/// and objects without the key all yield the default. A string,
/// null, array or object value cannot be divided and is reported as an
/// unexpected failure.
pub fn numerator_from_body(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Numerator, HandlerError> {
    if !content_type.is_some_and(is_json_content_type) {
        return Ok(Numerator::default());
    }
    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
        return Ok(Numerator::default());
    };
    match map.get("numerator") {
        None => Ok(Numerator::default()),
        Some(Value::Number(n)) => Ok(Numerator::Number(n.clone())),
        Some(Value::Bool(b)) => Ok(Numerator::Bool(*b)),
        Some(other) => Err(HandlerError::Unexpected(format!(
            "unsupported operand for division: {other}"
        ))),
    }
}

/// Division that raises a domain error on a zero denominator
fn divide(numerator: &Numerator, denominator: i64) -> Result<f64, TracedFault> {
    if denominator == 0 {
        return Err(SimulatedFault::DivisionByZero.into());
    }
    #[allow(clippy::cast_precision_loss)]
    let quotient = numerator.as_f64() / denominator as f64;
    Ok(quotient)
}

pub fn division_by_zero_error(ctx: &RequestContext<'_>, _params: &PathParams<'_>) -> HandlerResult {
    logger::log_info("Attempting division calculation for testing");
    let numerator = numerator_from_body(ctx.content_type, &ctx.body)?;
    let denominator = DENOMINATOR;

    logger::log_info(&format!("Calculation: {numerator} / {denominator}"));
    let TracedFault { fault, trace } = match divide(&numerator, denominator) {
        Ok(quotient) => {
            return Err(HandlerError::Unexpected(format!(
                "division by {denominator} returned {quotient}"
            )))
        }
        Err(traced) => traced,
    };

    logger::log_error(&format!("DIVISION_BY_ZERO_ERROR: {fault}"));
    logger::log_error(&format!(
        "Numerator: {numerator}, Denominator: {denominator}"
    ));
    logger::log_error("Extra log line");
    logger::log_error(&format!("Stack trace: {trace}"));
    let body = DivisionBody {
        error: "division_by_zero",
        message: "Division by zero is not allowed",
        details: DivisionDetails {
            numerator,
            denominator,
        },
        timestamp: timestamp(),
    };
    Ok(Reply::json(StatusCode::BAD_REQUEST, &body)?)
}

pub fn custom_error(_ctx: &RequestContext<'_>, params: &PathParams<'_>) -> HandlerResult {
    let error_type = params.get("error_type").unwrap_or_default();

    let Some(config) = lookup_error_type(error_type) else {
        logger::log_warning(&format!("Unknown error type requested: {error_type}"));
        let body = UnknownTypeBody {
            error: "unknown_error_type",
            message: format!("Error type \"{error_type}\" not supported"),
            supported_types: ERROR_TYPES.iter().map(|c| c.key).collect(),
            timestamp: timestamp(),
        };
        return Ok(Reply::json(StatusCode::BAD_REQUEST, &body)?);
    };

    logger::log_error(&format!(
        "CUSTOM_ERROR_{}: {}",
        error_type.to_ascii_uppercase(),
        config.message
    ));
    let body = ErrorBody {
        error: error_type,
        message: config.message,
        timestamp: timestamp(),
    };
    Ok(Reply::json(config.status, &body)?)
}
