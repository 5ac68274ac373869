//! JSON envelope module
//!
//! A `Reply` is the status code plus the serialized JSON body a handler
//! produced. Bodies are serialized as soon as they are built so field order
//! follows the struct declaring them.

use chrono::{SecondsFormat, Utc};
use hyper::StatusCode;
use serde::Serialize;
use serde_json::json;

/// Current UTC instant in RFC 3339 / ISO-8601 form with microseconds
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Handler output: status code and JSON body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    /// Serialize `body` into a reply with the given status
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status,
            body: serde_json::to_string(body)?,
        })
    }

    fn from_value(status: StatusCode, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    /// Envelope for requests no route matched
    pub fn not_found() -> Self {
        Self::from_value(
            StatusCode::NOT_FOUND,
            &json!({
                "error": "not_found",
                "message": "Endpoint not found",
                "timestamp": timestamp(),
            }),
        )
    }

    /// Envelope for handler failures nothing else caught
    pub fn internal_error() -> Self {
        Self::from_value(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({
                "error": "internal_server_error",
                "message": "Internal server error occurred",
                "timestamp": timestamp(),
            }),
        )
    }
}
