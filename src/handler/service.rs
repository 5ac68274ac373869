//! Service metadata endpoints
//!
//! `/`, `/index`, `/ping`, `/health`, `/test` and `/status`. All of them are
//! infallible apart from serialization.

use hyper::StatusCode;
use serde::Serialize;

use super::{HandlerResult, RequestContext};
use crate::http::{timestamp, Reply};
use crate::routing::PathParams;

pub const INDEX_VERSION: &str = "1.0.0";
pub const RELEASE_VERSION: &str = "2.0.0";

/// Route signatures advertised by `/status`, in this order
pub static AVAILABLE_ENDPOINTS: [&str; 8] = [
    "GET /",
    "GET /health",
    "GET /status",
    "GET /test",
    "POST /error/null-pointer",
    "POST /error/server-error",
    "POST /error/division-zero",
    "POST /error/custom/<error_type>",
];

#[derive(Serialize)]
struct IndexBody<'a> {
    service: &'a str,
    version: &'static str,
    status: &'static str,
    timestamp: String,
    message: String,
}

#[derive(Serialize)]
struct MessageBody {
    message: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct HealthBody<'a> {
    status: &'static str,
    timestamp: String,
    service: &'a str,
}

#[derive(Serialize)]
struct TestBody {
    message: &'static str,
    timestamp: String,
    version: &'static str,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    service: &'a str,
    version: &'static str,
    status: &'static str,
    timestamp: String,
    environment: &'a str,
    available_endpoints: &'static [&'static str],
}

pub fn index(ctx: &RequestContext<'_>, _params: &PathParams<'_>) -> HandlerResult {
    let body = IndexBody {
        service: &ctx.service.name,
        version: INDEX_VERSION,
        status: "running",
        timestamp: timestamp(),
        message: format!("{} is running", ctx.service.display_name),
    };
    Ok(Reply::json(StatusCode::OK, &body)?)
}

pub fn ping(_ctx: &RequestContext<'_>, _params: &PathParams<'_>) -> HandlerResult {
    let body = MessageBody {
        message: "pong",
        timestamp: timestamp(),
    };
    Ok(Reply::json(StatusCode::OK, &body)?)
}

pub fn health_check(ctx: &RequestContext<'_>, _params: &PathParams<'_>) -> HandlerResult {
    let body = HealthBody {
        status: "healthy",
        timestamp: timestamp(),
        service: &ctx.service.name,
    };
    Ok(Reply::json(StatusCode::OK, &body)?)
}

pub fn test(_ctx: &RequestContext<'_>, _params: &PathParams<'_>) -> HandlerResult {
    let body = TestBody {
        message: "Test endpoint working!",
        timestamp: timestamp(),
        version: RELEASE_VERSION,
    };
    Ok(Reply::json(StatusCode::OK, &body)?)
}

pub fn status(ctx: &RequestContext<'_>, _params: &PathParams<'_>) -> HandlerResult {
    let body = StatusBody {
        service: &ctx.service.name,
        version: RELEASE_VERSION,
        status: "running",
        timestamp: timestamp(),
        environment: &ctx.service.environment,
        available_endpoints: &AVAILABLE_ENDPOINTS,
    };
    Ok(Reply::json(StatusCode::OK, &body)?)
}
