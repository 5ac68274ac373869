//! HTTP response building module
//!
//! Turns handler replies into hyper responses.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use hyper::{Response, StatusCode};

use super::envelope::Reply;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Build JSON response
pub fn build_json_response(reply: Reply, server_name: &str) -> Response<Full<Bytes>> {
    let status = reply.status;
    let body = Bytes::from(reply.body);

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(CONTENT_LENGTH, body.len())
        .header(SERVER, server_name)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback_response()
        })
}

/// Bare 500 used when the builder itself rejects a header
fn fallback_response() -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from_static(
        br#"{"error":"internal_server_error","message":"Internal server error occurred"}"#,
    )));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp.headers_mut().insert(
        CONTENT_TYPE,
        hyper::header::HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    resp
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!(
        "Failed to build {} response: {error}",
        status.as_u16()
    ));
}
