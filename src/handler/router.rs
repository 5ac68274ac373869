//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: request hook, body collection,
//! route matching, the not-found and internal-error fallbacks, and the
//! response hook.

use crate::config::{AppState, ServiceConfig};
use crate::http::{self, Reply};
use crate::logger;
use crate::routing::RouteTable;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_TYPE, HOST};
use hyper::{Method, Request, Response};
use std::any::Any;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    /// Absolute URL as logged by the hooks
    pub url: &'a str,
    /// Raw `Content-Type` header, if present and readable
    pub content_type: Option<&'a str>,
    /// Collected request body, empty when absent or over the size limit
    pub body: Bytes,
    pub service: &'a ServiceConfig,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let url = request_url(&parts);
    let access_log = state.config.logging.access_log;

    // 1. Request hook
    if access_log {
        logger::log_request(
            parts.method.as_str(),
            &url,
            &remote_addr.ip().to_string(),
        );
    }

    // 2. Collect body (bounded)
    let body = read_body(body, state.config.http.max_body_size).await;

    // 3. Dispatch
    let ctx = RequestContext {
        method: &parts.method,
        path: parts.uri.path(),
        url: &url,
        content_type: parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        body,
        service: &state.config.service,
    };
    let reply = dispatch(&state.routes, &ctx);

    // 4. Response hook
    if access_log {
        logger::log_response(reply.status.as_u16(), parts.method.as_str(), &url);
    }

    Ok(http::build_json_response(
        reply,
        &state.config.http.server_name,
    ))
}

/// Match the request against the route table and run the handler
///
/// Unmatched requests get the not-found envelope. A handler that returns an
/// error or panics gets the generic internal-error envelope.
pub fn dispatch(routes: &RouteTable, ctx: &RequestContext<'_>) -> Reply {
    let Some((route, params)) = routes.find(ctx.method, ctx.path) else {
        logger::log_warning(&format!("404_ERROR: {} not found", ctx.url));
        return Reply::not_found();
    };

    let handler = route.handler;
    match panic::catch_unwind(AssertUnwindSafe(|| handler(ctx, &params))) {
        Ok(Ok(reply)) => reply,
        Ok(Err(err)) => {
            logger::log_error(&format!("500_ERROR: Internal server error - {err}"));
            Reply::internal_error()
        }
        Err(payload) => {
            logger::log_error(&format!(
                "500_ERROR: Internal server error - handler '{}' panicked: {}",
                route.endpoint,
                panic_message(payload.as_ref())
            ));
            Reply::internal_error()
        }
    }
}

/// Collect the body up to `max_body_size` bytes
async fn read_body<B>(body: B, max_body_size: u64) -> Bytes
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_warning(&format!("Discarding request body: {e}"));
            Bytes::new()
        }
    }
}

/// Rebuild the absolute request URL from the Host header
fn request_url(parts: &hyper::http::request::Parts) -> String {
    if parts.uri.scheme().is_some() {
        return parts.uri.to_string();
    }
    let host = parts
        .headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    format!("http://{host}{path_and_query}")
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::routing::table::Route;
    use crate::routing::PathParams;
    use crate::logger::writer::capture;
    use crate::logger::Level;
    use chrono::DateTime;
    use hyper::StatusCode;
    use serde_json::Value;

    const JSON: &str = "application/json";

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(&test_config()).unwrap())
    }

    fn access_log_state() -> Arc<AppState> {
        let mut cfg = test_config();
        cfg.logging.access_log = true;
        Arc::new(AppState::new(&cfg).unwrap())
    }

    async fn call(method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        send(test_state(), method, uri, Some(JSON), body).await
    }

    async fn send(
        state: Arc<AppState>,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(HOST, "diag.local");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let req = builder
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap();
        let resp = handle_request(req, state, "10.0.0.7:4242".parse().unwrap())
            .await
            .unwrap();

        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Run one request with the access log on and return the lines it logged
    async fn call_logged(
        method: Method,
        uri: &str,
        body: &str,
    ) -> (StatusCode, Vec<(Level, String)>) {
        capture::start();
        let (status, _) = send(access_log_state(), method, uri, Some(JSON), body).await;
        (status, capture::finish())
    }

    fn assert_line(line: &(Level, String), level: Level, prefix: &str) {
        assert_eq!(line.0, level, "{}", line.1);
        assert!(line.1.starts_with(prefix), "expected {prefix:?}, got {:?}", line.1);
    }

    fn assert_timestamp(body: &Value) {
        let ts = body["timestamp"].as_str().expect("timestamp missing");
        assert!(DateTime::parse_from_rfc3339(ts).is_ok(), "bad timestamp {ts}");
    }

    fn keys(body: &Value) -> Vec<String> {
        let mut keys: Vec<String> = body.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn test_get_endpoints_return_200_with_timestamp() {
        for path in ["/", "/index", "/ping", "/health", "/test", "/status"] {
            let (status, body) = call(Method::GET, path, "").await;
            assert_eq!(status, StatusCode::OK, "GET {path}");
            assert_timestamp(&body);
        }
    }

    #[tokio::test]
    async fn test_index_and_health_bodies() {
        let (_, body) = call(Method::GET, "/index", "").await;
        assert_eq!(body["service"], "sevvy-test-server");
        assert_eq!(body["version"], "1.0.0");
        assert_eq!(body["status"], "running");
        assert_eq!(body["message"], "Sevvy Test Server is running");

        let (_, body) = call(Method::GET, "/ping", "").await;
        assert_eq!(body["message"], "pong");

        let (_, body) = call(Method::GET, "/health", "").await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "sevvy-test-server");

        let (_, body) = call(Method::GET, "/test", "").await;
        assert_eq!(body["message"], "Test endpoint working!");
        assert_eq!(body["version"], "2.0.0");
    }

    #[tokio::test]
    async fn test_status_lists_endpoints_in_order() {
        let (status, body) = call(Method::GET, "/status", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["environment"], "production");
        assert_eq!(body["version"], "2.0.0");
        let endpoints: Vec<&str> = body["available_endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            endpoints,
            vec![
                "GET /",
                "GET /health",
                "GET /status",
                "GET /test",
                "POST /error/null-pointer",
                "POST /error/server-error",
                "POST /error/division-zero",
                "POST /error/custom/<error_type>",
            ]
        );
    }

    #[tokio::test]
    async fn test_status_reports_configured_environment() {
        let mut cfg = test_config();
        cfg.service.environment = "staging".to_string();
        let state = Arc::new(AppState::new(&cfg).unwrap());
        let req = Request::builder()
            .uri("/status")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, state, "127.0.0.1:1".parse().unwrap())
            .await
            .unwrap();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["environment"], "staging");
    }

    #[tokio::test]
    async fn test_null_pointer() {
        let (status, body) = call(Method::POST, "/error/null-pointer", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "null_pointer");
        assert!(body["message"].as_str().unwrap().contains("some_attribute"));
        assert_timestamp(&body);
    }

    #[tokio::test]
    async fn test_server_error() {
        let (status, body) = call(Method::POST, "/error/server-error", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_server_error");
        assert_eq!(body["message"], "Something went wrong on the server");
    }

    #[tokio::test]
    async fn test_division_zero_defaults() {
        for payload in ["", "{}", "{not json", "[3]"] {
            let (status, body) = call(Method::POST, "/error/division-zero", payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload:?}");
            assert_eq!(body["error"], "division_by_zero");
            assert_eq!(body["message"], "Division by zero is not allowed");
            assert_eq!(body["details"]["numerator"], 100);
            assert_eq!(body["details"]["denominator"], 0);
        }
    }

    #[tokio::test]
    async fn test_division_zero_uses_numerator() {
        let (status, body) =
            call(Method::POST, "/error/division-zero", r#"{"numerator": 7}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["numerator"], 7);
        assert!(body["details"]["numerator"].is_i64());

        let (_, body) =
            call(Method::POST, "/error/division-zero", r#"{"numerator": 7.5}"#).await;
        assert_eq!(body["details"]["numerator"], 7.5);
    }

    #[tokio::test]
    async fn test_division_zero_boolean_numerator() {
        let (status, body) =
            call(Method::POST, "/error/division-zero", r#"{"numerator": true}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "division_by_zero");
        assert_eq!(body["details"]["numerator"], true);
        assert_eq!(body["details"]["denominator"], 0);
    }

    #[tokio::test]
    async fn test_division_zero_keeps_large_integers() {
        let (status, body) = call(
            Method::POST,
            "/error/division-zero",
            r#"{"numerator": 1180591620717411303424}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["numerator"].to_string(), "1180591620717411303424");
    }

    #[tokio::test]
    async fn test_division_zero_ignores_non_json_content_type() {
        let payload = r#"{"numerator": 7}"#;
        let content_types = [
            Some("text/plain"),
            Some("application/x-www-form-urlencoded"),
            None,
        ];
        for content_type in content_types {
            let (status, body) = send(
                test_state(),
                Method::POST,
                "/error/division-zero",
                content_type,
                payload,
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{content_type:?}");
            assert_eq!(body["details"]["numerator"], 100, "{content_type:?}");
        }

        let (_, body) = send(
            test_state(),
            Method::POST,
            "/error/division-zero",
            Some("application/vnd.api+json; charset=utf-8"),
            payload,
        )
        .await;
        assert_eq!(body["details"]["numerator"], 7);
    }

    #[tokio::test]
    async fn test_division_zero_non_numeric_numerator() {
        for payload in [
            r#"{"numerator": "x"}"#,
            r#"{"numerator": null}"#,
            r#"{"numerator": [1]}"#,
            r#"{"numerator": {}}"#,
        ] {
            let (status, body) = call(Method::POST, "/error/division-zero", payload).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "payload {payload}");
            assert_eq!(body["error"], "internal_server_error");
            assert_eq!(body["message"], "Internal server error occurred");
        }
    }

    #[tokio::test]
    async fn test_division_zero_oversized_body_uses_default() {
        let payload = format!(r#"{{"numerator": 7, "pad": "{}"}}"#, "x".repeat(2048));
        let (status, body) = call(Method::POST, "/error/division-zero", &payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["numerator"], 100);
    }

    #[tokio::test]
    async fn test_custom_error_known_types() {
        let cases = [
            ("timeout", StatusCode::REQUEST_TIMEOUT),
            ("forbidden", StatusCode::FORBIDDEN),
            ("not_found", StatusCode::NOT_FOUND),
            ("bad_request", StatusCode::BAD_REQUEST),
            ("unauthorized", StatusCode::UNAUTHORIZED),
        ];
        for (key, expected) in cases {
            let (status, body) = call(Method::POST, &format!("/error/custom/{key}"), "").await;
            assert_eq!(status, expected, "error type {key}");
            assert_eq!(body["error"], key);
            assert_eq!(keys(&body), vec!["error", "message", "timestamp"]);
        }
    }

    #[tokio::test]
    async fn test_custom_error_unknown_type() {
        let (status, body) = call(Method::POST, "/error/custom/bogus", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unknown_error_type");
        assert_eq!(body["message"], "Error type \"bogus\" not supported");
        assert_eq!(
            body["supported_types"],
            serde_json::json!(["timeout", "forbidden", "not_found", "bad_request", "unauthorized"])
        );
    }

    #[tokio::test]
    async fn test_custom_error_decodes_path() {
        let (status, body) = call(Method::POST, "/error/custom/time%6Fut", "").await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["error"], "timeout");

        let (status, body) = call(Method::POST, "/error/custom/no%20such", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Error type \"no such\" not supported");
    }

    #[tokio::test]
    async fn test_unmatched_requests_are_404() {
        let (status, body) = call(Method::GET, "/does-not-exist", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "Endpoint not found");

        let (status, _) = call(Method::GET, "/error/server-error", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(Method::DELETE, "/ping", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_repeated_calls_keep_shape() {
        for (method, path) in [
            (Method::GET, "/status"),
            (Method::POST, "/error/division-zero"),
            (Method::POST, "/error/custom/bogus"),
        ] {
            let (status_a, a) = call(method.clone(), path, "").await;
            let (status_b, b) = call(method, path, "").await;
            assert_eq!(status_a, status_b);
            assert_eq!(keys(&a), keys(&b));

            let mut a = a;
            let mut b = b;
            a["timestamp"] = Value::Null;
            b["timestamp"] = Value::Null;
            assert_eq!(a, b);
        }
    }

    fn exploding(_ctx: &RequestContext<'_>, _params: &PathParams<'_>) -> crate::handler::HandlerResult {
        panic!("handler blew up");
    }

    #[test]
    fn test_panicking_handler_yields_internal_error() {
        let routes = RouteTable::new(vec![
            Route::new(Method::GET, "/boom", "boom", exploding).unwrap(),
        ]);
        let cfg = test_config();
        let method = Method::GET;
        let ctx = RequestContext {
            method: &method,
            path: "/boom",
            url: "http://localhost/boom",
            content_type: None,
            body: Bytes::new(),
            service: &cfg.service,
        };
        capture::start();
        let reply = dispatch(&routes, &ctx);
        let lines = capture::finish();

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(body["error"], "internal_server_error");
        assert_eq!(body["message"], "Internal server error occurred");

        assert_eq!(lines.len(), 1, "{lines:?}");
        assert_line(&lines[0], Level::Error, "500_ERROR: Internal server error - ");
        assert!(lines[0].1.contains("handler 'boom' panicked: handler blew up"));
    }

    #[tokio::test]
    async fn test_hook_lines_wrap_each_request() {
        let (status, lines) = call_logged(Method::GET, "/ping", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            lines,
            vec![
                (
                    Level::Info,
                    "Request: GET http://diag.local/ping - IP: 10.0.0.7".to_string()
                ),
                (
                    Level::Info,
                    "Response: 200 for GET http://diag.local/ping".to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_hook_lines_follow_access_log_setting() {
        capture::start();
        let (status, _) = call(Method::GET, "/ping", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(capture::finish().is_empty());
    }

    #[tokio::test]
    async fn test_null_pointer_log_sequence() {
        let (status, lines) = call_logged(Method::POST, "/error/null-pointer", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(lines.len(), 5, "{lines:?}");
        assert_line(&lines[0], Level::Info, "Request: POST http://diag.local/error/null-pointer");
        assert_line(&lines[1], Level::Info, "Triggering null pointer error for testing");
        assert_line(
            &lines[2],
            Level::Error,
            "NULL_POINTER_ERROR: cannot read attribute 'some_attribute'",
        );
        assert_line(&lines[3], Level::Error, "Stack trace: ");
        assert_line(&lines[4], Level::Info, "Response: 500 for POST");
    }

    #[tokio::test]
    async fn test_division_zero_log_sequence() {
        let (status, lines) =
            call_logged(Method::POST, "/error/division-zero", r#"{"numerator": 7}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(lines.len(), 8, "{lines:?}");
        assert_line(&lines[0], Level::Info, "Request: POST");
        assert_eq!(
            lines[1..6],
            [
                (Level::Info, "Attempting division calculation for testing".to_string()),
                (Level::Info, "Calculation: 7 / 0".to_string()),
                (Level::Error, "DIVISION_BY_ZERO_ERROR: division by zero".to_string()),
                (Level::Error, "Numerator: 7, Denominator: 0".to_string()),
                (Level::Error, "Extra log line".to_string()),
            ]
        );
        assert_line(&lines[6], Level::Error, "Stack trace: ");
        assert_line(&lines[7], Level::Info, "Response: 400 for POST");

        let (_, lines) =
            call_logged(Method::POST, "/error/division-zero", r#"{"numerator": true}"#).await;
        assert_eq!(lines[2], (Level::Info, "Calculation: true / 0".to_string()));
    }

    #[tokio::test]
    async fn test_fallback_log_lines() {
        let (status, lines) = call_logged(Method::GET, "/does-not-exist", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(lines.len(), 3, "{lines:?}");
        assert_eq!(
            lines[1],
            (
                Level::Warning,
                "404_ERROR: http://diag.local/does-not-exist not found".to_string()
            )
        );

        let (status, lines) =
            call_logged(Method::POST, "/error/division-zero", r#"{"numerator": "x"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(lines.len(), 4, "{lines:?}");
        assert_line(&lines[1], Level::Info, "Attempting division calculation for testing");
        assert_line(&lines[2], Level::Error, "500_ERROR: Internal server error - ");
        assert_line(&lines[3], Level::Info, "Response: 500 for POST");
    }

    #[test]
    fn test_request_url() {
        let req = Request::builder()
            .uri("/ping?x=1")
            .header(HOST, "example.org:8000")
            .body(())
            .unwrap();
        let (parts, ()) = req.into_parts();
        assert_eq!(request_url(&parts), "http://example.org:8000/ping?x=1");

        let req = Request::builder().uri("/ping").body(()).unwrap();
        let (parts, ()) = req.into_parts();
        assert_eq!(request_url(&parts), "http://localhost/ping");
    }
}
