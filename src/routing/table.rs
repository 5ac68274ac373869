//! Route table module
//!
//! The static method + pattern table the router dispatches against. It is
//! built once at startup and only read afterwards.

use hyper::Method;

use super::matcher::{PathParams, PathPattern};
use crate::handler::{faults, service, HandlerResult, RequestContext};

/// Handler function signature
pub type Handler = fn(&RequestContext<'_>, &PathParams<'_>) -> HandlerResult;

/// A single route entry
pub struct Route {
    pub method: Method,
    pub pattern: PathPattern,
    /// Name reported in the startup route listing
    pub endpoint: &'static str,
    pub handler: Handler,
}

impl Route {
    pub fn new(
        method: Method,
        pattern: &'static str,
        endpoint: &'static str,
        handler: Handler,
    ) -> Result<Self, String> {
        Ok(Self {
            method,
            pattern: PathPattern::parse(pattern)?,
            endpoint,
            handler,
        })
    }
}

/// Ordered route table; the first matching entry wins
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub const fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The diagnostic server's endpoints
    pub fn standard() -> Result<Self, String> {
        let routes = vec![
            Route::new(Method::GET, "/", "index", service::index)?,
            Route::new(Method::GET, "/index", "index", service::index)?,
            Route::new(Method::GET, "/ping", "ping", service::ping)?,
            Route::new(Method::GET, "/health", "health_check", service::health_check)?,
            Route::new(
                Method::POST,
                "/error/null-pointer",
                "null_pointer_error",
                faults::null_pointer_error,
            )?,
            Route::new(
                Method::POST,
                "/error/server-error",
                "generic_server_error",
                faults::generic_server_error,
            )?,
            Route::new(
                Method::POST,
                "/error/division-zero",
                "division_by_zero_error",
                faults::division_by_zero_error,
            )?,
            Route::new(
                Method::POST,
                "/error/custom/<error_type>",
                "custom_error",
                faults::custom_error,
            )?,
            Route::new(Method::GET, "/test", "test", service::test)?,
            Route::new(Method::GET, "/status", "status", service::status)?,
        ];
        Ok(Self::new(routes))
    }

    /// Find the route for a method and path
    pub fn find<'p>(&self, method: &Method, path: &'p str) -> Option<(&Route, PathParams<'p>)> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| route.pattern.matches(path).map(|params| (route, params)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}
