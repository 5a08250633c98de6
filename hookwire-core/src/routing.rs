// Routing system for HTTP requests

use crate::{Error, HttpRequest, HttpResponse};
use http::Method;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by a route handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;

/// A route handler function type
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> HandlerFuture + Send + Sync>;

/// Route definition with handler
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub handler: HandlerFn,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Router for managing routes and dispatching requests
#[derive(Debug, Default)]
pub struct Router {
    pub routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Add a route to the router
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Register the same handler for several methods on one path
    pub fn add_methods(&mut self, methods: &[Method], path: &str, handler: HandlerFn) {
        for method in methods {
            self.add_route(Route {
                method: method.clone(),
                path: path.to_string(),
                handler: handler.clone(),
            });
        }
    }

    /// Find a route that matches the request
    pub async fn route(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        if request.query_params.is_empty() {
            if let Some(query) = request.query.as_deref() {
                request.query_params = parse_query_string(query);
            }
        }

        let mut path_matched = false;
        for route in &self.routes {
            let Some(params) = match_path(&route.path, &request.path) else {
                continue;
            };
            if route.method != request.method {
                path_matched = true;
                continue;
            }
            request.path_params = params;
            return (route.handler)(request).await;
        }

        if path_matched {
            Err(Error::MethodNotAllowed(format!(
                "{} {}",
                request.method, request.path
            )))
        } else {
            Err(Error::RouteNotFound(format!(
                "{} {}",
                request.method, request.path
            )))
        }
    }
}

/// Match a route path pattern against a request path
/// Returns Some(params) if matched, None otherwise
fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (pattern_part, path_part) in pattern_parts.iter().zip(path_parts.iter()) {
        let decoded = percent_decode_str(path_part).decode_utf8_lossy();
        if let Some(param_name) = pattern_part.strip_prefix(':') {
            params.insert(param_name.to_string(), decoded.into_owned());
        } else if *pattern_part != decoded {
            return None;
        }
    }

    Some(params)
}

/// Parse a query string into decoded key/value pairs, keeping repeats
fn parse_query_string(query: &str) -> Vec<(String, String)> {
    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => pairs,
        Err(err) => {
            tracing::debug!(%query, error = %err, "Ignoring malformed query string");
            Vec::new()
        }
    }
}
