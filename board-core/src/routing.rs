// Routing system for HTTP requests

use crate::{Error, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A route handler function type
pub type HandlerFn = Arc<
    dyn Fn(HttpRequest) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>
        + Send
        + Sync,
>;

/// Wrap an async closure as a [`HandlerFn`].
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Route definition with handler
///
/// Path patterns use `:name` for a single segment and `*name` (last
/// segment only) for the remainder of the path.
#[derive(Clone)]
pub struct Route {
    pub method: String,
    pub path: String,
    pub handler: HandlerFn,
}

/// Router for managing routes and dispatching requests
#[derive(Clone, Default)]
pub struct Router {
    pub routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Add a route to the router
    pub fn add_route(&mut self, method: &str, path: &str, handler: HandlerFn) {
        self.routes.push(Route {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            handler,
        });
    }

    /// Find a route that matches the request and run it
    pub async fn route(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        let (path, query_string) = match request.path.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (request.path.clone(), None),
        };
        let path = strip_trailing_slash(&path);

        if let Some(query) = query_string {
            request.query_params = parse_query_string(&query);
        }

        let mut method_mismatch = false;

        for route in &self.routes {
            let Some(params) = match_path(&route.path, path) else {
                continue;
            };

            if route.method != request.method {
                method_mismatch = true;
                continue;
            }

            request.path = path.to_string();
            request.path_params = params;
            return (route.handler)(request).await;
        }

        if method_mismatch {
            return Err(Error::MethodNotAllowed(format!("{} {}", request.method, path)));
        }

        Err(Error::RouteNotFound(format!("{} {}", request.method, path)))
    }
}

/// `/settings/` and `/settings` are the same route; the root stays `/`.
fn strip_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Match a route path pattern against a request path
/// Returns Some(params) if matched, None otherwise
fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut params = HashMap::new();

    for (i, pattern_part) in pattern_parts.iter().enumerate() {
        if let Some(rest_name) = pattern_part.strip_prefix('*') {
            if i + 1 != pattern_parts.len() || i >= path_parts.len() {
                return None;
            }
            params.insert(rest_name.to_string(), path_parts[i..].join("/"));
            return Some(params);
        }

        let path_part = path_parts.get(i)?;

        if let Some(param_name) = pattern_part.strip_prefix(':') {
            let value = urlencoding::decode(path_part)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| path_part.to_string());
            params.insert(param_name.to_string(), value);
        } else if pattern_part != path_part {
            return None;
        }
    }

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    Some(params)
}

/// Parse a query string into a map of parameters
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let mut split = part.splitn(2, '=');
            let key = urlencoding::decode(split.next()?).ok()?.into_owned();
            let value = urlencoding::decode(split.next().unwrap_or(""))
                .map(|v| v.into_owned())
                .unwrap_or_default();
            Some((key, value))
        })
        .collect()
}
