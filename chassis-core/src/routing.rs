// Routing system for HTTP requests

use crate::{Envelope, HttpMethod, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::sync::Arc;

/// The fully-wired request pipeline for one route: guards, argument
/// resolution, invocation, and envelope formatting.
pub type PipelineFn = Arc<
    dyn Fn(HttpRequest) -> std::pin::Pin<Box<dyn std::future::Future<Output = HttpResponse> + Send>>
        + Send
        + Sync,
>;

/// Route definition with its pipeline
#[derive(Clone)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
    pub handler: PipelineFn,
}

/// Router for dispatching requests to wired routes
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

    /// The mounted routes as (method, path) pairs, in mount order
    pub fn route_table(&self) -> Vec<(HttpMethod, String)> {
        self.routes
            .iter()
            .map(|r| (r.method, r.path.clone()))
            .collect()
    }

    /// Dispatch a request to the first matching route.
    ///
    /// Every request gets a response; no match falls through to the fixed
    /// unknown-route envelope with status 404.
    pub async fn dispatch(&self, mut request: HttpRequest) -> HttpResponse {
        // Parse query parameters from path
        let (path, query_string) = request
            .path
            .split_once('?')
            .map(|(p, q)| (p.to_string(), Some(q.to_string())))
            .unwrap_or((request.path.clone(), None));

        if let Some(query) = query_string {
            request.query_params = parse_query_string(&query);
        }
        request.path = path;

        for route in &self.routes {
            if route.method.as_str() != request.method {
                continue;
            }

            if let Some(params) = match_path(&route.path, &request.path) {
                request.path_params = params;
                return (route.handler)(request).await;
            }
        }

        tracing::debug!(method = %request.method, path = %request.path, "No route matched");
        HttpResponse::not_found()
            .with_json(&Envelope::unknown_route())
            .unwrap_or_else(|_| HttpResponse::not_found())
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Match a route path pattern against a request path
/// Returns Some(params) if matched, None otherwise
pub(crate) fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (pattern_part, path_part) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(param_name) = pattern_part.strip_prefix(':') {
            params.insert(param_name.to_string(), path_part.to_string());
        } else if pattern_part != path_part {
            return None;
        }
    }

    Some(params)
}

/// Parse a query string into a map of parameters
pub(crate) fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|part| {
            let mut split = part.splitn(2, '=');
            let key = split.next()?;
            let value = split.next().unwrap_or("");
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
