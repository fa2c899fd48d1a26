// Guard system for protecting routes

use crate::{Auth, EndpointConfig, Error, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::sync::Arc;

/// Context available to guards during request evaluation
pub struct GuardContext<'a> {
    pub request: &'a HttpRequest,
}

impl<'a> GuardContext<'a> {
    pub fn new(request: &'a HttpRequest) -> Self {
        Self { request }
    }

    /// Get a request header (case-insensitive)
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.request.header(name)
    }

    /// Get a path parameter
    pub fn get_param(&self, name: &str) -> Option<&String> {
        self.request.param(name)
    }
}

/// Trait for route guards.
///
/// `Ok(true)` admits the request; `Ok(false)` rejects it with the uniform
/// 401 body before any argument resolution happens.
#[async_trait]
pub trait Guard: Send + Sync {
    async fn can_activate(&self, context: &GuardContext<'_>) -> Result<bool, Error>;
}

/// Guard derived from an endpoint's declared access configuration.
///
/// Presence-only: a JWT endpoint requires an `authorization` header to exist,
/// nothing more. Token verification belongs to the application layer.
pub struct ConfigGuard {
    config: EndpointConfig,
}

impl ConfigGuard {
    pub fn new(config: EndpointConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Guard for ConfigGuard {
    async fn can_activate(&self, context: &GuardContext<'_>) -> Result<bool, Error> {
        match self.config.auth {
            Auth::Jwt => {
                let admitted = context.get_header("authorization").is_some();
                if !admitted {
                    tracing::debug!(
                        path = %context.request.path,
                        "Rejecting request: missing authorization header"
                    );
                }
                Ok(admitted)
            }
            // Session handling is left to the application; nothing to check here.
            Auth::Session | Auth::None => Ok(true),
        }
    }
}

/// Build the guard chain for an endpoint's configuration.
pub fn guards_for(config: &EndpointConfig) -> Vec<Arc<dyn Guard>> {
    match config.auth {
        Auth::None => Vec::new(),
        _ => vec![Arc::new(ConfigGuard::new(config.clone()))],
    }
}

/// The uniform rejection every failed guard produces.
pub fn unauthorized_response() -> HttpResponse {
    HttpResponse::unauthorized()
        .with_json(&serde_json::json!({ "error": "NOT_AUTHORIZED" }))
        .unwrap_or_else(|_| HttpResponse::unauthorized())
}
