// Core traits for the Chassis framework

use crate::{Args, RuntimeError};
use async_trait::async_trait;
use serde_json::Value;
use std::any::TypeId;
use std::sync::Arc;

/// HTTP methods an endpoint may declare
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl HttpMethod {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "PATCH" => Some(HttpMethod::PATCH),
            "DELETE" => Some(HttpMethod::DELETE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handler exposing named endpoints.
///
/// One instance is created at build time and shared across all requests to all
/// of the handler's endpoints; implementations must be safe for concurrent
/// invocation. Endpoints are addressed by the `handler_name` declared in their
/// `EndpointDescriptor`, so dispatch is an explicit match rather than
/// reflection over a method set.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Invoke the named endpoint with positionally resolved arguments.
    async fn invoke(&self, endpoint: &str, args: Args) -> Result<Value, RuntimeError>;
}

/// Factory producing the shared handler instance at build time
pub type HandlerFactory = Arc<dyn Fn() -> Arc<dyn Handler> + Send + Sync>;

/// Registration information for a handler type
#[derive(Clone)]
pub struct HandlerRegistration {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub factory: HandlerFactory,
}

impl HandlerRegistration {
    pub fn new<H, F>(factory: F) -> Self
    where
        H: Handler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<H>(),
            type_name: std::any::type_name::<H>(),
            factory: Arc::new(move || Arc::new(factory()) as Arc<dyn Handler>),
        }
    }
}

impl std::fmt::Debug for HandlerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistration")
            .field("type_id", &self.type_id)
            .field("type_name", &self.type_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl Handler for EchoHandler {
        async fn invoke(&self, endpoint: &str, _args: Args) -> Result<Value, RuntimeError> {
            Ok(json!({ "endpoint": endpoint }))
        }
    }

    #[test]
    fn test_http_method_round_trip() {
        for (name, method) in [
            ("GET", HttpMethod::GET),
            ("POST", HttpMethod::POST),
            ("PUT", HttpMethod::PUT),
            ("PATCH", HttpMethod::PATCH),
            ("DELETE", HttpMethod::DELETE),
        ] {
            assert_eq!(HttpMethod::from_str(name), Some(method));
            assert_eq!(method.as_str(), name);
        }
        assert_eq!(HttpMethod::from_str("TRACE"), None);
    }

    #[test]
    fn test_http_method_from_str_is_case_insensitive() {
        assert_eq!(HttpMethod::from_str("get"), Some(HttpMethod::GET));
        assert_eq!(HttpMethod::from_str("Post"), Some(HttpMethod::POST));
    }

    #[tokio::test]
    async fn test_registration_factory_produces_handler() {
        let registration = HandlerRegistration::new(|| EchoHandler);
        let handler = (registration.factory)();
        let result = handler.invoke("ping", Args::default()).await.unwrap();
        assert_eq!(result["endpoint"], "ping");
        assert_eq!(registration.type_id, TypeId::of::<EchoHandler>());
    }
}
