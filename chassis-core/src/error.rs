// Error types for the Chassis framework

use serde_json::Value;
use thiserror::Error;

/// Structural and transport errors.
///
/// Everything in the build/config family is fatal at startup: the process must
/// not begin serving traffic from an inconsistent route table.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid base path for {handler}: {reason}")]
    InvalidBasePath {
        handler: &'static str,
        reason: String,
    },

    #[error("Invalid discoverable tag {tag:?}: {reason}")]
    InvalidRouteTag { tag: String, reason: String },

    #[error("Route descriptor already declared for {0}")]
    DuplicateRouteDescriptor(&'static str),

    #[error("Discoverable tag already declared for {0}")]
    DuplicateDiscoverable(&'static str),

    #[error("Duplicate endpoint declaration for {handler}.{endpoint}")]
    DuplicateEndpoint {
        handler: &'static str,
        endpoint: &'static str,
    },

    #[error("Duplicate {kind} declaration for {handler}.{endpoint}")]
    DuplicateEndpointMetadata {
        handler: &'static str,
        endpoint: &'static str,
        kind: &'static str,
    },

    #[error("Duplicate router tag {0:?}")]
    DuplicateRouterTag(String),

    #[error("{handler} declares discoverable tag {tag:?} but no router with that tag is mounted")]
    UnknownRouterTag { handler: String, tag: String },

    #[error("Duplicate route: {method} {path}")]
    DuplicateRoute { method: String, path: String },

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Domain error carried out of handler invocations.
///
/// The pipeline derives the error's key as `code`, falling back to `id`,
/// falling back to `name`, and maps it through the endpoint's `ErrorMap` to an
/// HTTP status (500 when unmapped). `info` is arbitrary diagnostic payload
/// surfaced in the failure envelope.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub code: Option<String>,
    pub id: Option<String>,
    pub name: &'static str,
    pub message: String,
    pub info: Option<Value>,
}

impl RuntimeError {
    /// Create a new domain error identified by `id` (e.g. "VALIDATION_FAILED").
    pub fn new(id: &str) -> Self {
        Self {
            code: None,
            id: Some(id.to_string()),
            name: "RuntimeError",
            message: id.to_string(),
            info: None,
        }
    }

    /// Set an explicit error code; takes precedence over `id` for mapping.
    pub fn code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    /// Set the concrete error type name (the last-resort mapping key).
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    pub fn info(mut self, info: Value) -> Self {
        self.info = Some(info);
        self
    }

    /// The key used for ErrorMap lookup: code, then id, then name.
    pub fn key(&self) -> &str {
        self.code
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or(self.name)
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() || self.message == self.key() {
            write!(f, "[{}]", self.key())
        } else {
            write!(f, "[{}] {}", self.key(), self.message)
        }
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_prefers_code_over_id_over_name() {
        let err = RuntimeError::new("SOME_ID");
        assert_eq!(err.key(), "SOME_ID");

        let err = RuntimeError::new("SOME_ID").code("SOME_CODE");
        assert_eq!(err.key(), "SOME_CODE");

        let mut err = RuntimeError::new("SOME_ID").named("InvalidRequest");
        err.id = None;
        assert_eq!(err.key(), "InvalidRequest");
    }

    #[test]
    fn test_display_includes_key_and_message() {
        let err = RuntimeError::new("VALIDATION_FAILED");
        assert_eq!(err.to_string(), "[VALIDATION_FAILED]");

        let err = RuntimeError::new("VALIDATION_FAILED").message("age must be a number");
        assert_eq!(err.to_string(), "[VALIDATION_FAILED] age must be a number");
    }

    #[test]
    fn test_info_is_preserved() {
        let err = RuntimeError::new("DUPLICATE_ID").info(json!({"id": "abc"}));
        assert_eq!(err.info.unwrap()["id"], "abc");
    }

    #[test]
    fn test_build_error_messages() {
        let err = Error::DuplicateRouterTag("reports".to_string());
        assert!(err.to_string().contains("reports"));

        let err = Error::UnknownRouterTag {
            handler: "ReportsRoute".to_string(),
            tag: "reports".to_string(),
        };
        assert!(err.to_string().contains("ReportsRoute"));
    }
}
