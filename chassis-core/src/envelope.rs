// Response envelope: the single shape every routed response takes

use crate::{HttpResponse, RuntimeError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The uniform response body.
///
/// Success carries `data`, failure carries `error`; the absent side is omitted
/// from serialization entirely so clients can branch on field presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl Envelope {
    /// Format a payload for the given route path and status. 2xx statuses
    /// produce a success envelope, everything else a failure envelope.
    pub fn format(path: &str, status: u16, payload: Value) -> Self {
        let ok = (200..300).contains(&status);
        if ok {
            Self {
                ok,
                message: format!("SUCCESS({path})"),
                data: Some(payload),
                error: None,
            }
        } else {
            Self {
                ok,
                message: format!("FAILED({path})"),
                data: None,
                error: Some(payload),
            }
        }
    }

    /// The fixed envelope returned for requests matching no route.
    pub fn unknown_route() -> Self {
        Self {
            ok: false,
            message: "FAILED(Unknown Route)".to_string(),
            data: Some(Value::Null),
            error: None,
        }
    }
}

/// Serialize an envelope into the wire response.
pub fn send_envelope(path: &str, status: u16, payload: Value) -> HttpResponse {
    let envelope = Envelope::format(path, status, payload);
    HttpResponse::new(status)
        .with_json(&envelope)
        .unwrap_or_else(|_| HttpResponse::internal_server_error())
}

/// The error payload placed in a failure envelope: the mapping key, the
/// display message, and diagnostic info when the error carries any.
pub fn failure_payload(error: &RuntimeError) -> Value {
    let mut payload = Map::new();
    payload.insert("error".to_string(), Value::String(error.key().to_string()));
    payload.insert("message".to_string(), Value::String(error.to_string()));
    if let Some(info) = &error.info {
        payload.insert("info".to_string(), info.clone());
    }
    Value::Object(payload)
}
