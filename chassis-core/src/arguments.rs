// Argument resolution: declared tokens -> positional handler arguments

use crate::{HttpRequest, RuntimeError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A declarative argument source for one handler parameter.
///
/// Tokens resolve permissively: anything that cannot be located in the request
/// resolves to `Value::Null` rather than failing. Validation of resolved
/// values is the handler's responsibility.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgumentToken {
    /// The entire request body, parsed as JSON
    Body,
    /// All query parameters as an object
    Query,
    /// All path parameters as an object
    Params,
    /// All headers as an object (names lowercased)
    Headers,
    /// All uploaded files as an object
    Files,
    /// A single named path parameter
    Param(String),
    /// A single named query parameter
    QueryField(String),
    /// A single named field of the JSON body
    BodyField(String),
}

/// Ordered argument declaration for one endpoint; order defines the
/// positional binding to the handler's parameters.
pub type ArgumentMapping = Vec<ArgumentToken>;

const NULL: Value = Value::Null;

/// Positional arguments resolved for one handler invocation.
///
/// Out-of-range reads yield `Null`, mirroring the tolerated mismatch between
/// declared tokens and parameter count.
#[derive(Clone, Debug, Default)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, index: usize) -> &Value {
        self.0.get(index).unwrap_or(&NULL)
    }

    pub fn take(&mut self, index: usize) -> Value {
        if index < self.0.len() {
            std::mem::take(&mut self.0[index])
        } else {
            Value::Null
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deserialize the argument at `index` into a typed value.
    ///
    /// Failure surfaces as a `VALIDATION_FAILED` domain error carrying the
    /// serde message in `info`, so a handler can map it straight through its
    /// ErrorMap.
    pub fn parse<T: DeserializeOwned>(&self, index: usize) -> Result<T, RuntimeError> {
        serde_json::from_value(self.get(index).clone()).map_err(|e| {
            RuntimeError::new("VALIDATION_FAILED")
                .info(serde_json::json!({ "errorMessage": e.to_string() }))
        })
    }
}

fn string_map_value(map: &HashMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<String, Value>>(),
    )
}

fn body_value(request: &HttpRequest) -> Value {
    if request.body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&request.body).unwrap_or(Value::Null)
}

fn resolve_token(token: &ArgumentToken, request: &HttpRequest) -> Value {
    match token {
        ArgumentToken::Body => body_value(request),
        ArgumentToken::Query => string_map_value(&request.query_params),
        ArgumentToken::Params => string_map_value(&request.path_params),
        ArgumentToken::Headers => string_map_value(&request.headers),
        ArgumentToken::Files => serde_json::to_value(&request.files).unwrap_or(Value::Null),
        ArgumentToken::Param(name) => request
            .param(name)
            .map(|v| Value::String(v.clone()))
            .unwrap_or(Value::Null),
        ArgumentToken::QueryField(name) => request
            .query(name)
            .map(|v| Value::String(v.clone()))
            .unwrap_or(Value::Null),
        ArgumentToken::BodyField(name) => match body_value(request) {
            Value::Object(mut fields) => fields.remove(name).unwrap_or(Value::Null),
            _ => Value::Null,
        },
    }
}

/// Resolve the declared tokens against a request, one value per token, in
/// declared order.
pub fn resolve_arguments(tokens: &[ArgumentToken], request: &HttpRequest) -> Args {
    Args::new(tokens.iter().map(|t| resolve_token(t, request)).collect())
}
