//! Metadata store and declaration surface.
//!
//! Handlers declare everything the registrar needs out-of-band from their
//! endpoint bodies: route descriptor, endpoints, argument mappings, access
//! configuration, and error maps. Declarations are keyed by
//! `(TypeId, optional endpoint name)` and looked up by exact identity; there
//! is no inheritance-based merging. The store is written once during startup
//! and consumed (frozen) by the route builder.

use crate::{ArgumentMapping, Error, HttpMethod};
use serde_json::Value;
use std::any::TypeId;
use std::collections::HashMap;

/// Per-handler route declaration
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    /// Base path all of the handler's endpoints mount under
    pub base_path: String,
    pub version: Option<String>,
    pub description: Option<String>,
}

impl RouteDescriptor {
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.to_string(),
            version: None,
            description: None,
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Per-endpoint declaration: HTTP verb plus the handler-side endpoint name
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    pub method: HttpMethod,
    pub handler_name: &'static str,
    /// Free-form hints (e.g. "ACTION"); carried as metadata only
    pub hints: Vec<String>,
}

impl EndpointDescriptor {
    pub fn new(method: HttpMethod, handler_name: &'static str) -> Self {
        Self {
            method,
            handler_name,
            hints: Vec::new(),
        }
    }

    pub fn hint(mut self, hint: &str) -> Self {
        self.hints.push(hint.to_string());
        self
    }
}

/// Access level of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Public,
    Protected,
}

/// Authentication scheme an endpoint expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Auth {
    #[default]
    None,
    Jwt,
    Session,
}

/// Per-endpoint access configuration; the permissive default applies when an
/// endpoint declares nothing.
#[derive(Debug, Clone, Default)]
pub struct EndpointConfig {
    pub access: Access,
    pub auth: Auth,
    /// Opaque rights descriptor for future richer guards
    pub guard: Option<Value>,
}

impl EndpointConfig {
    pub fn new(access: Access, auth: Auth) -> Self {
        Self {
            access,
            auth,
            guard: None,
        }
    }

    pub fn guard(mut self, guard: Value) -> Self {
        self.guard = Some(guard);
        self
    }
}

/// Application error code -> HTTP status mapping; unmapped codes default to 500
#[derive(Debug, Clone, Default)]
pub struct ErrorMap {
    entries: HashMap<String, u16>,
}

impl ErrorMap {
    pub const DEFAULT_STATUS: u16 = 500;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(mut self, code: &str, status: u16) -> Self {
        self.entries.insert(code.to_string(), status);
        self
    }

    pub fn status_for(&self, key: &str) -> u16 {
        self.entries.get(key).copied().unwrap_or(Self::DEFAULT_STATUS)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type EndpointKey = (TypeId, &'static str);

/// Process-wide registry of declared route metadata.
///
/// Written once at startup, read many times by the route builder. Structural
/// violations (duplicate declarations, malformed paths or tags) fail the
/// declaring call so the process never starts with inconsistent metadata.
#[derive(Debug, Default)]
pub struct MetadataStore {
    routes: HashMap<TypeId, RouteDescriptor>,
    tags: HashMap<TypeId, String>,
    endpoints: HashMap<TypeId, Vec<EndpointDescriptor>>,
    arguments: HashMap<EndpointKey, ArgumentMapping>,
    configs: HashMap<EndpointKey, EndpointConfig>,
    error_maps: HashMap<EndpointKey, ErrorMap>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the route descriptor for a handler type. At most once per type;
    /// an empty base path is rejected.
    pub fn declare_route<T: 'static>(&mut self, descriptor: RouteDescriptor) -> Result<(), Error> {
        let handler = std::any::type_name::<T>();
        if descriptor.base_path.is_empty() {
            return Err(Error::InvalidBasePath {
                handler,
                reason: "base path must be non-empty".to_string(),
            });
        }
        let type_id = TypeId::of::<T>();
        if self.routes.contains_key(&type_id) {
            return Err(Error::DuplicateRouteDescriptor(handler));
        }
        self.routes.insert(type_id, descriptor);
        Ok(())
    }

    /// Declare the discoverable tag selecting which sub-router the handler's
    /// endpoints mount under. Empty tags and tags containing a path separator
    /// are rejected.
    pub fn declare_discoverable<T: 'static>(&mut self, tag: &str) -> Result<(), Error> {
        if tag.is_empty() {
            return Err(Error::InvalidRouteTag {
                tag: tag.to_string(),
                reason: "tag must be non-empty".to_string(),
            });
        }
        if tag.contains('/') {
            return Err(Error::InvalidRouteTag {
                tag: tag.to_string(),
                reason: "tag must not contain a path separator".to_string(),
            });
        }
        let type_id = TypeId::of::<T>();
        if self.tags.contains_key(&type_id) {
            return Err(Error::DuplicateDiscoverable(std::any::type_name::<T>()));
        }
        self.tags.insert(type_id, tag.to_string());
        Ok(())
    }

    /// Declare an endpoint on a handler type. A handler endpoint name may
    /// carry at most one declaration.
    pub fn declare_endpoint<T: 'static>(
        &mut self,
        descriptor: EndpointDescriptor,
    ) -> Result<(), Error> {
        let list = self.endpoints.entry(TypeId::of::<T>()).or_default();
        if list.iter().any(|e| e.handler_name == descriptor.handler_name) {
            return Err(Error::DuplicateEndpoint {
                handler: std::any::type_name::<T>(),
                endpoint: descriptor.handler_name,
            });
        }
        list.push(descriptor);
        Ok(())
    }

    /// Declare the ordered argument mapping for an endpoint.
    ///
    /// The mapping length is not required to match the handler's parameter
    /// count; missing slots resolve to null at request time.
    pub fn declare_arguments<T: 'static>(
        &mut self,
        endpoint: &'static str,
        tokens: ArgumentMapping,
    ) -> Result<(), Error> {
        insert_endpoint_meta::<T, _>(&mut self.arguments, endpoint, tokens, "argument")
    }

    pub fn declare_config<T: 'static>(
        &mut self,
        endpoint: &'static str,
        config: EndpointConfig,
    ) -> Result<(), Error> {
        insert_endpoint_meta::<T, _>(&mut self.configs, endpoint, config, "config")
    }

    pub fn declare_error_map<T: 'static>(
        &mut self,
        endpoint: &'static str,
        map: ErrorMap,
    ) -> Result<(), Error> {
        insert_endpoint_meta::<T, _>(&mut self.error_maps, endpoint, map, "error map")
    }

    pub fn route_for(&self, type_id: TypeId) -> Option<&RouteDescriptor> {
        self.routes.get(&type_id)
    }

    pub fn tag_for(&self, type_id: TypeId) -> Option<&str> {
        self.tags.get(&type_id).map(String::as_str)
    }

    /// Declared endpoints for a type, in declaration order
    pub fn endpoints_for(&self, type_id: TypeId) -> &[EndpointDescriptor] {
        self.endpoints.get(&type_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn arguments_for(&self, type_id: TypeId, endpoint: &str) -> ArgumentMapping {
        self.arguments
            .get(&(type_id, endpoint))
            .cloned()
            .unwrap_or_default()
    }

    pub fn config_for(&self, type_id: TypeId, endpoint: &str) -> EndpointConfig {
        self.configs
            .get(&(type_id, endpoint))
            .cloned()
            .unwrap_or_default()
    }

    pub fn error_map_for(&self, type_id: TypeId, endpoint: &str) -> ErrorMap {
        self.error_maps
            .get(&(type_id, endpoint))
            .cloned()
            .unwrap_or_default()
    }
}

fn insert_endpoint_meta<T: 'static, V>(
    table: &mut HashMap<EndpointKey, V>,
    endpoint: &'static str,
    value: V,
    kind: &'static str,
) -> Result<(), Error> {
    let key = (TypeId::of::<T>(), endpoint);
    if table.contains_key(&key) {
        return Err(Error::DuplicateEndpointMetadata {
            handler: std::any::type_name::<T>(),
            endpoint,
            kind,
        });
    }
    table.insert(key, value);
    Ok(())
}
