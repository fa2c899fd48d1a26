// Route builder: turns declared metadata plus registered handlers into a
// wired router

use crate::{
    resolve_arguments, send_envelope, ArgumentMapping, Error, ErrorMap, Guard, GuardContext,
    Handler, HttpMethod, MetadataStore, PipelineFn, Route, RouteRegistry, Router,
};
use crate::envelope::failure_payload;
use crate::guard::{guards_for, unauthorized_response};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Build lifecycle of a `RouteBuilder`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Uninitialized,
    Building,
    Mounted,
}

/// Assembles the route table from registered handlers and their declared
/// metadata.
///
/// Mounting is all-or-nothing: any structural problem (unknown or duplicate
/// tag, duplicate route) aborts the build so a partially wired router never
/// serves traffic.
pub struct RouteBuilder {
    registry: RouteRegistry,
    metadata: MetadataStore,
    mounts: Vec<(String, String)>,
    phase: BuildPhase,
}

impl RouteBuilder {
    pub fn new(registry: RouteRegistry, metadata: MetadataStore) -> Self {
        Self {
            registry,
            metadata,
            mounts: Vec::new(),
            phase: BuildPhase::Uninitialized,
        }
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Mount a sub-router: handlers whose discoverable tag equals `tag` are
    /// wired under `prefix`.
    pub fn mount_router(mut self, tag: &str, prefix: &str) -> Self {
        self.phase = BuildPhase::Building;
        self.mounts.push((tag.to_string(), prefix.to_string()));
        self
    }

    /// Wire every registered handler into a router.
    pub fn build(mut self) -> Result<Router, Error> {
        let mut prefixes: HashMap<String, String> = HashMap::new();
        for (tag, prefix) in &self.mounts {
            if prefixes.insert(tag.clone(), prefix.clone()).is_some() {
                return Err(Error::DuplicateRouterTag(tag.clone()));
            }
        }

        let mut router = Router::new();
        let mut mounted: HashSet<(HttpMethod, String)> = HashSet::new();

        for registration in self.registry.iter() {
            let Some(descriptor) = self.metadata.route_for(registration.type_id) else {
                tracing::debug!(
                    handler = registration.type_name,
                    "Registered handler has no route descriptor, skipping"
                );
                continue;
            };

            let prefix = match self.metadata.tag_for(registration.type_id) {
                Some(tag) => {
                    prefixes
                        .get(tag)
                        .ok_or_else(|| Error::UnknownRouterTag {
                            handler: registration.type_name.to_string(),
                            tag: tag.to_string(),
                        })?
                        .as_str()
                }
                None => "",
            };

            let base_path = join_paths(prefix, &descriptor.base_path);
            let handler = (registration.factory)();

            for endpoint in self.metadata.endpoints_for(registration.type_id) {
                let key = (endpoint.method, base_path.clone());
                if !mounted.insert(key) {
                    return Err(Error::DuplicateRoute {
                        method: endpoint.method.to_string(),
                        path: base_path.clone(),
                    });
                }

                let tokens = self
                    .metadata
                    .arguments_for(registration.type_id, endpoint.handler_name);
                let config = self
                    .metadata
                    .config_for(registration.type_id, endpoint.handler_name);
                let error_map = self
                    .metadata
                    .error_map_for(registration.type_id, endpoint.handler_name);

                let pipeline = build_pipeline(
                    handler.clone(),
                    endpoint.handler_name,
                    tokens,
                    guards_for(&config),
                    error_map,
                    base_path.clone(),
                );

                tracing::info!(
                    handler = registration.type_name,
                    endpoint = endpoint.handler_name,
                    method = %endpoint.method,
                    path = %base_path,
                    "Mounted route"
                );

                router.add_route(Route {
                    method: endpoint.method,
                    path: base_path.clone(),
                    handler: pipeline,
                });
            }
        }

        self.phase = BuildPhase::Mounted;
        tracing::info!(routes = router.routes.len(), "Route table built");
        Ok(router)
    }
}

fn join_paths(prefix: &str, base_path: &str) -> String {
    if prefix.is_empty() {
        return base_path.to_string();
    }
    let prefix = prefix.trim_end_matches('/');
    let base = base_path.trim_start_matches('/');
    format!("{prefix}/{base}")
}

/// Assemble the per-route pipeline: guards, argument resolution, invocation,
/// envelope formatting. Domain errors are mapped through the endpoint's
/// ErrorMap; guard rejections short-circuit with the uniform 401 body.
fn build_pipeline(
    handler: Arc<dyn Handler>,
    endpoint: &'static str,
    tokens: ArgumentMapping,
    guards: Vec<Arc<dyn Guard>>,
    error_map: ErrorMap,
    path: String,
) -> PipelineFn {
    let tokens = Arc::new(tokens);
    let guards = Arc::new(guards);
    let error_map = Arc::new(error_map);
    let path = Arc::new(path);

    Arc::new(move |request| {
        let handler = handler.clone();
        let tokens = tokens.clone();
        let guards = guards.clone();
        let error_map = error_map.clone();
        let path = path.clone();

        Box::pin(async move {
            {
                let context = GuardContext::new(&request);
                for guard in guards.iter() {
                    match guard.can_activate(&context).await {
                        Ok(true) => {}
                        Ok(false) => return unauthorized_response(),
                        Err(error) => {
                            tracing::error!(path = %path, error = %error, "Guard evaluation failed");
                            return unauthorized_response();
                        }
                    }
                }
            }

            let args = resolve_arguments(&tokens, &request);
            match handler.invoke(endpoint, args).await {
                Ok(value) => send_envelope(&path, 200, value),
                Err(error) => {
                    let status = error_map.status_for(error.key());
                    tracing::debug!(
                        path = %path,
                        key = error.key(),
                        status,
                        "Endpoint returned domain error"
                    );
                    send_envelope(&path, status, failure_payload(&error))
                }
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Access, Args, ArgumentToken, Auth, EndpointConfig, EndpointDescriptor, HttpRequest,
        RouteDescriptor, RuntimeError,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct HelloRoute;

    #[async_trait]
    impl Handler for HelloRoute {
        async fn invoke(&self, endpoint: &str, args: Args) -> Result<Value, RuntimeError> {
            match endpoint {
                "say_hello" => Ok(json!({ "greeting": "hello" })),
                "fail" => Err(RuntimeError::new("TEAPOT")),
                "echo_name" => Ok(json!({ "name": args.get(0) })),
                _ => Err(RuntimeError::new("UNKNOWN_ENDPOINT")),
            }
        }
    }

    struct SilentRoute;

    #[async_trait]
    impl Handler for SilentRoute {
        async fn invoke(&self, _endpoint: &str, _args: Args) -> Result<Value, RuntimeError> {
            Ok(Value::Null)
        }
    }

    fn hello_metadata() -> MetadataStore {
        let mut metadata = MetadataStore::new();
        metadata
            .declare_route::<HelloRoute>(RouteDescriptor::new("/hello"))
            .unwrap();
        metadata
            .declare_discoverable::<HelloRoute>("demo")
            .unwrap();
        metadata
            .declare_endpoint::<HelloRoute>(EndpointDescriptor::new(HttpMethod::GET, "say_hello"))
            .unwrap();
        metadata
    }

    fn hello_registry() -> RouteRegistry {
        let mut registry = RouteRegistry::new();
        registry.register(|| HelloRoute);
        registry
    }

    #[tokio::test]
    async fn test_build_wires_registered_routes() {
        let router = RouteBuilder::new(hello_registry(), hello_metadata())
            .mount_router("demo", "/api/v1")
            .build()
            .unwrap();

        assert_eq!(
            router.route_table(),
            vec![(HttpMethod::GET, "/api/v1/hello".to_string())]
        );

        let response = router
            .dispatch(HttpRequest::new("GET".to_string(), "/api/v1/hello".to_string()))
            .await;
        assert_eq!(response.status, 200);
        let body: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["message"], "SUCCESS(/api/v1/hello)");
        assert_eq!(body["data"]["greeting"], "hello");
    }

    #[tokio::test]
    async fn test_handler_without_descriptor_is_skipped() {
        let mut registry = hello_registry();
        registry.register(|| SilentRoute);

        let router = RouteBuilder::new(registry, hello_metadata())
            .mount_router("demo", "/api/v1")
            .build()
            .unwrap();
        assert_eq!(router.routes.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tag_aborts_build() {
        let result = RouteBuilder::new(hello_registry(), hello_metadata())
            .mount_router("other", "/api/v1")
            .build();
        assert!(matches!(result, Err(Error::UnknownRouterTag { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_tag_aborts_build() {
        let result = RouteBuilder::new(hello_registry(), hello_metadata())
            .mount_router("demo", "/api/v1")
            .mount_router("demo", "/api/v2")
            .build();
        assert!(matches!(result, Err(Error::DuplicateRouterTag(_))));
    }

    #[tokio::test]
    async fn test_duplicate_route_aborts_build() {
        let mut metadata = hello_metadata();
        metadata
            .declare_endpoint::<HelloRoute>(EndpointDescriptor::new(HttpMethod::GET, "fail"))
            .unwrap();

        let result = RouteBuilder::new(hello_registry(), metadata)
            .mount_router("demo", "/api/v1")
            .build();
        assert!(matches!(result, Err(Error::DuplicateRoute { .. })));
    }

    #[tokio::test]
    async fn test_error_map_drives_failure_status() {
        let mut metadata = MetadataStore::new();
        metadata
            .declare_route::<HelloRoute>(RouteDescriptor::new("/hello"))
            .unwrap();
        metadata
            .declare_endpoint::<HelloRoute>(EndpointDescriptor::new(HttpMethod::GET, "fail"))
            .unwrap();
        metadata
            .declare_error_map::<HelloRoute>("fail", ErrorMap::new().map("TEAPOT", 418))
            .unwrap();

        let router = RouteBuilder::new(hello_registry(), metadata).build().unwrap();
        let response = router
            .dispatch(HttpRequest::new("GET".to_string(), "/hello".to_string()))
            .await;
        assert_eq!(response.status, 418);
        let body: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["message"], "FAILED(/hello)");
        assert_eq!(body["error"]["error"], "TEAPOT");
    }

    #[tokio::test]
    async fn test_unmapped_error_defaults_to_500() {
        let mut metadata = MetadataStore::new();
        metadata
            .declare_route::<HelloRoute>(RouteDescriptor::new("/hello"))
            .unwrap();
        metadata
            .declare_endpoint::<HelloRoute>(EndpointDescriptor::new(HttpMethod::GET, "fail"))
            .unwrap();

        let router = RouteBuilder::new(hello_registry(), metadata).build().unwrap();
        let response = router
            .dispatch(HttpRequest::new("GET".to_string(), "/hello".to_string()))
            .await;
        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn test_jwt_config_rejects_missing_authorization() {
        let mut metadata = hello_metadata();
        metadata
            .declare_config::<HelloRoute>(
                "say_hello",
                EndpointConfig::new(Access::Protected, Auth::Jwt),
            )
            .unwrap();

        let router = RouteBuilder::new(hello_registry(), metadata)
            .mount_router("demo", "/api/v1")
            .build()
            .unwrap();

        let response = router
            .dispatch(HttpRequest::new("GET".to_string(), "/api/v1/hello".to_string()))
            .await;
        assert_eq!(response.status, 401);
        let body: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["error"], "NOT_AUTHORIZED");

        let response = router
            .dispatch(
                HttpRequest::new("GET".to_string(), "/api/v1/hello".to_string())
                    .with_header("Authorization", "Bearer t"),
            )
            .await;
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_arguments_flow_into_invocation() {
        let mut metadata = MetadataStore::new();
        metadata
            .declare_route::<HelloRoute>(RouteDescriptor::new("/hello/:name"))
            .unwrap();
        metadata
            .declare_endpoint::<HelloRoute>(EndpointDescriptor::new(HttpMethod::GET, "echo_name"))
            .unwrap();
        metadata
            .declare_arguments::<HelloRoute>(
                "echo_name",
                vec![ArgumentToken::Param("name".to_string())],
            )
            .unwrap();

        let router = RouteBuilder::new(hello_registry(), metadata).build().unwrap();
        let response = router
            .dispatch(HttpRequest::new("GET".to_string(), "/hello/Akshay".to_string()))
            .await;
        let body: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["data"]["name"], "Akshay");
    }

    #[test]
    fn test_phase_transitions() {
        let builder = RouteBuilder::new(RouteRegistry::new(), MetadataStore::new());
        assert_eq!(builder.phase(), BuildPhase::Uninitialized);
        let builder = builder.mount_router("demo", "/api");
        assert_eq!(builder.phase(), BuildPhase::Building);
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/api/v1", "/hello"), "/api/v1/hello");
        assert_eq!(join_paths("/api/v1/", "hello"), "/api/v1/hello");
        assert_eq!(join_paths("", "/hello"), "/hello");
    }
}
