// Chassis - a declarative HTTP routing layer for Rust
//
// Handlers describe their routes, arguments, guards, and error mappings as
// metadata; a registrar wires them into a router with uniform response
// envelopes.

// Re-export core functionality
pub use chassis_core::*;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Access,
        Application,
        Args,
        ArgumentToken,
        Auth,
        Collection,
        EndpointConfig,
        EndpointDescriptor,
        Envelope,
        Error,
        ErrorMap,
        Guard,
        GuardContext,
        Handler,
        HttpMethod,
        HttpRequest,
        HttpResponse,
        MemoryStore,
        MetadataStore,
        Route,
        RouteBuilder,
        RouteDescriptor,
        RouteRegistry,
        Router,
        RuntimeError,
        ServerConfig,
        resolve_arguments,
    };
    pub use async_trait::async_trait;
}
