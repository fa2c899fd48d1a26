// Core library for the Chassis routing framework
// This module contains the metadata, registry, and runtime components

pub mod application;
pub mod arguments;
pub mod config;
pub mod envelope;
pub mod error;
pub mod guard;
pub mod http;
pub mod logging;
pub mod metadata;
pub mod registrar;
pub mod registry;
pub mod routing;
pub mod store;
pub mod traits;

// Re-export commonly used types
pub use application::*;
pub use arguments::*;
pub use config::*;
pub use envelope::*;
pub use error::*;
pub use guard::*;
pub use http::*;
pub use metadata::*;
pub use registrar::*;
pub use registry::*;
pub use routing::{PipelineFn, Route, Router};
pub use store::*;
pub use traits::*;
