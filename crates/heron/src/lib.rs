//! # Heron
//!
//! **Declarative controllers for API Gateway proxy events**
//!
//! Heron turns explicit controller and endpoint declarations into:
//!
//! - live routes on a request engine, each dispatched through
//!   authentication, authorization, content negotiation, parameter
//!   extraction, invocation and error interception
//! - an OpenAPI 3 document synthesized from the same declarations, served
//!   as JSON and YAML under the configured base path
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use heron::prelude::*;
//!
//! let mut registry = Registry::new();
//! registry
//!     .declare::<Orders>("Orders")
//!     .root_path("/orders")
//!     .endpoint("get", |e| e.get("/:id").param(0, ParameterExtractor::path("id")))
//!     .finish()?;
//!
//! let app = Heron::builder()
//!     .registry(registry)
//!     .controllers(container)
//!     .config(ConfigLoader::new().with_defaults().with_env_prefix("HERON").load()?)
//!     .build()?;
//!
//! let response = app.handle(event).await;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Registry ──freeze──→ RouteBinder ──→ LambdaEngine ──→ DispatchPipeline
//!     │                                                     │
//!     └──────→ OpenApiGenerator ──→ SpecRoutes      MiddlewareRegistry
//! ```

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;

pub use app::{init_logging, Heron, HeronBuilder};

// Re-export core types
pub use heron_core as core;

// Re-export configuration
pub use heron_config as config;

// Re-export OpenAPI generation
pub use heron_docs as docs;

// Re-export extraction types
pub use heron_extract as extract;

// Re-export middleware types
pub use heron_middleware as middleware;

// Re-export the metadata registry
pub use heron_registry as registry;

// Re-export router types
pub use heron_router as router;

// Re-export engine and pipeline types
pub use heron_server as server;

// Re-export logging setup
pub use heron_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use heron::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Heron, HeronBuilder};

    pub use heron_core::di::{Container, ControllerFactory};
    pub use heron_core::{
        ApiRequest, ApiResponse, Args, Controller, HeronError, HeronResult, MethodTable,
        Principal, RegistrationError, Reply, Request, Response,
    };

    pub use heron_config::{ConfigLoader, HeronConfig};

    pub use heron_extract::{Field, ParameterExtractor, Shape};

    pub use heron_middleware::{
        BasicAuthFilter, BearerAuthFilter, ErrorInterceptor, FnAuthorizer, FnInterceptor,
        InterceptorCatalog, InterceptorTarget, MiddlewareRegistry, RoleAuthorizer,
    };

    pub use heron_registry::{ApiBody, Registry};
}
