//! # Heron Server
//!
//! Route binding and request dispatch for Heron controllers.
//!
//! - [`RequestEngine`] - where routes are bound; [`LambdaEngine`] serves
//!   API Gateway proxy events on the radix router
//! - [`RouteBinder`] - one route per registered endpoint
//! - [`DispatchPipeline`] - authentication, authorization, controller
//!   resolution, content negotiation, extraction, invocation and error
//!   interception for each request
//! - [`SpecRoutes`] - the generated OpenAPI document under the base path
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use heron_core::di::Container;
//! use heron_core::{ApiRequest, Args, Controller, MethodTable};
//! use heron_middleware::{InterceptorCatalog, MiddlewareRegistry};
//! use heron_registry::Registry;
//! use heron_server::{DispatchPipeline, LambdaEngine, RouteBinder};
//!
//! struct Health;
//!
//! impl Controller for Health {
//!     fn methods() -> MethodTable {
//!         MethodTable::builder::<Self>()
//!             .method("check", 0, |_this: Arc<Self>, _args: Args| async move { Ok("ok") })
//!             .build()
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry
//!     .declare::<Health>("Health")
//!     .root_path("/health")
//!     .endpoint("check", |e| e.get("/"))
//!     .finish()
//!     .unwrap();
//!
//! let mut container = Container::new();
//! container.register(Arc::new(Health));
//!
//! let pipeline = DispatchPipeline::new(
//!     registry.freeze(),
//!     Arc::new(MiddlewareRegistry::new()),
//!     Arc::new(container),
//!     Arc::new(InterceptorCatalog::new()),
//!     "text/plain",
//! );
//!
//! let mut engine = LambdaEngine::new();
//! RouteBinder::new(Arc::new(pipeline)).bind(&mut engine).unwrap();
//!
//! let response = tokio_test::block_on(engine.handle(ApiRequest::new("GET", "/health")));
//! assert_eq!(response.status_code, 200);
//! assert_eq!(response.body, "ok");
//! ```

#![doc(html_root_url = "https://docs.rs/heron-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod docs;
mod engine;
mod pipeline;

pub use binder::RouteBinder;
pub use docs::SpecRoutes;
pub use engine::{error_response, route_handler, LambdaEngine, RequestEngine, RouteHandler, REQUEST_ID_HEADER};
pub use pipeline::DispatchPipeline;
