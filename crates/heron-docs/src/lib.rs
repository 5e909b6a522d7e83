//! # Heron Docs
//!
//! OpenAPI document synthesis for the Heron framework.
//!
//! The document is derived purely from registry metadata:
//!
//! - **Paths** from controller root paths and endpoint paths, trimmed and
//!   rewritten to `{name}` templates
//! - **Parameters** from path, query and header extractors
//! - **Bodies** from declared type tokens, shapes and examples
//! - **Security** from the registered auth filters
//!
//! ## Quick Start
//!
//! ```rust
//! use heron_docs::OpenApiGenerator;
//! use heron_middleware::MiddlewareRegistry;
//! use heron_registry::Registry;
//!
//! let registry = Registry::new().freeze();
//! let doc = OpenApiGenerator::new()
//!     .title("Orders API")
//!     .version("1.0")
//!     .generate(&registry, &MiddlewareRegistry::new())
//!     .unwrap();
//!
//! let json = doc.to_json().unwrap();
//! let yaml = doc.to_yaml().unwrap();
//! assert!(json.contains("Orders API"));
//! assert!(yaml.contains("Orders API"));
//! ```

#![doc(html_root_url = "https://docs.rs/heron-docs/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod generator;
mod openapi;
pub mod schema;

pub use error::{DocsError, DocsResult};
pub use generator::{OpenApiGenerator, DEFAULT_CONTENT_TYPE, OPENAPI_VERSION};
pub use openapi::{
    Components, Info, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem,
    RequestBody, Response, Schema, SchemaType, SecurityRequirement, SecurityScheme, Server, Tag,
};
