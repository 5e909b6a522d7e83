//! # Heron Registry
//!
//! Controller and endpoint metadata.
//!
//! Application code declares controllers and endpoints here, either through
//! the idempotent fetch-or-create calls and setters or through the fluent
//! [`Registry::declare`] layer. The registry is then frozen into an
//! `Arc<Registry>` that the route binder and the API document generator read.
//!
//! - [`Registry`] - the store, keyed by controller identity
//! - [`ControllerDescriptor`] / [`EndpointDescriptor`] - declared metadata
//! - [`EndpointRef`] - an endpoint with controller fallbacks resolved
//! - [`ApiOperation`] / [`ApiBody`] - documentation metadata

#![doc(html_root_url = "https://docs.rs/heron-registry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod decl;
mod descriptor;
mod operation;
mod registry;

pub use decl::{ControllerDecl, EndpointDecl};
pub use descriptor::{ControllerDescriptor, EndpointDescriptor, EndpointRef};
pub use operation::{ApiBody, ApiInfo, ApiOperation};
pub use registry::Registry;
