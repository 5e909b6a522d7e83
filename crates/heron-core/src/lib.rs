//! # Heron Core
//!
//! Core types shared by every Heron crate.
//!
//! - [`HeronError`] / [`RegistrationError`] - request-scoped and startup errors
//! - [`ApiRequest`] / [`ApiResponse`] - API Gateway proxy event shapes
//! - [`Request`] / [`Response`] - what extractors, filters and endpoints see
//! - [`Principal`] / [`Credentials`] - authentication inputs and outputs
//! - [`Controller`] / [`MethodTable`] - explicit function-table dispatch
//! - [`di::ControllerFactory`] - how the pipeline obtains controller instances

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod controller;
pub mod di;
mod error;
mod event;
mod principal;
mod request;
mod response;

pub use controller::{
    ArgValue, Args, BoxFuture, Controller, ErasedInvoker, Instance, MethodRef, MethodTable,
    MethodTableBuilder, Reply, TypeKey,
};
pub use error::{
    ErrorCategory, ErrorDetail, ErrorEnvelope, HeronError, HeronResult, RegistrationError,
};
pub use event::{ApiRequest, ApiResponse};
pub use principal::{Credentials, Principal, ROLES_ATTRIBUTE};
pub use request::{is_json_media_type, Request, RequestBuilder};
pub use response::Response;
