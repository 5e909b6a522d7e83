//! # Heron Middleware
//!
//! Authentication, authorization and error interception for Heron.
//!
//! Three ordered lists live in a [`MiddlewareRegistry`]:
//!
//! | Kind | Trait | Chaining |
//! |------|-------|----------|
//! | Auth filter | [`AuthFilter`] | first principal wins, otherwise 401 |
//! | Authorizer | [`Authorizer`] | first granted role wins, otherwise 403 |
//! | Error interceptor | [`ErrorInterceptor`] | first matching target, never chained |
//!
//! Interceptors bound by identifier on a controller or endpoint are looked up
//! through an [`InterceptorFactory`]; [`InterceptorCatalog`] is the default.

#![doc(html_root_url = "https://docs.rs/heron-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod auth;
mod authorizer;
mod interceptor;
mod registry;

pub use auth::{ApiKeyAuthFilter, ApiKeyLocation, AuthFilter, AuthScheme, BasicAuthFilter, BearerAuthFilter};
pub use authorizer::{Authorizer, FnAuthorizer, RoleAuthorizer};
pub use interceptor::{
    ErrorInterceptor, FnInterceptor, InterceptContext, InterceptorCatalog, InterceptorFactory,
    InterceptorTarget,
};
pub use registry::MiddlewareRegistry;
