//! Radix tree router for Heron.
//!
//! Maps `(method, path)` pairs to arbitrary targets using a radix tree, so a
//! lookup costs O(k) in the number of path segments rather than O(n) in the
//! number of routes.
//!
//! # Features
//!
//! - **Two parameter spellings**: `/items/:id` and `/items/{id}`
//! - **Wildcards**: catch-all routes (`/files/*path`)
//! - **Method-aware misses**: [`RouteLookup`] tells a 404 from a 405
//! - **Path helpers**: [`path`] joins, trims and templates patterns
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!           "items"         "files"
//!              │               │
//!        ┌─────┴─────┐        "*"
//!        │           │
//!      (leaf)       ":"
//!   [GET,POST]       │
//!                  (leaf)
//!              [GET,DELETE]
//! ```

mod method_router;
mod node;
mod params;
pub mod path;
mod router;

pub use method_router::MethodRouter;
pub use params::Params;
pub use router::Router;

use http::Method;

/// A matched route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The registered target.
    pub target: &'a T,
    /// Captured path parameters.
    pub params: Params,
    /// The pattern the route was registered with.
    pub pattern: &'a str,
}

/// Outcome of a route lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteLookup<'a, T> {
    /// A route matched both path and method.
    Found(RouteMatch<'a, T>),
    /// The path matched, the method did not. Carries the allowed methods.
    MethodNotAllowed(Vec<Method>),
    /// Nothing matched the path.
    NotFound,
}

/// Error raised when inserting a route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The method is already bound on an equivalent pattern.
    #[error("route conflict: {method} {pattern} is already registered")]
    Conflict {
        /// Method token.
        method: String,
        /// The rejected pattern.
        pattern: String,
    },
    /// The pattern is malformed.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },
}
