//! High-level router API.

use http::Method;

use crate::method_router::{MethodEntry, MethodRouter};
use crate::node::{Node, SegmentKind};
use crate::params::Params;
use crate::path::param_names;
use crate::{RouteError, RouteLookup, RouteMatch};

/// A radix tree router mapping `(method, path)` to a target of type `T`.
///
/// # Example
///
/// ```rust
/// use heron_router::{RouteLookup, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(Method::GET, "/items/:id", "getItem").unwrap();
/// router.insert(Method::DELETE, "/items/{itemId}", "deleteItem").unwrap();
///
/// let RouteLookup::Found(found) = router.lookup(&Method::GET, "/items/42") else {
///     panic!("expected a match");
/// };
/// assert_eq!(*found.target, "getItem");
/// assert_eq!(found.params.get("id"), Some("42"));
/// ```
///
/// # Route Priority
///
/// When multiple routes could match, the router prefers:
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/:id`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    routes: Vec<(Method, String)>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            routes: Vec::new(),
        }
    }

    /// Registers `target` for `method` on `pattern`.
    ///
    /// Fails if a wildcard is not the final segment or if the method is
    /// already bound on an equivalent pattern.
    pub fn insert(&mut self, method: Method, pattern: &str, target: T) -> Result<(), RouteError> {
        let segments = Node::<T>::parse_path(pattern);
        if let Some(position) = segments
            .iter()
            .position(|(_, kind)| *kind == SegmentKind::Wildcard)
        {
            if position + 1 != segments.len() {
                return Err(RouteError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: "a wildcard must be the last segment".to_string(),
                });
            }
        }

        let entry = MethodEntry {
            method: method.clone(),
            target,
            param_names: param_names(pattern),
            pattern: pattern.to_string(),
        };

        self.root
            .leaf_mut(&segments)
            .insert(entry)
            .map_err(|rejected| RouteError::Conflict {
                method: rejected.method.to_string(),
                pattern: pattern.to_string(),
            })?;
        self.routes.push((method, pattern.to_string()));
        Ok(())
    }

    /// Matches a method and path.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup<'_, T> {
        let Some((methods, values)) = self.root.match_path(path) else {
            return RouteLookup::NotFound;
        };
        let Some(entry) = methods.entry(method) else {
            return RouteLookup::MethodNotAllowed(methods.allowed_methods());
        };

        let params: Params = entry.param_names.iter().cloned().zip(values).collect();
        RouteLookup::Found(RouteMatch {
            target: &entry.target,
            params,
            pattern: &entry.pattern,
        })
    }

    /// Matches a method and path, discarding the reason for a miss.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        match self.lookup(method, path) {
            RouteLookup::Found(found) => Some(found),
            _ => None,
        }
    }

    /// Returns the methods accepted on a path.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        self.root
            .match_path(path)
            .map(|(methods, _)| methods.allowed_methods())
            .unwrap_or_default()
    }

    /// Returns the registered `(method, pattern)` pairs in insertion order.
    #[must_use]
    pub fn routes(&self) -> &[(Method, String)] {
        &self.routes
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
