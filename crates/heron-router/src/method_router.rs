//! Per-path method table.
//!
//! A [`MethodRouter`] holds the targets registered for one path pattern,
//! one per HTTP method, together with the parameter names that pattern
//! declared. Two patterns such as `/items/:id` and `/items/{itemId}` share
//! a tree leaf but keep their own names.

use http::Method;
use smallvec::SmallVec;

/// A target bound to one method of a path.
#[derive(Debug, Clone)]
pub(crate) struct MethodEntry<T> {
    pub(crate) method: Method,
    pub(crate) target: T,
    pub(crate) param_names: Vec<String>,
    pub(crate) pattern: String,
}

/// Maps HTTP methods to targets for a single path.
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    entries: SmallVec<[MethodEntry<T>; 2]>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target. Returns the target back if the method is already taken.
    pub(crate) fn insert(&mut self, entry: MethodEntry<T>) -> Result<(), MethodEntry<T>> {
        if self.entries.iter().any(|e| e.method == entry.method) {
            return Err(entry);
        }
        self.entries.push(entry);
        Ok(())
    }

    pub(crate) fn entry(&self, method: &Method) -> Option<&MethodEntry<T>> {
        self.entries.iter().find(|e| e.method == *method)
    }

    /// Returns the target for a method.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&T> {
        self.entry(method).map(|e| &e.target)
    }

    /// Returns the methods with a target, in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|e| e.method.clone()).collect()
    }

    /// Returns true if any method is registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        !self.entries.is_empty()
    }
}
