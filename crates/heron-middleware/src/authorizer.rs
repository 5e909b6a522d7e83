//! Role authorizers.

use std::fmt;
use std::sync::Arc;

use heron_core::{BoxFuture, HeronError, Principal};

/// Decides whether a principal holds a role.
pub trait Authorizer: Send + Sync + 'static {
    /// Returns a non-blank name used in logs.
    fn name(&self) -> &str;

    /// Returns `true` if `principal` is granted `role`.
    fn authorize<'a>(
        &'a self,
        principal: &'a Principal,
        role: &'a str,
    ) -> BoxFuture<'a, Result<bool, HeronError>>;
}

/// Grants roles listed in the principal's `roles` attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizer;

impl RoleAuthorizer {
    /// Creates the authorizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Authorizer for RoleAuthorizer {
    fn name(&self) -> &str {
        "roles"
    }

    fn authorize<'a>(
        &'a self,
        principal: &'a Principal,
        role: &'a str,
    ) -> BoxFuture<'a, Result<bool, HeronError>> {
        Box::pin(std::future::ready(Ok(principal.has_role(role))))
    }
}

type Predicate = Arc<dyn Fn(&Principal, &str) -> bool + Send + Sync>;

/// An authorizer backed by a synchronous predicate.
///
/// # Example
///
/// ```rust
/// use heron_core::Principal;
/// use heron_middleware::FnAuthorizer;
///
/// let admins_only = FnAuthorizer::new("admins", |principal: &Principal, _role: &str| {
///     principal.name() == "root"
/// });
/// ```
#[derive(Clone)]
pub struct FnAuthorizer {
    name: String,
    predicate: Predicate,
}

impl FnAuthorizer {
    /// Creates an authorizer named `name`.
    #[must_use]
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Principal, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }
}

impl Authorizer for FnAuthorizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn authorize<'a>(
        &'a self,
        principal: &'a Principal,
        role: &'a str,
    ) -> BoxFuture<'a, Result<bool, HeronError>> {
        Box::pin(std::future::ready(Ok((self.predicate)(principal, role))))
    }
}

impl fmt::Debug for FnAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAuthorizer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
