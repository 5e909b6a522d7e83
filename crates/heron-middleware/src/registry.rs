//! The middleware registry and its chaining rules.

use std::fmt;
use std::sync::Arc;

use heron_core::{HeronError, Principal, RegistrationError, Request};

use crate::auth::{AuthFilter, AuthScheme};
use crate::authorizer::Authorizer;
use crate::interceptor::ErrorInterceptor;

const AUTH_FILTER: &str = "auth filter";
const AUTHORIZER: &str = "authorizer";
const INTERCEPTOR: &str = "error interceptor";

/// Ordered, append-only lists of auth filters, authorizers and error
/// interceptors.
///
/// Registration validates eagerly: an absent or malformed entry is rejected
/// and the list is left unchanged.
///
/// # Example
///
/// ```rust
/// use heron_core::Principal;
/// use heron_middleware::{BasicAuthFilter, MiddlewareRegistry, RoleAuthorizer};
///
/// let mut middleware = MiddlewareRegistry::new();
/// middleware
///     .add_auth_filter(BasicAuthFilter::new(|user: String, _password: String| async move {
///         Ok(Some(Principal::new(user).with_roles(["reader"])))
///     }))
///     .unwrap();
/// middleware.add_authorizer(RoleAuthorizer::new()).unwrap();
///
/// assert!(middleware.requires_authentication());
/// assert_eq!(middleware.schemes().len(), 1);
/// assert!(middleware.add_shared_authorizer(None).is_err());
/// assert_eq!(middleware.authorizers().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    auth_filters: Vec<Arc<dyn AuthFilter>>,
    authorizers: Vec<Arc<dyn Authorizer>>,
    interceptors: Vec<Arc<dyn ErrorInterceptor>>,
}

impl MiddlewareRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an auth filter.
    pub fn add_auth_filter<F: AuthFilter>(&mut self, filter: F) -> Result<(), RegistrationError> {
        self.add_shared_auth_filter(Some(Arc::new(filter)))
    }

    /// Appends a shared auth filter. `None` is rejected.
    pub fn add_shared_auth_filter(
        &mut self,
        filter: Option<Arc<dyn AuthFilter>>,
    ) -> Result<(), RegistrationError> {
        let filter = filter.ok_or_else(|| RegistrationError::invalid_middleware(AUTH_FILTER, "filter is absent"))?;
        if filter.name().trim().is_empty() {
            return Err(RegistrationError::invalid_middleware(AUTH_FILTER, "name must not be blank"));
        }
        tracing::debug!(filter = filter.name(), "registered auth filter");
        self.auth_filters.push(filter);
        Ok(())
    }

    /// Appends an authorizer.
    pub fn add_authorizer<A: Authorizer>(&mut self, authorizer: A) -> Result<(), RegistrationError> {
        self.add_shared_authorizer(Some(Arc::new(authorizer)))
    }

    /// Appends a shared authorizer. `None` is rejected.
    pub fn add_shared_authorizer(
        &mut self,
        authorizer: Option<Arc<dyn Authorizer>>,
    ) -> Result<(), RegistrationError> {
        let authorizer = authorizer
            .ok_or_else(|| RegistrationError::invalid_middleware(AUTHORIZER, "authorizer is absent"))?;
        if authorizer.name().trim().is_empty() {
            return Err(RegistrationError::invalid_middleware(AUTHORIZER, "name must not be blank"));
        }
        tracing::debug!(authorizer = authorizer.name(), "registered authorizer");
        self.authorizers.push(authorizer);
        Ok(())
    }

    /// Appends an error interceptor.
    pub fn add_interceptor<I: ErrorInterceptor>(&mut self, interceptor: I) -> Result<(), RegistrationError> {
        self.add_shared_interceptor(Some(Arc::new(interceptor)))
    }

    /// Appends a shared error interceptor. `None` is rejected, as is a blank
    /// target.
    pub fn add_shared_interceptor(
        &mut self,
        interceptor: Option<Arc<dyn ErrorInterceptor>>,
    ) -> Result<(), RegistrationError> {
        let interceptor = interceptor
            .ok_or_else(|| RegistrationError::invalid_middleware(INTERCEPTOR, "interceptor is absent"))?;
        let target = interceptor.target();
        if target.is_blank() {
            return Err(RegistrationError::invalid_middleware(INTERCEPTOR, "target must not be blank"));
        }
        tracing::debug!(target = %target, "registered error interceptor");
        self.interceptors.push(interceptor);
        Ok(())
    }

    /// Returns the auth filters in registration order.
    #[must_use]
    pub fn auth_filters(&self) -> &[Arc<dyn AuthFilter>] {
        &self.auth_filters
    }

    /// Returns the authorizers in registration order.
    #[must_use]
    pub fn authorizers(&self) -> &[Arc<dyn Authorizer>] {
        &self.authorizers
    }

    /// Returns the error interceptors in registration order.
    #[must_use]
    pub fn interceptors(&self) -> &[Arc<dyn ErrorInterceptor>] {
        &self.interceptors
    }

    /// Returns `true` when at least one auth filter is registered.
    #[must_use]
    pub fn requires_authentication(&self) -> bool {
        !self.auth_filters.is_empty()
    }

    /// Returns one scheme per distinct security scheme name, in registration
    /// order.
    #[must_use]
    pub fn schemes(&self) -> Vec<AuthScheme> {
        let mut schemes: Vec<AuthScheme> = Vec::new();
        for filter in &self.auth_filters {
            let scheme = filter.scheme();
            if !schemes
                .iter()
                .any(|s| s.component_name() == scheme.component_name())
            {
                schemes.push(scheme);
            }
        }
        schemes
    }

    /// Runs the auth filters in order. The first principal wins.
    ///
    /// Returns `Ok(None)` when no filter is registered. Fails with
    /// [`HeronError::Unauthenticated`] when no filter accepts the request.
    pub async fn authenticate(&self, request: &Request) -> Result<Option<Principal>, HeronError> {
        if self.auth_filters.is_empty() {
            return Ok(None);
        }

        for filter in &self.auth_filters {
            let Some(credentials) = filter.extract_credentials(request) else {
                continue;
            };
            if let Some(principal) = filter.authenticate(credentials, request).await? {
                tracing::debug!(filter = filter.name(), principal = principal.name(), "authenticated");
                return Ok(Some(principal));
            }
        }

        let challenges = self.schemes().iter().map(AuthScheme::challenge).collect();
        Err(HeronError::unauthenticated("authentication required", challenges))
    }

    /// Checks that `principal` holds at least one of `roles`.
    ///
    /// No roles means no check. Roles without any registered authorizer is a
    /// server error.
    pub async fn authorize(
        &self,
        endpoint_id: &str,
        principal: Option<&Principal>,
        roles: &[String],
    ) -> Result<(), HeronError> {
        if roles.is_empty() {
            return Ok(());
        }
        if self.authorizers.is_empty() {
            return Err(HeronError::NoAuthorizer {
                endpoint: endpoint_id.to_string(),
            });
        }
        let Some(principal) = principal else {
            return Err(HeronError::forbidden("no authenticated principal"));
        };

        for role in roles {
            for authorizer in &self.authorizers {
                if authorizer.authorize(principal, role).await? {
                    tracing::debug!(authorizer = authorizer.name(), role = %role, "authorized");
                    return Ok(());
                }
            }
        }

        Err(HeronError::forbidden(format!(
            "principal '{}' holds none of the required roles",
            principal.name()
        )))
    }

    /// Returns the first interceptor whose target covers the endpoint.
    #[must_use]
    pub fn find_interceptor(&self, endpoint_id: &str, controller_id: &str) -> Option<&Arc<dyn ErrorInterceptor>> {
        self.interceptors
            .iter()
            .find(|i| i.target().matches(endpoint_id, controller_id))
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareRegistry")
            .field(
                "auth_filters",
                &self.auth_filters.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field(
                "authorizers",
                &self.authorizers.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}
