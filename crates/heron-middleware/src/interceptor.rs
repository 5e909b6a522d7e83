//! Error interceptors.
//!
//! When parameter extraction or the endpoint method fails, exactly one
//! interceptor gets a chance to turn the error into a response. Interceptors
//! are never chained: if the chosen one produces nothing, the original error
//! goes back to the engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use heron_core::{
    Args, BoxFuture, HeronError, Instance, MethodRef, RegistrationError, Reply, Request, Response,
};

/// Which errors an interceptor handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptorTarget {
    /// Every endpoint.
    Any,
    /// Every endpoint of the controller with this identity.
    Controller(String),
    /// An identity containing `::`. Matches the endpoint with this
    /// `controller::method` identity, or a controller whose own identity is
    /// namespaced the same way.
    Endpoint(String),
}

impl InterceptorTarget {
    /// Parses a target string. `*` is the wildcard and identities containing
    /// `::` name an endpoint or a namespaced controller.
    #[must_use]
    pub fn parse(target: &str) -> Self {
        match target.trim() {
            "*" => Self::Any,
            t if t.contains("::") => Self::Endpoint(t.to_string()),
            t => Self::Controller(t.to_string()),
        }
    }

    /// Returns `true` if the target covers the given endpoint.
    #[must_use]
    pub fn matches(&self, endpoint_id: &str, controller_id: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Controller(id) => id == controller_id,
            Self::Endpoint(id) => id == endpoint_id || id == controller_id,
        }
    }

    pub(crate) fn is_blank(&self) -> bool {
        match self {
            Self::Any => false,
            Self::Controller(id) | Self::Endpoint(id) => id.trim().is_empty(),
        }
    }
}

impl fmt::Display for InterceptorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Controller(id) | Self::Endpoint(id) => f.write_str(id),
        }
    }
}

/// Everything an interceptor may inspect.
#[derive(Debug, Clone, Copy)]
pub struct InterceptContext<'a> {
    /// The error being intercepted.
    pub error: &'a HeronError,
    /// Endpoint identity.
    pub endpoint_id: &'a str,
    /// Controller identity.
    pub controller_id: &'a str,
    /// The endpoint method.
    pub method: &'a MethodRef,
    /// The controller instance.
    pub instance: &'a Instance,
    /// Arguments extracted so far. Slots after a failed extraction are absent.
    pub args: &'a Args,
    /// The request.
    pub request: &'a Arc<Request>,
    /// The response. An interceptor may send it directly.
    pub response: &'a Response,
}

/// Turns an error into a response.
pub trait ErrorInterceptor: Send + Sync + 'static {
    /// Returns the target predicate.
    fn target(&self) -> InterceptorTarget {
        InterceptorTarget::Any
    }

    /// Handles the error.
    ///
    /// A non-empty reply, or a sent response, replaces the error. An `Err`
    /// replaces the original error.
    fn intercept<'a>(&'a self, ctx: InterceptContext<'a>) -> BoxFuture<'a, Result<Reply, HeronError>>;
}

type InterceptFn =
    Arc<dyn for<'c> Fn(&InterceptContext<'c>) -> Result<Reply, HeronError> + Send + Sync>;

/// An interceptor backed by a synchronous closure.
///
/// # Example
///
/// ```rust
/// use heron_core::{HeronError, Reply};
/// use heron_middleware::{FnInterceptor, InterceptorTarget};
/// use serde_json::json;
///
/// let interceptor = FnInterceptor::new(InterceptorTarget::parse("Orders"), |ctx| {
///     Ok(Reply::Json(json!({ "failed": ctx.error.to_string() })))
/// });
/// ```
#[derive(Clone)]
pub struct FnInterceptor {
    target: InterceptorTarget,
    intercept: InterceptFn,
}

impl FnInterceptor {
    /// Creates an interceptor for `target`.
    #[must_use]
    pub fn new<F>(target: InterceptorTarget, intercept: F) -> Self
    where
        F: for<'c> Fn(&InterceptContext<'c>) -> Result<Reply, HeronError> + Send + Sync + 'static,
    {
        Self {
            target,
            intercept: Arc::new(intercept),
        }
    }
}

impl ErrorInterceptor for FnInterceptor {
    fn target(&self) -> InterceptorTarget {
        self.target.clone()
    }

    fn intercept<'a>(&'a self, ctx: InterceptContext<'a>) -> BoxFuture<'a, Result<Reply, HeronError>> {
        Box::pin(std::future::ready((self.intercept)(&ctx)))
    }
}

impl fmt::Debug for FnInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Resolves interceptors bound by identifier on controllers and endpoints.
pub trait InterceptorFactory: Send + Sync + 'static {
    /// Returns the interceptor registered under `id`.
    fn resolve_interceptor(&self, id: &str) -> Option<Arc<dyn ErrorInterceptor>>;
}

/// Default [`InterceptorFactory`]: a map from identifier to interceptor.
#[derive(Clone, Default)]
pub struct InterceptorCatalog {
    entries: HashMap<String, Arc<dyn ErrorInterceptor>>,
}

impl InterceptorCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an interceptor under `id`, replacing any earlier one.
    pub fn register<I: ErrorInterceptor>(&mut self, id: &str, interceptor: I) -> Result<(), RegistrationError> {
        if id.trim().is_empty() {
            return Err(RegistrationError::invalid_middleware(
                "error interceptor",
                "catalog identifier must not be blank",
            ));
        }
        self.entries.insert(id.to_string(), Arc::new(interceptor));
        Ok(())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl InterceptorFactory for InterceptorCatalog {
    fn resolve_interceptor(&self, id: &str) -> Option<Arc<dyn ErrorInterceptor>> {
        self.entries.get(id).cloned()
    }
}

impl fmt::Debug for InterceptorCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.entries.keys().collect();
        ids.sort();
        f.debug_struct("InterceptorCatalog").field("ids", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{Controller, MethodTable};
    use serde_json::json;

    struct Orders;

    impl Controller for Orders {
        fn methods() -> MethodTable {
            MethodTable::builder::<Self>()
                .method("get", 0, |_this: Arc<Self>, _args: Args| async move { Ok(()) })
                .build()
        }
    }

    #[test]
    fn test_target_parse_and_match() {
        assert_eq!(InterceptorTarget::parse("*"), InterceptorTarget::Any);
        assert_eq!(
            InterceptorTarget::parse("Orders"),
            InterceptorTarget::Controller("Orders".to_string())
        );
        assert_eq!(
            InterceptorTarget::parse("Orders::get"),
            InterceptorTarget::Endpoint("Orders::get".to_string())
        );

        let controller = InterceptorTarget::parse("Orders");
        assert!(controller.matches("Orders::get", "Orders"));
        assert!(!controller.matches("Users::get", "Users"));

        let endpoint = InterceptorTarget::parse("Orders::get");
        assert!(endpoint.matches("Orders::get", "Orders"));
        assert!(!endpoint.matches("Orders::list", "Orders"));

        assert!(InterceptorTarget::Any.matches("a::b", "a"));
        assert!(InterceptorTarget::parse("  ").is_blank());
    }

    #[test]
    fn test_namespaced_controller_target() {
        let target = InterceptorTarget::parse("billing::Orders");
        assert!(target.matches("billing::Orders::fail", "billing::Orders"));
        assert!(target.matches("billing::Orders", "billing"));
        assert!(!target.matches("billing::Invoices::fail", "billing::Invoices"));
    }

    #[tokio::test]
    async fn test_fn_interceptor_sees_error() {
        let interceptor = FnInterceptor::new(InterceptorTarget::Any, |ctx| {
            Ok(Reply::Json(json!({ "status": ctx.error.status_code().as_u16() })))
        });

        let table = Orders::methods();
        let method = table.get("get").unwrap();
        let instance: Instance = Arc::new(Orders);
        let request = Arc::new(Request::builder().build());
        let response = Response::new();
        let args = Args::default();
        let error = HeronError::forbidden("nope");

        let reply = interceptor
            .intercept(InterceptContext {
                error: &error,
                endpoint_id: "Orders::get",
                controller_id: "Orders",
                method,
                instance: &instance,
                args: &args,
                request: &request,
                response: &response,
            })
            .await
            .unwrap();
        assert_eq!(reply, Reply::Json(json!({ "status": 403 })));
    }

    #[test]
    fn test_catalog() {
        let mut catalog = InterceptorCatalog::new();
        catalog
            .register("json", FnInterceptor::new(InterceptorTarget::Any, |_| Ok(Reply::Empty)))
            .unwrap();
        assert!(catalog
            .register(" ", FnInterceptor::new(InterceptorTarget::Any, |_| Ok(Reply::Empty)))
            .is_err());
        assert_eq!(catalog.len(), 1);
        assert!(catalog.resolve_interceptor("json").is_some());
        assert!(catalog.resolve_interceptor("xml").is_none());
    }
}
