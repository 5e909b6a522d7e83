//! What an extractor can see while producing an argument.

use std::sync::Arc;

use heron_core::{Principal, Request, Response};

/// The ambient objects of one dispatch.
///
/// Built once per request by the pipeline and handed to every extractor in
/// slot order.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use heron_core::{Request, Response};
/// use heron_extract::ExtractionContext;
///
/// let request = Arc::new(Request::builder().path("/items/42").path_param("id", "42").build());
/// let response = Response::new();
///
/// let ctx = ExtractionContext::new(&request, &response, None);
/// assert_eq!(ctx.request().path_param("id"), Some("42"));
/// assert!(ctx.principal().is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    request: &'a Arc<Request>,
    response: &'a Response,
    principal: Option<&'a Arc<Principal>>,
}

impl<'a> ExtractionContext<'a> {
    /// Creates a new extraction context.
    #[must_use]
    pub fn new(
        request: &'a Arc<Request>,
        response: &'a Response,
        principal: Option<&'a Arc<Principal>>,
    ) -> Self {
        Self {
            request,
            response,
            principal,
        }
    }

    /// Returns the request.
    #[must_use]
    pub fn request(&self) -> &'a Arc<Request> {
        self.request
    }

    /// Returns the response.
    #[must_use]
    pub fn response(&self) -> &'a Response {
        self.response
    }

    /// Returns the authenticated principal, if authentication ran.
    #[must_use]
    pub fn principal(&self) -> Option<&'a Arc<Principal>> {
        self.principal
    }
}
