//! Controller and endpoint descriptors.
//!
//! Descriptors are plain metadata. They are created through the
//! [`Registry`](crate::Registry), mutated only by declaration calls and read
//! by the route binder and the API document generator once frozen.

use heron_core::{MethodRef, MethodTable, RegistrationError, TypeKey};
use heron_extract::ParameterExtractor;
use heron_router::path;
use indexmap::IndexMap;

use crate::operation::{ApiBody, ApiInfo, ApiOperation};

/// Metadata of one controller.
#[derive(Debug, Clone)]
pub struct ControllerDescriptor {
    id: String,
    type_key: TypeKey,
    methods: MethodTable,
    root_path: String,
    produces: Option<String>,
    consumes: Option<String>,
    no_auth: bool,
    roles: Vec<String>,
    error_interceptor: Option<String>,
    api: ApiInfo,
    defaults: ApiOperation,
    ignored: bool,
    pub(crate) endpoints: IndexMap<String, EndpointDescriptor>,
}

impl ControllerDescriptor {
    pub(crate) fn new(id: String, methods: MethodTable) -> Self {
        Self {
            id,
            type_key: methods.owner(),
            methods,
            root_path: String::new(),
            produces: None,
            consumes: None,
            no_auth: false,
            roles: Vec::new(),
            error_interceptor: None,
            api: ApiInfo::default(),
            defaults: ApiOperation::default(),
            ignored: false,
            endpoints: IndexMap::new(),
        }
    }

    /// Returns the controller identity.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the owning Rust type.
    #[must_use]
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Returns the method table of the owning type.
    #[must_use]
    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// Returns the root path, empty by default.
    #[must_use]
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Returns the default response content type.
    #[must_use]
    pub fn produces(&self) -> Option<&str> {
        self.produces.as_deref()
    }

    /// Returns the default request content type.
    #[must_use]
    pub fn consumes(&self) -> Option<&str> {
        self.consumes.as_deref()
    }

    /// Returns the default no-auth flag.
    #[must_use]
    pub fn no_auth(&self) -> bool {
        self.no_auth
    }

    /// Returns the default allowed roles.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Returns the default error-interceptor binding.
    #[must_use]
    pub fn error_interceptor(&self) -> Option<&str> {
        self.error_interceptor.as_deref()
    }

    /// Returns the API metadata.
    #[must_use]
    pub fn api(&self) -> &ApiInfo {
        &self.api
    }

    /// Returns the operation defaults.
    #[must_use]
    pub fn operation_defaults(&self) -> &ApiOperation {
        &self.defaults
    }

    /// Returns `true` if the controller is left out of API documents.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Returns the endpoints in declaration order.
    pub fn endpoints(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.values()
    }

    /// Returns an endpoint by method name.
    #[must_use]
    pub fn endpoint(&self, method_name: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.get(method_name)
    }

    /// Sets the root path.
    pub fn set_root_path(&mut self, root_path: impl Into<String>) {
        self.root_path = root_path.into();
    }

    /// Sets the default response content type.
    pub fn set_produces(&mut self, content_type: impl Into<String>) {
        self.produces = Some(content_type.into());
    }

    /// Sets the default request content type.
    pub fn set_consumes(&mut self, content_type: impl Into<String>) {
        self.consumes = Some(content_type.into());
    }

    /// Sets the default no-auth flag.
    pub fn set_no_auth(&mut self, no_auth: bool) {
        self.no_auth = no_auth;
    }

    /// Replaces the default allowed roles.
    pub fn set_roles<I, S>(&mut self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
    }

    /// Binds an error interceptor by identifier.
    pub fn set_error_interceptor(&mut self, id: impl Into<String>) {
        self.error_interceptor = Some(id.into());
    }

    /// Sets the API name, used as the operation tag.
    pub fn set_api_name(&mut self, name: impl Into<String>) {
        self.api.name = Some(name.into());
    }

    /// Sets the API description.
    pub fn set_api_description(&mut self, description: impl Into<String>) {
        self.api.description = Some(description.into());
    }

    /// Returns mutable operation defaults.
    pub fn operation_defaults_mut(&mut self) -> &mut ApiOperation {
        &mut self.defaults
    }

    /// Sets the ignored flag.
    pub fn set_ignored(&mut self, ignored: bool) {
        self.ignored = ignored;
    }
}

/// Metadata of one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    id: String,
    controller_id: String,
    method_name: String,
    http_method: Option<String>,
    path: String,
    produces: Option<String>,
    consumes: Option<String>,
    no_auth: bool,
    roles: Vec<String>,
    error_interceptor: Option<String>,
    operation: ApiOperation,
    ignored: bool,
    extractors: Vec<Option<ParameterExtractor>>,
    method: MethodRef,
}

impl EndpointDescriptor {
    pub(crate) fn new(controller_id: &str, method: MethodRef) -> Self {
        Self {
            id: format!("{controller_id}::{}", method.name()),
            controller_id: controller_id.to_string(),
            method_name: method.name().to_string(),
            http_method: None,
            path: String::new(),
            produces: None,
            consumes: None,
            no_auth: false,
            roles: Vec::new(),
            error_interceptor: None,
            operation: ApiOperation::default(),
            ignored: false,
            extractors: vec![None; method.arity()],
            method,
        }
    }

    /// Returns the identity, `controller::method`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the owning controller identity.
    #[must_use]
    pub fn controller_id(&self) -> &str {
        &self.controller_id
    }

    /// Returns the method name.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Returns the HTTP method token as declared.
    #[must_use]
    pub fn http_method(&self) -> Option<&str> {
        self.http_method.as_deref()
    }

    /// Returns the path segment.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the response content type.
    #[must_use]
    pub fn produces(&self) -> Option<&str> {
        self.produces.as_deref()
    }

    /// Returns the request content type.
    #[must_use]
    pub fn consumes(&self) -> Option<&str> {
        self.consumes.as_deref()
    }

    /// Returns the no-auth flag.
    #[must_use]
    pub fn no_auth(&self) -> bool {
        self.no_auth
    }

    /// Returns the allowed roles.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Returns the error-interceptor binding.
    #[must_use]
    pub fn error_interceptor(&self) -> Option<&str> {
        self.error_interceptor.as_deref()
    }

    /// Returns the operation metadata.
    #[must_use]
    pub fn operation(&self) -> &ApiOperation {
        &self.operation
    }

    /// Returns `true` if the endpoint is left out of API documents.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Returns the extractor slots. The length equals the method arity.
    #[must_use]
    pub fn extractors(&self) -> &[Option<ParameterExtractor>] {
        &self.extractors
    }

    /// Returns the bound method.
    #[must_use]
    pub fn method(&self) -> &MethodRef {
        &self.method
    }

    /// Sets the HTTP method token. Checked when routes are bound.
    pub fn set_http_method(&mut self, method: impl Into<String>) {
        self.http_method = Some(method.into());
    }

    /// Sets the path segment.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Sets the response content type.
    pub fn set_produces(&mut self, content_type: impl Into<String>) {
        self.produces = Some(content_type.into());
    }

    /// Sets the request content type.
    pub fn set_consumes(&mut self, content_type: impl Into<String>) {
        self.consumes = Some(content_type.into());
    }

    /// Sets the no-auth flag.
    pub fn set_no_auth(&mut self, no_auth: bool) {
        self.no_auth = no_auth;
    }

    /// Replaces the allowed roles.
    pub fn set_roles<I, S>(&mut self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
    }

    /// Binds an error interceptor by identifier.
    pub fn set_error_interceptor(&mut self, id: impl Into<String>) {
        self.error_interceptor = Some(id.into());
    }

    /// Sets the operation name.
    pub fn set_operation_name(&mut self, name: impl Into<String>) {
        self.operation.name = Some(name.into());
    }

    /// Sets the operation description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.operation.description = Some(description.into());
    }

    /// Sets the documented request body.
    pub fn set_request_body(&mut self, body: ApiBody) {
        self.operation.request = Some(body);
    }

    /// Adds a documented response, replacing any with the same status.
    pub fn add_response(&mut self, status: impl Into<String>, body: ApiBody) {
        self.operation.responses.insert(status.into(), body);
    }

    /// Sets the ignored flag.
    pub fn set_ignored(&mut self, ignored: bool) {
        self.ignored = ignored;
    }

    /// Binds an extractor to parameter slot `index`, replacing any earlier one.
    pub fn set_extractor(
        &mut self,
        index: usize,
        extractor: ParameterExtractor,
    ) -> Result<(), RegistrationError> {
        extractor.validate()?;
        let arity = self.extractors.len();
        let slot = self.extractors.get_mut(index).ok_or_else(|| {
            RegistrationError::invalid_declaration(
                self.id.clone(),
                format!("parameter index {index} is out of range for arity {arity}"),
            )
        })?;
        *slot = Some(extractor);
        Ok(())
    }
}

/// An endpoint together with its controller.
///
/// Resolves the values that fall back from endpoint to controller.
#[derive(Debug, Clone, Copy)]
pub struct EndpointRef<'a> {
    /// The owning controller.
    pub controller: &'a ControllerDescriptor,
    /// The endpoint.
    pub endpoint: &'a EndpointDescriptor,
}

impl<'a> EndpointRef<'a> {
    /// Returns the endpoint identity.
    #[must_use]
    pub fn id(&self) -> &'a str {
        self.endpoint.id()
    }

    /// Returns the root path joined with the endpoint path, untrimmed.
    #[must_use]
    pub fn full_path(&self) -> String {
        path::join(self.controller.root_path(), self.endpoint.path())
    }

    /// Returns the endpoint's `produces`, else the controller's.
    #[must_use]
    pub fn produces(&self) -> Option<&'a str> {
        self.endpoint.produces().or_else(|| self.controller.produces())
    }

    /// Returns the endpoint's `consumes`, else the controller's.
    #[must_use]
    pub fn consumes(&self) -> Option<&'a str> {
        self.endpoint.consumes().or_else(|| self.controller.consumes())
    }

    /// Returns the allowed roles. Endpoint roles override controller roles.
    #[must_use]
    pub fn roles(&self) -> &'a [String] {
        if self.endpoint.roles().is_empty() {
            self.controller.roles()
        } else {
            self.endpoint.roles()
        }
    }

    /// Returns `true` when either level opts out of authentication.
    #[must_use]
    pub fn skips_auth(&self) -> bool {
        self.endpoint.no_auth() || self.controller.no_auth()
    }

    /// Returns `true` when either level is left out of API documents.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.endpoint.is_ignored() || self.controller.is_ignored()
    }

    /// Returns the merged operation metadata.
    #[must_use]
    pub fn operation(&self) -> ApiOperation {
        ApiOperation::merged(self.controller.operation_defaults(), self.endpoint.operation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{Args, Controller};
    use std::sync::Arc;

    struct Items;

    impl Controller for Items {
        fn methods() -> MethodTable {
            MethodTable::builder::<Self>()
                .method("get", 2, |_this: Arc<Self>, _args: Args| async move { Ok(()) })
                .build()
        }
    }

    fn descriptors() -> (ControllerDescriptor, EndpointDescriptor) {
        let table = Items::methods();
        let method = table.get("get").unwrap().clone();
        (
            ControllerDescriptor::new("Items".to_string(), table),
            EndpointDescriptor::new("Items", method),
        )
    }

    #[test]
    fn test_endpoint_identity_and_slots() {
        let (_, endpoint) = descriptors();
        assert_eq!(endpoint.id(), "Items::get");
        assert_eq!(endpoint.extractors().len(), 2);
        assert!(endpoint.extractors().iter().all(Option::is_none));
    }

    #[test]
    fn test_set_extractor_bounds() {
        let (_, mut endpoint) = descriptors();
        endpoint.set_extractor(1, ParameterExtractor::path("id")).unwrap();
        assert!(endpoint.extractors()[1].is_some());

        let err = endpoint
            .set_extractor(2, ParameterExtractor::path("id"))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidDeclaration { .. }));
        assert_eq!(endpoint.extractors().len(), 2);
    }

    #[test]
    fn test_effective_values() {
        let (mut controller, mut endpoint) = descriptors();
        controller.set_root_path("/items/");
        controller.set_produces("text/plain");
        controller.set_roles(["admin"]);
        endpoint.set_path("/:id/");

        let view = EndpointRef {
            controller: &controller,
            endpoint: &endpoint,
        };
        assert_eq!(view.full_path(), "/items/:id/");
        assert_eq!(view.produces(), Some("text/plain"));
        assert_eq!(view.roles(), ["admin".to_string()]);

        endpoint.set_produces("application/json");
        endpoint.set_roles(["reader"]);
        let view = EndpointRef {
            controller: &controller,
            endpoint: &endpoint,
        };
        assert_eq!(view.produces(), Some("application/json"));
        assert_eq!(view.roles(), ["reader".to_string()]);
    }

    #[test]
    fn test_no_auth_and_ignored_fall_back() {
        let (mut controller, endpoint) = descriptors();
        controller.set_no_auth(true);
        controller.set_ignored(true);
        let view = EndpointRef {
            controller: &controller,
            endpoint: &endpoint,
        };
        assert!(view.skips_auth());
        assert!(view.is_ignored());
    }
}
