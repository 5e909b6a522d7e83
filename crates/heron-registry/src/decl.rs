//! Fluent declarations.
//!
//! A thin layer over the idempotent fetch-or-create calls and one-property
//! setters of [`Registry`]. The first failing call is remembered and
//! returned by [`ControllerDecl::finish`]; later calls are skipped.

use heron_core::{Controller, RegistrationError};
use heron_extract::ParameterExtractor;

use crate::descriptor::{ControllerDescriptor, EndpointDescriptor};
use crate::operation::ApiBody;
use crate::registry::Registry;

impl Registry {
    /// Starts a fluent declaration of controller `C` under `id`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use heron_core::{Args, Controller, MethodTable};
    /// use heron_extract::ParameterExtractor;
    /// use heron_registry::Registry;
    ///
    /// struct Items;
    ///
    /// impl Controller for Items {
    ///     fn methods() -> MethodTable {
    ///         MethodTable::builder::<Self>()
    ///             .method("get", 1, |_this: Arc<Self>, args: Args| async move {
    ///                 Ok(args.text(0).unwrap_or_default().to_string())
    ///             })
    ///             .build()
    ///     }
    /// }
    ///
    /// let mut registry = Registry::new();
    /// registry
    ///     .declare::<Items>("Items")
    ///     .root_path("/items")
    ///     .endpoint("get", |e| e.get("/:id").param(0, ParameterExtractor::path("id")))
    ///     .finish()
    ///     .unwrap();
    ///
    /// assert_eq!(registry.endpoint("Items::get").unwrap().full_path(), "/items/:id");
    /// ```
    pub fn declare<C: Controller>(&mut self, id: &str) -> ControllerDecl<'_> {
        let error = self.get_or_create_controller::<C>(id).err();
        ControllerDecl {
            registry: self,
            id: id.to_string(),
            error,
        }
    }
}

/// Fluent declaration of one controller.
#[must_use = "call `finish` to observe declaration errors"]
#[derive(Debug)]
pub struct ControllerDecl<'r> {
    registry: &'r mut Registry,
    id: String,
    error: Option<RegistrationError>,
}

impl<'r> ControllerDecl<'r> {
    fn apply(mut self, f: impl FnOnce(&mut ControllerDescriptor)) -> Self {
        if self.error.is_none() {
            if let Some(controller) = self.registry.controller_mut(&self.id) {
                f(controller);
            }
        }
        self
    }

    /// Sets the root path.
    pub fn root_path(self, root_path: &str) -> Self {
        self.apply(|c| c.set_root_path(root_path))
    }

    /// Sets the default response content type.
    pub fn produces(self, content_type: &str) -> Self {
        self.apply(|c| c.set_produces(content_type))
    }

    /// Sets the default request content type.
    pub fn consumes(self, content_type: &str) -> Self {
        self.apply(|c| c.set_consumes(content_type))
    }

    /// Skips authentication for every endpoint.
    pub fn no_auth(self) -> Self {
        self.apply(|c| c.set_no_auth(true))
    }

    /// Sets the default allowed roles.
    pub fn roles(self, roles: &[&str]) -> Self {
        self.apply(|c| c.set_roles(roles.iter().copied()))
    }

    /// Binds an error interceptor by identifier.
    pub fn error_interceptor(self, id: &str) -> Self {
        self.apply(|c| c.set_error_interceptor(id))
    }

    /// Sets the API name used as the tag.
    pub fn api_name(self, name: &str) -> Self {
        self.apply(|c| c.set_api_name(name))
    }

    /// Sets the API description.
    pub fn api_description(self, description: &str) -> Self {
        self.apply(|c| c.set_api_description(description))
    }

    /// Adds a response documented for every endpoint.
    pub fn default_response(self, status: &str, body: ApiBody) -> Self {
        self.apply(|c| {
            c.operation_defaults_mut()
                .responses
                .insert(status.to_string(), body);
        })
    }

    /// Leaves the controller out of API documents.
    pub fn ignored(self) -> Self {
        self.apply(|c| c.set_ignored(true))
    }

    /// Declares the endpoint for `method_name` and configures it.
    pub fn endpoint<F>(mut self, method_name: &str, configure: F) -> Self
    where
        F: FnOnce(EndpointDecl<'_>) -> EndpointDecl<'_>,
    {
        if self.error.is_some() {
            return self;
        }
        match self.registry.get_or_create_endpoint(&self.id, method_name) {
            Ok(endpoint) => {
                let decl = configure(EndpointDecl {
                    endpoint,
                    error: None,
                });
                self.error = decl.error;
            }
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Ends the declaration, returning the first error encountered.
    pub fn finish(self) -> Result<(), RegistrationError> {
        self.error.map_or(Ok(()), Err)
    }
}

/// Fluent declaration of one endpoint.
#[derive(Debug)]
pub struct EndpointDecl<'a> {
    endpoint: &'a mut EndpointDescriptor,
    error: Option<RegistrationError>,
}

impl<'a> EndpointDecl<'a> {
    fn route(mut self, method: &str, path: &str) -> Self {
        self.endpoint.set_http_method(method);
        self.endpoint.set_path(path);
        self
    }

    /// Binds `GET path`.
    pub fn get(self, path: &str) -> Self {
        self.route("GET", path)
    }

    /// Binds `POST path`.
    pub fn post(self, path: &str) -> Self {
        self.route("POST", path)
    }

    /// Binds `PUT path`.
    pub fn put(self, path: &str) -> Self {
        self.route("PUT", path)
    }

    /// Binds `PATCH path`.
    pub fn patch(self, path: &str) -> Self {
        self.route("PATCH", path)
    }

    /// Binds `DELETE path`.
    pub fn delete(self, path: &str) -> Self {
        self.route("DELETE", path)
    }

    /// Sets an arbitrary method token. Unsupported tokens fail at bind time.
    pub fn method(mut self, method: &str) -> Self {
        self.endpoint.set_http_method(method);
        self
    }

    /// Sets the path segment.
    pub fn path(mut self, path: &str) -> Self {
        self.endpoint.set_path(path);
        self
    }

    /// Sets the response content type.
    pub fn produces(mut self, content_type: &str) -> Self {
        self.endpoint.set_produces(content_type);
        self
    }

    /// Sets the request content type.
    pub fn consumes(mut self, content_type: &str) -> Self {
        self.endpoint.set_consumes(content_type);
        self
    }

    /// Skips authentication.
    pub fn no_auth(mut self) -> Self {
        self.endpoint.set_no_auth(true);
        self
    }

    /// Sets the allowed roles, overriding the controller's.
    pub fn roles(mut self, roles: &[&str]) -> Self {
        self.endpoint.set_roles(roles.iter().copied());
        self
    }

    /// Binds an error interceptor by identifier.
    pub fn error_interceptor(mut self, id: &str) -> Self {
        self.endpoint.set_error_interceptor(id);
        self
    }

    /// Sets the operation name.
    pub fn name(mut self, name: &str) -> Self {
        self.endpoint.set_operation_name(name);
        self
    }

    /// Sets the operation description.
    pub fn description(mut self, description: &str) -> Self {
        self.endpoint.set_description(description);
        self
    }

    /// Documents the request body.
    pub fn request_body(mut self, body: ApiBody) -> Self {
        self.endpoint.set_request_body(body);
        self
    }

    /// Documents a response.
    pub fn response(mut self, status: &str, body: ApiBody) -> Self {
        self.endpoint.add_response(status, body);
        self
    }

    /// Leaves the endpoint out of API documents.
    pub fn ignored(mut self) -> Self {
        self.endpoint.set_ignored(true);
        self
    }

    /// Binds an extractor to parameter slot `index`.
    pub fn param(mut self, index: usize, extractor: ParameterExtractor) -> Self {
        if self.error.is_none() {
            self.error = self.endpoint.set_extractor(index, extractor).err();
        }
        self
    }
}
