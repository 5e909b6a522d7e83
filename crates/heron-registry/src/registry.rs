//! The metadata registry.

use std::sync::Arc;

use heron_core::{Controller, RegistrationError};
use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::descriptor::{ControllerDescriptor, EndpointDescriptor, EndpointRef};

/// Store of controller and endpoint descriptors keyed by identity.
///
/// Declarations populate the registry at load time through idempotent
/// fetch-or-create calls. [`Registry::freeze`] then hands out a shared,
/// read-only snapshot. Nothing is ever removed.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use heron_core::{Args, Controller, MethodTable};
/// use heron_registry::Registry;
///
/// struct Health;
///
/// impl Controller for Health {
///     fn methods() -> MethodTable {
///         MethodTable::builder::<Self>()
///             .method("check", 0, |_this: Arc<Self>, _args: Args| async move { Ok("ok") })
///             .build()
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry.get_or_create_controller::<Health>("Health").unwrap().set_root_path("/health");
/// registry.get_or_create_endpoint("Health", "check").unwrap().set_http_method("GET");
///
/// let registry = registry.freeze();
/// let endpoint = registry.endpoint("Health::check").unwrap();
/// assert_eq!(endpoint.full_path(), "/health");
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    controllers: IndexMap<String, ControllerDescriptor>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the controller registered under `id`, creating it for `C` if
    /// absent.
    ///
    /// When `id` is already taken the existing descriptor is returned, even
    /// if it was created for another type. The clash surfaces as a method
    /// lookup failure when endpoints are declared.
    pub fn get_or_create_controller<C: Controller>(
        &mut self,
        id: &str,
    ) -> Result<&mut ControllerDescriptor, RegistrationError> {
        if id.trim().is_empty() {
            return Err(RegistrationError::invalid_declaration(
                std::any::type_name::<C>(),
                "controller identity must not be blank",
            ));
        }
        Ok(self.controllers.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!(controller = %id, type_name = std::any::type_name::<C>(), "declared controller");
            ControllerDescriptor::new(id.to_string(), C::methods())
        }))
    }

    /// Returns the endpoint for `method_name` on controller `controller_id`,
    /// creating it if absent.
    ///
    /// The extractor slots are sized from the method's declared arity.
    pub fn get_or_create_endpoint(
        &mut self,
        controller_id: &str,
        method_name: &str,
    ) -> Result<&mut EndpointDescriptor, RegistrationError> {
        let controller = self.controllers.get_mut(controller_id).ok_or_else(|| {
            RegistrationError::invalid_declaration(
                format!("{controller_id}::{method_name}"),
                format!("controller '{controller_id}' has not been declared"),
            )
        })?;

        let type_name = controller.type_key().name();
        let method = controller.methods().get(method_name).cloned();

        match controller.endpoints.entry(method_name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let method = method.ok_or_else(|| RegistrationError::MethodLookup {
                    controller: controller_id.to_string(),
                    method: method_name.to_string(),
                    type_name,
                })?;
                tracing::debug!(
                    controller = %controller_id,
                    method = %method_name,
                    arity = method.arity(),
                    "declared endpoint"
                );
                Ok(entry.insert(EndpointDescriptor::new(controller_id, method)))
            }
        }
    }

    /// Returns a controller by identity.
    #[must_use]
    pub fn controller(&self, id: &str) -> Option<&ControllerDescriptor> {
        self.controllers.get(id)
    }

    pub(crate) fn controller_mut(&mut self, id: &str) -> Option<&mut ControllerDescriptor> {
        self.controllers.get_mut(id)
    }

    /// Returns the controllers in declaration order.
    pub fn controllers(&self) -> impl Iterator<Item = &ControllerDescriptor> {
        self.controllers.values()
    }

    /// Returns an endpoint by its `controller::method` identity.
    #[must_use]
    pub fn endpoint(&self, id: &str) -> Option<EndpointRef<'_>> {
        let (controller_id, method_name) = id.rsplit_once("::")?;
        let controller = self.controllers.get(controller_id)?;
        controller.endpoint(method_name).map(|endpoint| EndpointRef { controller, endpoint })
    }

    /// Returns every endpoint with its controller, in declaration order.
    pub fn endpoints(&self) -> impl Iterator<Item = EndpointRef<'_>> {
        self.controllers.values().flat_map(|controller| {
            controller
                .endpoints()
                .map(move |endpoint| EndpointRef { controller, endpoint })
        })
    }

    /// Returns the number of controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Returns `true` if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Freezes the registry into a shared, read-only snapshot.
    #[must_use]
    pub fn freeze(self) -> Arc<Self> {
        tracing::debug!(
            controllers = self.controllers.len(),
            endpoints = self.endpoints().count(),
            "registry frozen"
        );
        Arc::new(self)
    }
}
