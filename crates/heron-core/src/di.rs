//! Controller instance resolution.
//!
//! The dispatch pipeline never constructs controllers itself. It asks a
//! [`ControllerFactory`] for an instance of the endpoint's owning type. The
//! default factory is [`Container`], which holds shared singletons and
//! per-resolution constructors keyed by type.
//!
//! # Example
//!
//! ```rust
//! use heron_core::di::{Container, ControllerFactory};
//! use heron_core::TypeKey;
//! use std::sync::Arc;
//!
//! struct OrdersController {
//!     table: String,
//! }
//!
//! let mut container = Container::new();
//! container.register(Arc::new(OrdersController { table: "orders".to_string() }));
//!
//! let instance = container.resolve_instance(TypeKey::of::<OrdersController>()).unwrap();
//! assert!(instance.downcast::<OrdersController>().is_ok());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::controller::{Instance, TypeKey};
use crate::error::HeronError;

/// Supplies controller instances by type.
pub trait ControllerFactory: Send + Sync + 'static {
    /// Returns an instance of the type identified by `key`.
    fn resolve_instance(&self, key: TypeKey) -> Result<Instance, HeronError>;
}

impl<F> ControllerFactory for F
where
    F: Fn(TypeKey) -> Result<Instance, HeronError> + Send + Sync + 'static,
{
    fn resolve_instance(&self, key: TypeKey) -> Result<Instance, HeronError> {
        self(key)
    }
}

type Constructor = Arc<dyn Fn() -> Instance + Send + Sync>;

enum Provider {
    Singleton(Instance),
    Constructor(Constructor),
}

/// A type-keyed dependency container.
///
/// Singletons registered with [`Container::register`] are shared across
/// requests. Constructors registered with [`Container::register_with`] build a
/// fresh instance on every resolution.
#[derive(Default)]
pub struct Container {
    providers: HashMap<TypeId, Provider>,
}

impl Container {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registers a shared instance.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.providers
            .insert(TypeId::of::<T>(), Provider::Singleton(service));
    }

    /// Registers a constructor invoked on every resolution.
    pub fn register_with<T, F>(&mut self, constructor: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let constructor: Constructor = Arc::new(move || Arc::new(constructor()) as Instance);
        self.providers
            .insert(TypeId::of::<T>(), Provider::Constructor(constructor));
    }

    /// Resolves a typed service.
    ///
    /// Returns `None` if the type is not registered.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.provide(TypeId::of::<T>())
            .and_then(|instance| instance.downcast::<T>().ok())
    }

    /// Checks if a type is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.providers.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn provide(&self, id: TypeId) -> Option<Instance> {
        self.providers.get(&id).map(|provider| match provider {
            Provider::Singleton(instance) => Arc::clone(instance),
            Provider::Constructor(constructor) => constructor(),
        })
    }
}

impl ControllerFactory for Container {
    fn resolve_instance(&self, key: TypeKey) -> Result<Instance, HeronError> {
        self.provide(key.id()).ok_or_else(|| {
            HeronError::internal(format!(
                "no controller instance registered for {}",
                key.name()
            ))
        })
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("provider_count", &self.providers.len())
            .finish()
    }
}
