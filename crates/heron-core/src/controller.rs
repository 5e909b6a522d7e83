//! Controllers and their method tables.
//!
//! Rust has no runtime method lookup, so each controller type publishes a
//! [`MethodTable`]: a map from method name to declared arity and a type-erased
//! invoker. Endpoints bind to entries of that table and the pipeline calls
//! them through the uniform [`MethodRef::invoke`] contract.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use heron_core::{Args, Controller, HeronError, MethodTable, Reply};
//!
//! struct Greeter;
//!
//! impl Greeter {
//!     async fn hello(&self, name: Option<String>) -> Result<Reply, HeronError> {
//!         Ok(Reply::text(format!("hello {}", name.as_deref().unwrap_or("world"))))
//!     }
//! }
//!
//! impl Controller for Greeter {
//!     fn methods() -> MethodTable {
//!         MethodTable::builder::<Self>()
//!             .method("hello", 1, |this: Arc<Self>, args: Args| async move {
//!                 this.hello(args.text(0).map(str::to_string)).await
//!             })
//!             .build()
//!     }
//! }
//!
//! let table = Greeter::methods();
//! assert_eq!(table.get("hello").map(|m| m.arity()), Some(1));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::HeronError;
use crate::principal::Principal;
use crate::request::Request;
use crate::response::Response;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased controller instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A type-erased method invoker.
pub type ErasedInvoker =
    Arc<dyn Fn(Instance, Args) -> BoxFuture<'static, Result<Reply, HeronError>> + Send + Sync>;

/// A type implementing endpoints.
pub trait Controller: Send + Sync + 'static {
    /// Returns the table of invocable methods.
    fn methods() -> MethodTable
    where
        Self: Sized;
}

/// Stable identity of a Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key of `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the `TypeId`.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// What an endpoint method produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing was returned.
    Empty,
    /// A JSON value.
    Json(serde_json::Value),
    /// Plain text.
    Text(String),
    /// Raw bytes.
    Binary(Bytes),
}

impl Reply {
    /// Creates a text reply.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Serializes a value into a JSON reply.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, HeronError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| HeronError::internal_with_source("failed to serialize reply", e))
    }

    /// Returns `true` when nothing usable was returned.
    ///
    /// `Empty` and JSON `null` count as empty; an empty string does not.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty | Self::Json(serde_json::Value::Null))
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

impl From<serde_json::Value> for Reply {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for Reply {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}

impl<T: Into<Reply>> From<Option<T>> for Reply {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// One extracted argument.
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// No extractor bound, or the value was missing.
    Absent,
    /// A string value (path, query or header).
    Text(String),
    /// Decoded raw body.
    Bytes(Bytes),
    /// Parsed or validated body.
    Json(serde_json::Value),
    /// The ambient request.
    Request(Arc<Request>),
    /// The ambient response.
    Response(Response),
    /// The authenticated principal.
    Principal(Arc<Principal>),
}

impl ArgValue {
    /// Returns `true` for [`ArgValue::Absent`].
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

static ABSENT: ArgValue = ArgValue::Absent;

/// Positional arguments passed to an endpoint method.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<ArgValue>,
}

impl Args {
    /// Wraps extracted values.
    #[must_use]
    pub fn new(values: Vec<ArgValue>) -> Self {
        Self { values }
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the argument at `index`, or [`ArgValue::Absent`] when out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> &ArgValue {
        self.values.get(index).unwrap_or(&ABSENT)
    }

    /// Returns a string argument.
    ///
    /// JSON strings count as strings.
    #[must_use]
    pub fn text(&self, index: usize) -> Option<&str> {
        match self.get(index) {
            ArgValue::Text(text) => Some(text),
            ArgValue::Json(serde_json::Value::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns a JSON argument.
    #[must_use]
    pub fn json(&self, index: usize) -> Option<&serde_json::Value> {
        match self.get(index) {
            ArgValue::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Deserializes a JSON argument into `T`.
    pub fn typed<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, HeronError> {
        self.json(index)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| {
                    HeronError::validation(
                        format!("argument {index} has an unexpected shape"),
                        vec![e.to_string()],
                    )
                })
            })
            .transpose()
    }

    /// Returns a raw-body argument.
    #[must_use]
    pub fn bytes(&self, index: usize) -> Option<&Bytes> {
        match self.get(index) {
            ArgValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns a request argument.
    #[must_use]
    pub fn request(&self, index: usize) -> Option<&Arc<Request>> {
        match self.get(index) {
            ArgValue::Request(request) => Some(request),
            _ => None,
        }
    }

    /// Returns a response argument.
    #[must_use]
    pub fn response(&self, index: usize) -> Option<&Response> {
        match self.get(index) {
            ArgValue::Response(response) => Some(response),
            _ => None,
        }
    }

    /// Returns a principal argument.
    #[must_use]
    pub fn principal(&self, index: usize) -> Option<&Arc<Principal>> {
        match self.get(index) {
            ArgValue::Principal(principal) => Some(principal),
            _ => None,
        }
    }

    /// Iterates over the arguments in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &ArgValue> {
        self.values.iter()
    }
}

/// A bound, invocable controller method.
#[derive(Clone)]
pub struct MethodRef {
    name: String,
    arity: usize,
    owner: TypeKey,
    invoker: ErasedInvoker,
}

impl MethodRef {
    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared parameter count.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Returns the owning controller type.
    #[must_use]
    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    /// Invokes the method on `instance`.
    ///
    /// Fails with an internal error if `instance` is not of the owning type.
    pub fn invoke(&self, instance: Instance, args: Args) -> BoxFuture<'static, Result<Reply, HeronError>> {
        (self.invoker)(instance, args)
    }
}

impl fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRef")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("owner", &self.owner.name())
            .finish_non_exhaustive()
    }
}

/// The invocable methods of one controller type.
#[derive(Clone, Debug)]
pub struct MethodTable {
    owner: TypeKey,
    methods: IndexMap<String, MethodRef>,
}

impl MethodTable {
    /// Starts a table for controller type `C`.
    #[must_use]
    pub fn builder<C: Controller>() -> MethodTableBuilder<C> {
        MethodTableBuilder {
            owner: TypeKey::of::<C>(),
            methods: IndexMap::new(),
            _marker: PhantomData,
        }
    }

    /// Returns the owning type.
    #[must_use]
    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MethodRef> {
        self.methods.get(name)
    }

    /// Returns the method names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Returns the number of methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if the table has no methods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Builder for a [`MethodTable`].
pub struct MethodTableBuilder<C> {
    owner: TypeKey,
    methods: IndexMap<String, MethodRef>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Controller> MethodTableBuilder<C> {
    /// Adds a method with its declared parameter count.
    ///
    /// Adding a name twice replaces the earlier entry.
    #[must_use]
    pub fn method<F, Fut, R>(mut self, name: &str, arity: usize, f: F) -> Self
    where
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HeronError>> + Send + 'static,
        R: Into<Reply>,
    {
        let invoker: ErasedInvoker = Arc::new(
            move |instance: Instance, args: Args| -> BoxFuture<'static, Result<Reply, HeronError>> {
                match instance.downcast::<C>() {
                    Ok(this) => {
                        let fut = f(this, args);
                        Box::pin(async move { fut.await.map(Into::into) })
                    }
                    Err(_) => Box::pin(std::future::ready(Err(HeronError::internal(format!(
                        "controller instance is not a {}",
                        std::any::type_name::<C>()
                    ))))),
                }
            },
        );

        self.methods.insert(
            name.to_string(),
            MethodRef {
                name: name.to_string(),
                arity,
                owner: self.owner,
                invoker,
            },
        );
        self
    }

    /// Finishes the table.
    #[must_use]
    pub fn build(self) -> MethodTable {
        MethodTable {
            owner: self.owner,
            methods: self.methods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Counter {
        start: i64,
    }

    impl Controller for Counter {
        fn methods() -> MethodTable {
            MethodTable::builder::<Self>()
                .method("add", 1, |this: Arc<Self>, args: Args| async move {
                    let n: i64 = args
                        .text(0)
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(|| HeronError::validation("n must be a number", vec![]))?;
                    Ok(json!(this.start + n))
                })
                .method("noop", 0, |_this: Arc<Self>, _args: Args| async move { Ok(()) })
                .build()
        }
    }

    #[test]
    fn test_method_table_contents() {
        let table = Counter::methods();
        assert_eq!(table.len(), 2);
        assert_eq!(table.owner(), TypeKey::of::<Counter>());
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["add", "noop"]);
        assert_eq!(table.get("add").unwrap().arity(), 1);
        assert!(table.get("missing").is_none());
    }

    #[tokio::test]
    async fn test_invoke_method() {
        let table = Counter::methods();
        let instance: Instance = Arc::new(Counter { start: 40 });
        let args = Args::new(vec![ArgValue::Text("2".to_string())]);

        let reply = table.get("add").unwrap().invoke(instance, args).await.unwrap();
        assert_eq!(reply, Reply::Json(json!(42)));
    }

    #[tokio::test]
    async fn test_invoke_unit_returns_empty() {
        let table = Counter::methods();
        let instance: Instance = Arc::new(Counter { start: 0 });
        let reply = table
            .get("noop")
            .unwrap()
            .invoke(instance, Args::default())
            .await
            .unwrap();
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn test_invoke_wrong_instance_type() {
        let table = Counter::methods();
        let instance: Instance = Arc::new("not a counter".to_string());
        let err = table
            .get("noop")
            .unwrap()
            .invoke(instance, Args::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Counter"));
    }

    #[test]
    fn test_reply_emptiness() {
        assert!(Reply::Empty.is_empty());
        assert!(Reply::Json(serde_json::Value::Null).is_empty());
        assert!(!Reply::text("").is_empty());
        assert!(!Reply::Json(json!(false)).is_empty());
        assert!(Reply::from(None::<String>).is_empty());
    }

    #[test]
    fn test_args_accessors() {
        let args = Args::new(vec![
            ArgValue::Text("a".to_string()),
            ArgValue::Json(json!({"qty": 2})),
            ArgValue::Absent,
        ]);
        assert_eq!(args.text(0), Some("a"));
        assert_eq!(args.json(1), Some(&json!({"qty": 2})));
        assert!(args.get(2).is_absent());
        assert!(args.get(99).is_absent());
        assert!(args.response(0).is_none());
    }

    #[test]
    fn test_args_typed() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Line {
            qty: u32,
        }

        let args = Args::new(vec![ArgValue::Json(json!({"qty": 2}))]);
        assert_eq!(args.typed::<Line>(0).unwrap(), Some(Line { qty: 2 }));
        assert_eq!(args.typed::<Line>(1).unwrap(), None);

        let bad = Args::new(vec![ArgValue::Json(json!({"qty": "two"}))]);
        assert!(bad.typed::<Line>(0).is_err());
    }
}
