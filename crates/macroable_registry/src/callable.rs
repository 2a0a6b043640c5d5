//! Callable macro bodies and the values they produce.
//!
//! A macro body is a closure taking an explicit [`CallContext`] and an ordered
//! list of JSON parameters. Bodies are type-erased into [`Callable`] so that
//! heterogeneous closures can live in one registry.
//!
//! # Example
//!
//! ```
//! use macroable_registry::callable::{CallContext, Callable};
//! use serde_json::{Value, json};
//!
//! let shout = Callable::new(|_ctx, params: &[Value]| {
//!     let input = params.first().and_then(Value::as_str).unwrap_or_default();
//!     Ok(json!(format!("{}!", input.to_uppercase())))
//! });
//!
//! let ctx = CallContext::new("Greeter", "shout");
//! assert_eq!(shout.call(&ctx, &[json!("hi")]).unwrap(), json!("HI!"));
//! ```

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::MacroError;

// ─────────────────────────────────────────────────────────────────────────────
// MacroValue
// ─────────────────────────────────────────────────────────────────────────────

/// The result of a macro call.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroValue {
    /// A plain value produced by the macro body.
    Value(Value),
    /// The call resolves to its receiver, allowing fluent call chains.
    Receiver,
}

impl MacroValue {
    /// Returns the wrapped value, or `None` for [`Receiver`](Self::Receiver).
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Receiver => None,
        }
    }

    /// Consumes the result, returning the wrapped value if any.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Receiver => None,
        }
    }

    /// Returns `true` if the call resolved to its receiver.
    #[must_use]
    pub fn is_receiver(&self) -> bool {
        matches!(self, Self::Receiver)
    }

    /// Short type label used in log records.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Receiver => "receiver",
            Self::Value(Value::Null) => "null",
            Self::Value(Value::Bool(_)) => "bool",
            Self::Value(Value::Number(_)) => "number",
            Self::Value(Value::String(_)) => "string",
            Self::Value(Value::Array(_)) => "array",
            Self::Value(Value::Object(_)) => "object",
        }
    }
}

impl From<Value> for MacroValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<()> for MacroValue {
    fn from((): ()) -> Self {
        Self::Value(Value::Null)
    }
}

impl PartialEq<Value> for MacroValue {
    fn eq(&self, other: &Value) -> bool {
        self.as_value() == Some(other)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CallContext
// ─────────────────────────────────────────────────────────────────────────────

/// The explicit binding context a macro body is invoked with.
///
/// Static calls carry only the host identifier; instance calls also carry a
/// reference to the receiver, which bodies can downcast with
/// [`instance`](Self::instance).
#[derive(Clone, Copy)]
pub struct CallContext<'a> {
    host: &'a str,
    name: &'a str,
    namespace: Option<&'a str>,
    instance: Option<&'a dyn Any>,
}

impl<'a> CallContext<'a> {
    /// Creates a static context for `host::name`.
    #[must_use]
    pub fn new(host: &'a str, name: &'a str) -> Self {
        Self {
            host,
            name,
            namespace: None,
            instance: None,
        }
    }

    /// Qualifies the context with a namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: &'a str) -> Self {
        self.namespace = Some(namespace);
        self
    }

    /// Binds the context to a receiver instance.
    #[must_use]
    pub fn with_instance(mut self, instance: &'a dyn Any) -> Self {
        self.instance = Some(instance);
        self
    }

    /// The host the macro was called on.
    #[must_use]
    pub fn host(&self) -> &'a str {
        self.host
    }

    /// The macro name being invoked.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The namespace of a namespaced call.
    #[must_use]
    pub fn namespace(&self) -> Option<&'a str> {
        self.namespace
    }

    /// Returns `true` when no receiver instance is bound.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.instance.is_none()
    }

    /// Downcasts the bound receiver to `T`.
    #[must_use]
    pub fn instance<T: Any>(&self) -> Option<&'a T> {
        self.instance.and_then(|instance| instance.downcast_ref::<T>())
    }
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("bound", &self.instance.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Callable
// ─────────────────────────────────────────────────────────────────────────────

type MacroFn = dyn Fn(&CallContext<'_>, &[Value]) -> Result<MacroValue, MacroError> + Send + Sync;

/// A type-erased macro body.
///
/// Cloning is cheap; clones share the same body.
#[derive(Clone)]
pub struct Callable {
    func: Arc<MacroFn>,
}

impl Callable {
    /// Wraps a closure as a callable.
    ///
    /// The closure may return anything convertible into a [`MacroValue`],
    /// typically a [`serde_json::Value`].
    pub fn new<F, R>(func: F) -> Self
    where
        F: Fn(&CallContext<'_>, &[Value]) -> Result<R, MacroError> + Send + Sync + 'static,
        R: Into<MacroValue>,
    {
        let func: Arc<MacroFn> = Arc::new(move |ctx: &CallContext<'_>, params: &[Value]| {
            func(ctx, params).map(Into::into)
        });
        Self { func }
    }

    /// Invokes the body. Failures raised by the body are returned unchanged.
    pub fn call(&self, ctx: &CallContext<'_>, params: &[Value]) -> Result<MacroValue, MacroError> {
        (self.func)(ctx, params)
    }

    /// Returns `true` if both callables share the same body.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Condition
// ─────────────────────────────────────────────────────────────────────────────

/// Call-time predicate gating a conditional macro.
#[derive(Clone)]
pub struct Condition {
    func: Arc<dyn Fn(&[Value]) -> bool + Send + Sync>,
}

impl Condition {
    /// Wraps a predicate over the call parameters.
    pub fn new(func: impl Fn(&[Value]) -> bool + Send + Sync + 'static) -> Self {
        Self {
            func: Arc::new(func),
        }
    }

    /// Evaluates the predicate against the call parameters.
    #[must_use]
    pub fn evaluate(&self, params: &[Value]) -> bool {
        (self.func)(params)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition").finish_non_exhaustive()
    }
}
