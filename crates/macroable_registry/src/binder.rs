//! Binding resolved callables to their calling context.

use core::any::Any;

use serde_json::Value;

use crate::callable::{CallContext, Callable, MacroValue};
use crate::error::MacroError;

/// What a macro call is bound to.
#[derive(Clone, Copy, Default)]
pub enum Binding<'a> {
    /// No receiver; the call is bound to the host identifier only.
    #[default]
    Static,
    /// The call is bound to a receiver instance.
    Instance(&'a dyn Any),
}

impl core::fmt::Debug for Binding<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Binding::Static => f.write_str("Static"),
            Binding::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// A resolved callable bound to a host, name and receiver.
#[derive(Debug)]
pub struct Invocation<'a> {
    callable: &'a Callable,
    context: CallContext<'a>,
}

impl<'a> Invocation<'a> {
    /// Prepares a static invocation of `callable` as `host::name`.
    #[must_use]
    pub fn new(callable: &'a Callable, host: &'a str, name: &'a str) -> Self {
        Self {
            callable,
            context: CallContext::new(host, name),
        }
    }

    /// Records the namespace the callable was resolved under.
    #[must_use]
    pub fn in_namespace(mut self, namespace: &'a str) -> Self {
        self.context = self.context.with_namespace(namespace);
        self
    }

    /// Binds the invocation to a receiver.
    #[must_use]
    pub fn bind(mut self, binding: Binding<'a>) -> Self {
        if let Binding::Instance(instance) = binding {
            self.context = self.context.with_instance(instance);
        }
        self
    }

    /// The context the callable will see.
    #[must_use]
    pub fn context(&self) -> &CallContext<'a> {
        &self.context
    }

    /// Invokes the callable with positional parameters.
    ///
    /// Failures raised inside the callable are returned unchanged.
    pub fn invoke(&self, params: &[Value]) -> Result<MacroValue, MacroError> {
        self.callable.call(&self.context, params)
    }
}
