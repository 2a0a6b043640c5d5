//! Host-side contract for types that accept macros.
//!
//! A host names itself with [`Macroable::HOST`] and may declare its
//! supertype chain with [`Macroable::ancestors`]. Lookups walk the chain
//! starting from the host itself, so a macro registered on an ancestor is
//! callable on every descendant and a descendant's own macro shadows it.
//!
//! # Example
//!
//! ```
//! use macroable_registry::{Callable, Macroable, Registry};
//! use serde_json::json;
//!
//! struct Model;
//! impl Macroable for Model {
//!     const HOST: &'static str = "Model";
//! }
//!
//! struct User {
//!     name: String,
//! }
//! impl Macroable for User {
//!     const HOST: &'static str = "User";
//!     fn ancestors() -> &'static [&'static str] {
//!         &["Model"]
//!     }
//! }
//!
//! let registry = Registry::new();
//! Model::register_macro(
//!     &registry,
//!     "greet",
//!     Callable::new(|ctx, _| {
//!         let name = ctx.instance::<User>().map_or("nobody", |user| user.name.as_str());
//!         Ok(json!(format!("hello {name}")))
//!     }),
//! )
//! .unwrap();
//!
//! let user = User { name: "ada".into() };
//! assert!(User::has_macro(&registry, "greet"));
//! assert_eq!(user.call_macro(&registry, "greet", &[]).unwrap(), json!("hello ada"));
//! ```

use core::any::Any;
use core::iter;

use indexmap::IndexMap;
use serde_json::Value;

use crate::binder::{Binding, Invocation};
use crate::callable::{Callable, MacroValue};
use crate::error::MacroError;
use crate::registry::Registry;
use crate::store::MacroEntry;

/// A value that exports named macros for [`Macroable::mixin`].
pub trait MacroSource {
    /// The macros to register, in registration order.
    fn exports_macros(&self) -> IndexMap<String, Callable>;
}

impl MacroSource for IndexMap<String, Callable> {
    fn exports_macros(&self) -> IndexMap<String, Callable> {
        self.clone()
    }
}

/// A type that can be extended with macros at runtime.
pub trait Macroable: Any + Sized {
    /// Identifier the host's macros are registered under.
    const HOST: &'static str;

    /// Supertype hosts, nearest first.
    fn ancestors() -> &'static [&'static str] {
        &[]
    }

    /// Registers a global macro on this host, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::InvalidArgument`] if `name` is empty.
    fn register_macro(
        registry: &Registry,
        name: impl Into<String>,
        implementation: Callable,
    ) -> Result<(), MacroError> {
        let name = name.into();
        registry.commit(Self::HOST, &name, MacroEntry::global(implementation), true)
    }

    /// Returns whether this host or any ancestor has a resolvable macro.
    fn has_macro(registry: &Registry, name: &str) -> bool {
        lineage::<Self>().any(|host| registry.has(host, name))
    }

    /// Calls a macro without a receiver.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::MethodNotFound`] naming this host if no host in
    /// the chain resolves `name`, or whatever the macro body fails with.
    fn call_static_macro(
        registry: &Registry,
        name: &str,
        params: &[Value],
    ) -> Result<MacroValue, MacroError> {
        dispatch::<Self>(registry, name, Binding::Static, params)
    }

    /// Calls a macro bound to `self`.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::MethodNotFound`] naming this host if no host in
    /// the chain resolves `name`, or whatever the macro body fails with.
    fn call_macro(
        &self,
        registry: &Registry,
        name: &str,
        params: &[Value],
    ) -> Result<MacroValue, MacroError> {
        dispatch::<Self>(registry, name, Binding::Instance(self), params)
    }

    /// Registers every macro exported by `source` on this host.
    ///
    /// With `replace` set to `false`, names that already have a macro are
    /// left alone. Returns how many macros were registered.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::InvalidArgument`] if an exported name is empty.
    fn mixin(
        registry: &Registry,
        source: &impl MacroSource,
        replace: bool,
    ) -> Result<usize, MacroError> {
        registry.mixin(Self::HOST, source, replace)
    }

    /// Removes every macro registered directly on this host.
    ///
    /// Ancestors are untouched.
    fn flush_macros(registry: &Registry) {
        registry.flush(Some(Self::HOST));
    }
}

fn lineage<H: Macroable>() -> impl Iterator<Item = &'static str> {
    iter::once(H::HOST).chain(H::ancestors().iter().copied())
}

fn dispatch<H: Macroable>(
    registry: &Registry,
    name: &str,
    binding: Binding<'_>,
    params: &[Value],
) -> Result<MacroValue, MacroError> {
    let callable = lineage::<H>()
        .find_map(|host| registry.resolve(host, name, params))
        .ok_or_else(|| MacroError::method_not_found(H::HOST, name))?;

    Invocation::new(&callable, H::HOST, name)
        .bind(binding)
        .invoke(params)
}
