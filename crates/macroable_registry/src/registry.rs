//! The extension registry and its resolution rules.
//!
//! [`Registry`] stores macros for arbitrary hosts and resolves dynamic calls
//! against them. It is an ordinary value owned by the application: create
//! one at startup, share it by reference (or `Arc`), and drop it at shutdown.
//!
//! # Resolution
//!
//! Unqualified calls check, in order:
//!
//! 1. the disabled flag for `(host, name)`: if set, nothing resolves
//! 2. the global entry
//! 3. the conditional entry, if its predicate holds for the call parameters
//!
//! Namespaced calls only ever see the entry registered under that namespace,
//! and are also subject to the disabled flag.
//!
//! # Thread Safety
//!
//! All operations take `&self`; the store sits behind a [`RwLock`]. Callables
//! and predicates are cloned out of the lock before they run, so macro bodies
//! may call back into the registry.
//!
//! # Example
//!
//! ```
//! use macroable_registry::{Callable, Registry};
//! use serde_json::{Value, json};
//!
//! let registry = Registry::new();
//! registry
//!     .register("Greeter", "shout", Callable::new(|_, params: &[Value]| {
//!         let input = params.first().and_then(Value::as_str).unwrap_or_default();
//!         Ok(json!(format!("{}!", input.to_uppercase())))
//!     }))
//!     .unwrap();
//!
//! let result = registry.call("Greeter", "shout", &[json!("hi")]).unwrap();
//! assert_eq!(result, json!("HI!"));
//! ```

use core::fmt;

use parking_lot::RwLock;
use serde_json::Value;

use crate::binder::{Binding, Invocation};
use crate::builder::MacroBuilder;
use crate::callable::{Callable, Condition, MacroValue};
use crate::config::RegistryConfig;
use crate::error::MacroError;
use crate::host::MacroSource;
use crate::store::{MacroEntry, MacroInfo, MacroKey, Scope, Statistics, Store};

/// Registry of macros keyed by host and name.
#[derive(Default)]
pub struct Registry {
    store: RwLock<Store>,
    config: RegistryConfig,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("statistics", &self.statistics())
            .field("config", &self.config)
            .finish()
    }
}

impl Registry {
    /// Creates an empty registry with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            config,
        }
    }

    /// The registry configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Starts building a macro for `host::name`.
    ///
    /// See [`MacroBuilder`] for the available options.
    pub fn builder(&self, host: impl Into<String>, name: impl Into<String>) -> MacroBuilder<'_> {
        MacroBuilder::new(self, host.into(), name.into())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a global macro.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::InvalidArgument`] if `host` or `name` is empty
    /// or a global macro with that name already exists on the host.
    pub fn register(
        &self,
        host: &str,
        name: &str,
        implementation: Callable,
    ) -> Result<(), MacroError> {
        self.commit(host, name, MacroEntry::global(implementation), false)
    }

    /// Registers a macro that only resolves when `condition` holds for the
    /// call parameters.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::InvalidArgument`] if `host` or `name` is empty
    /// or a conditional macro with that name already exists on the host.
    pub fn register_conditional(
        &self,
        host: &str,
        name: &str,
        condition: Condition,
        implementation: Callable,
    ) -> Result<(), MacroError> {
        self.commit(
            host,
            name,
            MacroEntry::conditional(implementation, condition),
            false,
        )
    }

    /// Registers a macro that only resolves under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::InvalidArgument`] if any identifier is empty or
    /// the namespace already holds a macro with that name for the host.
    pub fn register_namespaced(
        &self,
        namespace: &str,
        host: &str,
        name: &str,
        implementation: Callable,
    ) -> Result<(), MacroError> {
        self.commit(
            host,
            name,
            MacroEntry::namespaced(implementation, namespace),
            false,
        )
    }

    /// Inserts an entry into its scope, refusing duplicates unless
    /// `overwrite` is set. The check and insert happen under one write lock.
    pub(crate) fn commit(
        &self,
        host: &str,
        name: &str,
        entry: MacroEntry,
        overwrite: bool,
    ) -> Result<(), MacroError> {
        let scope = entry.scope().to_string();
        let mut store = self.store.write();

        if !overwrite && store.contains(entry.scope(), host, name) {
            return Err(MacroError::invalid_argument(format!(
                "{scope} macro {host}::{name} is already registered"
            )));
        }

        let replaced = store.put(host, name, entry)?.is_some();
        drop(store);

        tracing::debug!(host, name, scope = %scope, replaced, "macro registered");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────

    /// Resolves the callable an unqualified call would run.
    ///
    /// Returns `None` when the macro is disabled, missing, or only
    /// conditionally registered with a predicate that rejects `params`.
    #[must_use]
    pub fn resolve(&self, host: &str, name: &str, params: &[Value]) -> Option<Callable> {
        let (implementation, condition) = {
            let store = self.store.read();

            if store.is_disabled(host, name) {
                tracing::trace!(host, name, "macro is disabled");
                return None;
            }

            if let Some(entry) = store.get(Scope::Global, host, name) {
                return Some(entry.implementation().clone());
            }

            match store.get(Scope::Conditional, host, name) {
                Some(MacroEntry::Conditional {
                    implementation,
                    condition,
                    ..
                }) => (implementation.clone(), condition.clone()),
                _ => {
                    tracing::trace!(host, name, "macro not found");
                    return None;
                }
            }
        };

        if condition.evaluate(params) {
            Some(implementation)
        } else {
            tracing::trace!(host, name, "macro condition rejected call");
            None
        }
    }

    /// Resolves the callable a namespaced call would run.
    #[must_use]
    pub fn resolve_namespaced(&self, namespace: &str, host: &str, name: &str) -> Option<Callable> {
        let store = self.store.read();
        let entry = store.get(Scope::Namespace(namespace), host, name)?;

        if store.is_disabled(host, name) {
            tracing::trace!(namespace, host, name, "macro is disabled");
            return None;
        }

        Some(entry.implementation().clone())
    }

    /// Returns whether a macro in `scope` would resolve for `params`.
    ///
    /// For the conditional scope the stored predicate is evaluated, so the
    /// answer can differ between parameter lists.
    #[must_use]
    pub fn exists(&self, scope: Scope<'_>, host: &str, name: &str, params: &[Value]) -> bool {
        let condition = {
            let store = self.store.read();
            if store.is_disabled(host, name) {
                return false;
            }
            match store.get(scope, host, name) {
                Some(MacroEntry::Conditional { condition, .. }) => condition.clone(),
                Some(_) => return true,
                None => return false,
            }
        };
        condition.evaluate(params)
    }

    /// Returns whether an unqualified call with no parameters would resolve.
    #[must_use]
    pub fn has(&self, host: &str, name: &str) -> bool {
        self.resolve(host, name, &[]).is_some()
    }

    /// Returns a copy of the stored entry, ignoring disabled flags.
    #[must_use]
    pub fn get(&self, scope: Scope<'_>, host: &str, name: &str) -> Option<MacroEntry> {
        self.store.read().get(scope, host, name).cloned()
    }

    /// Returns the description data of a stored entry.
    #[must_use]
    pub fn info(&self, scope: Scope<'_>, host: &str, name: &str) -> Option<MacroInfo> {
        self.store
            .read()
            .get(scope, host, name)
            .map(|entry| entry.info().clone())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Invocation
    // ─────────────────────────────────────────────────────────────────────

    /// Calls `host::name` statically.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::MethodNotFound`] if nothing resolves, or
    /// whatever the macro body fails with.
    pub fn call(&self, host: &str, name: &str, params: &[Value]) -> Result<MacroValue, MacroError> {
        self.call_with(host, name, Binding::Static, params)
    }

    /// Calls `host::name` bound to `binding`.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::MethodNotFound`] if nothing resolves, or
    /// whatever the macro body fails with.
    pub fn call_with(
        &self,
        host: &str,
        name: &str,
        binding: Binding<'_>,
        params: &[Value],
    ) -> Result<MacroValue, MacroError> {
        let callable = self
            .resolve(host, name, params)
            .ok_or_else(|| MacroError::method_not_found(host, name))?;

        Invocation::new(&callable, host, name)
            .bind(binding)
            .invoke(params)
    }

    /// Calls `host::name` under `namespace` statically.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::NamespacedMethodNotFound`] if nothing resolves,
    /// or whatever the macro body fails with.
    pub fn call_namespaced(
        &self,
        namespace: &str,
        host: &str,
        name: &str,
        params: &[Value],
    ) -> Result<MacroValue, MacroError> {
        self.call_namespaced_with(namespace, host, name, Binding::Static, params)
    }

    /// Calls `host::name` under `namespace` bound to `binding`.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::NamespacedMethodNotFound`] if nothing resolves,
    /// or whatever the macro body fails with.
    pub fn call_namespaced_with(
        &self,
        namespace: &str,
        host: &str,
        name: &str,
        binding: Binding<'_>,
        params: &[Value],
    ) -> Result<MacroValue, MacroError> {
        let callable = self
            .resolve_namespaced(namespace, host, name)
            .ok_or_else(|| MacroError::namespaced_method_not_found(namespace, host, name))?;

        Invocation::new(&callable, host, name)
            .in_namespace(namespace)
            .bind(binding)
            .invoke(params)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Disabled flags
    // ─────────────────────────────────────────────────────────────────────

    /// Disables `host::name` in every scope until [`enable`](Self::enable)d.
    pub fn disable(&self, host: &str, name: &str) {
        self.store.write().disable(host, name);
        tracing::debug!(host, name, "macro disabled");
    }

    /// Clears the disabled flag for `host::name`.
    pub fn enable(&self, host: &str, name: &str) {
        self.store.write().enable(host, name);
        tracing::debug!(host, name, "macro enabled");
    }

    /// Returns whether `host::name` is disabled.
    #[must_use]
    pub fn is_disabled(&self, host: &str, name: &str) -> bool {
        self.store.read().is_disabled(host, name)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Removal
    // ─────────────────────────────────────────────────────────────────────

    /// Removes the global macro `host::name`. Returns whether one existed.
    pub fn remove(&self, host: &str, name: &str) -> bool {
        self.remove_from(Scope::Global, host, name)
    }

    /// Removes the conditional macro `host::name`. Returns whether one existed.
    pub fn remove_conditional(&self, host: &str, name: &str) -> bool {
        self.remove_from(Scope::Conditional, host, name)
    }

    /// Removes `host::name` from `namespace`. Returns whether one existed.
    pub fn remove_namespaced(&self, namespace: &str, host: &str, name: &str) -> bool {
        self.remove_from(Scope::Namespace(namespace), host, name)
    }

    fn remove_from(&self, scope: Scope<'_>, host: &str, name: &str) -> bool {
        let removed = self.store.write().remove(scope, host, name).is_some();
        if removed {
            tracing::debug!(host, name, scope = %scope, "macro removed");
        }
        removed
    }

    /// Clears every macro and disabled flag of `host`, or of the whole
    /// registry when `host` is `None`.
    pub fn flush(&self, host: Option<&str>) {
        self.store.write().flush(host);
        tracing::debug!(host = host.unwrap_or("*"), "macros flushed");
    }

    /// Clears one namespace across all hosts. Returns how many entries it held.
    pub fn flush_namespace(&self, namespace: &str) -> usize {
        let removed = self.store.write().remove_namespace(namespace);
        tracing::debug!(namespace, removed, "namespace flushed");
        removed
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mixins
    // ─────────────────────────────────────────────────────────────────────

    /// Registers every macro exported by `source` as a global macro on `host`.
    ///
    /// When `replace` is `false`, names that already have a global macro are
    /// skipped. Returns how many macros were registered.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::InvalidArgument`] if `host` or an exported name
    /// is empty. Macros registered before the failure stay registered.
    pub fn mixin(
        &self,
        host: &str,
        source: &impl MacroSource,
        replace: bool,
    ) -> Result<usize, MacroError> {
        let mut registered = 0;

        for (name, implementation) in source.exports_macros() {
            // Check and insert under one guard so a concurrent registration
            // is never replaced when `replace` is off.
            let mut store = self.store.write();
            if !replace && store.contains(Scope::Global, host, &name) {
                drop(store);
                tracing::trace!(host, name = %name, "mixin skipped existing macro");
                continue;
            }
            let replaced = store
                .put(host, &name, MacroEntry::global(implementation))?
                .is_some();
            drop(store);

            tracing::debug!(host, name = %name, scope = "global", replaced, "macro registered");
            registered += 1;
        }

        Ok(registered)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────

    /// Entry counts per scope.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.store.read().statistics()
    }

    /// Sorted macro names of `host` across every scope.
    #[must_use]
    pub fn names(&self, host: &str) -> Vec<String> {
        self.store.read().names(host)
    }

    /// Keys of every macro carrying `tag`, highest priority first, then by key.
    #[must_use]
    pub fn tagged(&self, tag: &str) -> Vec<MacroKey> {
        let store = self.store.read();
        let mut matches: Vec<(i32, MacroKey)> = store
            .entries()
            .into_iter()
            .filter(|(_, entry)| entry.info().has_tag(tag))
            .map(|(key, entry)| (entry.info().priority, key))
            .collect();

        matches.sort_by(|(a_priority, a_key), (b_priority, b_key)| {
            b_priority.cmp(a_priority).then_with(|| a_key.cmp(b_key))
        });
        matches.into_iter().map(|(_, key)| key).collect()
    }
}
