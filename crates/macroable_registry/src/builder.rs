//! Fluent construction of a single macro.
//!
//! [`MacroBuilder`] accumulates a draft (implementation, scope, description
//! data, validation rules) and commits it with [`register`](MacroBuilder::register).
//!
//! # Decorators
//!
//! [`chainable`](MacroBuilder::chainable), [`cached`](MacroBuilder::cached) and
//! [`logged`](MacroBuilder::logged) each *replace* the implementation with a
//! wrapped version of their own callback. They do not stack: the last
//! implementation-setting call wins.
//!
//! # Example
//!
//! ```
//! use macroable_registry::Registry;
//! use serde_json::{Value, json};
//!
//! let registry = Registry::new();
//! registry
//!     .builder("Str", "slug")
//!     .implement(|_, params: &[Value]| {
//!         let input = params.first().and_then(Value::as_str).unwrap_or_default();
//!         Ok(json!(input.to_lowercase().replace(' ', "-")))
//!     })
//!     .describe("Turns a title into a URL slug")
//!     .tag(["string", "url"])
//!     .validate_parameter("0", Value::is_string)
//!     .register()
//!     .unwrap();
//!
//! assert_eq!(
//!     registry.call("Str", "slug", &[json!("Hello World")]).unwrap(),
//!     json!("hello-world")
//! );
//! ```

use core::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::Level;

use crate::callable::{CallContext, Callable, Condition, MacroValue};
use crate::decorators::{self, CacheMap};
use crate::error::MacroError;
use crate::registry::Registry;
use crate::store::{MacroEntry, MacroInfo};
use crate::validation::{self, ValidationRule, ValidationRules};

/// In-progress state of a macro under construction.
#[derive(Debug)]
struct MacroDraft {
    host: String,
    name: String,
    implementation: Option<Callable>,
    condition: Option<Condition>,
    namespace: Option<String>,
    overwrite: bool,
    rules: ValidationRules,
    info: MacroInfo,
}

/// Fluent builder for one macro on one host.
///
/// Created by [`Registry::builder`]; consumed by [`register`](Self::register).
#[must_use = "a macro builder does nothing until `register` is called"]
pub struct MacroBuilder<'r> {
    registry: &'r Registry,
    draft: MacroDraft,
    // Private to this builder; shared by every `cached` call on it.
    cache: CacheMap,
}

impl fmt::Debug for MacroBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroBuilder")
            .field("draft", &self.draft)
            .finish_non_exhaustive()
    }
}

impl<'r> MacroBuilder<'r> {
    pub(crate) fn new(registry: &'r Registry, host: String, name: String) -> Self {
        Self {
            registry,
            draft: MacroDraft {
                host,
                name,
                implementation: None,
                condition: None,
                namespace: None,
                overwrite: false,
                rules: ValidationRules::new(),
                info: MacroInfo::default(),
            },
            cache: CacheMap::default(),
        }
    }

    /// Sets the macro body.
    pub fn implement<F, R>(mut self, body: F) -> Self
    where
        F: Fn(&CallContext<'_>, &[Value]) -> Result<R, MacroError> + Send + Sync + 'static,
        R: Into<MacroValue>,
    {
        self.draft.implementation = Some(Callable::new(body));
        self
    }

    /// Sets a prebuilt callable as the macro body.
    pub fn implement_callable(mut self, callable: Callable) -> Self {
        self.draft.implementation = Some(callable);
        self
    }

    /// Makes the macro conditional on `predicate` holding for the call
    /// parameters.
    pub fn when(mut self, predicate: impl Fn(&[Value]) -> bool + Send + Sync + 'static) -> Self {
        self.draft.condition = Some(Condition::new(predicate));
        self
    }

    /// Registers the macro under `namespace` instead of the global scope.
    ///
    /// Ignored when [`when`](Self::when) was also called.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.draft.namespace = Some(namespace.into());
        self
    }

    /// Allows replacing an existing macro in the same scope.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.draft.overwrite = overwrite;
        self
    }

    /// Shallow-merges entries into the metadata map.
    pub fn with_metadata<I, K>(mut self, metadata: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (key, value) in metadata {
            self.draft.info.metadata.insert(key.into(), value);
        }
        self
    }

    /// Sets one metadata entry.
    pub fn add_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.draft.info.metadata.insert(key.into(), value.into());
        self
    }

    /// Merges a set of validation rules.
    pub fn validate_with<I, K>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = (K, ValidationRule)>,
        K: Into<String>,
    {
        self.draft.rules.extend(rules);
        self
    }

    /// Adds a validation rule for one parameter.
    ///
    /// Integer keys address positional arguments; other keys address fields
    /// of an object first argument.
    pub fn validate_parameter(
        mut self,
        parameter: impl Into<String>,
        rule: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.draft
            .rules
            .insert(parameter, ValidationRule::new(rule));
        self
    }

    /// Sets the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.draft.info.description = Some(description.into());
        self
    }

    /// Appends tags.
    pub fn tag<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.draft.info.tags.insert(tag.into());
        }
        self
    }

    /// Sets the informational priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.draft.info.priority = priority;
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Decorators
    // ─────────────────────────────────────────────────────────────────────

    /// Uses `body` as the implementation, resolving `null` results to
    /// [`MacroValue::Receiver`] so call sites can keep chaining.
    pub fn chainable<F, R>(mut self, body: F) -> Self
    where
        F: Fn(&CallContext<'_>, &[Value]) -> Result<R, MacroError> + Send + Sync + 'static,
        R: Into<MacroValue>,
    {
        self.draft.implementation = Some(decorators::chainable(Callable::new(body)));
        self
    }

    /// Uses `body` as the implementation, caching results per parameter list
    /// for the registry's default TTL.
    pub fn cached<F, R>(self, body: F) -> Self
    where
        F: Fn(&CallContext<'_>, &[Value]) -> Result<R, MacroError> + Send + Sync + 'static,
        R: Into<MacroValue>,
    {
        let ttl = self.registry.config().default_cache_ttl();
        self.cached_for(body, ttl)
    }

    /// Like [`cached`](Self::cached) with an explicit TTL.
    /// [`Duration::ZERO`] caches for the lifetime of the macro.
    pub fn cached_for<F, R>(mut self, body: F, ttl: Duration) -> Self
    where
        F: Fn(&CallContext<'_>, &[Value]) -> Result<R, MacroError> + Send + Sync + 'static,
        R: Into<MacroValue>,
    {
        let clock = self.registry.config().clock().clone();
        self.draft.implementation = Some(decorators::cached(
            Callable::new(body),
            ttl,
            clock,
            CacheMap::clone(&self.cache),
        ));
        self
    }

    /// Uses `body` as the implementation, logging every call at the
    /// registry's default level.
    pub fn logged<F, R>(self, body: F) -> Self
    where
        F: Fn(&CallContext<'_>, &[Value]) -> Result<R, MacroError> + Send + Sync + 'static,
        R: Into<MacroValue>,
    {
        let level = self.registry.config().default_log_level();
        self.logged_at(body, level)
    }

    /// Like [`logged`](Self::logged) at an explicit level.
    pub fn logged_at<F, R>(mut self, body: F, level: Level) -> Self
    where
        F: Fn(&CallContext<'_>, &[Value]) -> Result<R, MacroError> + Send + Sync + 'static,
        R: Into<MacroValue>,
    {
        let config = self.registry.config();
        self.draft.implementation = Some(decorators::logged(
            Callable::new(body),
            level,
            config.clock().clone(),
            config.logger().clone(),
        ));
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Terminal
    // ─────────────────────────────────────────────────────────────────────

    /// Commits the draft to the registry.
    ///
    /// The scope is conditional if [`when`](Self::when) was called, else
    /// namespaced if [`in_namespace`](Self::in_namespace) was called, else
    /// global.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::InvalidArgument`] if no implementation was set,
    /// an identifier is empty, or the scope already holds the macro and
    /// [`overwrite`](Self::overwrite) was not enabled.
    pub fn register(self) -> Result<(), MacroError> {
        let MacroDraft {
            host,
            name,
            implementation,
            condition,
            namespace,
            overwrite,
            rules,
            mut info,
        } = self.draft;

        let Some(implementation) = implementation else {
            return Err(MacroError::invalid_argument(format!(
                "macro {host}::{name} must have an implementation"
            )));
        };

        let implementation = if rules.is_empty() {
            implementation
        } else {
            info.validated_parameters = rules.parameters();
            validation::guard(implementation, rules)
        };

        let entry = match (condition, namespace) {
            (Some(condition), _) => MacroEntry::Conditional {
                implementation,
                condition,
                info,
            },
            (None, Some(namespace)) => MacroEntry::Namespaced {
                implementation,
                namespace,
                info,
            },
            (None, None) => MacroEntry::Global {
                implementation,
                info,
            },
        };

        self.registry.commit(&host, &name, entry, overwrite)
    }
}
