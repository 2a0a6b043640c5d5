//! Call-time parameter validation for built macros.
//!
//! Rules are keyed by parameter. A key that parses as an integer addresses a
//! positional argument; any other key addresses a field of the first
//! argument when that argument is a JSON object. Missing arguments are
//! validated as `null`.

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::callable::{CallContext, Callable};
use crate::error::MacroError;

static NULL: Value = Value::Null;

/// Predicate over a single parameter value.
#[derive(Clone)]
pub struct ValidationRule {
    func: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl ValidationRule {
    /// Wraps a predicate.
    pub fn new(func: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self {
            func: Arc::new(func),
        }
    }

    /// Returns `true` if the value passes the rule.
    #[must_use]
    pub fn check(&self, value: &Value) -> bool {
        (self.func)(value)
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule").finish_non_exhaustive()
    }
}

/// Ordered set of rules, one per parameter key.
#[derive(Debug, Clone, Default)]
pub struct ValidationRules {
    rules: IndexMap<String, ValidationRule>,
}

impl ValidationRules {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the rule for `parameter`.
    pub fn insert(&mut self, parameter: impl Into<String>, rule: ValidationRule) {
        self.rules.insert(parameter.into(), rule);
    }

    /// Returns `true` if no rules are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parameter keys in insertion order.
    #[must_use]
    pub fn parameters(&self) -> Vec<String> {
        self.rules.keys().cloned().collect()
    }

    /// Checks every rule against the call parameters.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::InvalidArgument`] naming the first parameter that
    /// fails its rule.
    pub fn validate(&self, ctx: &CallContext<'_>, params: &[Value]) -> Result<(), MacroError> {
        for (parameter, rule) in &self.rules {
            if !rule.check(argument(params, parameter)) {
                return Err(MacroError::invalid_argument(format!(
                    "parameter '{parameter}' failed validation for {}::{}",
                    ctx.host(),
                    ctx.name()
                )));
            }
        }
        Ok(())
    }
}

impl<K: Into<String>> FromIterator<(K, ValidationRule)> for ValidationRules {
    fn from_iter<I: IntoIterator<Item = (K, ValidationRule)>>(iter: I) -> Self {
        let mut rules = Self::new();
        rules.extend(iter);
        rules
    }
}

impl<K: Into<String>> Extend<(K, ValidationRule)> for ValidationRules {
    fn extend<I: IntoIterator<Item = (K, ValidationRule)>>(&mut self, iter: I) {
        for (parameter, rule) in iter {
            self.insert(parameter, rule);
        }
    }
}

fn argument<'p>(params: &'p [Value], key: &str) -> &'p Value {
    let found = match key.parse::<usize>() {
        Ok(index) => params.get(index),
        Err(_) => params.first().and_then(|first| first.get(key)),
    };
    found.unwrap_or(&NULL)
}

/// Wraps `inner` so the rules run before every call.
pub(crate) fn guard(inner: Callable, rules: ValidationRules) -> Callable {
    Callable::new(move |ctx, params| {
        rules.validate(ctx, params)?;
        inner.call(ctx, params)
    })
}
