//! Runtime macro registry for extensible host types.
//!
//! This crate lets an application attach named behaviors ("macros") to host
//! types at runtime and dispatch calls to them by name. A macro is registered
//! in one of three scopes:
//!
//! - **global**: always resolvable while not disabled
//! - **conditional**: resolvable only when a predicate over the call
//!   parameters holds
//! - **namespaced**: resolvable only when the caller names the namespace
//!
//! # Quick Start
//!
//! ```
//! use macroable_registry::{Callable, Macroable, Registry};
//! use serde_json::{Value, json};
//!
//! struct Str;
//! impl Macroable for Str {
//!     const HOST: &'static str = "Str";
//! }
//!
//! let registry = Registry::new();
//! Str::register_macro(
//!     &registry,
//!     "reverse",
//!     Callable::new(|_, params: &[Value]| {
//!         let input = params.first().and_then(Value::as_str).unwrap_or_default();
//!         Ok(json!(input.chars().rev().collect::<String>()))
//!     }),
//! )
//! .unwrap();
//!
//! let result = Str::call_static_macro(&registry, "reverse", &[json!("abc")]).unwrap();
//! assert_eq!(result, json!("cba"));
//! ```
//!
//! # Architecture
//!
//! - [`Registry`]: stores entries and resolves calls against them
//! - [`MacroBuilder`]: fluent registration with decorators and metadata
//! - [`Invocation`] / [`Binding`]: binds a resolved callable to its receiver
//! - [`Macroable`]: host-side contract with supertype inheritance
//! - [`RegistryConfig`]: cache TTL, log level, clock and log sink defaults
//! - [`MacroError`]: every failure the registry reports

pub mod binder;
pub mod builder;
pub mod callable;
pub mod config;
mod decorators;
pub mod error;
pub mod host;
pub mod logging;
pub mod registry;
pub mod store;
pub mod time;
pub mod validation;

// Re-export core types at crate root.
pub use binder::{Binding, Invocation};
pub use builder::MacroBuilder;
pub use callable::{CallContext, Callable, Condition, MacroValue};
pub use config::{DEFAULT_CACHE_TTL, DEFAULT_LOG_LEVEL, RegistryConfig, parse_level};
pub use error::MacroError;
pub use host::{MacroSource, Macroable};
pub use logging::{LogRecord, MacroLogger, TracingLogger};
pub use registry::Registry;
pub use store::{MacroEntry, MacroInfo, MacroKey, Scope, Statistics};
pub use time::{Clock, ClockProvider, ManualClock};
pub use validation::{ValidationRule, ValidationRules};
