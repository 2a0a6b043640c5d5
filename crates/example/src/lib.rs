//! Demo hosts and macros for the `macroable-demo` binary.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Registry                                                │
//! │                                                          │
//! │  Greeter::shout            global                        │
//! │  admin::Api::adminOnly     namespaced                    │
//! │  App::betaFeature          conditional (beta-user only)  │
//! │  Report::expensive         cached forever, logged calls  │
//! │  Model::describe           inherited by User             │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use macroable_registry::{Callable, MacroError, Macroable, Registry};
use serde_json::{Value, json};

/// Host for string helpers.
pub struct Greeter;

impl Macroable for Greeter {
    const HOST: &'static str = "Greeter";
}

/// Base model host.
pub struct Model;

impl Macroable for Model {
    const HOST: &'static str = "Model";
}

/// A model subtype carrying a receiver value.
#[derive(Debug, Clone)]
pub struct User {
    /// Display name.
    pub name: String,
}

impl Macroable for User {
    const HOST: &'static str = "User";

    fn ancestors() -> &'static [&'static str] {
        &["Model"]
    }
}

/// Counts how often the expensive report body actually ran.
#[derive(Debug, Clone, Default)]
pub struct ReportRuns(Arc<AtomicUsize>);

impl ReportRuns {
    /// Number of body executions so far.
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Registers every demo macro on `registry`.
///
/// # Errors
///
/// Returns the first registration failure.
pub fn install(registry: &Registry) -> Result<ReportRuns, MacroError> {
    Greeter::register_macro(
        registry,
        "shout",
        Callable::new(|_, params: &[Value]| {
            let input = params.first().and_then(Value::as_str).unwrap_or_default();
            Ok(json!(format!("{}!", input.to_uppercase())))
        }),
    )?;

    registry
        .builder("Api", "adminOnly")
        .implement(|ctx, _| Ok(json!(format!("welcome to {}", ctx.namespace().unwrap_or("?")))))
        .in_namespace("admin")
        .describe("Only reachable under the admin namespace")
        .tag(["admin"])
        .register()?;

    registry
        .builder("App", "betaFeature")
        .implement(|_, _| Ok(json!("beta enabled")))
        .when(|params| params.first().and_then(Value::as_str) == Some("beta-user"))
        .tag(["feature-flag"])
        .register()?;

    let runs = ReportRuns::default();
    let counter = Arc::clone(&runs.0);
    registry
        .builder("Report", "expensive")
        .cached_for(
            move |_, params: &[Value]| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!({ "rows": params.len() * 1000 }))
            },
            Duration::ZERO,
        )
        .describe("Pretends to aggregate a large table")
        .register()?;

    registry
        .builder("Report", "audit")
        .logged(|_, params: &[Value]| Ok(Value::Array(params.to_vec())))
        .register()?;

    Model::register_macro(
        registry,
        "describe",
        Callable::new(|ctx, _| {
            let who = ctx
                .instance::<User>()
                .map_or_else(|| ctx.host().to_owned(), |user| user.name.clone());
            Ok(json!(format!("{who} is a {}", ctx.host())))
        }),
    )?;

    Ok(runs)
}
