//! Runs the registry through a handful of end-to-end scenarios.
//!
//! # Usage
//!
//! ```bash
//! macroable-demo [pretty|compact|json] [level]
//! ```
//!
//! # Example
//!
//! ```bash
//! macroable-demo compact debug
//! ```

use example::{Greeter, User, install};
use macroable_registry::{MacroError, MacroValue, Macroable, Registry, RegistryConfig, parse_level};
use macroable_tracing::{TracingFormat, TracingSetup};
use serde_json::json;
use tracing::Level;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let format = args
        .get(1)
        .and_then(|name| TracingFormat::parse(name))
        .unwrap_or_default();
    let level = match args.get(2).map(|name| parse_level(name)).transpose() {
        Ok(level) => level.unwrap_or(Level::INFO),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    TracingSetup::new()
        .with_level(level)
        .with_format(format)
        .init();

    let registry = Registry::with_config(RegistryConfig::new().with_default_log_level(Level::INFO));

    if let Err(e) = run(&registry) {
        tracing::error!(error = %e, "demo failed");
        std::process::exit(1);
    }

    tracing::info!(statistics = ?registry.statistics(), "demo finished");
}

fn run(registry: &Registry) -> Result<(), MacroError> {
    let runs = install(registry)?;

    let shouted = Greeter::call_static_macro(registry, "shout", &[json!("hi")])?;
    report("global", &shouted);

    match registry.call("Api", "adminOnly", &[]) {
        Err(e) if e.is_not_found() => tracing::info!(error = %e, "unqualified call rejected"),
        other => return Err(unexpected("adminOnly without namespace", other)),
    }
    let admin = registry.call_namespaced("admin", "Api", "adminOnly", &[])?;
    report("namespaced", &admin);

    let beta = registry.call("App", "betaFeature", &[json!("beta-user")])?;
    report("conditional", &beta);
    match registry.call("App", "betaFeature", &[json!("normal-user")]) {
        Err(e) if e.is_not_found() => tracing::info!(error = %e, "non-beta user rejected"),
        other => return Err(unexpected("betaFeature for normal-user", other)),
    }

    for _ in 0..5 {
        registry.call("Report", "expensive", &[json!("q")])?;
    }
    tracing::info!(calls = 5, runs = runs.get(), "cached report");

    registry.call("Report", "audit", &[json!("login"), json!({ "user": "ada" })])?;

    let user = User { name: "ada".into() };
    let described = user.call_macro(registry, "describe", &[])?;
    report("inherited", &described);

    registry.disable(Greeter::HOST, "shout");
    match Greeter::call_static_macro(registry, "shout", &[json!("hi")]) {
        Err(e) if e.is_not_found() => tracing::info!(error = %e, "disabled macro rejected"),
        other => return Err(unexpected("shout while disabled", other)),
    }
    registry.enable(Greeter::HOST, "shout");
    let again = Greeter::call_static_macro(registry, "shout", &[json!("hi")])?;
    report("re-enabled", &again);

    Ok(())
}

fn report(scenario: &str, value: &MacroValue) {
    match value.as_value() {
        Some(value) => tracing::info!(scenario, result = %value, "macro returned"),
        None => tracing::info!(scenario, "macro returned its receiver"),
    }
}

fn unexpected(what: &str, outcome: Result<MacroValue, MacroError>) -> MacroError {
    match outcome {
        Ok(value) => MacroError::failure(format!("{what}: expected not found, got {value:?}")),
        Err(e) => e,
    }
}
