//! Registry store and resolution tests.
//!
//! Covers host isolation, scope independence, the disabled kill-switch,
//! overwrite protection, conditional gating and statistics accounting.


use macroable_registry::{Condition, MacroError, Registry, Scope, Statistics};
use serde_json::json;
use test_utils::{CallCounter, constant, shout};

// ═══════════════════════════════════════════════════════════════════════════════
// ISOLATION AND SCOPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Registering on one host never makes the macro visible on another.
#[test]
fn hosts_are_isolated() {
    let registry = Registry::new();
    registry.register("Invoice", "total", constant(json!(1))).unwrap();

    assert!(registry.has("Invoice", "total"));
    assert!(!registry.has("Order", "total"));

    let err = registry.call("Order", "total", &[]).unwrap_err();
    assert!(matches!(err, MacroError::MethodNotFound { .. }));
}

/// Global and namespaced entries with the same key live side by side.
#[test]
fn global_and_namespaced_entries_are_independent() {
    let registry = Registry::new();
    registry.register("Api", "ping", constant(json!("global"))).unwrap();
    registry
        .register_namespaced("v1", "Api", "ping", constant(json!("v1")))
        .unwrap();
    registry
        .register_namespaced("v2", "Api", "ping", constant(json!("v2")))
        .unwrap();

    assert_eq!(registry.call("Api", "ping", &[]).unwrap(), json!("global"));
    assert_eq!(
        registry.call_namespaced("v1", "Api", "ping", &[]).unwrap(),
        json!("v1")
    );
    assert_eq!(
        registry.call_namespaced("v2", "Api", "ping", &[]).unwrap(),
        json!("v2")
    );

    assert!(registry.remove_namespaced("v1", "Api", "ping"));
    assert!(registry.call_namespaced("v1", "Api", "ping", &[]).is_err());
    assert_eq!(
        registry.call_namespaced("v2", "Api", "ping", &[]).unwrap(),
        json!("v2")
    );
    assert_eq!(registry.call("Api", "ping", &[]).unwrap(), json!("global"));

    assert!(registry.remove("Api", "ping"));
    assert!(!registry.has("Api", "ping"));
    assert_eq!(
        registry.call_namespaced("v2", "Api", "ping", &[]).unwrap(),
        json!("v2")
    );
}

/// A namespaced entry is never found by an unqualified call.
#[test]
fn namespaced_entry_requires_its_namespace() {
    let registry = Registry::new();
    registry
        .register_namespaced("admin", "Api", "purge", constant(json!("purged")))
        .unwrap();

    assert!(!registry.has("Api", "purge"));
    assert!(registry.exists(Scope::Namespace("admin"), "Api", "purge", &[]));
    assert!(!registry.exists(Scope::Namespace("public"), "Api", "purge", &[]));

    let err = registry.call_namespaced("public", "Api", "purge", &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "namespaced method public::Api::purge does not exist"
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISABLE / ENABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Disabling hides the macro from every lookup; enabling restores it as-is.
#[test]
fn disable_is_a_reversible_kill_switch() {
    let registry = Registry::new();
    let counter = CallCounter::new();
    registry.register("Greeter", "shout", shout()).unwrap();
    registry.register("Greeter", "count", counter.echo()).unwrap();

    assert!(registry.has("Greeter", "shout"));
    registry.disable("Greeter", "shout");
    registry.disable("Greeter", "count");

    assert!(registry.is_disabled("Greeter", "shout"));
    assert!(!registry.has("Greeter", "shout"));
    assert!(!registry.exists(Scope::Global, "Greeter", "shout", &[]));
    assert!(registry.get(Scope::Global, "Greeter", "shout").is_some());

    let err = registry.call("Greeter", "shout", &[json!("hi")]).unwrap_err();
    assert!(err.is_not_found());
    assert!(registry.call("Greeter", "count", &[]).is_err());
    assert_eq!(counter.count(), 0, "disabled body must not run");

    registry.enable("Greeter", "shout");
    assert!(!registry.is_disabled("Greeter", "shout"));
    assert_eq!(
        registry.call("Greeter", "shout", &[json!("hi")]).unwrap(),
        json!("HI!")
    );
}

/// A disabled flag may be set before anything is registered.
#[test]
fn disable_applies_to_later_registrations() {
    let registry = Registry::new();
    registry.disable("Greeter", "wave");
    registry.register("Greeter", "wave", constant(json!("o/"))).unwrap();

    assert!(registry.call("Greeter", "wave", &[]).is_err());
    registry.enable("Greeter", "wave");
    assert_eq!(registry.call("Greeter", "wave", &[]).unwrap(), json!("o/"));
}

/// The disabled flag is keyed by host and name, so it covers every scope.
#[test]
fn disable_covers_conditional_and_namespaced_entries() {
    let registry = Registry::new();
    registry
        .register_conditional("App", "beta", Condition::new(|_| true), constant(json!(1)))
        .unwrap();
    registry
        .register_namespaced("labs", "App", "beta", constant(json!(2)))
        .unwrap();

    registry.disable("App", "beta");
    assert!(registry.call("App", "beta", &[]).is_err());
    assert!(registry.call_namespaced("labs", "App", "beta", &[]).is_err());

    registry.enable("App", "beta");
    assert_eq!(registry.call("App", "beta", &[]).unwrap(), json!(1));
    assert_eq!(
        registry.call_namespaced("labs", "App", "beta", &[]).unwrap(),
        json!(2)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// OVERWRITE PROTECTION
// ═══════════════════════════════════════════════════════════════════════════════

/// A second registration in the same scope fails and leaves the first intact.
#[test]
fn duplicate_registration_is_rejected() {
    let registry = Registry::new();
    registry.register("Api", "version", constant(json!(1))).unwrap();

    let err = registry
        .register("Api", "version", constant(json!(2)))
        .unwrap_err();
    assert!(matches!(err, MacroError::InvalidArgument(_)));
    assert_eq!(
        err.to_string(),
        "invalid argument: global macro Api::version is already registered"
    );
    assert_eq!(registry.call("Api", "version", &[]).unwrap(), json!(1));
}

/// The same name may be registered once per scope.
#[test]
fn duplicates_are_checked_per_scope() {
    let registry = Registry::new();
    registry.register("Api", "version", constant(json!(1))).unwrap();
    registry
        .register_conditional("Api", "version", Condition::new(|_| true), constant(json!(2)))
        .unwrap();
    registry
        .register_namespaced("v2", "Api", "version", constant(json!(3)))
        .unwrap();

    let err = registry
        .register_conditional("Api", "version", Condition::new(|_| true), constant(json!(4)))
        .unwrap_err();
    assert!(err.to_string().contains("conditional macro Api::version"));
}

/// Empty identifiers are rejected before anything is stored.
#[test]
fn empty_identifiers_are_invalid() {
    let registry = Registry::new();

    for result in [
        registry.register("", "name", constant(json!(1))),
        registry.register("Host", "", constant(json!(1))),
        registry.register_namespaced("", "Host", "name", constant(json!(1))),
    ] {
        assert!(matches!(result, Err(MacroError::InvalidArgument(_))));
    }
    assert_eq!(registry.statistics(), Statistics::default());
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONDITIONAL GATING
// ═══════════════════════════════════════════════════════════════════════════════

/// The predicate is evaluated against each call's own parameters.
#[test]
fn conditional_macro_is_gated_per_call() {
    let registry = Registry::new();
    let counter = CallCounter::new();
    registry
        .register_conditional(
            "App",
            "betaFeature",
            Condition::new(|params| params.first() == Some(&json!("beta-user"))),
            counter.echo(),
        )
        .unwrap();

    assert_eq!(
        registry.call("App", "betaFeature", &[json!("beta-user")]).unwrap(),
        json!(["beta-user"])
    );
    let err = registry
        .call("App", "betaFeature", &[json!("normal-user")])
        .unwrap_err();
    assert!(matches!(err, MacroError::MethodNotFound { .. }));
    assert!(registry.call("App", "betaFeature", &[]).is_err());

    assert_eq!(counter.count(), 1);
}

/// A global entry shadows a conditional one with the same key.
#[test]
fn global_entry_shadows_conditional_entry() {
    let registry = Registry::new();
    registry
        .register_conditional("App", "mode", Condition::new(|_| false), constant(json!("c")))
        .unwrap();
    assert!(!registry.has("App", "mode"));

    registry.register("App", "mode", constant(json!("g"))).unwrap();
    assert_eq!(registry.call("App", "mode", &[]).unwrap(), json!("g"));

    assert!(registry.remove("App", "mode"));
    assert!(!registry.has("App", "mode"));
    assert!(registry.remove_conditional("App", "mode"));
    assert!(!registry.remove_conditional("App", "mode"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// FLUSH AND STATISTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Statistics report each scope and keep disabled flags out of the total.
#[test]
fn statistics_count_each_scope() {
    let registry = Registry::new();
    registry.register("A", "one", constant(json!(1))).unwrap();
    registry.register("A", "two", constant(json!(2))).unwrap();
    registry.register("B", "one", constant(json!(1))).unwrap();
    registry
        .register_conditional("A", "three", Condition::new(|_| true), constant(json!(3)))
        .unwrap();
    registry
        .register_namespaced("x", "A", "four", constant(json!(4)))
        .unwrap();
    registry
        .register_namespaced("y", "A", "four", constant(json!(4)))
        .unwrap();
    registry.disable("A", "one");
    registry.disable("B", "one");

    assert_eq!(
        registry.statistics(),
        Statistics {
            global: 3,
            conditional: 1,
            namespaced: 2,
            disabled: 2,
            total: 6,
        }
    );
}

/// Flushing a host clears only that host, including its disabled flags.
#[test]
fn flush_host_leaves_other_hosts_alone() {
    let registry = Registry::new();
    registry.register("A", "one", constant(json!(1))).unwrap();
    registry
        .register_namespaced("ns", "A", "two", constant(json!(2)))
        .unwrap();
    registry.register("B", "one", constant(json!(1))).unwrap();
    registry.disable("A", "one");

    registry.flush(Some("A"));

    assert!(registry.names("A").is_empty());
    assert!(!registry.is_disabled("A", "one"));
    assert!(registry.has("B", "one"));
    assert_eq!(registry.statistics().total, 1);

    registry.flush(None);
    assert_eq!(registry.statistics(), Statistics::default());
}

/// Flushing a namespace removes its entries across hosts and nothing else.
#[test]
fn flush_namespace_counts_removed_entries() {
    let registry = Registry::new();
    registry
        .register_namespaced("admin", "A", "purge", constant(json!(1)))
        .unwrap();
    registry
        .register_namespaced("admin", "B", "purge", constant(json!(1)))
        .unwrap();
    registry
        .register_namespaced("public", "A", "purge", constant(json!(1)))
        .unwrap();

    assert_eq!(registry.flush_namespace("admin"), 2);
    assert_eq!(registry.flush_namespace("admin"), 0);
    assert_eq!(registry.statistics().namespaced, 1);
}

/// Names are listed once per host, sorted, across scopes.
#[test]
fn names_are_sorted_and_unique() {
    let registry = Registry::new();
    registry.register("A", "zeta", constant(json!(1))).unwrap();
    registry.register("A", "alpha", constant(json!(1))).unwrap();
    registry
        .register_conditional("A", "alpha", Condition::new(|_| true), constant(json!(1)))
        .unwrap();
    registry
        .register_namespaced("ns", "A", "mid", constant(json!(1)))
        .unwrap();

    assert_eq!(registry.names("A"), vec!["alpha", "mid", "zeta"]);
    assert!(registry.names("B").is_empty());
}
