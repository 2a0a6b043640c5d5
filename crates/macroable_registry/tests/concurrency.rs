//! Concurrent access tests.
//!
//! The registry is shared through `Arc` across plain threads; every
//! operation takes `&self`.


use std::sync::Arc;
use std::thread;
use std::time::Duration;

use indexmap::IndexMap;
use macroable_registry::{Callable, Registry};
use serde_json::json;
use test_utils::{CallCounter, constant};

const THREADS: usize = 8;
const PER_THREAD: usize = 50;

/// Registrations from many threads all land.
#[test]
fn concurrent_registrations_are_all_visible() {
    let registry = Arc::new(Registry::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    registry
                        .register(&format!("Host{t}"), &format!("m{i}"), constant(json!(i)))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = registry.statistics();
    assert_eq!(stats.global, THREADS * PER_THREAD);
    assert_eq!(registry.call("Host3", "m7", &[]).unwrap(), json!(7));
}

/// Exactly one of many racing non-overwriting registrations wins.
#[test]
fn racing_duplicates_have_a_single_winner() {
    let registry = Arc::new(Registry::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.register("Race", "prize", constant(json!(t))).is_ok())
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(registry.statistics().global, 1);
}

/// Racing mixins that must not replace leave exactly one of them registered.
#[test]
fn racing_mixins_without_replace_have_a_single_winner() {
    let registry = Arc::new(Registry::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut source = IndexMap::new();
                source.insert("prize".to_owned(), constant(json!(t)));
                registry.mixin("Race", &source, false).unwrap()
            })
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|registered| *registered == 1)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(registry.statistics().global, 1);
}

/// Calls keep resolving while other threads toggle unrelated macros.
#[test]
fn calls_run_alongside_writers() {
    let registry = Arc::new(Registry::new());
    let counter = CallCounter::new();
    registry.register("Stable", "echo", counter.echo()).unwrap();
    registry.register("Flaky", "echo", constant(json!(0))).unwrap();

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for _ in 0..PER_THREAD {
                registry.disable("Flaky", "echo");
                registry.enable("Flaky", "echo");
            }
        })
    };
    let readers: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let result = registry.call("Stable", "echo", &[json!(i)]).unwrap();
                    assert_eq!(result, json!([i]));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(counter.count(), THREADS * PER_THREAD);
}

/// A body that calls back into the registry does not deadlock, even while
/// another thread writes.
#[test]
fn reentrant_bodies_do_not_deadlock() {
    let registry = Arc::new(Registry::new());
    registry.register("Math", "one", constant(json!(1))).unwrap();

    let inner = Arc::clone(&registry);
    registry
        .register(
            "Math",
            "two",
            Callable::new(move |_, _| {
                let one = inner.call("Math", "one", &[])?;
                let one = one.as_value().and_then(serde_json::Value::as_i64).unwrap_or_default();
                inner.register("Math", "scratch", constant(json!(one))).ok();
                Ok(json!(one + 1))
            }),
        )
        .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.call("Math", "two", &[]).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), json!(2));
    }
    assert!(registry.has("Math", "scratch"));
}

/// A cached macro shared across threads keeps serving identical results.
#[test]
fn cached_macro_is_shared_across_threads() {
    let registry = Arc::new(Registry::new());
    let counter = CallCounter::new();
    let body = counter.echo();
    registry
        .builder("Report", "shared")
        .cached_for(move |ctx, params| body.call(ctx, params), Duration::ZERO)
        .register()
        .unwrap();

    registry.call("Report", "shared", &[json!("k")]).unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.call("Report", "shared", &[json!("k")]).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), json!(["k"]));
    }
    assert_eq!(counter.count(), 1);
}
