//! A runtime extension registry for Rust host types.
//!

/// Registry, builder and host contract.
pub use macroable_registry as registry;

/// Subscriber setup for binaries.
#[cfg(feature = "subscriber")]
pub use macroable_tracing as tracing_setup;

pub use macroable_registry::{MacroError, Macroable, Registry, RegistryConfig};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use macroable_registry::{
        Binding, CallContext, Callable, Condition, MacroBuilder, MacroError, MacroSource,
        MacroValue, Macroable, Registry, RegistryConfig, Scope,
    };

    #[cfg(feature = "subscriber")]
    pub use macroable_tracing::{TracingFormat, TracingSetup};
}
