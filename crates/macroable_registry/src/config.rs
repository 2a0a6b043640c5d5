//! Registry configuration.
//!
//! [`RegistryConfig`] carries the defaults the builder decorators fall back
//! to, plus the injectable time source and log sink.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use macroable_registry::{Registry, RegistryConfig};
//! use tracing::Level;
//!
//! let config = RegistryConfig::new()
//!     .with_default_cache_ttl(Duration::from_secs(60))
//!     .with_default_log_level(Level::INFO);
//!
//! let registry = Registry::with_config(config);
//! assert_eq!(registry.config().default_cache_ttl(), Duration::from_secs(60));
//! ```

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::Level;

use crate::error::MacroError;
use crate::logging::{MacroLogger, TracingLogger};
use crate::time::Clock;

/// TTL used by cached macros when none is given.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Level used by logged macros when none is given.
pub const DEFAULT_LOG_LEVEL: Level = Level::DEBUG;

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Clone)]
pub struct RegistryConfig {
    default_cache_ttl: Duration,
    default_log_level: Level,
    clock: Clock,
    logger: Arc<dyn MacroLogger>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_cache_ttl: DEFAULT_CACHE_TTL,
            default_log_level: DEFAULT_LOG_LEVEL,
            clock: Clock::default(),
            logger: Arc::new(TracingLogger),
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL used by `cached()`. [`Duration::ZERO`] caches forever.
    #[must_use]
    pub fn with_default_cache_ttl(mut self, ttl: Duration) -> Self {
        self.default_cache_ttl = ttl;
        self
    }

    /// Sets the level used by `logged()`.
    #[must_use]
    pub fn with_default_log_level(mut self, level: Level) -> Self {
        self.default_log_level = level;
        self
    }

    /// Sets the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the sink for logged macros.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn MacroLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// TTL used by `cached()`.
    #[must_use]
    pub fn default_cache_ttl(&self) -> Duration {
        self.default_cache_ttl
    }

    /// Level used by `logged()`.
    #[must_use]
    pub fn default_log_level(&self) -> Level {
        self.default_log_level
    }

    /// The configured time source.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// The configured log sink.
    #[must_use]
    pub fn logger(&self) -> &Arc<dyn MacroLogger> {
        &self.logger
    }
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("default_cache_ttl", &self.default_cache_ttl)
            .field("default_log_level", &self.default_log_level)
            .finish_non_exhaustive()
    }
}

/// Parses a log level name such as `"debug"` or `"warning"`.
///
/// # Errors
///
/// Returns [`MacroError::InvalidArgument`] for unknown names.
pub fn parse_level(name: &str) -> Result<Level, MacroError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(MacroError::invalid_argument(format!(
            "unknown log level '{other}'"
        ))),
    }
}
