//! Structured call records written by logged macros.
//!
//! A macro built with [`MacroBuilder::logged`](crate::builder::MacroBuilder::logged)
//! writes a [`LogRecord::Started`] before the body runs and either a
//! [`LogRecord::Finished`] or a [`LogRecord::Failed`] after it. Records go to
//! the [`MacroLogger`] configured on the registry; the default,
//! [`TracingLogger`], turns them into `tracing` events.

use std::time::{Duration, SystemTime};

use serde_json::Value;
use tracing::Level;

/// Sink for logged-macro records.
pub trait MacroLogger: Send + Sync + 'static {
    /// Handles one record.
    fn record(&self, record: &LogRecord);
}

/// One structured record emitted around a logged macro call.
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    /// Emitted before the body runs.
    Started {
        /// Level configured for the macro.
        level: Level,
        /// Host the macro was called on.
        host: String,
        /// Macro name.
        name: String,
        /// Call parameters.
        params: Vec<Value>,
        /// Wall-clock start time.
        started_at: SystemTime,
    },
    /// Emitted after the body returned successfully.
    Finished {
        /// Level configured for the macro.
        level: Level,
        /// Host the macro was called on.
        host: String,
        /// Macro name.
        name: String,
        /// Time spent in the body.
        elapsed: Duration,
        /// Type label of the returned value.
        result_type: &'static str,
    },
    /// Emitted after the body failed. Always logged at `ERROR`.
    Failed {
        /// Host the macro was called on.
        host: String,
        /// Macro name.
        name: String,
        /// Rendered failure.
        message: String,
        /// Time spent in the body.
        elapsed: Duration,
    },
}

impl LogRecord {
    /// The level the record is emitted at.
    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Self::Started { level, .. } | Self::Finished { level, .. } => *level,
            Self::Failed { .. } => Level::ERROR,
        }
    }

    /// Host of the logged call.
    #[must_use]
    pub fn host(&self) -> &str {
        match self {
            Self::Started { host, .. } | Self::Finished { host, .. } | Self::Failed { host, .. } => {
                host
            }
        }
    }

    /// Macro name of the logged call.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Started { name, .. } | Self::Finished { name, .. } | Self::Failed { name, .. } => {
                name
            }
        }
    }
}

// `tracing` levels must be known at compile time.
macro_rules! event_at {
    ($level:expr, $($args:tt)+) => {
        match $level {
            Level::TRACE => tracing::trace!($($args)+),
            Level::DEBUG => tracing::debug!($($args)+),
            Level::INFO => tracing::info!($($args)+),
            Level::WARN => tracing::warn!($($args)+),
            _ => tracing::error!($($args)+),
        }
    };
}

/// Default sink: emits every record as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl MacroLogger for TracingLogger {
    fn record(&self, record: &LogRecord) {
        match record {
            LogRecord::Started {
                level,
                host,
                name,
                params,
                started_at,
            } => {
                let params = Value::Array(params.clone());
                let started_ms = started_at
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .map_or(0, |since| {
                        u64::try_from(since.as_millis()).unwrap_or(u64::MAX)
                    });
                event_at!(
                    *level,
                    host = %host,
                    name = %name,
                    params = %params,
                    started_ms,
                    "macro call started"
                );
            }
            LogRecord::Finished {
                level,
                host,
                name,
                elapsed,
                result_type,
            } => {
                event_at!(
                    *level,
                    host = %host,
                    name = %name,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    result_type,
                    "macro call finished"
                );
            }
            LogRecord::Failed {
                host,
                name,
                message,
                elapsed,
            } => {
                tracing::error!(
                    host = %host,
                    name = %name,
                    error = %message,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    "macro call failed"
                );
            }
        }
    }
}
