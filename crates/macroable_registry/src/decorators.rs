//! Wrappers applied by the builder's decorator setters.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use hashbrown::HashMap;
use parking_lot::Mutex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::Level;

use crate::callable::{Callable, MacroValue};
use crate::error::MacroError;
use crate::logging::{LogRecord, MacroLogger};
use crate::time::Clock;

/// Cached results keyed by the SHA-256 of the serialized parameters.
pub(crate) type CacheMap = Arc<Mutex<HashMap<[u8; 32], CacheSlot>>>;

#[derive(Debug, Clone)]
pub(crate) struct CacheSlot {
    value: MacroValue,
    // `None` never expires.
    expires_at: Option<Instant>,
}

impl CacheSlot {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

/// Turns a `null` result into [`MacroValue::Receiver`].
pub(crate) fn chainable(inner: Callable) -> Callable {
    Callable::new(move |ctx, params| {
        Ok(match inner.call(ctx, params)? {
            MacroValue::Value(Value::Null) => MacroValue::Receiver,
            other => other,
        })
    })
}

/// Memoizes results per parameter list for `ttl`; a zero TTL never expires.
pub(crate) fn cached(inner: Callable, ttl: Duration, clock: Clock, cache: CacheMap) -> Callable {
    Callable::new(move |ctx, params| {
        let key = cache_key(params)?;

        if let Some(slot) = cache.lock().get(&key)
            && slot.is_fresh(clock.now())
        {
            return Ok(slot.value.clone());
        }

        let value = inner.call(ctx, params)?;
        // A TTL too large to represent as an instant never expires.
        let expires_at = if ttl.is_zero() {
            None
        } else {
            clock.now().checked_add(ttl)
        };
        cache.lock().insert(
            key,
            CacheSlot {
                value: value.clone(),
                expires_at,
            },
        );
        Ok(value)
    })
}

fn cache_key(params: &[Value]) -> Result<[u8; 32], MacroError> {
    let bytes = serde_json::to_vec(params)?;
    Ok(Sha256::digest(&bytes).into())
}

/// Writes start/finish/failure records around every call.
pub(crate) fn logged(
    inner: Callable,
    level: Level,
    clock: Clock,
    logger: Arc<dyn MacroLogger>,
) -> Callable {
    Callable::new(move |ctx, params| {
        let host = ctx.host().to_owned();
        let name = ctx.name().to_owned();

        logger.record(&LogRecord::Started {
            level,
            host: host.clone(),
            name: name.clone(),
            params: params.to_vec(),
            started_at: SystemTime::now(),
        });

        let start = clock.now();
        let result = inner.call(ctx, params);
        let elapsed = clock.elapsed_since(start);

        match &result {
            Ok(value) => logger.record(&LogRecord::Finished {
                level,
                host,
                name,
                elapsed,
                result_type: value.type_name(),
            }),
            Err(error) => logger.record(&LogRecord::Failed {
                host,
                name,
                message: error.to_string(),
                elapsed,
            }),
        }

        result
    })
}
