//! Time-windowed suppression of repeated identical errors.
//!
//! A render loop throwing every frame would otherwise flood the ingestion
//! endpoint; the window guarantees a burst of N identical records yields
//! exactly one delivery.

use faultline_common::ErrorRecord;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default trailing window during which identical signatures are suppressed.
pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

/// Bounded time-windowed cache keyed by record signature.
#[derive(Debug)]
pub struct Deduplicator {
    ttl: Duration,
    window: Mutex<HashMap<String, Instant>>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl Deduplicator {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            window: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if an identical record was already seen within the
    /// trailing window. A suppressed duplicate does not refresh its entry, so
    /// an error recurring past the window is delivered again.
    ///
    /// Sweep, lookup and insert happen under one lock so producers on other
    /// threads cannot interleave between the steps.
    pub fn should_suppress(&self, record: &ErrorRecord) -> bool {
        let now = Instant::now();
        let key = record.signature();
        let mut window = match self.window.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        window.retain(|_, expiry| *expiry > now);
        if window.contains_key(&key) {
            return true;
        }
        window.insert(key, now + self.ttl);
        false
    }
}
