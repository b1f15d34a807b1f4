//! Login Attempt Limiter (AC-7)
//!
//! NIST SP 800-53 AC-7 (Unsuccessful Logon Attempts) compliant tracking of
//! failed logins per principal. A bounded, time-expiring, concurrent cache
//! of failure counters; the caller inspects
//! [`has_exceeded_max_attempts`](LoginAttemptCache::has_exceeded_max_attempts)
//! and decides whether to lock the account.
//!
//! # Eviction
//!
//! Records expire a fixed window after their last write, so stale failures
//! never cause a permanent lockout and memory stays bounded. Expiry is
//! lazy: the queried key is checked on every access, and a full sweep runs
//! when the map is at capacity before admitting a new key. If the sweep
//! frees nothing, the stalest record is dropped.
//!
//! A record racing its own expiry is simply treated as absent. The
//! invariant: a record is absent exactly when there are zero recent
//! failures for that key.
//!
//! # Concurrency
//!
//! The map is sharded ([`DashMap`]), so requests for unrelated keys do not
//! serialize on one lock. The capacity check and the subsequent insert are
//! separate steps; under contention the map can transiently exceed
//! capacity by a few in-flight entries, which is acceptable for a bound
//! that exists to cap memory.
//!
//! # Storage Note
//!
//! In-memory tracking suits single-instance deployments. Distributed
//! deployments should place an equivalent counter in shared storage and
//! keep the same three operations.
//!
//! # Usage
//!
//! ```
//! use portcullis::login::{AttemptPolicy, LoginAttemptCache};
//!
//! let cache = LoginAttemptCache::new(AttemptPolicy::default());
//!
//! for _ in 0..5 {
//!     cache.record_failure("bob");
//! }
//! assert!(cache.has_exceeded_max_attempts("bob"));
//!
//! // Successful authentication resets the counter
//! cache.evict("bob");
//! assert!(!cache.has_exceeded_max_attempts("bob"));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::AuthConfig;

/// Policy for failed-login tracking (AC-7)
#[derive(Debug, Clone)]
pub struct AttemptPolicy {
    /// Failed attempts at or above which the principal counts as exceeded
    pub max_attempts: u32,

    /// Retention window, anchored to the record's last write
    pub window: Duration,

    /// Maximum number of records held at once
    pub capacity: usize,
}

impl Default for AttemptPolicy {
    /// 5 failures, 15-minute window, 100 tracked principals
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(15 * 60),
            capacity: 100,
        }
    }
}

impl AttemptPolicy {
    /// Derive the policy from pipeline configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            window: config.attempt_window,
            capacity: config.attempt_cache_capacity,
        }
    }
}

/// Failure counter for one principal
#[derive(Debug, Clone)]
struct AttemptRecord {
    count: u32,
    last_write: Instant,
}

impl AttemptRecord {
    fn is_expired(&self, window: Duration, now: Instant) -> bool {
        now.duration_since(self.last_write) >= window
    }
}

/// Bounded, time-expiring cache of failed-login counters.
///
/// Cheap to clone; clones share the underlying map. Safe for concurrent
/// use from multiple request-handling threads without serializing
/// unrelated keys.
#[derive(Debug)]
pub struct LoginAttemptCache {
    policy: AttemptPolicy,
    records: Arc<DashMap<String, AttemptRecord>>,
}

impl Clone for LoginAttemptCache {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy.clone(),
            records: Arc::clone(&self.records),
        }
    }
}

impl LoginAttemptCache {
    /// Create a cache with the given policy.
    pub fn new(policy: AttemptPolicy) -> Self {
        Self {
            policy,
            records: Arc::new(DashMap::new()),
        }
    }

    /// Create a cache with the default policy.
    pub fn with_default_policy() -> Self {
        Self::new(AttemptPolicy::default())
    }

    /// Record a failed attempt, creating the record if absent.
    ///
    /// Returns the current failure count for the key. The write also
    /// re-anchors the record's retention window.
    pub fn record_failure(&self, key: &str) -> u32 {
        let now = Instant::now();

        // Lazy expiry for the touched key
        self.records
            .remove_if(key, |_, r| r.is_expired(self.policy.window, now));

        if !self.records.contains_key(key) && self.records.len() >= self.policy.capacity {
            self.records
                .retain(|_, r| !r.is_expired(self.policy.window, now));

            if self.records.len() >= self.policy.capacity {
                // Sweep freed nothing; drop the stalest record
                let stalest = self
                    .records
                    .iter()
                    .min_by_key(|entry| entry.value().last_write)
                    .map(|entry| entry.key().clone());
                if let Some(stalest) = stalest {
                    self.records.remove(&stalest);
                }
            }
        }

        let mut record = self.records.entry(key.to_string()).or_insert(AttemptRecord {
            count: 0,
            last_write: now,
        });
        record.count += 1;
        record.last_write = now;
        let count = record.count;
        drop(record);

        tracing::debug!(
            key = %key,
            failed_count = count,
            "Recorded failed login attempt"
        );

        count
    }

    /// Check whether the stored counter has reached the maximum.
    ///
    /// Does not mutate state; an expired record counts as absent.
    pub fn has_exceeded_max_attempts(&self, key: &str) -> bool {
        let now = Instant::now();
        match self.records.get(key) {
            Some(record) if !record.is_expired(self.policy.window, now) => {
                record.count >= self.policy.max_attempts
            }
            _ => false,
        }
    }

    /// Get the current failure count for a key (0 if absent or expired).
    pub fn failure_count(&self, key: &str) -> u32 {
        let now = Instant::now();
        match self.records.get(key) {
            Some(record) if !record.is_expired(self.policy.window, now) => record.count,
            _ => 0,
        }
    }

    /// Remove the record for a key, returning the principal to a clean
    /// state. Call on every successful authentication.
    pub fn evict(&self, key: &str) {
        if self.records.remove(key).is_some() {
            tracing::debug!(key = %key, "Evicted login attempt record");
        }
    }

    /// Number of live (unexpired) records.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.records
            .iter()
            .filter(|entry| !entry.value().is_expired(self.policy.window, now))
            .count()
    }

    /// True when no live records are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired record. Runs automatically when the cache is at
    /// capacity; exposed for callers that want periodic housekeeping.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.records
            .retain(|_, r| !r.is_expired(self.policy.window, now));
    }
}
