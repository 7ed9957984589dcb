//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached key/value pair and its optional deadline.
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    /// The key, duplicated in the index
    pub(crate) key: K,
    /// The stored value, never inspected by the cache
    pub(crate) value: V,
    /// Absolute expiration instant, None = no expiration
    pub(crate) expires_at: Option<Instant>,
}

impl<K, V> Entry<K, V> {
    // == Constructor ==
    /// Creates a new entry expiring at `expires_at`.
    pub fn new(key: K, value: V, expires_at: Option<Instant>) -> Self {
        Self {
            key,
            value,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is strictly after its
    /// deadline. Entries without a deadline never expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the time left before expiry, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the deadline has passed
    /// - `Some(remaining)` if the entry has a deadline in the future
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}

// == Utility Functions ==
/// Resolves the deadline for a new write.
///
/// A non-zero `ttl` wins, then a non-zero `default_ttl`; otherwise the
/// entry never expires.
pub(crate) fn deadline(ttl: Option<Duration>, default_ttl: Option<Duration>) -> Option<Instant> {
    ttl.filter(|d| !d.is_zero())
        .or_else(|| default_ttl.filter(|d| !d.is_zero()))
        .and_then(|d| Instant::now().checked_add(d))
}
