//! ttl_lru - A fixed-capacity LRU cache with lazy TTL expiration
//!
//! Bounds a frequently-accessed working set by entry count, discarding the
//! least recently used entries first. Entries may carry their own TTL or
//! inherit a cache-wide default; expired entries are hidden from reads and
//! reaped lazily, without a background sweeper.
//!
//! The cache is single-threaded. Wrap it in a `Mutex` to share it.
//!
//! ```
//! use std::time::Duration;
//! use ttl_lru::LruCache;
//!
//! let mut cache = LruCache::new(2, None).unwrap();
//! cache.put("a", 1);
//! cache.put_with_ttl("b", 2, Duration::from_secs(60));
//! assert_eq!(cache.get("a"), Some(&1));
//!
//! // "b" is now the least recently used entry
//! assert!(cache.put("c", 3));
//! assert_eq!(cache.keys(), vec!["a", "c"]);
//! ```

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{EvictCallback, LruCache};
pub use config::CacheConfig;
pub use error::{ConfigError, Result};
