//! Cache Module
//!
//! Provides an in-process LRU cache with lazy TTL expiration.

mod entry;
mod lru;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use store::{EvictCallback, LruCache};
