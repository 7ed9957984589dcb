//! Error types for the cache
//!
//! Provides construction-time error handling using thiserror.

use thiserror::Error;

// == Config Error Enum ==
/// Error returned when a cache is built with invalid parameters.
///
/// This is the only error the cache produces. Runtime operations signal
/// absent keys or an empty cache through `Option`/`bool` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Capacity was zero
    #[error("capacity must be positive")]
    ZeroCapacity,
}

// == Result Type Alias ==
/// Convenience Result type for cache construction.
pub type Result<T> = std::result::Result<T, ConfigError>;
