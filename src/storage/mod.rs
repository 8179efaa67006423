//! Storage backends
//!
//! In-memory backends live next to their traits; this module holds the
//! shared-storage implementations.

#[cfg(feature = "redis")]
pub mod redis;
