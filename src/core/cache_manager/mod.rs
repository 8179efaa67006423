//! In-memory cache backend
//!
//! - `types`: Cache entry and statistics
//! - `manager`: [`MemoryCacheBackend`] implementation

mod manager;
mod types;

pub use manager::{MemoryCacheBackend, escape_key_part, glob_to_regex};
pub use types::{CacheEntry, CacheStats};
pub(crate) use types::AtomicCacheStats;
