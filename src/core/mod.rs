//! Core infrastructure shared by the authorization and lock modules
//!
//! - `traits`: cache backend trait
//! - `cache_manager`: in-memory cache backend
//! - `builder`: wiring of the [`AccessCore`] facade

pub mod builder;
pub mod cache_manager;
pub mod traits;

pub use builder::{AccessCore, AccessCoreBuilder};
pub use cache_manager::MemoryCacheBackend;
pub use traits::CacheBackend;
