//! Redis backends
//!
//! - `pool`: shared multiplexed connection
//! - `cache`: [`CacheBackend`](crate::core::traits::CacheBackend) for user contexts
//! - `locks`: [`LockStore`](crate::locks::LockStore) for entity locks

mod cache;
mod locks;
mod pool;

pub use cache::RedisCacheBackend;
pub use locks::RedisLockStore;
pub use pool::RedisPool;
