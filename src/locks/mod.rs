//! Entity locks
//!
//! Advisory, TTL-bounded mutual exclusion for records edited concurrently,
//! keyed by `(tenant_id, entity_type, entity_id)`.

mod clock;
mod coordinator;
mod store;
mod sweeper;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::LockCoordinator;
pub use store::{LockStore, MemoryLockStore};
pub use sweeper::spawn_sweeper;
pub use types::{DeleteMode, EntityLock, LockInfo, LockKey, LockOutcome, StoreWrite, UpsertMode};
