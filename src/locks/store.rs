//! Lock store adapter
//!
//! The store owns the lock records and provides the compare-and-swap that
//! makes acquire mutually exclusive. Every conditional write is evaluated
//! against the caller's `now`, so an expired record counts as vacant.

use super::types::{DeleteMode, EntityLock, LockKey, StoreWrite, UpsertMode};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::debug;

/// Persistence of entity locks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Lock held for `key` at `now`
    async fn find_active_lock(&self, key: &LockKey, now: DateTime<Utc>) -> Result<Option<EntityLock>>;

    /// Conditionally write `lock`; atomic with respect to other writes on the key
    async fn upsert_lock(&self, lock: EntityLock, mode: UpsertMode, now: DateTime<Utc>) -> Result<StoreWrite>;

    /// Conditionally delete the lock for `key`; atomic with respect to other writes on the key
    async fn delete_lock(&self, key: &LockKey, mode: DeleteMode, now: DateTime<Utc>) -> Result<StoreWrite>;

    /// Held locks of one tenant, ordered by key
    async fn list_active(&self, tenant_id: &str, now: DateTime<Utc>) -> Result<Vec<EntityLock>>;

    /// Drop records that are no longer held; returns how many were removed
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;

    fn name(&self) -> &'static str;
}

/// In-process lock store
///
/// DashMap's entry API locks the shard of the key for the duration of a
/// conditional write, which serializes writers per key.
#[derive(Debug, Clone, Default)]
pub struct MemoryLockStore {
    locks: Arc<DashMap<LockKey, EntityLock>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records currently stored, expired ones included
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn find_active_lock(&self, key: &LockKey, now: DateTime<Utc>) -> Result<Option<EntityLock>> {
        let held = self
            .locks
            .get(key)
            .map(|entry| entry.value().clone())
            .filter(|lock| lock.is_held_at(now));

        if held.is_none() {
            // lazy expiry
            self.locks.remove_if(key, |_, lock| !lock.is_held_at(now));
        }
        Ok(held)
    }

    async fn upsert_lock(&self, lock: EntityLock, mode: UpsertMode, now: DateTime<Utc>) -> Result<StoreWrite> {
        let write = match (self.locks.entry(lock.key.clone()), mode) {
            (Entry::Vacant(vacant), UpsertMode::CreateIfVacant) => {
                vacant.insert(lock.clone());
                StoreWrite::Applied(lock)
            }
            (Entry::Vacant(_), UpsertMode::RenewIfOwner) => StoreWrite::Missing,
            (Entry::Occupied(mut occupied), UpsertMode::CreateIfVacant) => {
                if occupied.get().is_held_at(now) {
                    StoreWrite::Held(occupied.get().clone())
                } else {
                    occupied.insert(lock.clone());
                    StoreWrite::Applied(lock)
                }
            }
            (Entry::Occupied(mut occupied), UpsertMode::RenewIfOwner) => {
                let current = occupied.get();
                if !current.is_held_at(now) {
                    occupied.remove();
                    StoreWrite::Missing
                } else if !current.is_owned_by(&lock.locked_by) {
                    StoreWrite::Held(current.clone())
                } else {
                    occupied.insert(lock.clone());
                    StoreWrite::Applied(lock)
                }
            }
        };
        Ok(write)
    }

    async fn delete_lock(&self, key: &LockKey, mode: DeleteMode, now: DateTime<Utc>) -> Result<StoreWrite> {
        let Entry::Occupied(occupied) = self.locks.entry(key.clone()) else {
            return Ok(StoreWrite::Missing);
        };

        let current = occupied.get();
        if !current.is_held_at(now) {
            occupied.remove();
            return Ok(StoreWrite::Missing);
        }

        let write = match mode {
            DeleteMode::Owner(user_id) if !current.is_owned_by(&user_id) => {
                StoreWrite::Held(current.clone())
            }
            DeleteMode::Owner(_) | DeleteMode::Force => StoreWrite::Applied(occupied.remove()),
        };
        Ok(write)
    }

    async fn list_active(&self, tenant_id: &str, now: DateTime<Utc>) -> Result<Vec<EntityLock>> {
        let mut locks: Vec<EntityLock> = self
            .locks
            .iter()
            .filter(|entry| entry.key().tenant_id == tenant_id && entry.value().is_held_at(now))
            .map(|entry| entry.value().clone())
            .collect();
        locks.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(locks)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let before = self.locks.len();
        self.locks.retain(|_, lock| lock.is_held_at(now));
        let removed = before.saturating_sub(self.locks.len());
        if removed > 0 {
            debug!(removed, "Purged expired locks");
        }
        Ok(removed)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
