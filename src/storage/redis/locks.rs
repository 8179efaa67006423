//! Redis lock store
//!
//! One key per lock holding the JSON record, with a PX expiry equal to the
//! lock's remaining lifetime. Creation uses `SET NX PX`; owner-conditional
//! renew and release run as Lua scripts so the check and the write are one
//! atomic step on the server.

use super::pool::{RedisPool, scan_keys};
use crate::core::cache_manager::escape_key_part;
use crate::locks::{DeleteMode, EntityLock, LockKey, LockStore, StoreWrite, UpsertMode};
use crate::utils::error::{GuardError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::Script;
use tracing::debug;

/// Replace the record if its owner matches. Returns `{1, new}` when written,
/// `{2, current}` when held by someone else and `{0, ''}` when missing.
const RENEW_IF_OWNER: &str = r"
local current = redis.call('GET', KEYS[1])
if not current then
  return {0, ''}
end
if cjson.decode(current)['locked_by'] ~= ARGV[1] then
  return {2, current}
end
redis.call('SET', KEYS[1], ARGV[2], 'PX', ARGV[3])
return {1, ARGV[2]}
";

/// Delete the record if its owner matches, same return convention
const DELETE_IF_OWNER: &str = r"
local current = redis.call('GET', KEYS[1])
if not current then
  return {0, ''}
end
if cjson.decode(current)['locked_by'] ~= ARGV[1] then
  return {2, current}
end
redis.call('DEL', KEYS[1])
return {1, current}
";

const CREATE_ATTEMPTS: usize = 3;

/// [`LockStore`] backed by Redis
#[derive(Debug, Clone)]
pub struct RedisLockStore {
    pool: RedisPool,
}

impl RedisLockStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(&self, key: &LockKey) -> String {
        lock_key(self.pool.key_prefix(), key)
    }

    fn tenant_pattern(&self, tenant_id: &str) -> String {
        format!("{}:lock:{}:*", self.pool.key_prefix(), escape_key_part(tenant_id))
    }
}

pub(crate) fn lock_key(prefix: &str, key: &LockKey) -> String {
    format!(
        "{}:lock:{}:{}:{}",
        prefix,
        escape_key_part(&key.tenant_id),
        escape_key_part(&key.entity_type),
        escape_key_part(&key.entity_id)
    )
}

/// Milliseconds left until `lock` expires, at least 1
pub(crate) fn remaining_millis(lock: &EntityLock, now: DateTime<Utc>) -> i64 {
    (lock.expires_at - now).num_milliseconds().max(1)
}

fn decode(raw: &str) -> Result<EntityLock> {
    Ok(serde_json::from_str(raw)?)
}

fn script_result(status: i64, raw: String) -> Result<StoreWrite> {
    match status {
        0 => Ok(StoreWrite::Missing),
        1 => Ok(StoreWrite::Applied(decode(&raw)?)),
        2 => Ok(StoreWrite::Held(decode(&raw)?)),
        other => Err(GuardError::store(format!(
            "unexpected lock script status {}",
            other
        ))),
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn find_active_lock(&self, key: &LockKey, now: DateTime<Utc>) -> Result<Option<EntityLock>> {
        let mut conn = self.pool.connection();
        let raw: Option<String> = conn.get(self.key(key)).await?;
        match raw {
            Some(raw) => Ok(Some(decode(&raw)?).filter(|lock: &EntityLock| lock.is_held_at(now))),
            None => Ok(None),
        }
    }

    async fn upsert_lock(&self, lock: EntityLock, mode: UpsertMode, now: DateTime<Utc>) -> Result<StoreWrite> {
        let mut conn = self.pool.connection();
        let redis_key = self.key(&lock.key);
        let value = serde_json::to_string(&lock)?;
        let ttl = remaining_millis(&lock, now);

        match mode {
            UpsertMode::CreateIfVacant => {
                for _ in 0..CREATE_ATTEMPTS {
                    let created: Option<String> = redis::cmd("SET")
                        .arg(&redis_key)
                        .arg(&value)
                        .arg("NX")
                        .arg("PX")
                        .arg(ttl)
                        .query_async(&mut conn)
                        .await?;
                    if created.is_some() {
                        return Ok(StoreWrite::Applied(lock));
                    }

                    let current: Option<String> = conn.get(&redis_key).await?;
                    if let Some(current) = current {
                        return Ok(StoreWrite::Held(decode(&current)?));
                    }
                    // expired between SET NX and GET
                    debug!(key = %lock.key, "Lock vanished during create, retrying");
                }
                Err(GuardError::store(format!(
                    "could not create lock {} after {} attempts",
                    lock.key, CREATE_ATTEMPTS
                )))
            }
            UpsertMode::RenewIfOwner => {
                let (status, raw): (i64, String) = Script::new(RENEW_IF_OWNER)
                    .key(&redis_key)
                    .arg(&lock.locked_by)
                    .arg(&value)
                    .arg(ttl)
                    .invoke_async(&mut conn)
                    .await?;
                script_result(status, raw)
            }
        }
    }

    async fn delete_lock(&self, key: &LockKey, mode: DeleteMode, _now: DateTime<Utc>) -> Result<StoreWrite> {
        let mut conn = self.pool.connection();
        let redis_key = self.key(key);

        match mode {
            DeleteMode::Owner(user_id) => {
                let (status, raw): (i64, String) = Script::new(DELETE_IF_OWNER)
                    .key(&redis_key)
                    .arg(&user_id)
                    .invoke_async(&mut conn)
                    .await?;
                script_result(status, raw)
            }
            DeleteMode::Force => {
                let removed: Option<String> = redis::cmd("GETDEL")
                    .arg(&redis_key)
                    .query_async(&mut conn)
                    .await?;
                match removed {
                    Some(raw) => Ok(StoreWrite::Applied(decode(&raw)?)),
                    None => Ok(StoreWrite::Missing),
                }
            }
        }
    }

    async fn list_active(&self, tenant_id: &str, now: DateTime<Utc>) -> Result<Vec<EntityLock>> {
        let mut conn = self.pool.connection();
        let keys = scan_keys(&mut conn, &self.tenant_pattern(tenant_id)).await?;

        let mut locks = Vec::with_capacity(keys.len());
        for key in keys {
            let raw: Option<String> = conn.get(&key).await?;
            if let Some(raw) = raw {
                let lock = decode(&raw)?;
                if lock.is_held_at(now) {
                    locks.push(lock);
                }
            }
        }
        locks.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(locks)
    }

    /// Redis expires lock keys itself
    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize> {
        Ok(0)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
