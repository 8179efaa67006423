//! Access core facade and builder
//!
//! [`AccessCore`] is the surface the route layer talks to. The builder wires
//! the stores, caches and audit emitter from a [`Config`], defaulting to the
//! in-memory backends and switching to Redis when it is enabled.

use crate::audit::{AuditEmitter, AuditSink, TracingAuditSink};
use crate::auth::rbac::{
    AccessDecision, AccessDecisionEngine, AccessRequest, ContextResolver, MemoryRoleStore,
    PermissionCache, PermissionPattern, PermissionService, Principal, RoleAdmin, RoleAdminStore,
    RoleStore, UserContext,
};
use crate::config::Config;
use crate::core::cache_manager::MemoryCacheBackend;
use crate::core::traits::CacheBackend;
use crate::locks::{
    Clock, LockCoordinator, LockInfo, LockKey, LockOutcome, LockStore, MemoryLockStore, spawn_sweeper,
};
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Access-control and entity-locking core
pub struct AccessCore {
    config: Config,
    permissions: PermissionService,
    admin: RoleAdmin,
    locks: LockCoordinator,
    audit: Arc<AuditEmitter>,
    sweeper: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for AccessCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCore")
            .field("permissions", &self.permissions)
            .field("locks", &self.locks)
            .field("sweeper", &self.sweeper.is_some())
            .finish()
    }
}

impl AccessCore {
    pub fn builder(config: Config) -> AccessCoreBuilder {
        AccessCoreBuilder::new(config)
    }

    /// Resolve (or fetch from cache) the context of an authenticated principal
    pub async fn resolve_context(&self, principal: &Principal) -> Result<UserContext> {
        self.permissions.resolve_context(principal).await
    }

    /// Decide a request for a resolved context; `None` is denied
    pub async fn can_access(&self, context: Option<&UserContext>, request: &AccessRequest) -> AccessDecision {
        self.permissions.can_access(context, request).await
    }

    /// Resolve the principal and decide, failing closed
    pub async fn check(&self, principal: &Principal, request: &AccessRequest) -> AccessDecision {
        self.permissions.check(principal, request).await
    }

    pub async fn acquire_lock(
        &self,
        tenant_id: &str,
        entity_type: &str,
        entity_id: &str,
        locked_by: &str,
        reason: &str,
        ttl_minutes: Option<u64>,
    ) -> Result<LockOutcome> {
        let key = LockKey::new(tenant_id, entity_type, entity_id);
        self.locks
            .acquire_lock(&key, locked_by, reason, ttl_minutes)
            .await
    }

    pub async fn is_locked(&self, tenant_id: &str, entity_type: &str, entity_id: &str) -> Result<Option<LockInfo>> {
        self.locks
            .is_locked(&LockKey::new(tenant_id, entity_type, entity_id))
            .await
    }

    pub async fn renew_lock(
        &self,
        tenant_id: &str,
        entity_type: &str,
        entity_id: &str,
        requested_by: &str,
        ttl_minutes: Option<u64>,
    ) -> Result<LockOutcome> {
        let key = LockKey::new(tenant_id, entity_type, entity_id);
        self.locks.renew_lock(&key, requested_by, ttl_minutes).await
    }

    pub async fn release_lock(
        &self,
        tenant_id: &str,
        entity_type: &str,
        entity_id: &str,
        requested_by: &str,
    ) -> Result<LockOutcome> {
        let key = LockKey::new(tenant_id, entity_type, entity_id);
        self.locks.release_lock(&key, requested_by).await
    }

    pub async fn force_release_lock(
        &self,
        tenant_id: &str,
        entity_type: &str,
        entity_id: &str,
        forced_by: &str,
    ) -> Result<LockOutcome> {
        let key = LockKey::new(tenant_id, entity_type, entity_id);
        self.locks.force_release_lock(&key, forced_by).await
    }

    pub async fn list_locks(&self, tenant_id: &str) -> Result<Vec<LockInfo>> {
        self.locks.list_locks(tenant_id).await
    }

    pub fn permissions(&self) -> &PermissionService {
        &self.permissions
    }

    pub fn admin(&self) -> &RoleAdmin {
        &self.admin
    }

    pub fn locks(&self) -> &LockCoordinator {
        &self.locks
    }

    pub fn audit(&self) -> &Arc<AuditEmitter> {
        &self.audit
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stop the sweeper and wait for queued audit events
    pub async fn shutdown(mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
        self.audit.flush().await;
        info!("Access core shut down");
    }
}

impl Drop for AccessCore {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

/// Builder for [`AccessCore`]
pub struct AccessCoreBuilder {
    config: Config,
    role_reader: Option<Arc<dyn RoleStore>>,
    role_writer: Option<Arc<dyn RoleAdminStore>>,
    lock_store: Option<Arc<dyn LockStore>>,
    cache_backend: Option<Arc<dyn CacheBackend>>,
    audit_sink: Option<Arc<dyn AuditSink>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AccessCoreBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            role_reader: None,
            role_writer: None,
            lock_store: None,
            cache_backend: None,
            audit_sink: None,
            clock: None,
        }
    }

    /// Role/permission store; defaults to a [`MemoryRoleStore`]
    pub fn with_role_store<S>(mut self, store: Arc<S>) -> Self
    where
        S: RoleAdminStore + 'static,
    {
        self.role_reader = Some(store.clone());
        self.role_writer = Some(store);
        self
    }

    pub fn with_lock_store(mut self, store: Arc<dyn LockStore>) -> Self {
        self.lock_store = Some(store);
        self
    }

    pub fn with_cache_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.cache_backend = Some(backend);
        self
    }

    /// Audit sink; defaults to [`TracingAuditSink`]
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and wire every component
    ///
    /// Must be called inside a tokio runtime.
    pub async fn build(mut self) -> Result<AccessCore> {
        self.config.validate()?;
        self.connect_shared_backends().await?;

        let config = self.config;
        let (role_reader, role_writer) = match (self.role_reader, self.role_writer) {
            (Some(reader), Some(writer)) => (reader, writer),
            _ => {
                let store = if config.rbac.seed_default_roles {
                    MemoryRoleStore::with_defaults(&config.rbac.super_admin_role)?
                } else {
                    MemoryRoleStore::new()
                };
                let store = Arc::new(store);
                let reader: Arc<dyn RoleStore> = store.clone();
                let writer: Arc<dyn RoleAdminStore> = store;
                (reader, writer)
            }
        };

        let sink = self
            .audit_sink
            .unwrap_or_else(|| Arc::new(TracingAuditSink));
        let audit = Arc::new(AuditEmitter::new(config.audit.clone(), sink));

        let backend = self
            .cache_backend
            .unwrap_or_else(|| Arc::new(MemoryCacheBackend::new()));
        let cache = Arc::new(PermissionCache::new(
            backend.clone(),
            config.storage.redis.key_prefix.clone(),
            config.cache.clone(),
        ));

        let permissions = PermissionService::new(
            ContextResolver::new(role_reader, config.rbac.super_admin_role.clone()),
            cache.clone(),
            AccessDecisionEngine::new(&config.rbac, audit.clone()),
        );
        let admin = RoleAdmin::new(role_writer, cache, audit.clone());

        let force_release: PermissionPattern = config.rbac.force_release_permission.parse()?;
        let lock_store = self
            .lock_store
            .unwrap_or_else(|| Arc::new(MemoryLockStore::new()));
        let mut locks = LockCoordinator::new(
            lock_store.clone(),
            permissions.clone(),
            audit.clone(),
            config.locks.clone(),
        )
        .with_force_release_permission(force_release);
        if let Some(clock) = self.clock {
            locks = locks.with_clock(clock);
        }

        let sweeper = config
            .locks
            .sweep_interval()
            .map(|every| spawn_sweeper(locks.clone(), backend.clone(), every));

        info!(
            cache_backend = backend.name(),
            lock_store = lock_store.name(),
            audit = audit.is_enabled(),
            "Access core ready"
        );

        Ok(AccessCore {
            config,
            permissions,
            admin,
            locks,
            audit,
            sweeper,
        })
    }

    #[cfg(feature = "redis")]
    async fn connect_shared_backends(&mut self) -> Result<()> {
        use crate::storage::redis::{RedisCacheBackend, RedisLockStore, RedisPool};

        if !self.config.storage.redis.enabled {
            return Ok(());
        }
        if self.cache_backend.is_some() && self.lock_store.is_some() {
            return Ok(());
        }

        let pool = RedisPool::new(&self.config.storage.redis).await?;
        pool.health_check().await?;
        if self.cache_backend.is_none() {
            self.cache_backend = Some(Arc::new(RedisCacheBackend::new(pool.clone())));
        }
        if self.lock_store.is_none() {
            self.lock_store = Some(Arc::new(RedisLockStore::new(pool)));
        }
        Ok(())
    }

    #[cfg(not(feature = "redis"))]
    async fn connect_shared_backends(&mut self) -> Result<()> {
        if self.config.storage.redis.enabled {
            return Err(crate::utils::error::GuardError::config(
                "Redis storage is enabled but the crate was built without the `redis` feature",
            ));
        }
        Ok(())
    }
}
