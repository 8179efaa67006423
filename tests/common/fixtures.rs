//! Test fixtures and data factories
//!
//! Fixtures build a real [`AccessCore`] over in-memory stores. Nothing here
//! is mocked.

use chrono::Utc;
use std::sync::Arc;
use tenant_guard::audit::MemoryAuditSink;
use tenant_guard::auth::MemoryRoleStore;
use tenant_guard::config::Config;
use tenant_guard::locks::ManualClock;
use tenant_guard::{AccessCore, PolicySeed, Principal};
use uuid::Uuid;

/// Access core wired to inspectable collaborators
pub struct TestCore {
    pub core: AccessCore,
    pub store: Arc<MemoryRoleStore>,
    pub sink: MemoryAuditSink,
    pub clock: Arc<ManualClock>,
}

impl TestCore {
    /// Core with the platform roles and tenants `t1` and `t2`
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let store = MemoryRoleStore::with_defaults(&config.rbac.super_admin_role).unwrap();
        store.seed_tenant_roles("t1");
        store.seed_tenant_roles("t2");
        Self::with_store(config, store).await
    }

    pub async fn with_store(config: Config, store: MemoryRoleStore) -> Self {
        let store = Arc::new(store);
        let sink = MemoryAuditSink::new();
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let core = AccessCore::builder(config)
            .with_role_store(store.clone())
            .with_audit_sink(Arc::new(sink.clone()))
            .with_clock(clock.clone())
            .build()
            .await
            .unwrap();

        Self {
            core,
            store,
            sink,
            clock,
        }
    }

    /// Assign directly in the store, bypassing cache invalidation
    pub fn assign(&self, user_id: &str, role_id: &str) {
        self.store.assign(user_id, role_id);
    }

    /// Wait for queued audit events to reach the sink
    pub async fn flush_audit(&self) {
        self.core.audit().flush().await;
    }
}

/// Factory for policy seeds and principals
pub struct PolicyFactory;

impl PolicyFactory {
    /// Seed with the built-in roles, one tenant and a few assignments
    pub fn acme() -> PolicySeed {
        PolicySeed::from_yaml(ACME_POLICY).unwrap()
    }

    /// Principal with a random user id
    pub fn stranger(tenant_id: &str) -> Principal {
        Principal::new(format!("user_{}", &Uuid::new_v4().to_string()[..8]), tenant_id)
    }
}

const ACME_POLICY: &str = r#"
include_defaults: true
tenants: [acme, globex]
roles:
  - id: acme:billing
    name: billing
    tenant_id: acme
permissions:
  - id: invoices.approve
    name: Approve invoices
    pattern: invoices.approve.account
    priority: 10
grants:
  - role: acme:billing
    permissions: [invoices.approve]
assignments:
  - user: alice
    roles: [acme:tenant_admin]
  - user: bob
    roles: [acme:member]
  - user: carol
    roles: [acme:billing, acme:viewer]
  - user: root
    roles: [super_admin]
"#;
