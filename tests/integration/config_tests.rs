//! Configuration loading integration tests
//!
//! Loads YAML files from disk and builds a core from them.

#[cfg(test)]
mod tests {
    use crate::common::TestCore;
    use std::io::Write;
    use tenant_guard::config::Config;
    use tenant_guard::{AccessRequest, GuardError, PermissionPattern, Principal, Scope};

    const CONFIG: &str = r#"
rbac:
  super_admin_role: platform_owner
  read_actions: [read, list, export]
cache:
  context_ttl_secs: 120
  decision_ttl_secs: 10
locks:
  default_ttl_minutes: 15
  max_ttl_minutes: 60
audit:
  buffer_size: 64
logging:
  level: debug
"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let file = write_config(CONFIG);
        let config = Config::from_file(file.path()).await.unwrap();

        assert_eq!(config.rbac.super_admin_role, "platform_owner");
        assert!(config.rbac.is_read_action("export"));
        assert_eq!(config.cache.context_ttl_secs, 120);
        assert_eq!(config.locks.default_ttl_minutes, 15);
        assert_eq!(config.audit.buffer_size, 64);
        assert_eq!(config.logging.level, "debug");

        // unspecified sections keep their defaults
        assert!(!config.storage.redis.enabled);
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let err = Config::from_file("/nonexistent/tenant-guard.yaml").await.unwrap_err();
        assert!(matches!(err, GuardError::Config(_)));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Config::from_yaml("locks:\n  default_ttl_minutes: 120\n  max_ttl_minutes: 60\n")
            .unwrap_err();
        assert!(matches!(err, GuardError::Config(_)));

        let err = Config::from_yaml("cache:\n  decision_ttl_secs: 600\n").unwrap_err();
        assert!(err.to_string().contains("Cache config error"));

        let err = Config::from_yaml("rbac:\n  force_release_permission: '*.*.tenant'\n").unwrap_err();
        assert!(err.to_string().contains("RBAC config error"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let reloaded = Config::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(reloaded.rbac.read_actions, config.rbac.read_actions);
        assert_eq!(reloaded.locks.max_ttl_minutes, 60);
    }

    #[tokio::test]
    async fn test_core_honours_loaded_config() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let t = TestCore::with_config(config).await;
        t.assign("owner", "platform_owner");
        t.assign("u1", "t1:viewer");

        let owner = Principal::new("owner", "t1");
        let decision = t
            .core
            .check(&owner, &AccessRequest::new("drop", "tenants", Scope::Global))
            .await;
        assert!(decision.allowed);

        let export = AccessRequest::new("export", "jobs", Scope::Tenant).with_read_only_fallback();
        assert!(t.core.check(&Principal::new("u1", "t1"), &export).await.allowed);

        let err = t
            .core
            .acquire_lock("t1", "doc", "1", "u1", "", Some(61))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::Validation(_)));

        let lock = t
            .core
            .acquire_lock("t1", "doc", "1", "u1", "", None)
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!((lock.expires_at - lock.acquired_at).num_minutes(), 15);
    }

    #[test]
    fn test_force_release_pattern_parses() {
        let config = Config::default();
        let pattern: PermissionPattern = config.rbac.force_release_permission.parse().unwrap();
        assert_eq!(pattern.to_string(), "locks.force_release.tenant");
        assert!(!pattern.is_wildcard());
    }
}
