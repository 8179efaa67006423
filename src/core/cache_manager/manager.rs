//! In-memory cache backend implementation

use super::types::CacheEntry;
use crate::core::traits::CacheBackend;
use crate::utils::error::{GuardError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Process-local cache backend with lazy expiry
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheBackend {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Percent-encode the characters that act as separators or glob syntax in keys
pub fn escape_key_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            ':' => escaped.push_str("%3A"),
            '*' => escaped.push_str("%2A"),
            '?' => escaped.push_str("%3F"),
            '[' => escaped.push_str("%5B"),
            ']' => escaped.push_str("%5D"),
            '\\' => escaped.push_str("%5C"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Translate a `*` glob into an anchored regex
pub fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", body))
        .map_err(|e| GuardError::cache(format!("Invalid key pattern '{}': {}", pattern, e)))
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
        } else {
            return Ok(None);
        }

        self.entries.remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<usize> {
        let matcher = glob_to_regex(pattern)?;
        let before = self.entries.len();
        self.entries.retain(|key, _| !matcher.is_match(key));
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn purge_expired(&self) -> Result<usize> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        Ok(removed)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
