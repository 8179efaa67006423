//! Integration tests for tenant-guard
//!
//! These tests drive the public API over in-memory stores and verify real
//! system behavior without mocking.

pub mod access_scenarios;
pub mod cache_invalidation;
pub mod config_tests;
pub mod lock_scenarios;
