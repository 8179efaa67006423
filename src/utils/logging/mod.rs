//! Logging utilities
//!
//! This module installs the global `tracing` subscriber.

mod subscriber;

pub use subscriber::{build_filter, init_tracing};
