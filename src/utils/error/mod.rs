//! Error handling utilities
//!
//! This module defines the crate-wide error type and the category mapping
//! route layers use to turn failures into responses.

mod category;
mod helpers;
mod types;

pub use category::ErrorCategory;
pub use types::{GuardError, Result};
