//! Utility modules for the access core
//!
//! - **error**: Error type, result alias and error categories
//! - **logging**: Tracing subscriber setup

pub mod error;
pub mod logging;

pub use error::{ErrorCategory, GuardError, Result};
