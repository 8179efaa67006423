//! Configuration validation
//!
//! - `trait_def`: Core Validate trait definition
//! - `rbac_validators`: permission resolution validators
//! - `cache_validators`: cache validators
//! - `lock_validators`: lock and audit validators
//! - `storage_validators`: storage validators

mod cache_validators;
mod lock_validators;
mod rbac_validators;
mod storage_validators;
mod trait_def;

pub use trait_def::{Validate, validate_section};
