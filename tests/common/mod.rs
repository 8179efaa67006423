//! Shared fixtures for the integration suite
//!
//! `TestCore` wires an `AccessCore` to an in-memory role store, a manual
//! clock and a capturing audit sink. `PolicyFactory` builds seeds and
//! principals.

pub mod assertions;
pub mod fixtures;

pub use fixtures::{PolicyFactory, TestCore};

/// Unwrap a `GuardError` result, naming the failing expression on panic
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => panic!("`{}` failed: {}", stringify!($expr), err),
        }
    };
}

/// Unwrap the error of a result that must fail
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => panic!("`{}` succeeded with {:?}", stringify!($expr), value),
            Err(err) => err,
        }
    };
}
