//! Foundation utilities shared by the stackctl crates: domain types, the error
//! model with exit-code mapping, logging setup and name validation.

pub mod error;
pub mod exit_codes;
pub mod group_name;
pub mod logging;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
