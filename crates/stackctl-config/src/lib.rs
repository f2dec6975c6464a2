//! Configuration model, discovery, and validation for stackctl.

mod config;

pub use config::*;
