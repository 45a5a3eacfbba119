//! Shared utilities: error types, constants, configuration, and formatting helpers.

pub mod config;
pub mod constants;
pub mod error;
pub mod time;
