//! EventScope library crate.
//!
//! Re-exports the core modules so that integration tests and the command-line
//! front end share one pipeline. The binary entry point is in `main.rs`.

pub mod core;
pub mod export;
pub mod util;
