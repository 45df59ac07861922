//! shelf application library
//!
//! HTTP modules and domain records for the key-value façade. The binary in
//! `main.rs` and `shelf-cli` are thin wrappers around this crate.

pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use modules::*;
