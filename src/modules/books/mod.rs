//! Book and chapter records, their key layout, and the sample dataset.

pub mod keys;
pub mod models;
pub mod seed;

pub use models::{Book, Chapter};
