//! Repository Module
//!
//! Data access layer for heroes.
//! Repository functions take the executor explicitly on every call and hold
//! no state of their own.

pub mod hero;

// Re-export for convenience
pub use hero as hero_repository;
