//! Core types and shared utilities for the statusdir system.
//!
//! This crate provides:
//! - The directory [`Entry`] record and validator verdict types
//! - The [`DirectoryStore`]: the authoritative URL→Entry map with merge,
//!   snapshot, and crash-safe persistence
//! - Generic JSON flattening into leaf field paths
//! - Prometheus metrics helpers
//! - Shared error types

mod entry;
mod error;
pub mod flatten;
pub mod metrics;
pub mod store;

pub use entry::{Entry, FieldError, Verdict};
pub use error::{Error, Result};
pub use flatten::flatten;
pub use store::DirectoryStore;
