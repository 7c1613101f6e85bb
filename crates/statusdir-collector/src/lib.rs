//! Directory-build pipeline for the statusdir system.
//!
//! This crate discovers candidate status endpoints, fetches and validates
//! them concurrently, merges the results into the shared directory store,
//! derives field/version usage statistics, and persists the directory.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ SourceLister │  Discovery list → candidate URLs
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │  scheduler   │  One EntryBuilder task per URL, fan-in over a
//! └──────┬───────┘  bounded channel, batch deadline
//!        │
//!        ▼
//! ┌──────────────┐
//! │DirectoryStore│  Merge with last-seen carry-forward and eviction,
//! └──────┬───────┘  atomic JSON persistence
//!        │
//!        ▼
//! ┌──────────────┐
//! │StatsReconciler│ Field-presence facts, exact set diff against the
//! └──────────────┘  previous cycle
//! ```
//!
//! One rebuild cycle runs the whole chain; cycles are strictly sequential.

pub mod builder;
pub mod rebuild;
pub mod scheduler;
pub mod source;
pub mod stats;
pub mod validator;

pub use builder::EntryBuilder;
pub use rebuild::Rebuilder;
pub use source::SourceLister;
pub use stats::{Fact, Reconciliation, StatsReconciler};
pub use validator::{HttpValidator, Validate};
