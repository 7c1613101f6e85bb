//! Application state shared by all request handlers.

use std::sync::Arc;

use statusdir_core::DirectoryStore;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The directory store, written by the rebuild pipeline and read here.
    pub store: Arc<DirectoryStore>,
}

impl AppState {
    pub fn new(store: Arc<DirectoryStore>) -> Self {
        Self { store }
    }
}
