//! Read-only HTTP API over the statusdir directory.
//!
//! The collector binary mounts this router in the same process that rebuilds
//! the directory; handlers only ever read complete snapshots from the shared
//! store.

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
