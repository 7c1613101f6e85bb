//! Prometheus metrics helpers for the statusdir system.
//!
//! Centralizes recorder initialization and the metric descriptions used by
//! the collector and the serving layer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use statusdir_core::metrics::{init_metrics, metrics_router};
//!
//! #[tokio::main]
//! async fn main() {
//!     let handle = init_metrics();
//!     let app = my_router().merge(metrics_router(handle));
//!
//!     metrics::counter!("directory_source_scrape_total").increment(1);
//! }
//! ```

use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
///
/// Must be called once at startup before any metrics are recorded.
///
/// # Panics
///
/// Panics if called more than once (the recorder can only be installed once).
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    register_directory_metrics();

    handle
}

/// Like [`init_metrics`] but returns `None` if a recorder is already
/// installed, instead of panicking. Useful for tests.
pub fn try_init_metrics() -> Option<PrometheusHandle> {
    PrometheusBuilder::new().install_recorder().ok()
}

/// Build the `/metrics` router for the given handle.
///
/// The caller merges this into its own router so the directory API and the
/// metrics endpoint share one listener.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}

/// Register descriptions for the directory metrics.
///
/// Called automatically by [`init_metrics`].
fn register_directory_metrics() {
    describe_histogram!(
        "directory_fetch_seconds",
        "Per-endpoint fetch+validate latency (labels: route, error)"
    );
    describe_gauge!(
        "directory_field",
        "Field presence in valid documents, 1=present 0=retired (labels: version, space, field)"
    );
    describe_gauge!(
        "directory_version_documents",
        "Number of valid documents per declared version (label: version)"
    );
    describe_gauge!(
        "directory_source_scrape_seconds",
        "Time used to fetch the discovery list"
    );
    describe_counter!(
        "directory_source_scrape_total",
        "Discovery list fetch attempts"
    );
    describe_gauge!(
        "directory_entries",
        "Entries in the directory (label: valid)"
    );
    describe_gauge!(
        "directory_rebuild_seconds",
        "Duration of the last rebuild cycle"
    );
    describe_counter!("directory_rebuild_total", "Completed rebuild cycles");
}
