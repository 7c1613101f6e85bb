//! Directory listing route.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use statusdir_core::Entry;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DirectoryQuery {
    /// `all`, `true`, or `false`; absent means `true`.
    valid: Option<String>,
}

/// Serve the directory, filtered by validity.
pub async fn directory(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let filter = parse_valid_filter(query.valid.as_deref())?;

    let mut entries = state.store.snapshot();
    if let Some(valid) = filter {
        entries.retain(|entry| entry.valid == valid);
    }
    // Stable output order for clients and tests
    entries.sort_by(|a, b| a.url.cmp(&b.url));

    Ok(Json(entries))
}

/// `None` means no filtering; the default is valid-only.
fn parse_valid_filter(raw: Option<&str>) -> Result<Option<bool>, ApiError> {
    match raw {
        None => Ok(Some(true)),
        Some("all") => Ok(None),
        Some(value) => value.parse::<bool>().map(Some).map_err(|_| {
            ApiError::BadRequest(format!(
                "invalid valid filter '{}', expected all, true, or false",
                value
            ))
        }),
    }
}
