//! Per-endpoint entry building.
//!
//! One build is the fetch + validate round trip for a single URL. Every
//! failure is contained in the returned [`Entry`]; a build never aborts the
//! batch. A latency observation tagged with the error category is emitted on
//! every outcome branch.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use metrics::histogram;
use rand::Rng;
use serde_json::Value;
use statusdir_core::{Entry, Error};

use crate::validator::Validate;

/// Upper bound on validation attempts when the validator rate-limits us.
const MAX_VALIDATION_ATTEMPTS: u32 = 5;

/// Builds directory entries by fetching and validating endpoints.
pub struct EntryBuilder<V> {
    client: reqwest::Client,
    validator: V,
    request_timeout: Duration,
    backoff_unit: Duration,
}

impl<V: Validate> EntryBuilder<V> {
    pub fn new(client: reqwest::Client, validator: V, request_timeout: Duration) -> Self {
        Self {
            client,
            validator,
            request_timeout,
            backoff_unit: Duration::from_secs(1),
        }
    }

    /// Override the rate-limit backoff unit. Tests use milliseconds.
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Fetch and validate one endpoint.
    ///
    /// `last_seen` is set as soon as the endpoint produced a parseable
    /// document; it records reachability, not validity. The merge step later
    /// carries the previous value forward when it stays unset here.
    pub async fn build(&self, url: &str) -> Entry {
        let start = Instant::now();
        let mut entry = Entry::new(url);

        let error_tag = self.fill(url, &mut entry).await;

        histogram!(
            "directory_fetch_seconds",
            "route" => url.to_string(),
            "error" => error_tag,
        )
        .record(start.elapsed().as_secs_f64());

        entry
    }

    /// Run the fetch+validate steps, returning the error category for the
    /// latency observation ("" on a fully clean build).
    async fn fill(&self, url: &str, entry: &mut Entry) -> String {
        let response = match self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                entry.push_error(format!("fetch failed: {}", e));
                return "http".to_string();
            }
        };

        // Some endpoints return a document alongside an error status; keep
        // the status as a soft tag and read the body anyway.
        let status = response.status();
        let mut tag = String::new();
        if !status.is_success() {
            tag = format!("status {}", status.as_u16());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                entry.push_error(format!("can't read body: {}", e));
                return "body".to_string();
            }
        };

        let document: Value = match serde_json::from_str(&body) {
            Ok(document) => document,
            Err(_) => {
                entry.push_error("invalid json");
                return "json".to_string();
            }
        };

        entry.data = Some(document.clone());
        entry.last_seen = Some(unix_now());

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.validator.validate(url, &document).await {
                Ok(verdict) => {
                    entry.valid = verdict.valid;
                    if let Some(validated) = verdict.validated_document {
                        entry.data = Some(validated);
                    }
                    if !verdict.valid {
                        for field_error in &verdict.errors {
                            entry.push_error(field_error.message());
                        }
                        if tag.is_empty() {
                            tag = "invalid".to_string();
                        }
                    }
                    return tag;
                }
                Err(Error::RateLimited) => {
                    if attempt >= MAX_VALIDATION_ATTEMPTS {
                        entry.valid = false;
                        entry.push_error("validator unreachable");
                        return "ratelimited".to_string();
                    }
                    let units = rand::thread_rng().gen_range(1..=10u32);
                    tracing::debug!(
                        url,
                        attempt,
                        backoff_units = units,
                        "validator rate limited, backing off"
                    );
                    tokio::time::sleep(self.backoff_unit * units).await;
                }
                Err(e) => {
                    entry.push_error(e.to_string());
                    return "validation".to_string();
                }
            }
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
