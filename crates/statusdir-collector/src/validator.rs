//! Validator client.
//!
//! The validator is an external service that, given a raw JSON document,
//! returns a structured verdict (`valid`, field-level errors, and the parsed
//! document body). An HTTP 429 from the validator is a distinguished
//! rate-limit signal surfaced as [`Error::RateLimited`]; the entry builder
//! handles backoff and retry.

use std::future::Future;

use reqwest::StatusCode;
use serde_json::Value;
use statusdir_core::{Error, Result, Verdict};

/// A payload validator.
///
/// Implementations must map a rate-limit response to
/// [`Error::RateLimited`] so the caller can back off and retry against the
/// same already-fetched document.
pub trait Validate: Send + Sync {
    /// Validate a fetched document for the given endpoint URL.
    fn validate(&self, url: &str, document: &Value)
        -> impl Future<Output = Result<Verdict>> + Send;
}

/// Validator backed by an HTTP validation service.
pub struct HttpValidator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpValidator {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl Validate for HttpValidator {
    async fn validate(&self, url: &str, document: &Value) -> Result<Verdict> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(document)
            .send()
            .await
            .map_err(|e| Error::Validator(format!("validator unreachable for {}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            return Err(Error::Validator(format!("validator returned {}", status)));
        }

        response
            .json::<Verdict>()
            .await
            .map_err(|e| Error::Validator(format!("bad validator response: {}", e)))
    }
}
