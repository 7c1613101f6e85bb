//! Discovery list fetching.
//!
//! The discovery source is a JSON object mapping arbitrary keys to endpoint
//! URL strings. Any non-string value or malformed JSON is a list-fetch
//! failure; the caller then treats the candidate list as empty and must skip
//! eviction-by-absence for the cycle.

use std::time::Instant;

use metrics::{counter, gauge};
use serde_json::Value;
use statusdir_core::{Error, Result};

/// Fetches and decodes the discovery list.
pub struct SourceLister {
    client: reqwest::Client,
    url: String,
}

impl SourceLister {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Fetch the discovery list and return the candidate URLs.
    pub async fn list(&self) -> Result<Vec<String>> {
        let start = Instant::now();
        counter!("directory_source_scrape_total").increment(1);

        let result = self.fetch().await;

        gauge!("directory_source_scrape_seconds").set(start.elapsed().as_secs_f64());
        result
    }

    async fn fetch(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Source(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Source(format!("discovery list returned {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Source(format!("discovery list is not valid JSON: {}", e)))?;

        let Value::Object(map) = body else {
            return Err(Error::Source("discovery list is not a JSON object".into()));
        };

        let mut urls = Vec::with_capacity(map.len());
        for (key, value) in &map {
            let url = value.as_str().ok_or_else(|| {
                Error::Source(format!("discovery entry '{}' is not a URL string", key))
            })?;
            urls.push(url.to_string());
        }

        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use std::net::SocketAddr;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn lists_urls_from_discovery_object() {
        let addr = serve(Router::new().route(
            "/directory.json",
            get(|| async { r#"{"a":"http://x/1","b":"http://x/2"}"# }),
        ))
        .await;

        let lister = SourceLister::new(
            reqwest::Client::new(),
            format!("http://{}/directory.json", addr),
        );

        let mut urls = lister.list().await.unwrap();
        urls.sort();
        assert_eq!(urls, vec!["http://x/1", "http://x/2"]);
    }

    #[tokio::test]
    async fn non_string_value_is_a_source_failure() {
        let addr = serve(Router::new().route(
            "/directory.json",
            get(|| async { r#"{"a":"http://x/1","b":42}"# }),
        ))
        .await;

        let lister = SourceLister::new(
            reqwest::Client::new(),
            format!("http://{}/directory.json", addr),
        );

        assert!(matches!(lister.list().await, Err(Error::Source(_))));
    }

    #[tokio::test]
    async fn malformed_json_is_a_source_failure() {
        let addr = serve(Router::new().route("/directory.json", get(|| async { "not json" }))).await;

        let lister = SourceLister::new(
            reqwest::Client::new(),
            format!("http://{}/directory.json", addr),
        );

        assert!(matches!(lister.list().await, Err(Error::Source(_))));
    }

    #[tokio::test]
    async fn unreachable_source_is_a_source_failure() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let lister = SourceLister::new(reqwest::Client::new(), format!("http://{}/", addr));
        assert!(matches!(lister.list().await, Err(Error::Source(_))));
    }
}
