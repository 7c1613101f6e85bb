//! Fan-out/fan-in batch scheduling.
//!
//! One entry-builder task is spawned per candidate URL; results are collected
//! over a bounded channel so producers can't outrun the consumer without
//! bound. The whole batch is time-boxed: URLs whose task has not completed by
//! the deadline are abandoned and simply have no result this cycle. The merge
//! step treats a missing result as "unknown this cycle", never as eviction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use statusdir_core::Entry;
use tokio::sync::mpsc;

use crate::builder::EntryBuilder;
use crate::validator::Validate;

/// Capacity of the fan-in result channel.
const RESULT_QUEUE_DEPTH: usize = 32;

/// Fetch and validate all candidate URLs concurrently.
///
/// Returns the entries for all builds that completed within `batch_deadline`,
/// keyed by URL.
pub async fn run<V>(
    builder: Arc<EntryBuilder<V>>,
    urls: &[String],
    batch_deadline: Duration,
) -> HashMap<String, Entry>
where
    V: Validate + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Entry>(RESULT_QUEUE_DEPTH);

    for url in urls {
        let builder = Arc::clone(&builder);
        let tx = tx.clone();
        let url = url.clone();
        tokio::spawn(async move {
            let entry = builder.build(&url).await;
            // The receiver may be gone if the batch deadline already fired
            let _ = tx.send(entry).await;
        });
    }
    drop(tx);

    let mut results = HashMap::with_capacity(urls.len());
    let deadline = tokio::time::sleep(batch_deadline);
    tokio::pin!(deadline);

    while results.len() < urls.len() {
        tokio::select! {
            _ = &mut deadline => {
                tracing::warn!(
                    collected = results.len(),
                    expected = urls.len(),
                    "batch deadline reached, abandoning outstanding builds"
                );
                break;
            }
            received = rx.recv() => {
                match received {
                    Some(entry) => {
                        results.insert(entry.url.clone(), entry);
                    }
                    None => break,
                }
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use serde_json::Value;
    use statusdir_core::{Result, Verdict};
    use std::net::SocketAddr;

    /// Validator that accepts everything.
    struct AcceptAll;

    impl Validate for AcceptAll {
        async fn validate(&self, _url: &str, document: &Value) -> Result<Verdict> {
            Ok(Verdict {
                valid: true,
                errors: vec![],
                validated_document: Some(document.clone()),
            })
        }
    }

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn builder(request_timeout: Duration) -> Arc<EntryBuilder<AcceptAll>> {
        Arc::new(EntryBuilder::new(
            reqwest::Client::new(),
            AcceptAll,
            request_timeout,
        ))
    }

    #[tokio::test]
    async fn collects_one_result_per_url() {
        let addr = serve(
            Router::new()
                .route("/1", get(|| async { r#"{"api":"0.13","space":"A"}"# }))
                .route("/2", get(|| async { r#"{"api":"0.13","space":"B"}"# }))
                .route("/3", get(|| async { "nope" })),
        )
        .await;

        let urls: Vec<String> = ["/1", "/2", "/3"]
            .iter()
            .map(|p| format!("http://{}{}", addr, p))
            .collect();

        let results = run(builder(Duration::from_secs(5)), &urls, Duration::from_secs(10)).await;

        assert_eq!(results.len(), 3);
        assert!(results[&urls[0]].valid);
        assert!(results[&urls[1]].valid);
        assert!(!results[&urls[2]].valid);
    }

    #[tokio::test]
    async fn failed_builds_still_produce_results() {
        // Nothing listens on this port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let urls = vec![format!("http://{}/gone", addr)];
        let results = run(builder(Duration::from_secs(2)), &urls, Duration::from_secs(10)).await;

        assert_eq!(results.len(), 1);
        assert!(!results[&urls[0]].valid);
    }

    #[tokio::test]
    async fn slow_task_is_abandoned_at_the_batch_deadline() {
        let addr = serve(
            Router::new()
                .route("/fast", get(|| async { r#"{"api":"0.13","space":"A"}"# }))
                .route(
                    "/slow",
                    get(|| async {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        "{}"
                    }),
                ),
        )
        .await;

        let fast = format!("http://{}/fast", addr);
        let slow = format!("http://{}/slow", addr);
        let urls = vec![fast.clone(), slow];

        let results = run(
            builder(Duration::from_secs(60)),
            &urls,
            Duration::from_millis(500),
        )
        .await;

        // The slow URL has no result this cycle; the fast one completed
        assert_eq!(results.len(), 1);
        assert!(results.contains_key(&fast));
    }

    #[tokio::test]
    async fn empty_url_list_returns_immediately() {
        let results = run(builder(Duration::from_secs(1)), &[], Duration::from_secs(10)).await;
        assert!(results.is_empty());
    }
}
