//! Rebuild cycle orchestration.
//!
//! One cycle is the whole List → Build → Merge → Reconcile → Persist chain.
//! The cycle loop owns the rebuilder, so cycles are strictly sequential: a
//! tick that fires while a cycle is still running is delayed, never run
//! concurrently against the same store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, gauge};
use serde_json::Value;
use statusdir_core::{DirectoryStore, Result};
use tokio::time::MissedTickBehavior;

use crate::builder::EntryBuilder;
use crate::scheduler;
use crate::source::SourceLister;
use crate::stats::StatsReconciler;
use crate::validator::Validate;

/// Runs rebuild cycles against the shared directory store.
pub struct Rebuilder<V> {
    lister: SourceLister,
    builder: Arc<EntryBuilder<V>>,
    store: Arc<DirectoryStore>,
    stats: StatsReconciler,
    batch_deadline: Duration,
}

impl<V: Validate + 'static> Rebuilder<V> {
    pub fn new(
        lister: SourceLister,
        builder: Arc<EntryBuilder<V>>,
        store: Arc<DirectoryStore>,
        batch_deadline: Duration,
    ) -> Self {
        Self {
            lister,
            builder,
            store,
            stats: StatsReconciler::new(),
            batch_deadline,
        }
    }

    /// Run one full rebuild cycle.
    ///
    /// Per-URL failures are contained in their entries and never fail the
    /// cycle. A discovery failure degrades to an empty candidate list, which
    /// skips eviction. Only a persistence failure is returned as an error;
    /// the in-memory directory remains servable either way.
    pub async fn run_cycle(&mut self) -> Result<()> {
        let start = Instant::now();
        tracing::info!("rebuilding directory...");

        let candidates = match self.lister.list().await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "discovery list fetch failed, skipping eviction this cycle"
                );
                Vec::new()
            }
        };

        let results =
            scheduler::run(Arc::clone(&self.builder), &candidates, self.batch_deadline).await;
        tracing::info!(
            candidates = candidates.len(),
            results = results.len(),
            "fetch batch finished"
        );

        self.store.merge(results, &candidates);

        let snapshot = self.store.snapshot();
        let documents: Vec<&Value> = snapshot
            .iter()
            .filter(|entry| entry.valid)
            .filter_map(|entry| entry.data.as_ref())
            .collect();
        let outcome = self.stats.reconcile(documents);
        tracing::info!(
            facts = outcome.current,
            activated = outcome.activated.len(),
            retired = outcome.retired.len(),
            "statistics reconciled"
        );

        self.store.persist()?;

        gauge!("directory_rebuild_seconds").set(start.elapsed().as_secs_f64());
        counter!("directory_rebuild_total").increment(1);
        tracing::info!(elapsed = ?start.elapsed(), "rebuilding done");
        Ok(())
    }

    /// Run cycles forever: once immediately, then on every interval tick.
    pub async fn run(mut self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // First tick completes immediately, giving the startup cycle
            ticker.tick().await;
            if let Err(e) = self.run_cycle().await {
                tracing::error!(error = %e, "rebuild cycle failed");
            }
        }
    }
}
