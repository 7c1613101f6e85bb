//! Field/version usage statistics.
//!
//! Each cycle, every valid document is flattened into field-presence facts:
//! (version, space, field-path) triples. The reconciler diffs the new fact
//! set against the previous cycle's set with exact set membership. Facts that
//! appeared get their gauge set to 1; facts that disappeared are set to 0
//! rather than deleted, so dashboards show the transition explicitly.

use std::collections::{HashMap, HashSet};

use metrics::gauge;
use serde_json::Value;
use statusdir_core::flatten;

/// One field-presence fact: this field path was observed in a valid document
/// of this version for this space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fact {
    pub version: String,
    pub space: String,
    pub field: String,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Facts present now but not in the previous cycle.
    pub activated: Vec<Fact>,
    /// Facts present in the previous cycle but gone now.
    pub retired: Vec<Fact>,
    /// Total facts in the current cycle.
    pub current: usize,
    /// Document count per declared or compatible version.
    pub versions: HashMap<String, usize>,
}

/// Reconciles per-cycle field-presence facts against the previous cycle.
///
/// The retained snapshot lives only in memory; after a restart the first
/// reconciliation treats all current facts as new, which is acceptable.
#[derive(Default)]
pub struct StatsReconciler {
    previous: HashSet<Fact>,
    previous_versions: HashSet<String>,
}

impl StatsReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute facts from this cycle's valid documents and update the
    /// exported gauges.
    ///
    /// Documents missing a string `api` version or a string `space`
    /// identifier carry no facts and are skipped.
    pub fn reconcile<'a, I>(&mut self, documents: I) -> Reconciliation
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut current = HashSet::new();
        let mut version_counts: HashMap<String, usize> = HashMap::new();

        for document in documents {
            let Some(version) = document.get("api").and_then(Value::as_str) else {
                continue;
            };
            let Some(space) = document.get("space").and_then(Value::as_str) else {
                continue;
            };

            // A document counts once per version it speaks: the declared
            // `api` plus every entry of `api_compatibility`
            let mut spoken: HashSet<&str> = HashSet::new();
            spoken.insert(version);
            if let Some(compat) = document.get("api_compatibility").and_then(Value::as_array) {
                spoken.extend(compat.iter().filter_map(Value::as_str));
            }
            for v in spoken {
                *version_counts.entry(v.to_string()).or_default() += 1;
            }

            for field in flatten(document) {
                current.insert(Fact {
                    version: version.to_string(),
                    space: space.to_string(),
                    field,
                });
            }
        }

        let activated: Vec<Fact> = current.difference(&self.previous).cloned().collect();
        let retired: Vec<Fact> = self.previous.difference(&current).cloned().collect();

        for fact in &activated {
            field_gauge(fact).set(1.0);
        }
        for fact in &retired {
            field_gauge(fact).set(0.0);
        }

        // Per-version document counts; versions that vanished drop to zero
        for (version, count) in &version_counts {
            gauge!("directory_version_documents", "version" => version.clone())
                .set(*count as f64);
        }
        for version in self.previous_versions.iter() {
            if !version_counts.contains_key(version) {
                gauge!("directory_version_documents", "version" => version.clone()).set(0.0);
            }
        }

        let reconciliation = Reconciliation {
            current: current.len(),
            activated,
            retired,
            versions: version_counts.clone(),
        };

        self.previous = current;
        self.previous_versions = version_counts.into_keys().collect();

        reconciliation
    }
}

fn field_gauge(fact: &Fact) -> metrics::Gauge {
    gauge!(
        "directory_field",
        "version" => fact.version.clone(),
        "space" => fact.space.clone(),
        "field" => fact.field.clone(),
    )
}
