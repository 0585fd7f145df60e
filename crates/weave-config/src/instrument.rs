//! Timing observations for include resolution.
//!
//! Attached to a [`Context`](crate::Context) as an optional decorator; each
//! resolver stage runs through [`Instrumentation::instrument`] when present.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::debug_span;

#[derive(Debug, Default)]
pub struct Instrumentation {
    observations: Mutex<BTreeMap<String, Observation>>,
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

/// Aggregated values of one observed metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObservationSummary {
    pub count: u64,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
}

impl Instrumentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, recording its duration as `{operation}_duration_s`.
    pub fn instrument<T>(&self, operation: &str, f: impl FnOnce() -> T) -> T {
        let span = debug_span!("instrument", operation);
        let _entered = span.enter();

        let started = Instant::now();
        let result = f();
        self.observe(
            &format!("{}_duration_s", operation),
            started.elapsed().as_secs_f64(),
        );
        result
    }

    /// Record one value for the metric `name`.
    pub fn observe(&self, name: &str, value: f64) {
        let mut observations = self
            .observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        observations
            .entry(name.to_string())
            .and_modify(|obs| {
                obs.count += 1;
                obs.sum += value;
                obs.min = obs.min.min(value);
                obs.max = obs.max.max(value);
            })
            .or_insert(Observation {
                count: 1,
                sum: value,
                min: value,
                max: value,
            });
    }

    pub fn observations(&self) -> BTreeMap<String, ObservationSummary> {
        self.observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, obs)| {
                (
                    name.clone(),
                    ObservationSummary {
                        count: obs.count,
                        avg: obs.sum / obs.count as f64,
                        max: obs.max,
                        min: obs.min,
                    },
                )
            })
            .collect()
    }
}
