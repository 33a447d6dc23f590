//! Testing utilities and fixtures
//!
//! An in-memory [`BatchSource`] standing in for the agency, plus builders
//! for batch records.

use crate::agency::{Batch, BatchSource, BatchState, BatchSummary, HistoryEntry};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Build a batch record from `(state, time)` pairs
pub fn batch(id: &str, experiment_id: &str, state: &str, history: &[(&str, f64)]) -> Batch {
    Batch {
        id: id.to_string(),
        experiment_id: experiment_id.to_string(),
        state: BatchState::from(state),
        history: history
            .iter()
            .map(|(state, time)| HistoryEntry::new(*state, *time))
            .collect(),
        node: Some(format!("node-{id}")),
        mount: None,
        extra: serde_json::Map::new(),
    }
}

/// History of a batch that went through every milestone in order
pub fn milestone_history(start: f64) -> Vec<(&'static str, f64)> {
    vec![
        ("registered", start),
        ("scheduled", start + 2.0),
        ("processing", start + 5.0),
        ("succeeded", start + 10.0),
    ]
}

/// Listing entry for a batch record
pub fn summary_of(batch: &Batch) -> BatchSummary {
    BatchSummary {
        id: batch.id.clone(),
        experiment_id: batch.experiment_id.clone(),
        state: batch.state.clone(),
    }
}

/// In-memory agency
#[derive(Default)]
pub struct MemorySource {
    listings: HashMap<String, Vec<BatchSummary>>,
    details: HashMap<String, Batch>,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register batches; each is listed under its own experiment id
    pub fn with_batches(mut self, batches: impl IntoIterator<Item = Batch>) -> Self {
        for batch in batches {
            self.listings
                .entry(batch.experiment_id.clone())
                .or_default()
                .push(summary_of(&batch));
            self.details.insert(batch.id.clone(), batch);
        }
        self
    }

    /// Delay the detail response for one batch
    pub fn with_delay(mut self, batch_id: &str, delay: Duration) -> Self {
        self.delays.insert(batch_id.to_string(), delay);
        self
    }

    /// Make the detail request for one batch fail
    pub fn with_failure(mut self, batch_id: &str) -> Self {
        self.failing.insert(batch_id.to_string());
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    /// Highest number of detail requests that were in progress at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchSource for MemorySource {
    async fn list_batches(&self, experiment_id: &str) -> Result<Vec<BatchSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .listings
            .get(experiment_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_batch_detail(&self, batch_id: &str) -> Result<Batch> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .get(batch_id)
            .copied()
            .unwrap_or(Duration::from_millis(1));
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(batch_id) {
            return Err(Error::Config(format!("simulated failure for {batch_id}")));
        }

        self.details
            .get(batch_id)
            .cloned()
            .ok_or_else(|| Error::Config(format!("unknown batch {batch_id}")))
    }
}
