//! Timeline reconstruction for one experiment
//!
//! Turns the raw batch list of an experiment into a [`DetailedResult`]:
//! a tally of current states, the per-batch histories, and the wall-clock
//! span of the whole experiment.

pub mod extract;

pub use extract::{duration_in_state, duration_or_zero, timestamp_of_state, StateSpan};

use crate::agency::{Batch, BatchState, HistoryEntry};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// History of one batch that recorded at least one transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchHistory {
    pub history: Vec<HistoryEntry>,
    pub node: Option<String>,
    /// Final state of the batch; absent in results cached by older versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<BatchState>,
}

/// Reconstructed timeline of one experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedResult {
    pub experiment_id: String,
    /// Number of batches per current state
    pub states: BTreeMap<String, usize>,
    /// Current state of every batch, in listing order
    pub batch_states: Vec<BatchState>,
    /// Histories of the batches that have one, in listing order
    pub batch_histories: Vec<BatchHistory>,
    /// Seconds between the first and the last recorded transition
    pub total_time: f64,
    /// Mount flag of the last batch that reported one
    pub mount: bool,
}

impl DetailedResult {
    /// Number of batches with a recorded history
    pub fn history_count(&self) -> usize {
        self.batch_histories.len()
    }
}

/// Count batches per state
pub fn state_tally<'a>(states: impl IntoIterator<Item = &'a BatchState>) -> BTreeMap<String, usize> {
    let mut tally = BTreeMap::new();
    for state in states {
        *tally.entry(state.to_string()).or_insert(0) += 1;
    }
    tally
}

/// Reconstruct an experiment's timeline, tallying the batches' own states
pub fn reconstruct(experiment_id: &str, batches: &[Batch]) -> Result<DetailedResult> {
    reconstruct_with_states(
        experiment_id,
        batches,
        state_tally(batches.iter().map(|b| &b.state)),
    )
}

/// Reconstruct an experiment's timeline with a precomputed state tally
///
/// The tally is taken as given, so callers can use the counts from the
/// agency's listing even when the batch records come from the cache.
pub fn reconstruct_with_states(
    experiment_id: &str,
    batches: &[Batch],
    states: BTreeMap<String, usize>,
) -> Result<DetailedResult> {
    let mut batch_states = Vec::with_capacity(batches.len());
    let mut batch_histories = Vec::new();
    let mut mount = false;

    for batch in batches {
        if let Some(flag) = batch.mount {
            mount = flag;
        }

        batch_states.push(batch.state.clone());

        if !batch.history.is_empty() {
            batch_histories.push(BatchHistory {
                history: batch.history.clone(),
                node: batch.node.clone(),
                state: Some(batch.state.clone()),
            });
        }
    }

    Ok(DetailedResult {
        experiment_id: experiment_id.to_string(),
        states,
        batch_states,
        batch_histories,
        total_time: total_time(experiment_id, batches)?,
        mount,
    })
}

/// Latest minus earliest history time across all batches
pub fn total_time(experiment_id: &str, batches: &[Batch]) -> Result<f64> {
    let span = batches
        .iter()
        .flat_map(|batch| batch.history.iter().map(|entry| entry.time))
        .fold(None, |span: Option<(f64, f64)>, time| match span {
            None => Some((time, time)),
            Some((start, end)) => Some((start.min(time), end.max(time))),
        });

    span.map(|(start, end)| end - start)
        .ok_or_else(|| Error::EmptyTimeline {
            experiment_id: experiment_id.to_string(),
        })
}

#[cfg(test)]
mod tests;
