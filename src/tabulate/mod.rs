//! Flat per-batch tables over reconstructed timelines
//!
//! Every table is built one experiment at a time. An experiment's rows are
//! complete before they are appended, so an experiment that fails
//! contributes nothing.

pub mod csv_output;

pub use csv_output::{write_durations, write_success_rates, write_timestamps};

use crate::agency::BatchState;
use crate::error::{Error, Result};
use crate::timeline::{duration_or_zero, state_tally, timestamp_of_state, DetailedResult};
use std::collections::BTreeMap;

/// Milestone entry times of one batch
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampRow {
    pub experiment_id: String,
    pub registered: f64,
    pub scheduled: f64,
    pub processing: f64,
    pub succeeded: f64,
}

/// Time one batch spent waiting and running
#[derive(Debug, Clone, PartialEq)]
pub struct DurationRow {
    pub experiment_id: String,
    pub scheduling: f64,
    pub processing: f64,
    pub state: BatchState,
}

/// Number of batches of an experiment that ended in a state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessRow {
    pub experiment_id: String,
    pub state: String,
    pub count: usize,
}

/// Milestone timestamps of every batch with a history
pub fn timestamp_rows(results: &BTreeMap<String, DetailedResult>) -> Result<Vec<TimestampRow>> {
    let mut rows = Vec::new();
    for (experiment_id, result) in results {
        let experiment_rows = experiment_timestamp_rows(experiment_id, result)
            .map_err(|e| e.for_experiment(experiment_id, "resolve milestone timestamps"))?;
        rows.extend(experiment_rows);
    }
    Ok(rows)
}

fn experiment_timestamp_rows(
    experiment_id: &str,
    result: &DetailedResult,
) -> Result<Vec<TimestampRow>> {
    let num_batches = result.history_count();

    let [registered, scheduled, processing, succeeded] =
        BatchState::MILESTONES.map(|state| milestone_timestamps(result, &state));
    let (registered, scheduled, processing, succeeded) =
        (registered?, scheduled?, processing?, succeeded?);

    for (state, column) in BatchState::MILESTONES
        .iter()
        .zip([&registered, &scheduled, &processing, &succeeded])
    {
        if column.len() != num_batches {
            return Err(Error::Consistency(format!(
                "{} '{}' timestamps for {} batch histories",
                column.len(),
                state,
                num_batches
            )));
        }
    }

    Ok((0..num_batches)
        .map(|i| TimestampRow {
            experiment_id: experiment_id.to_string(),
            registered: registered[i],
            scheduled: scheduled[i],
            processing: processing[i],
            succeeded: succeeded[i],
        })
        .collect())
}

fn milestone_timestamps(result: &DetailedResult, state: &BatchState) -> Result<Vec<f64>> {
    result
        .batch_histories
        .iter()
        .map(|batch| timestamp_of_state(&batch.history, state))
        .collect()
}

/// Scheduling and processing durations of every batch with a history
///
/// Each row carries the final state stored with its history. Results cached
/// without per-history states fall back to pairing with the experiment's
/// batch states by position, which needs a history for every batch.
pub fn duration_rows(results: &BTreeMap<String, DetailedResult>) -> Result<Vec<DurationRow>> {
    let mut rows = Vec::new();
    for (experiment_id, result) in results {
        let experiment_rows = experiment_duration_rows(experiment_id, result)
            .map_err(|e| e.for_experiment(experiment_id, "get durations"))?;
        rows.extend(experiment_rows);
    }
    Ok(rows)
}

fn experiment_duration_rows(experiment_id: &str, result: &DetailedResult) -> Result<Vec<DurationRow>> {
    let num_batches = result.history_count();
    let positional = result.batch_states.len() == num_batches;

    result
        .batch_histories
        .iter()
        .enumerate()
        .map(|(index, batch)| {
            let state = match &batch.state {
                Some(state) => state.clone(),
                None if positional => result.batch_states[index].clone(),
                None => {
                    return Err(Error::Consistency(format!(
                        "history #{} has no state and {} batch states cannot be paired with {} batch histories",
                        index,
                        result.batch_states.len(),
                        num_batches
                    )))
                }
            };

            Ok(DurationRow {
                experiment_id: experiment_id.to_string(),
                scheduling: duration_or_zero(&batch.history, &BatchState::Scheduled),
                processing: duration_or_zero(&batch.history, &BatchState::Processing),
                state,
            })
        })
        .collect()
}

/// Count of batches per final state, per experiment
pub fn success_rows(results: &BTreeMap<String, DetailedResult>) -> Vec<SuccessRow> {
    results
        .iter()
        .flat_map(|(experiment_id, result)| {
            state_tally(&result.batch_states)
                .into_iter()
                .map(move |(state, count)| SuccessRow {
                    experiment_id: experiment_id.clone(),
                    state,
                    count,
                })
        })
        .collect()
}
