//! CSV writers for the per-batch tables
//!
//! Headers are fixed strings that downstream tooling matches byte for byte.
//! The timestamp and duration tables carry a leading unnamed row index.

use super::{DurationRow, SuccessRow, TimestampRow};
use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const EXPERIMENT_ID_LABEL: &str = "experiment_id";
pub const TIME_REGISTERED_LABEL: &str = "timestamp_registered";
pub const TIME_SCHEDULED_LABEL: &str = "timestamp_scheduled";
pub const TIME_PROCESSING_LABEL: &str = "timestamp_processing";
pub const TIME_SUCCEEDED_LABEL: &str = "timestamp_succeeded";

pub const DURATION_EXPERIMENT_ID_LABEL: &str = "experimentId";
pub const SCHEDULING_DURATION_LABEL: &str = "scheduling duration in seconds";
pub const PROCESSING_DURATION_LABEL: &str = "processing duration in seconds";
pub const STATES_LABEL: &str = "states";

pub const STATE_LABEL: &str = "state";
pub const COUNT_LABEL: &str = "count";

pub const TIMESTAMPS_FILE: &str = "processing_timestamps.csv";
pub const DURATIONS_FILE: &str = "processing_durations.csv";
pub const SUCCESS_RATE_FILE: &str = "success_rate.csv";

pub fn write_timestamps<W: Write>(rows: &[TimestampRow], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "",
        EXPERIMENT_ID_LABEL,
        TIME_REGISTERED_LABEL,
        TIME_SCHEDULED_LABEL,
        TIME_PROCESSING_LABEL,
        TIME_SUCCEEDED_LABEL,
    ])?;

    for (index, row) in rows.iter().enumerate() {
        csv.write_record([
            index.to_string(),
            row.experiment_id.clone(),
            row.registered.to_string(),
            row.scheduled.to_string(),
            row.processing.to_string(),
            row.succeeded.to_string(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

pub fn write_durations<W: Write>(rows: &[DurationRow], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "",
        DURATION_EXPERIMENT_ID_LABEL,
        SCHEDULING_DURATION_LABEL,
        PROCESSING_DURATION_LABEL,
        STATES_LABEL,
    ])?;

    for (index, row) in rows.iter().enumerate() {
        csv.write_record([
            index.to_string(),
            row.experiment_id.clone(),
            row.scheduling.to_string(),
            row.processing.to_string(),
            row.state.to_string(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

pub fn write_success_rates<W: Write>(rows: &[SuccessRow], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([DURATION_EXPERIMENT_ID_LABEL, STATE_LABEL, COUNT_LABEL])?;

    for row in rows {
        csv.write_record([
            row.experiment_id.as_str(),
            row.state.as_str(),
            row.count.to_string().as_str(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Create `path` and hand it to one of the writers above
pub fn write_file<T>(
    path: &Path,
    rows: &[T],
    write: impl FnOnce(&[T], File) -> Result<()>,
) -> Result<()> {
    let file = File::create(path)?;
    write(rows, file)
}
