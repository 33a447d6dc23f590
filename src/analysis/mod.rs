//! State occupancy over time, derived from milestone timestamps
//!
//! Two views over the timestamp table: how many batches sit in each
//! milestone state at regular instants, and how many batches enter each
//! state per time bin.

use crate::error::{Error, Result};
use crate::tabulate::TimestampRow;
use std::io::Write;

/// Default sampling step of the occupancy table, seconds
pub const DEFAULT_OCCUPANCY_STEP: f64 = 4.0;
/// Default bin width of the transition table, seconds
pub const DEFAULT_TRANSITION_BIN: u64 = 60;

pub const OCCUPANCY_FILE: &str = "state_occupancy.csv";
pub const TRANSITIONS_FILE: &str = "state_transitions.csv";

const OCCUPANCY_HEADER: [&str; 5] = [
    "time",
    "number registered batches",
    "number scheduled batches",
    "number processing batches",
    "number succeeded batches",
];

const TRANSITIONS_HEADER: [&str; 4] = [
    "one minute time bins",
    "from registered to scheduled",
    "from scheduled to processing",
    "from processing to succeeded",
];

/// Batches per milestone state at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyRow {
    pub time: f64,
    pub registered: usize,
    pub scheduled: usize,
    pub processing: usize,
    pub succeeded: usize,
}

/// Batches entering each state within one bin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRow {
    /// End of the bin divided by the bin width
    pub bin: i64,
    pub scheduled: usize,
    pub processing: usize,
    pub succeeded: usize,
}

fn span(rows: &[TimestampRow]) -> Option<(f64, f64)> {
    let start = rows.iter().map(|r| r.registered).min_by(f64::total_cmp)?;
    let end = rows.iter().map(|r| r.succeeded).max_by(f64::total_cmp)?;
    Some((start, end))
}

/// Sample state occupancy every `step` seconds
///
/// Samples run from the earliest registration up to, not including, the
/// latest success. A batch is in a state from its entry time until the entry
/// time of the next milestone; succeeded batches stay succeeded.
pub fn occupancy(rows: &[TimestampRow], step: f64) -> Result<Vec<OccupancyRow>> {
    if step.is_nan() || step <= 0.0 {
        return Err(Error::Config(format!("occupancy step must be positive, got {step}")));
    }
    let Some((start, end)) = span(rows) else {
        return Ok(Vec::new());
    };

    let mut samples = Vec::new();
    let mut k = 0u64;
    loop {
        let time = start + k as f64 * step;
        if time >= end {
            break;
        }
        let mut sample = OccupancyRow {
            time,
            registered: 0,
            scheduled: 0,
            processing: 0,
            succeeded: 0,
        };
        for r in rows {
            if r.registered <= time && r.scheduled > time {
                sample.registered += 1;
            }
            if r.scheduled <= time && r.processing > time {
                sample.scheduled += 1;
            }
            if r.processing <= time && r.succeeded > time {
                sample.processing += 1;
            }
            if r.succeeded <= time {
                sample.succeeded += 1;
            }
        }

        samples.push(sample);
        k += 1;
    }

    Ok(samples)
}

/// Count state entries per `bin` seconds
///
/// Bin edges start at the earliest registration (truncated to whole
/// seconds) and cover the latest success rounded up to the next multiple of
/// `bin`. Each bin is half-open, `[start, end)`.
pub fn transitions_per_bin(rows: &[TimestampRow], bin: u64) -> Result<Vec<TransitionRow>> {
    if bin == 0 {
        return Err(Error::Config("transition bin must be positive".to_string()));
    }
    let Some((start, end)) = span(rows) else {
        return Ok(Vec::new());
    };

    let bin = bin as i64;
    let last_edge = ((end as i64).div_euclid(bin) + 1) * bin;
    let edges: Vec<i64> = (0..)
        .map(|k| start + (k * bin) as f64)
        .take_while(|edge| *edge < (last_edge + 1) as f64)
        .map(|edge| edge as i64)
        .collect();

    Ok(edges
        .windows(2)
        .map(|window| {
            let bin_range = window[0] as f64..window[1] as f64;
            let mut row = TransitionRow {
                bin: window[1].div_euclid(bin),
                scheduled: 0,
                processing: 0,
                succeeded: 0,
            };
            for r in rows {
                if bin_range.contains(&r.scheduled) {
                    row.scheduled += 1;
                }
                if bin_range.contains(&r.processing) {
                    row.processing += 1;
                }
                if bin_range.contains(&r.succeeded) {
                    row.succeeded += 1;
                }
            }
            row
        })
        .collect())
}

pub fn write_occupancy<W: Write>(rows: &[OccupancyRow], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(OCCUPANCY_HEADER)?;
    for row in rows {
        csv.write_record([
            row.time.to_string(),
            row.registered.to_string(),
            row.scheduled.to_string(),
            row.processing.to_string(),
            row.succeeded.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_transitions<W: Write>(rows: &[TransitionRow], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(TRANSITIONS_HEADER)?;
    for row in rows {
        csv.write_record([
            row.bin.to_string(),
            row.scheduled.to_string(),
            row.processing.to_string(),
            row.succeeded.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}
