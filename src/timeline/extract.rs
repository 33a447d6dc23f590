//! Per-state timestamps and durations from one batch's history
//!
//! Both operations are pure functions over the history slice.

use crate::agency::{BatchState, HistoryEntry};
use crate::error::{Error, Result};

/// Time a batch spent in a state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateSpan {
    /// Seconds between entering the state and the next recorded transition
    Elapsed(f64),
    /// The batch never entered the state
    NotReached,
    /// The state was entered but nothing was recorded after it
    Open,
}

impl StateSpan {
    /// Seconds spent in the state, 0 for a state skipped or never left
    pub fn or_zero(self) -> f64 {
        match self {
            StateSpan::Elapsed(seconds) => seconds,
            StateSpan::NotReached | StateSpan::Open => 0.0,
        }
    }
}

/// Time at which the batch entered `state`
///
/// The state must occur exactly once in the history.
pub fn timestamp_of_state(history: &[HistoryEntry], state: &BatchState) -> Result<f64> {
    let mut matches = history.iter().filter(|entry| &entry.state == state);

    match (matches.next(), matches.count()) {
        (Some(entry), 0) => Ok(entry.time),
        (first, rest) => Err(Error::AmbiguousState {
            state: state.to_string(),
            count: usize::from(first.is_some()) + rest,
        }),
    }
}

/// How long the batch stayed in `state`
///
/// The entry time is taken from the last entry with that state by position.
/// The exit time is the earliest recorded time strictly after the entry time,
/// wherever it sits in the history.
pub fn duration_in_state(history: &[HistoryEntry], state: &BatchState) -> StateSpan {
    let Some(begin) = history
        .iter()
        .rev()
        .find(|entry| &entry.state == state)
        .map(|entry| entry.time)
    else {
        return StateSpan::NotReached;
    };

    history
        .iter()
        .map(|entry| entry.time)
        .filter(|time| *time > begin)
        .min_by(f64::total_cmp)
        .map(|next| StateSpan::Elapsed(next - begin))
        .unwrap_or(StateSpan::Open)
}

/// Duration in `state`, with skipped and unfinished states counted as 0
pub fn duration_or_zero(history: &[HistoryEntry], state: &BatchState) -> f64 {
    duration_in_state(history, state).or_zero()
}
