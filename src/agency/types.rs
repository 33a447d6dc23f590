//! Batch records as returned by the agency

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a batch
///
/// States outside the known vocabulary are kept verbatim in `Other` so that
/// tallies and cached records never lose information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BatchState {
    Registered,
    Scheduled,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
    Other(String),
}

impl BatchState {
    /// The four states whose entry timestamps are tabulated
    pub const MILESTONES: [BatchState; 4] = [
        BatchState::Registered,
        BatchState::Scheduled,
        BatchState::Processing,
        BatchState::Succeeded,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            BatchState::Registered => "registered",
            BatchState::Scheduled => "scheduled",
            BatchState::Processing => "processing",
            BatchState::Succeeded => "succeeded",
            BatchState::Failed => "failed",
            BatchState::Cancelled => "cancelled",
            BatchState::Other(name) => name,
        }
    }
}

impl From<String> for BatchState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "registered" => BatchState::Registered,
            "scheduled" => BatchState::Scheduled,
            "processing" => BatchState::Processing,
            "succeeded" => BatchState::Succeeded,
            "failed" => BatchState::Failed,
            "cancelled" => BatchState::Cancelled,
            _ => BatchState::Other(value),
        }
    }
}

impl From<&str> for BatchState {
    fn from(value: &str) -> Self {
        BatchState::from(value.to_string())
    }
}

impl From<BatchState> for String {
    fn from(state: BatchState) -> Self {
        match state {
            BatchState::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch entering a state at a point on the agency clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub state: BatchState,
    /// Seconds on the agency clock
    pub time: f64,
}

impl HistoryEntry {
    pub fn new(state: impl Into<BatchState>, time: f64) -> Self {
        Self {
            state: state.into(),
            time,
        }
    }
}

/// Element of the batch listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "experimentId")]
    pub experiment_id: String,
    pub state: BatchState,
}

/// Full batch record including its state history
///
/// Fields the agency sends beyond the ones modelled here are kept in `extra`
/// and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "experimentId")]
    pub experiment_id: String,
    pub state: BatchState,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
