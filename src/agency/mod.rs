//! Read access to the agency's batch records
//!
//! The agency owns authoritative batch state. This module only queries it:
//! listing the batches of an experiment and fetching one batch's detail.

pub mod client;
pub mod types;

pub use client::{retain_experiment, AgencyClient, BatchSource, Credentials};
pub use types::{Batch, BatchState, BatchSummary, HistoryEntry};
