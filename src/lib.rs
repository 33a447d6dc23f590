//! # Batchtrace
//!
//! Collects the execution histories of batches submitted to a job agency and
//! turns them into timing tables for analysis.
//!
//! ## Usage
//!
//! ```bash
//! AGENCY_URL=https://agency.example.org AGENCY_USERNAME=me AGENCY_PASSWORD=secret batchtrace
//! ```
//!
//! ## Modules
//!
//! - `agency` - Agency REST client and batch record types
//! - `analysis` - State occupancy and transition counts over time
//! - `cache` - Read-through JSON cache of raw batches and detailed results
//! - `collect` - The collection pipeline tying everything together
//! - `config` - Configuration from TOML and environment
//! - `experiments` - Discovery of executed experiments
//! - `fetch` - Bounded concurrent fetching of batch details with progress
//! - `tabulate` - Per-batch timestamp, duration and success tables
//! - `timeline` - Timeline reconstruction and history queries
//! - `testing` - In-memory agency and fixtures for tests
pub mod agency;
pub mod analysis;
pub mod cache;
pub mod collect;
pub mod config;
pub mod error;
pub mod experiments;
pub mod fetch;
pub mod logging;
pub mod tabulate;
pub mod timeline;

pub mod testing;

pub use error::{Error, Result};
