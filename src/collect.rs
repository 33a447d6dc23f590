//! Collection pipeline
//!
//! For every executed experiment: reuse the cached detailed result, or list
//! the experiment's batches, fetch (or reread) their records, reconstruct the
//! timeline and cache it. The collected results are then tabulated into the
//! CSV files of the results directory.

use crate::agency::{AgencyClient, Batch, BatchSource};
use crate::analysis::{
    occupancy, transitions_per_bin, write_occupancy, write_transitions, OCCUPANCY_FILE,
    TRANSITIONS_FILE,
};
use crate::cache::JsonCache;
use crate::config::{AnalysisConfig, Config};
use crate::error::Result;
use crate::experiments;
use crate::fetch::{BatchFetcher, ProgressSink};
use crate::tabulate::csv_output::{
    write_file, DURATIONS_FILE, SUCCESS_RATE_FILE, TIMESTAMPS_FILE,
};
use crate::tabulate::{
    duration_rows, success_rows, timestamp_rows, write_durations, write_success_rates,
    write_timestamps,
};
use crate::timeline::{reconstruct_with_states, state_tally, DetailedResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Gathers detailed results through the two caches
pub struct Collector {
    source: Arc<dyn BatchSource>,
    fetcher: BatchFetcher,
    batch_cache: JsonCache,
    result_cache: JsonCache,
}

impl Collector {
    pub fn new(source: Arc<dyn BatchSource>, cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        Self {
            fetcher: BatchFetcher::new(source.clone()),
            source,
            batch_cache: JsonCache::batches(&cache_dir),
            result_cache: JsonCache::results(&cache_dir),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.fetcher = self.fetcher.with_progress(progress);
        self
    }

    /// Detailed result of one experiment, computed at most once per cache
    pub async fn detailed_result(&self, experiment_id: &str) -> Result<DetailedResult> {
        if let Some(result) = self.result_cache.get::<DetailedResult>(experiment_id)? {
            return Ok(result);
        }

        let summaries = self.source.list_batches(experiment_id).await?;
        let states = state_tally(summaries.iter().map(|summary| &summary.state));

        let batches = match self.batch_cache.get::<Vec<Batch>>(experiment_id)? {
            Some(batches) => {
                info!("reading {} from cache", experiment_id);
                batches
            }
            None => {
                let batches = self
                    .fetcher
                    .fetch_batches(&summaries, Some(experiment_id))
                    .await?;
                self.batch_cache.put(experiment_id, &batches)?;
                batches
            }
        };

        let result = reconstruct_with_states(experiment_id, &batches, states)?;
        self.result_cache.put(experiment_id, &result)?;

        Ok(result)
    }

    /// Detailed results of all experiments, keyed by id
    pub async fn collect_all(
        &self,
        experiment_ids: &[String],
    ) -> Result<BTreeMap<String, DetailedResult>> {
        let mut results = BTreeMap::new();

        for experiment_id in experiment_ids {
            info!("Collecting results of experiment {}", experiment_id);
            let result = self
                .detailed_result(experiment_id)
                .await
                .map_err(|e| e.for_experiment(experiment_id, "collect results"))?;
            results.insert(experiment_id.clone(), result);
        }

        Ok(results)
    }
}

/// Write every result table into `results_dir`
///
/// All tables are built before the first file is touched, so a failing
/// table leaves the results directory as it was.
pub fn write_tables(
    results: &BTreeMap<String, DetailedResult>,
    results_dir: &Path,
    analysis: &AnalysisConfig,
) -> Result<()> {
    let timestamps = timestamp_rows(results)?;
    let durations = duration_rows(results)?;
    let success = success_rows(results);
    let samples = occupancy(&timestamps, analysis.occupancy_step)?;
    let bins = transitions_per_bin(&timestamps, analysis.transition_bin)?;

    fs::create_dir_all(results_dir)?;

    write_file(&results_dir.join(TIMESTAMPS_FILE), &timestamps, write_timestamps)?;
    info!("Wrote {} rows to {}", timestamps.len(), TIMESTAMPS_FILE);

    write_file(&results_dir.join(DURATIONS_FILE), &durations, write_durations)?;
    info!("Wrote {} rows to {}", durations.len(), DURATIONS_FILE);

    write_file(&results_dir.join(SUCCESS_RATE_FILE), &success, write_success_rates)?;
    info!("Wrote {} rows to {}", success.len(), SUCCESS_RATE_FILE);

    write_file(&results_dir.join(OCCUPANCY_FILE), &samples, write_occupancy)?;
    info!("Wrote {} rows to {}", samples.len(), OCCUPANCY_FILE);

    write_file(&results_dir.join(TRANSITIONS_FILE), &bins, write_transitions)?;
    info!("Wrote {} rows to {}", bins.len(), TRANSITIONS_FILE);

    Ok(())
}

/// Collect and tabulate every executed experiment with a given collector
pub async fn run_with(
    config: &Config,
    collector: &Collector,
) -> Result<BTreeMap<String, DetailedResult>> {
    let experiment_ids = experiments::discover(&config.experiments_dir)?;
    info!("Found {} executed experiments", experiment_ids.len());

    let results = collector.collect_all(&experiment_ids).await?;
    write_tables(&results, &config.results_dir, &config.analysis)?;

    Ok(results)
}

/// Collect and tabulate every executed experiment from the agency
pub async fn run(config: &Config) -> Result<BTreeMap<String, DetailedResult>> {
    config.validate()?;

    let client = AgencyClient::new(&config.agency.url, config.credentials())?;
    let collector = Collector::new(Arc::new(client), &config.cache_dir);

    run_with(config, &collector).await
}
