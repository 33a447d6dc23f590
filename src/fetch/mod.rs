//! Concurrent batch detail fetching
//!
//! Fetches every batch of one experiment with a fixed number of concurrent
//! workers. Results land in slots indexed by input position, so the output
//! order matches the listing order no matter which request finishes first.

pub mod progress;

pub use progress::{
    render_line, CapturedProgress, ConsoleProgress, FetchProgress, ProgressSink, SilentProgress,
    WriterProgress, BAR_WIDTH,
};

use crate::agency::{Batch, BatchSource, BatchSummary};
use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Number of concurrent detail requests per experiment
pub const FETCH_WORKERS: usize = 5;

/// Fetches batch details from a [`BatchSource`]
pub struct BatchFetcher {
    source: Arc<dyn BatchSource>,
    progress: Arc<dyn ProgressSink>,
    workers: usize,
}

impl BatchFetcher {
    /// Create a fetcher that reports progress on stdout
    pub fn new(source: Arc<dyn BatchSource>) -> Self {
        Self {
            source,
            progress: Arc::new(ConsoleProgress::stdout()),
            workers: FETCH_WORKERS,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch the detail of every summarized batch, preserving input order
    ///
    /// The first failing request aborts the whole fetch; requests still in
    /// flight are cancelled and nothing fetched so far is returned.
    pub async fn fetch_batches(
        &self,
        summaries: &[BatchSummary],
        label: Option<&str>,
    ) -> Result<Vec<Batch>> {
        let total = summaries.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        info!("Fetching {} batches with {} workers", total, self.workers);

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let progress = Arc::new(FetchProgress::new(label, total, self.progress.clone()));
        let mut tasks = JoinSet::new();

        for (index, summary) in summaries.iter().enumerate() {
            let semaphore = semaphore.clone();
            let source = self.source.clone();
            let progress = progress.clone();
            let batch_id = summary.id.clone();

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::WorkerPanic(e.to_string()))?;
                let batch = source.get_batch_detail(&batch_id).await?;
                let done = progress.complete_one();
                debug!("Fetched batch {} ({}/{})", batch_id, done, total);
                Ok::<_, Error>((index, batch))
            });
        }

        let mut slots: Vec<Option<Batch>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, batch) = joined??;
            slots[index] = Some(batch);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| Error::WorkerPanic(format!("no result for batch #{index}")))
            })
            .collect()
    }
}
