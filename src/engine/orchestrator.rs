// * Orchestrator
// * Page loop: fetch -> filter -> persist on the worker pool -> commit to the ledger.
// * Pages run strictly one after another; the ledger is only touched here.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::constants::LEDGER_FILE_NAME;
use crate::config::HarvestConfig;
use crate::engine::dispatcher::WorkerPool;
use crate::engine::filter::{filter_items, FilterCriteria, FilterError};
use crate::network::endpoint::{build_listing_url, cursor_of};
use crate::network::errors::NetworkError;
use crate::network::schema::NextPage;
use crate::network::transport::Transport;
use crate::network::PageFetcher;
use crate::ops::telemetry;
use crate::persistence::{ContentPersister, DedupLedger, LedgerError, OutcomeStatus};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot create output directory: {0}")]
    OutputDir(#[source] std::io::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Page fetch failed: {0}")]
    Fetch(#[from] NetworkError),

    #[error("Malformed page: {0}")]
    Filter(#[from] FilterError),
}

/// Counters of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: usize,
    pub saved: usize,
    pub ignored: usize,
    pub failed: usize,
}

pub struct Pipeline {
    config: HarvestConfig,
    fetcher: PageFetcher,
    persister: ContentPersister,
    pool: WorkerPool,
    ledger: DedupLedger,
}

impl Pipeline {
    /// Creates the output directory and opens its ledger.
    pub async fn open(config: HarvestConfig, transport: Arc<dyn Transport>) -> Result<Self, PipelineError> {
        tokio::fs::create_dir_all(&config.output_dir)
            .await
            .map_err(PipelineError::OutputDir)?;

        let ledger = DedupLedger::open(config.output_dir.join(LEDGER_FILE_NAME)).await?;
        let fetcher = PageFetcher::new(
            transport.clone(),
            config.api_key.clone(),
            config.fetch_attempts,
            config.retry_delay,
        );
        let persister = ContentPersister::from_config(&config, transport);
        let pool = WorkerPool::new(config.workers);

        Ok(Self {
            config,
            fetcher,
            persister,
            pool,
            ledger,
        })
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    /// Runs until pagination ends or the save limit is reached.
    ///
    /// A fetch or filter error aborts the run; entries committed for earlier pages stay
    /// in the ledger.
    pub async fn run(&mut self) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();
        let mut next_url = Some(self.listing_url(self.config.cursor.as_deref())?);

        while let Some(url) = next_url.take() {
            if self.config.limit_reached(summary.saved) {
                break;
            }

            // * FETCHING
            info!(url = %url, page = summary.pages + 1, "Fetching page");
            let page = self.fetcher.fetch(&url).await?;
            summary.pages += 1;

            next_url = match page.next_page() {
                Some(NextPage::Url(next)) => Some(next),
                Some(NextPage::Cursor(cursor)) => Some(self.listing_url(Some(&cursor))?),
                None => None,
            };
            if let Some(cursor) = next_url.as_deref().and_then(cursor_of) {
                // * Resume point for --cursor if the run is interrupted
                info!(cursor = %cursor, "Next page cursor");
            }

            // * FILTERING
            let fetched = page.items.len();
            let criteria = FilterCriteria::from_config(&self.config);
            let batch = filter_items(page.items, &self.ledger, &criteria)?;
            debug!(fetched = fetched, selected = batch.len(), "Page filtered");

            // * PERSISTING
            // * Dispatched in chunks no larger than the remaining budget; ignored and failed
            // * items free their slot for the next chunk of the same page.
            let persister = &self.persister;
            let mut pending = batch.into_iter();
            loop {
                let budget = self.config.remaining_budget(summary.saved).unwrap_or(usize::MAX);
                let chunk: Vec<_> = pending.by_ref().take(budget).collect();
                if chunk.is_empty() {
                    break;
                }

                let outcomes = self.pool.run(chunk, |item| persister.persist(item)).await;

                for outcome in outcomes {
                    match &outcome.status {
                        OutcomeStatus::Saved { .. } => {
                            self.ledger.record(&outcome.url).await?;
                            summary.saved += 1;
                            telemetry::record_item_outcome("saved");
                        }
                        OutcomeStatus::Ignored(_) => {
                            summary.ignored += 1;
                            telemetry::record_item_outcome("ignored");
                        }
                        OutcomeStatus::Failed(e) => {
                            error!(id = outcome.id, url = %outcome.url, error = %e, "Failed to save item");
                            summary.failed += 1;
                            telemetry::record_item_outcome("failed");
                        }
                    }
                }
            }
        }

        info!(
            pages = summary.pages,
            saved = summary.saved,
            ignored = summary.ignored,
            failed = summary.failed,
            "Downloaded and saved {} images/videos and metadata files.",
            summary.saved
        );

        Ok(summary)
    }

    fn listing_url(&self, cursor: Option<&str>) -> Result<String, PipelineError> {
        let url = build_listing_url(&self.config.api_url, &self.config.query, self.config.nsfw, cursor)
            .map_err(NetworkError::from)?;
        Ok(url.into())
    }
}
