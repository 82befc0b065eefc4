// * Content Persister
// * Keyword policy, payload download and prompt text file for one item.
// * Every failure ends up in the returned outcome; nothing propagates to the caller.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::HarvestConfig;
use crate::network::errors::NetworkError;
use crate::network::schema::GalleryItem;
use crate::network::transport::Transport;
use crate::ops::telemetry;
use crate::persistence::encoder::{PayloadEncoder, SavedPayload};
use crate::persistence::paths::PathResolver;
use crate::refinery::{strip_tags, KeywordPolicy, PromptDecision, SkipReason};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Download failed: {0}")]
    Network(#[from] NetworkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("No file extension in URL '{0}'")]
    MissingExtension(String),

    #[error("Encoder task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// What happened to an item
#[derive(Debug)]
pub enum OutcomeStatus {
    Saved {
        payload: SavedPayload,
        prompt_file: Option<PathBuf>,
    },
    Ignored(SkipReason),
    Failed(PersistError),
}

/// Per-item result consumed by the orchestrator
#[derive(Debug)]
pub struct DownloadOutcome {
    pub id: u64,
    pub url: String,
    pub status: OutcomeStatus,
}

impl DownloadOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self.status, OutcomeStatus::Saved { .. })
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self.status, OutcomeStatus::Ignored(_))
    }

    pub fn error(&self) -> Option<&PersistError> {
        match &self.status {
            OutcomeStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

pub struct ContentPersister {
    transport: Arc<dyn Transport>,
    paths: PathResolver,
    policy: KeywordPolicy,
    encoder: PayloadEncoder,
}

impl ContentPersister {
    pub fn new(
        transport: Arc<dyn Transport>,
        paths: PathResolver,
        policy: KeywordPolicy,
        encoder: PayloadEncoder,
    ) -> Self {
        Self {
            transport,
            paths,
            policy,
            encoder,
        }
    }

    pub fn from_config(config: &HarvestConfig, transport: Arc<dyn Transport>) -> Self {
        Self::new(
            transport,
            PathResolver::new(&config.output_dir, config.segment_by_date, config.segment_by_rating),
            KeywordPolicy::new(config.require_keywords.clone(), config.ignore_keywords.clone()),
            PayloadEncoder::new(config.format, config.compress),
        )
    }

    pub async fn persist(&self, item: GalleryItem) -> DownloadOutcome {
        let status = match self.try_persist(&item).await {
            Ok(status) => status,
            Err(e) => OutcomeStatus::Failed(e),
        };

        DownloadOutcome {
            id: item.id,
            url: item.url,
            status,
        }
    }

    async fn try_persist(&self, item: &GalleryItem) -> Result<OutcomeStatus, PersistError> {
        // * Policy runs before any directory or file is created
        if let Some(prompt) = item.prompt() {
            if let PromptDecision::Skip(reason) = self.policy.evaluate(prompt) {
                info!(id = item.id, reason = %reason, "Skipping item");
                return Ok(OutcomeStatus::Ignored(reason));
            }
        }

        let dir = self.paths.resolve(item).await?;

        let bytes = self.transport.get_bytes(&item.url).await?;
        telemetry::record_bytes_downloaded(bytes.len());

        let encoder = self.encoder;
        let (id, url, payload_dir) = (item.id, item.url.clone(), dir.clone());
        let payload =
            tokio::task::spawn_blocking(move || encoder.save(&bytes, &payload_dir, id, &url)).await??;

        // * Prompt is written only once the payload is on disk
        let prompt_file = match item.prompt() {
            Some(prompt) => {
                let path = dir.join(format!("{}.txt", item.id));
                tokio::fs::write(&path, strip_tags(prompt)).await?;
                Some(path)
            }
            None => None,
        };

        debug!(id = item.id, path = %payload.path().display(), "Item saved");
        Ok(OutcomeStatus::Saved { payload, prompt_file })
    }
}
