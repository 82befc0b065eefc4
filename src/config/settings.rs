// * Validated run configuration handed to the pipeline
// * Built by config::cli from flags and the environment, or directly in tests

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::constants::{
    DEFAULT_API_URL, DEFAULT_SORT, DEFAULT_WORKERS, FETCH_ATTEMPTS,
    FETCH_RETRY_DELAY_SECS,
};
use crate::refinery::KeywordList;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Please set the CIVITAI_API_KEY environment variable or pass it as an argument via --api-key.")]
    MissingApiKey,

    #[error("Worker count must be at least 1")]
    NoWorkers,

    #[error("Fetch attempts must be at least 1")]
    NoFetchAttempts,

    #[error("Invalid API URL '{0}'")]
    InvalidApiUrl(String),
}

/// Which NSFW content the listing request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NsfwMode {
    /// `nsfw=false`
    #[default]
    Exclude,
    /// `nsfw=X`, everything
    Include,
    /// `nsfw=true`, and items must carry the nsfw flag
    Only,
}

impl NsfwMode {
    // * Maps the two CLI toggles onto a mode; --nsfw-only wins over --nsfw
    pub fn from_flags(nsfw: bool, nsfw_only: bool) -> Self {
        if nsfw_only {
            NsfwMode::Only
        } else if nsfw {
            NsfwMode::Include
        } else {
            NsfwMode::Exclude
        }
    }

    pub fn query_value(self) -> &'static str {
        match self {
            NsfwMode::Exclude => "false",
            NsfwMode::Include => "X",
            NsfwMode::Only => "true",
        }
    }
}

/// Encoding used for payloads that decode as raster images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Avif,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Avif => "avif",
        }
    }
}

/// Minimum values an item must reach to be saved. Zero/false means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thresholds {
    pub min_width: u32,
    pub min_height: u32,
    pub min_likes: u64,
    pub min_dislikes: u64,
    pub min_comments: u64,
    pub min_hearts: u64,
    pub min_cries: u64,
    pub min_laughs: u64,
    pub require_metadata: bool,
}

/// Listing query parameters besides the NSFW mode and cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub sort: String,
    pub period: Option<String>,
    pub page_size: Option<u32>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            sort: DEFAULT_SORT.to_string(),
            period: None,
            page_size: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub api_key: String,
    pub api_url: String,
    pub output_dir: PathBuf,
    pub workers: usize,
    /// 0 = unlimited
    pub max_images: usize,
    /// Resume point from a previous run
    pub cursor: Option<String>,
    pub thresholds: Thresholds,
    pub nsfw: NsfwMode,
    pub query: QueryOptions,
    pub require_keywords: KeywordList,
    pub ignore_keywords: KeywordList,
    pub segment_by_date: bool,
    pub segment_by_rating: bool,
    pub compress: bool,
    pub format: OutputFormat,
    pub fetch_attempts: u32,
    pub retry_delay: Duration,
}

impl HarvestConfig {
    /// Creates a configuration with defaults for everything but the credentials and output root.
    pub fn new(api_key: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            output_dir: output_dir.into(),
            workers: DEFAULT_WORKERS,
            max_images: 0,
            cursor: None,
            thresholds: Thresholds::default(),
            nsfw: NsfwMode::default(),
            query: QueryOptions::default(),
            require_keywords: KeywordList::default(),
            ignore_keywords: KeywordList::default(),
            segment_by_date: false,
            segment_by_rating: false,
            compress: false,
            format: OutputFormat::default(),
            fetch_attempts: FETCH_ATTEMPTS,
            retry_delay: Duration::from_secs(FETCH_RETRY_DELAY_SECS),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.fetch_attempts == 0 {
            return Err(ConfigError::NoFetchAttempts);
        }
        if url::Url::parse(&self.api_url).is_err() {
            return Err(ConfigError::InvalidApiUrl(self.api_url.clone()));
        }
        Ok(())
    }

    // * True once `saved` reached a non-zero limit
    pub fn limit_reached(&self, saved: usize) -> bool {
        self.max_images != 0 && saved >= self.max_images
    }

    // * How many more items may be dispatched, None when unlimited
    pub fn remaining_budget(&self, saved: usize) -> Option<usize> {
        (self.max_images != 0).then(|| self.max_images.saturating_sub(saved))
    }
}

/// Resolves the API token: the environment value overrides/supplies the flag.
/// Blank values count as absent.
pub fn resolve_api_key(env_value: Option<String>, flag_value: Option<String>) -> Result<String, ConfigError> {
    env_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| flag_value.filter(|v| !v.trim().is_empty()))
        .ok_or(ConfigError::MissingApiKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_flag() {
        let key = resolve_api_key(Some("from-env".into()), Some("from-flag".into())).unwrap();
        assert_eq!(key, "from-env");
    }

    #[test]
    fn test_flag_used_without_env() {
        let key = resolve_api_key(None, Some("from-flag".into())).unwrap();
        assert_eq!(key, "from-flag");

        // * Blank env value falls through to the flag
        let key = resolve_api_key(Some("  ".into()), Some("from-flag".into())).unwrap();
        assert_eq!(key, "from-flag");
    }

    #[test]
    fn test_missing_key_is_error() {
        assert_eq!(resolve_api_key(None, None), Err(ConfigError::MissingApiKey));
        assert_eq!(resolve_api_key(Some(String::new()), None), Err(ConfigError::MissingApiKey));
    }

    #[test]
    fn test_nsfw_mode_from_flags() {
        assert_eq!(NsfwMode::from_flags(false, false), NsfwMode::Exclude);
        assert_eq!(NsfwMode::from_flags(true, false), NsfwMode::Include);
        assert_eq!(NsfwMode::from_flags(true, true), NsfwMode::Only);
        assert_eq!(NsfwMode::from_flags(false, true).query_value(), "true");
        assert_eq!(NsfwMode::Include.query_value(), "X");
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = HarvestConfig::new("key", "/tmp/out");
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert_eq!(config.validate(), Err(ConfigError::NoWorkers));
    }

    #[test]
    fn test_save_limit_budget() {
        let mut config = HarvestConfig::new("key", "/tmp/out");
        assert!(!config.limit_reached(1_000));
        assert_eq!(config.remaining_budget(1_000), None);

        config.max_images = 5;
        assert_eq!(config.remaining_budget(3), Some(2));
        assert!(!config.limit_reached(4));
        assert!(config.limit_reached(5));
    }
}
