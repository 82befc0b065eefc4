// * Command line surface
// * Flags are turned into a validated HarvestConfig; nothing here touches the disk

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::constants::{API_KEY_ENV, DEFAULT_API_URL, DEFAULT_SORT, DEFAULT_WORKERS, FETCH_RETRY_DELAY_SECS};
use crate::config::settings::{
    resolve_api_key, ConfigError, HarvestConfig, NsfwMode, OutputFormat, QueryOptions, Thresholds,
};
use crate::refinery::KeywordList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Silent,
    Normal,
    Debug,
}

impl Verbosity {
    // * Default EnvFilter directive; RUST_LOG still overrides it
    pub fn filter_directive(self) -> &'static str {
        match self {
            Verbosity::Silent => "error",
            Verbosity::Normal => "info",
            Verbosity::Debug => "debug",
        }
    }
}

/// Download images and videos from the gallery API.
#[derive(Debug, Parser)]
#[command(name = "gallery-harvest")]
#[command(version)]
pub struct Cli {
    /// API key (the CIVITAI_API_KEY environment variable takes precedence)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Listing endpoint
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Path to save the images
    #[arg(short = 'o', long, default_value = ".")]
    pub download_path: PathBuf,

    /// Number of concurrent downloads per page
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, value_parser = parse_workers)]
    pub workers: usize,

    /// Maximum number of images to save (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub max_images: usize,

    /// Resume from this pagination cursor
    #[arg(long)]
    pub cursor: Option<String>,

    /// Minimum width of the image
    #[arg(long, default_value_t = 0)]
    pub min_width: u32,

    /// Minimum height of the image
    #[arg(long, default_value_t = 0)]
    pub min_height: u32,

    /// Minimum number of likes
    #[arg(long, default_value_t = 0)]
    pub min_likes: u64,

    /// Minimum number of dislikes
    #[arg(long, default_value_t = 0)]
    pub min_dislikes: u64,

    /// Minimum number of comments
    #[arg(long, default_value_t = 0)]
    pub min_comments: u64,

    /// Minimum number of hearts
    #[arg(long, default_value_t = 0)]
    pub min_hearts: u64,

    /// Minimum number of cry reactions
    #[arg(long, default_value_t = 0)]
    pub min_cries: u64,

    /// Minimum number of laugh reactions
    #[arg(long, default_value_t = 0)]
    pub min_laughs: u64,

    /// Only download images with metadata
    #[arg(long)]
    pub require_metadata: bool,

    /// CSV of keywords of which at least one must appear in the prompt
    #[arg(long, default_value = "")]
    pub require_keywords: String,

    /// CSV of keywords that skip the item when found in the prompt
    #[arg(long, default_value = "")]
    pub ignore_keywords: String,

    /// Include NSFW images
    #[arg(long)]
    pub nsfw: bool,

    /// Only download NSFW images
    #[arg(long)]
    pub nsfw_only: bool,

    /// Segment images into directories by date
    #[arg(long)]
    pub segment_by_date: bool,

    /// Segment images into directories by rating
    #[arg(long)]
    pub segment_by_rating: bool,

    /// Lossy AVIF output (quality 70) instead of maximum quality
    #[arg(long)]
    pub compress: bool,

    /// Save images as AVIF instead of JPEG
    #[arg(long)]
    pub avif: bool,

    /// Listing sort order
    #[arg(long, default_value = DEFAULT_SORT)]
    pub sort: String,

    /// Listing period (AllTime, Year, Month, Week, Day)
    #[arg(long)]
    pub period: Option<String>,

    /// Items per listing page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Seconds to wait before retrying an undecodable page
    #[arg(long, default_value_t = FETCH_RETRY_DELAY_SECS)]
    pub retry_delay_secs: u64,

    /// Verbose logging
    #[arg(long, conflicts_with = "silent")]
    pub debug: bool,

    /// Only log errors
    #[arg(long)]
    pub silent: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

fn parse_workers(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.debug {
            Verbosity::Debug
        } else if self.silent {
            Verbosity::Silent
        } else {
            Verbosity::Normal
        }
    }

    /// Builds the run configuration, resolving the key from the process environment.
    pub fn into_config(self) -> Result<HarvestConfig, ConfigError> {
        let env_key = std::env::var(API_KEY_ENV).ok();
        self.into_config_with_env(env_key)
    }

    pub fn into_config_with_env(self, env_key: Option<String>) -> Result<HarvestConfig, ConfigError> {
        let api_key = resolve_api_key(env_key, self.api_key)?;

        let mut config = HarvestConfig::new(api_key, self.download_path);
        config.api_url = self.api_url;
        config.workers = self.workers;
        config.max_images = self.max_images;
        config.cursor = self.cursor.filter(|c| !c.trim().is_empty());
        config.thresholds = Thresholds {
            min_width: self.min_width,
            min_height: self.min_height,
            min_likes: self.min_likes,
            min_dislikes: self.min_dislikes,
            min_comments: self.min_comments,
            min_hearts: self.min_hearts,
            min_cries: self.min_cries,
            min_laughs: self.min_laughs,
            require_metadata: self.require_metadata,
        };
        config.nsfw = NsfwMode::from_flags(self.nsfw, self.nsfw_only);
        config.query = QueryOptions {
            sort: self.sort,
            period: self.period,
            page_size: self.page_size,
        };
        config.require_keywords = KeywordList::parse(&self.require_keywords);
        config.ignore_keywords = KeywordList::parse(&self.ignore_keywords);
        config.segment_by_date = self.segment_by_date;
        config.segment_by_rating = self.segment_by_rating;
        config.compress = self.compress;
        config.format = if self.avif { OutputFormat::Avif } else { OutputFormat::Jpeg };
        config.retry_delay = Duration::from_secs(self.retry_delay_secs);

        config.validate()?;
        Ok(config)
    }
}
