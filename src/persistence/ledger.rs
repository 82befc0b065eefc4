// * Dedup Ledger
// * Append-only log of saved URLs (one per line) plus its in-memory set

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to read ledger {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append to ledger {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Membership test over previously saved URLs.
pub trait SeenUrls {
    fn contains(&self, url: &str) -> bool;
}

impl SeenUrls for HashSet<String> {
    fn contains(&self, url: &str) -> bool {
        HashSet::contains(self, url)
    }
}

/// Owns the open log handle for the lifetime of a run.
///
/// Lines are stored as `url\n`; the set holds the URL without its terminator, so
/// lookups use the bare URL. A `\r\n` terminator from a hand-edited log is tolerated.
#[derive(Debug)]
pub struct DedupLedger {
    path: PathBuf,
    file: File,
    urls: HashSet<String>,
}

impl DedupLedger {
    /// Loads an existing log (if any) and opens it for appending.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();

        let urls = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => parse_entries(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(source) => return Err(LedgerError::Load { path, source }),
        };

        let file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(file) => file,
            Err(source) => return Err(LedgerError::Load { path, source }),
        };

        tracing::info!(path = %path.display(), entries = urls.len(), "Ledger loaded");

        Ok(Self { path, file, urls })
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Appends the URL to the log and the set. Returns false if it was already present.
    pub async fn record(&mut self, url: &str) -> Result<bool, LedgerError> {
        if self.urls.contains(url) {
            return Ok(false);
        }

        let line = format!("{}\n", url);
        let written = async {
            self.file.write_all(line.as_bytes()).await?;
            self.file.flush().await
        }
        .await;

        if let Err(source) = written {
            return Err(LedgerError::Append {
                path: self.path.clone(),
                source,
            });
        }

        self.urls.insert(url.to_string());
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SeenUrls for DedupLedger {
    fn contains(&self, url: &str) -> bool {
        DedupLedger::contains(self, url)
    }
}

fn parse_entries(contents: &str) -> HashSet<String> {
    contents
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
