use std::path::{Path, PathBuf};

use crate::network::schema::GalleryItem;

// * Computes (and creates) the directory an item is saved into.
// * Layout: <root>[/<date>][/<rating>], date segment outermost.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    by_date: bool,
    by_rating: bool,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>, by_date: bool, by_rating: bool) -> Self {
        Self {
            root: root.into(),
            by_date,
            by_rating,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for the item, without touching the filesystem.
    pub fn directory_for(&self, item: &GalleryItem) -> PathBuf {
        let mut dir = self.root.clone();
        if self.by_date {
            dir.push(item.created_date());
        }
        if self.by_rating {
            dir.push(item.nsfw_level.to_string());
        }
        dir
    }

    /// Directory for the item, created if missing. Existing directories are fine.
    pub async fn resolve(&self, item: &GalleryItem) -> std::io::Result<PathBuf> {
        let dir = self.directory_for(item);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }
}
