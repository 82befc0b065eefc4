// * Wire schema of the gallery listing endpoint
// * Field names follow the JSON payload (camelCase)

use serde::{Deserialize, Serialize};
use std::fmt;

/// A string-or-number JSON scalar, rendered verbatim.
///
/// `nsfwLevel` is numeric on current payloads and a named level on older ones;
/// `nextCursor` is either an opaque string or a numeric offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(u64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Reaction counters. A missing counter stays `None` and is reported by the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStats {
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub dislike_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub heart_count: Option<u64>,
    #[serde(default)]
    pub cry_count: Option<u64>,
    #[serde(default)]
    pub laugh_count: Option<u64>,
}

/// Generation metadata. Only the prompt is used; other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMeta {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: u64,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub created_at: String,
    pub nsfw_level: Scalar,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub stats: ItemStats,
    #[serde(default)]
    pub meta: Option<ItemMeta>,
}

impl GalleryItem {
    pub fn prompt(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.prompt.as_deref())
    }

    // * Date part of the ISO timestamp ("2024-01-02T10:00:00Z" -> "2024-01-02")
    pub fn created_date(&self) -> &str {
        self.created_at
            .split_once('T')
            .map_or(self.created_at.as_str(), |(date, _)| date)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub next_cursor: Option<Scalar>,
}

/// Where the next page lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Absolute URL handed out by the server
    Url(String),
    /// Cursor to combine with the listing endpoint
    Cursor(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryPage {
    pub items: Vec<GalleryItem>,
    #[serde(default)]
    pub metadata: Option<PageMetadata>,
}

impl GalleryPage {
    /// Next-page pointer; `None` ends pagination.
    pub fn next_page(&self) -> Option<NextPage> {
        let metadata = self.metadata.as_ref()?;
        if let Some(url) = metadata.next_page.as_ref().filter(|u| !u.is_empty()) {
            return Some(NextPage::Url(url.clone()));
        }
        metadata
            .next_cursor
            .as_ref()
            .map(|c| NextPage::Cursor(c.to_string()))
    }
}
