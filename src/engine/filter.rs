// * Item Filter
// * Drops already-saved URLs and items below the configured thresholds, keeping page order

use thiserror::Error;

use crate::config::{HarvestConfig, NsfwMode, Thresholds};
use crate::network::schema::{GalleryItem, ItemStats};
use crate::persistence::ledger::SeenUrls;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Item {id} has no '{field}' in its stats")]
    MissingStat { id: u64, field: &'static str },
}

/// Predicates applied to every item of a page. Numerics default to 0, flags to false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub min_width: u32,
    pub min_height: u32,
    pub min_likes: u64,
    pub min_dislikes: u64,
    pub min_comments: u64,
    pub min_hearts: u64,
    pub min_cries: u64,
    pub min_laughs: u64,
    pub metadata_required: bool,
    pub nsfw_only: bool,
}

impl FilterCriteria {
    pub fn from_thresholds(thresholds: &Thresholds, nsfw: NsfwMode) -> Self {
        Self {
            min_width: thresholds.min_width,
            min_height: thresholds.min_height,
            min_likes: thresholds.min_likes,
            min_dislikes: thresholds.min_dislikes,
            min_comments: thresholds.min_comments,
            min_hearts: thresholds.min_hearts,
            min_cries: thresholds.min_cries,
            min_laughs: thresholds.min_laughs,
            metadata_required: thresholds.require_metadata,
            nsfw_only: nsfw == NsfwMode::Only,
        }
    }

    pub fn from_config(config: &HarvestConfig) -> Self {
        Self::from_thresholds(&config.thresholds, config.nsfw)
    }

    // * Evaluated in order with short-circuit: ledger, size, reactions, meta, nsfw.
    // * Reaction counters are only read once the size checks passed.
    fn accepts<L: SeenUrls + ?Sized>(&self, item: &GalleryItem, ledger: &L) -> Result<bool, FilterError> {
        if ledger.contains(&item.url) {
            return Ok(false);
        }
        if item.width < self.min_width || item.height < self.min_height {
            return Ok(false);
        }
        if !self.reactions_pass(item.id, &item.stats)? {
            return Ok(false);
        }
        if self.metadata_required && item.meta.is_none() {
            return Ok(false);
        }
        if self.nsfw_only && !item.nsfw {
            return Ok(false);
        }
        Ok(true)
    }

    fn reactions_pass(&self, id: u64, stats: &ItemStats) -> Result<bool, FilterError> {
        let checks = [
            ("likeCount", stats.like_count, self.min_likes),
            ("dislikeCount", stats.dislike_count, self.min_dislikes),
            ("commentCount", stats.comment_count, self.min_comments),
            ("heartCount", stats.heart_count, self.min_hearts),
            ("cryCount", stats.cry_count, self.min_cries),
            ("laughCount", stats.laugh_count, self.min_laughs),
        ];

        for (field, count, minimum) in checks {
            let count = count.ok_or(FilterError::MissingStat { id, field })?;
            if count < minimum {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Returns the items passing every predicate, in input order.
pub fn filter_items<L: SeenUrls + ?Sized>(
    items: Vec<GalleryItem>,
    ledger: &L,
    criteria: &FilterCriteria,
) -> Result<Vec<GalleryItem>, FilterError> {
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        if criteria.accepts(&item, ledger)? {
            kept.push(item);
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::schema::{ItemMeta, Scalar};
    use std::collections::HashSet;

    fn stats(n: u64) -> ItemStats {
        ItemStats {
            like_count: Some(n),
            dislike_count: Some(n),
            comment_count: Some(n),
            heart_count: Some(n),
            cry_count: Some(n),
            laugh_count: Some(n),
        }
    }

    fn item(id: u64, width: u32, height: u32) -> GalleryItem {
        GalleryItem {
            id,
            url: format!("https://img.test/{}.jpeg", id),
            width,
            height,
            created_at: "2024-01-02T10:00:00Z".to_string(),
            nsfw_level: Scalar::Number(1),
            nsfw: false,
            stats: stats(10),
            meta: None,
        }
    }

    fn no_ledger() -> HashSet<String> {
        HashSet::new()
    }

    fn ids(items: &[GalleryItem]) -> Vec<u64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_default_criteria_keep_everything() {
        let items = vec![item(1, 1, 1), item(2, 512, 512)];
        let kept = filter_items(items, &no_ledger(), &FilterCriteria::default()).unwrap();
        assert_eq!(ids(&kept), vec![1, 2]);
    }

    #[test]
    fn test_size_thresholds_are_inclusive() {
        let criteria = FilterCriteria {
            min_width: 512,
            min_height: 768,
            ..Default::default()
        };
        let items = vec![item(1, 512, 768), item(2, 511, 768), item(3, 512, 767), item(4, 1024, 1024)];

        let kept = filter_items(items, &no_ledger(), &criteria).unwrap();
        assert_eq!(ids(&kept), vec![1, 4]);
    }

    #[test]
    fn test_reaction_minimums_are_inclusive() {
        let criteria = FilterCriteria {
            min_hearts: 10,
            min_comments: 3,
            ..Default::default()
        };
        let mut low_hearts = item(2, 10, 10);
        low_hearts.stats.heart_count = Some(9);
        let mut low_comments = item(3, 10, 10);
        low_comments.stats.comment_count = Some(2);

        let kept = filter_items(vec![item(1, 10, 10), low_hearts, low_comments], &no_ledger(), &criteria)
            .unwrap();
        assert_eq!(ids(&kept), vec![1]);
    }

    #[test]
    fn test_ledger_urls_are_excluded() {
        let mut seen = HashSet::new();
        seen.insert("https://img.test/2.jpeg".to_string());

        let kept = filter_items(vec![item(1, 1, 1), item(2, 1, 1), item(3, 1, 1)], &seen, &FilterCriteria::default())
            .unwrap();
        assert_eq!(ids(&kept), vec![1, 3]);
    }

    #[test]
    fn test_metadata_required_and_nsfw_only() {
        let mut with_meta = item(1, 1, 1);
        with_meta.meta = Some(ItemMeta { prompt: None });
        let mut nsfw = item(2, 1, 1);
        nsfw.nsfw = true;
        let mut both = item(3, 1, 1);
        both.nsfw = true;
        both.meta = Some(ItemMeta {
            prompt: Some("x".into()),
        });

        let meta_only = FilterCriteria {
            metadata_required: true,
            ..Default::default()
        };
        let kept = filter_items(vec![with_meta.clone(), nsfw.clone(), both.clone()], &no_ledger(), &meta_only)
            .unwrap();
        assert_eq!(ids(&kept), vec![1, 3]);

        let nsfw_only = FilterCriteria::from_thresholds(&Thresholds::default(), NsfwMode::Only);
        let kept = filter_items(vec![with_meta, nsfw, both], &no_ledger(), &nsfw_only).unwrap();
        assert_eq!(ids(&kept), vec![2, 3]);
    }

    #[test]
    fn test_missing_stat_is_error() {
        let mut broken = item(7, 10, 10);
        broken.stats.cry_count = None;

        let result = filter_items(vec![item(1, 10, 10), broken], &no_ledger(), &FilterCriteria::default());
        assert_eq!(result, Err(FilterError::MissingStat { id: 7, field: "cryCount" }));
    }

    #[test]
    fn test_missing_stat_not_reached_when_size_fails() {
        let mut broken = item(7, 10, 10);
        broken.stats = ItemStats::default();
        let criteria = FilterCriteria {
            min_width: 100,
            ..Default::default()
        };

        let kept = filter_items(vec![broken], &no_ledger(), &criteria).unwrap();
        assert!(kept.is_empty());
    }
}
