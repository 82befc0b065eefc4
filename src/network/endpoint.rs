use url::Url;

use crate::config::{NsfwMode, QueryOptions};

// * Builds the listing URL for the first page or for a cursor.
// *
// * Query layout: sort, nsfw, then the optional period/limit/cursor, in that order.
// * Values are form-encoded ("Most Reactions" -> "Most+Reactions").
pub fn build_listing_url(
    base_url: &str,
    query: &QueryOptions,
    nsfw: NsfwMode,
    cursor: Option<&str>,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("sort", &query.sort);
        pairs.append_pair("nsfw", nsfw.query_value());

        if let Some(period) = &query.period {
            pairs.append_pair("period", period);
        }
        if let Some(limit) = query.page_size {
            pairs.append_pair("limit", &limit.to_string());
        }
        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            pairs.append_pair("cursor", cursor);
        }
    }

    Ok(url)
}

// * Extracts the cursor parameter of a next-page URL, for resume hints in the logs
pub fn cursor_of(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "cursor")
        .map(|(_, v)| v.into_owned())
}
