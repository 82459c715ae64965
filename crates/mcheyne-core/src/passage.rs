//! Passage splitting and Bible Gateway deep links.

use reqwest::Url;

const BIBLE_GATEWAY_PASSAGE_URL: &str = "https://www.biblegateway.com/passage/";

/// Translation used when the caller does not pick one.
pub const DEFAULT_VERSION: &str = "NIV";

/// Split a comma-separated reading into trimmed passage references.
pub fn split_passages(reading: &str) -> Vec<&str> {
    reading
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Build a Bible Gateway link for `passage` in translation `version`.
pub fn bible_gateway_url(passage: &str, version: &str) -> String {
    match Url::parse_with_params(
        BIBLE_GATEWAY_PASSAGE_URL,
        &[("search", passage), ("version", version)],
    ) {
        Ok(url) => url.into(),
        // The base URL is a constant; parsing it cannot fail.
        Err(_) => BIBLE_GATEWAY_PASSAGE_URL.to_owned(),
    }
}
