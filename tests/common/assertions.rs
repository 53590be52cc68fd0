//! Assertion helpers for tests.

use pretty_assertions::assert_eq;

/// Split a signed URL into its query items, in order
pub fn query_items(url: &str) -> Vec<(String, String)> {
    let (_, rest) = url.split_once("/?").expect("URL has no /? separator");
    let query = rest.split('#').next().unwrap_or_default();
    query
        .split('&')
        .map(|item| {
            let (name, value) = item.split_once('=').expect("item has no = delimiter");
            (name.to_string(), value.to_string())
        })
        .collect()
}

/// Assert the query item names appear in exactly this order
pub fn assert_query_names(url: &str, expected: &[&str]) {
    let names: Vec<String> = query_items(url).into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, expected, "Unexpected query layout in {url}");
}

/// Assert the query has no empty items and no trailing delimiter
pub fn assert_clean_query(url: &str) {
    assert!(!url.ends_with('&'), "Trailing item delimiter in {url}");
    assert!(!url.contains("&&"), "Empty item in {url}");
}
