//! Search, category filtering and pagination over a [`CatalogSnapshot`].
//!
//! Stateless: the same snapshot and query always give the same page, and
//! records keep the snapshot's order.

use serde::Serialize;

use super::{CatalogSnapshot, VideoRecord};

/// Category sentinel that disables category filtering.
pub const ALL_CATEGORIES: &str = "All";

pub const DEFAULT_PAGE_SIZE: usize = 6;

pub const CATEGORIES: &[&str] = &[
    ALL_CATEGORIES,
    "News",
    "Music",
    "Podcast",
    "Interview",
    "Entertainment",
    "Documentaries",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search_text: String,
    pub category: String,
    /// 1-indexed.
    pub page: usize,
    pub page_size: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            category: ALL_CATEGORIES.to_string(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    pub items: Vec<VideoRecord>,
    pub total_pages: usize,
    pub total_items: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_next: bool,
    pub has_prev: bool,
    /// Version of the snapshot the page was computed from.
    pub version: u64,
}

fn matches_category(record: &VideoRecord, category: &str) -> bool {
    if category.is_empty() || category == ALL_CATEGORIES {
        return true;
    }
    record.has_tag_containing(&category.to_lowercase())
}

fn matches_search(record: &VideoRecord, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    record.title.to_lowercase().contains(needle_lower)
        || record.channel_name.to_lowercase().contains(needle_lower)
        || record.description.to_lowercase().contains(needle_lower)
        || record.has_tag_containing(needle_lower)
}

/// Category filter, then free-text filter, then one page of the result.
///
/// A page past the end (or page 0) gives empty `items`, never an error.
/// `page_size == 0` falls back to [`DEFAULT_PAGE_SIZE`].
pub fn query(snapshot: &CatalogSnapshot, query: &CatalogQuery) -> QueryPage {
    let page_size = if query.page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        query.page_size
    };
    let needle = query.search_text.to_lowercase();

    let filtered: Vec<&VideoRecord> = snapshot
        .records()
        .iter()
        .filter(|record| matches_category(record, &query.category))
        .filter(|record| matches_search(record, &needle))
        .collect();

    let total_items = filtered.len();
    let total_pages = total_items.div_ceil(page_size);

    let items = match query.page.checked_sub(1) {
        Some(index) => filtered
            .into_iter()
            .skip(index.saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    QueryPage {
        items,
        total_pages,
        total_items,
        page: query.page,
        page_size,
        has_next: query.page >= 1 && query.page < total_pages,
        has_prev: query.page > 1,
        version: snapshot.version(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::seed::demo_records;
    use crate::catalog::{ExternalId, VideoRecord};
    use chrono::Utc;

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new(1, demo_records())
    }

    fn q(search: &str, category: &str, page: usize) -> CatalogQuery {
        CatalogQuery {
            search_text: search.to_string(),
            category: category.to_string(),
            page,
            page_size: 6,
        }
    }

    fn record(id: &str, title: &str, tags: &[&str]) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            external_id: ExternalId::parse("dQw4w9WgXcQ").unwrap(),
            source_url: "https://youtu.be/dQw4w9WgXcQ".into(),
            title: title.to_string(),
            channel_name: "Channel".into(),
            description: String::new(),
            thumbnail_url: String::new(),
            published_at: Utc::now(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            added_by_admin: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn seven_records_split_into_two_pages() {
        let snap = snapshot();

        let first = query(&snap, &q("", "All", 1));
        assert_eq!(first.items.len(), 6);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let second = query(&snap, &q("", "All", 2));
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].id, "demo-7");
        assert!(!second.has_next);
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let snap = snapshot();
        let beyond = query(&snap, &q("", "All", 3));
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_pages, 2);

        let zero = query(&snap, &q("", "All", 0));
        assert!(zero.items.is_empty());
        assert!(!zero.has_next);
        assert!(!zero.has_prev);

        let huge = query(&snap, &q("", "All", usize::MAX));
        assert!(huge.items.is_empty());
    }

    #[test]
    fn tag_substring_participates_in_search() {
        let snap = CatalogSnapshot::new(
            1,
            vec![
                record("a", "Gangnam Style", &["Music", "K-Pop"]),
                record("b", "Something else", &["Music"]),
            ],
        );

        let page = query(&snap, &q("k-pop", "All", 1));
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "a");
    }

    #[test]
    fn search_covers_title_channel_and_description() {
        let snap = snapshot();
        assert_eq!(query(&snap, &q("ZOO", "All", 1)).total_items, 1);
        assert_eq!(query(&snap, &q("3blue1brown", "All", 1)).total_items, 1);
        assert_eq!(query(&snap, &q("instant gratification", "All", 1)).total_items, 1);
        assert_eq!(query(&snap, &q("no such thing", "All", 1)).total_items, 0);
    }

    #[test]
    fn category_matches_tags_case_insensitively_by_substring() {
        let snap = CatalogSnapshot::new(
            1,
            vec![
                record("a", "One", &["Documentaries"]),
                record("b", "Two", &["music"]),
                record("c", "Three", &["Music Videos"]),
                record("d", "Four", &[]),
            ],
        );

        let music: Vec<_> = query(&snap, &q("", "Music", 1))
            .items
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(music, vec!["b", "c"]);

        let docs = query(&snap, &q("", "documentaries", 1));
        assert_eq!(docs.total_items, 1);
    }

    #[test]
    fn category_and_search_combine() {
        let snap = snapshot();
        let page = query(&snap, &q("despacito", "Music", 1));
        assert_eq!(page.total_items, 1);
        let page = query(&snap, &q("despacito", "Podcast", 1));
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let snap = snapshot();
        let input = q("music", "All", 1);
        assert_eq!(query(&snap, &input), query(&snap, &input));
    }

    #[test]
    fn results_keep_snapshot_order() {
        let snap = snapshot();
        let ids: Vec<_> = query(&snap, &q("", "All", 1))
            .items
            .iter()
            .map(|r| r.id.clone())
            .collect();
        let expected: Vec<_> = snap.records()[..6].iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn zero_page_size_uses_default() {
        let snap = snapshot();
        let mut input = q("", "All", 1);
        input.page_size = 0;
        let page = query(&snap, &input);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(page.items.len(), 6);
    }
}
