//! Page math and sort orders for list endpoints

use serde::Deserialize;
use utoipa::ToSchema;

pub const MAX_PER_PAGE: i64 = 100;
/// Highest page whose offset still fits in an `i64`
pub const MAX_PAGE: i64 = i64::MAX / MAX_PER_PAGE;

/// A resolved, clamped page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Pages are 1-based; out-of-range values are clamped instead of rejected.
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.per_page - 1) / self.per_page
        }
    }
}

/// Chronological ordering used by the admin queues
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    Oldest,
    #[default]
    Recent,
}

impl DateOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            DateOrder::Oldest => "ASC",
            DateOrder::Recent => "DESC",
        }
    }
}

/// Catalog sort orders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub enum BookSort {
    #[default]
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "-title")]
    TitleDesc,
    #[serde(rename = "rating")]
    Rating,
    #[serde(rename = "-rating")]
    RatingDesc,
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "oldest")]
    Oldest,
}

impl BookSort {
    /// ORDER BY clause; the id tiebreaker keeps pages stable
    pub fn as_sql(&self) -> &'static str {
        match self {
            BookSort::Title => "LOWER(title) ASC, id ASC",
            BookSort::TitleDesc => "LOWER(title) DESC, id ASC",
            BookSort::Rating => "rating ASC, LOWER(title) ASC, id ASC",
            BookSort::RatingDesc => "rating DESC, LOWER(title) ASC, id ASC",
            BookSort::Newest => "created_at DESC, id ASC",
            BookSort::Oldest => "created_at ASC, id ASC",
        }
    }
}

/// Escape LIKE metacharacters and wrap for a substring match
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let page = PageRequest::new(None, None, 7);
        assert_eq!(page, PageRequest { page: 1, per_page: 7 });

        let page = PageRequest::new(Some(0), Some(10_000), 7);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, MAX_PER_PAGE);

        let page = PageRequest::new(Some(-3), Some(0), 7);
        assert_eq!(page, PageRequest { page: 1, per_page: 1 });
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let page = PageRequest::new(Some(i64::MAX), Some(100), 7);
        assert_eq!(page.page, MAX_PAGE);
        assert!(page.offset() >= 0);
        assert!(page.offset() <= i64::MAX - page.per_page);

        let page = PageRequest::new(Some(i64::MAX), Some(1), 7);
        assert!(page.offset() >= 0);
    }

    #[test]
    fn test_offset_and_total_pages() {
        let page = PageRequest::new(Some(3), Some(7), 7);
        assert_eq!(page.offset(), 14);
        assert_eq!(page.limit(), 7);

        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(7), 1);
        assert_eq!(page.total_pages(8), 2);
        assert_eq!(page.total_pages(21), 3);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("  Dune "), "%dune%");
        assert_eq!(like_pattern("100%_sure"), "%100\\%\\_sure%");
    }

    #[test]
    fn test_sort_parsing() {
        let sort: BookSort = serde_json::from_str("\"-rating\"").unwrap();
        assert_eq!(sort, BookSort::RatingDesc);
        let order: DateOrder = serde_json::from_str("\"oldest\"").unwrap();
        assert_eq!(order.as_sql(), "ASC");
        assert_eq!(DateOrder::default(), DateOrder::Recent);
    }
}
