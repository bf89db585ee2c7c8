//! Pagination state derived from query parameters and the total count.

use crate::response::Notification;
use serde::Serialize;

/// Pagination block of a list response. `nextPage`/`prevPage` are page
/// numbers as strings, or null at the edges.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_items: u64,
    pub current_page: u32,
    pub items_per_page: u32,
    pub total_pages: u32,
    pub url_path: String,
    pub url_query: String,
    pub next_page: Option<String>,
    pub prev_page: Option<String>,
}

impl Pagination {
    /// Compute pagination for a validated (>= 1) requested page. A page past
    /// the last page is clamped to the last page, with a warning. On an empty
    /// result set `total_pages` is 0 and the current page stays 1.
    pub fn compute(
        total_items: u64,
        requested_page: u32,
        items_per_page: u32,
        url_path: &str,
        url_query: &str,
    ) -> (Pagination, Option<Notification>) {
        let total_pages = total_items.div_ceil(items_per_page as u64) as u32;
        let mut notification = None;
        let current_page = if total_pages > 0 && requested_page > total_pages {
            notification = Some(Notification::warning(format!(
                "Page {} is past the last page, showing page {}",
                requested_page, total_pages
            )));
            total_pages
        } else {
            requested_page
        };

        let next_page = (total_pages > 0 && current_page < total_pages)
            .then(|| (current_page + 1).to_string());
        let prev_page = (current_page > 1).then(|| (current_page - 1).to_string());

        (
            Pagination {
                total_items,
                current_page,
                items_per_page,
                total_pages,
                url_path: url_path.to_string(),
                url_query: url_query.to_string(),
                next_page,
                prev_page,
            },
            notification,
        )
    }

    /// Row offset for the current page.
    pub fn offset(&self) -> u64 {
        (self.current_page.saturating_sub(1) as u64) * self.items_per_page as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_ceiling_of_items_over_per_page() {
        let (p, _) = Pagination::compute(100, 1, 15, "/api/v1/products", "");
        assert_eq!(p.total_pages, 7);
        let (p, _) = Pagination::compute(105, 1, 15, "/api/v1/products", "");
        assert_eq!(p.total_pages, 7);
        let (p, _) = Pagination::compute(106, 1, 15, "/api/v1/products", "");
        assert_eq!(p.total_pages, 8);
    }

    #[test]
    fn page_past_the_end_clamps_with_warning() {
        let (p, n) = Pagination::compute(100, 99, 15, "/api/v1/products", "");
        assert_eq!(p.current_page, 7);
        assert_eq!(
            n.unwrap().message,
            "Page 99 is past the last page, showing page 7"
        );
    }

    #[test]
    fn next_and_prev_are_strings_or_null() {
        let (p, _) = Pagination::compute(100, 3, 15, "/api/v1/products", "");
        assert_eq!(p.next_page.as_deref(), Some("4"));
        assert_eq!(p.prev_page.as_deref(), Some("2"));

        let (first, _) = Pagination::compute(100, 1, 15, "/api/v1/products", "");
        assert_eq!(first.prev_page, None);
        let (last, _) = Pagination::compute(100, 7, 15, "/api/v1/products", "");
        assert_eq!(last.next_page, None);
    }

    #[test]
    fn empty_result_set_stays_on_page_one() {
        let (p, n) = Pagination::compute(0, 1, 15, "/api/v1/products", "");
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.next_page, None);
        assert!(n.is_none());
    }

    #[test]
    fn offset_tracks_the_clamped_page() {
        let (p, _) = Pagination::compute(100, 3, 15, "/api/v1/products", "");
        assert_eq!(p.offset(), 30);
        let (clamped, _) = Pagination::compute(100, 50, 15, "/api/v1/products", "");
        assert_eq!(clamped.offset(), 90);
    }

    #[test]
    fn serializes_camel_case() {
        let (p, _) = Pagination::compute(7, 1, 15, "/api/v1/products", "sort=name");
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["totalItems"], serde_json::json!(7));
        assert_eq!(v["urlQuery"], serde_json::json!("sort=name"));
        assert_eq!(v["nextPage"], serde_json::Value::Null);
    }
}
