//! List-endpoint query parameters: `page`, `per_page`, `sort`, `dir`,
//! `filter`, `search`. Invalid values never produce an HTTP error; each
//! parser returns a fallback value paired with an optional warning
//! notification, composed into the final [`ListQuery`].

use crate::registry::{FieldCast, ResourceDescriptor};
use crate::response::{AppliedFilter, FilterState, Notification, SortState};
use serde_json::Value;
use std::collections::HashMap;

pub const DEFAULT_PER_PAGE: u32 = 15;
pub const MAX_PER_PAGE: u32 = 100;
pub const MIN_SEARCH_LEN: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Validated list parameters plus the notifications their fallbacks produced.
#[derive(Clone, Debug)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub sort: String,
    pub dir: SortDir,
    /// Applied filter with its value already coerced to the column's type.
    pub filter: Option<(String, Value)>,
    pub search: Option<String>,
    pub notifications: Vec<Notification>,
    /// Query string with paging parameters removed, for pagination links.
    pub url_query: String,
}

impl ListQuery {
    pub fn parse(params: &HashMap<String, String>, desc: &ResourceDescriptor) -> ListQuery {
        let mut notifications = Vec::new();

        let (page, n) = parse_page(params.get("page").map(String::as_str));
        notifications.extend(n);
        let (per_page, n) = parse_per_page(params.get("per_page").map(String::as_str));
        notifications.extend(n);
        let (sort, n) = parse_sort(params.get("sort").map(String::as_str), desc);
        notifications.extend(n);
        let (dir, n) = parse_dir(params.get("dir").map(String::as_str));
        notifications.extend(n);
        let (filter, n) = parse_filter(params.get("filter").map(String::as_str), desc);
        notifications.extend(n);
        let (search, n) = parse_search(params.get("search").map(String::as_str));
        notifications.extend(n);

        ListQuery {
            page,
            per_page,
            sort,
            dir,
            filter,
            search,
            notifications,
            url_query: non_paging_query(params),
        }
    }

    pub fn sort_state(&self) -> SortState {
        SortState {
            column: self.sort.clone(),
            dir: self.dir.as_str().to_string(),
        }
    }

    pub fn filter_state(&self, desc: &ResourceDescriptor) -> FilterState {
        FilterState {
            applied: self.filter.as_ref().map(|(field, value)| AppliedFilter {
                field: field.clone(),
                value: match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            }),
            available: desc.filterable_columns().iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn parse_page(raw: Option<&str>) -> (u32, Option<Notification>) {
    let Some(raw) = raw else { return (1, None) };
    match raw.parse::<i64>() {
        Ok(n) if n >= 1 => (n.min(u32::MAX as i64) as u32, None),
        _ => (
            1,
            Some(Notification::warning(format!(
                "Invalid page number '{}', using page 1",
                raw
            ))),
        ),
    }
}

fn parse_per_page(raw: Option<&str>) -> (u32, Option<Notification>) {
    let Some(raw) = raw else { return (DEFAULT_PER_PAGE, None) };
    match raw.parse::<i64>() {
        Ok(n) if n > MAX_PER_PAGE as i64 => (
            MAX_PER_PAGE,
            Some(Notification::warning(format!(
                "per_page {} is above the maximum, using {}",
                n, MAX_PER_PAGE
            ))),
        ),
        Ok(n) if n < 1 => (
            1,
            Some(Notification::warning(format!(
                "per_page {} is below the minimum, using 1",
                n
            ))),
        ),
        Ok(n) => (n as u32, None),
        Err(_) => (
            DEFAULT_PER_PAGE,
            Some(Notification::warning(format!(
                "Invalid per_page '{}', using {}",
                raw, DEFAULT_PER_PAGE
            ))),
        ),
    }
}

fn parse_sort(raw: Option<&str>, desc: &ResourceDescriptor) -> (String, Option<Notification>) {
    let Some(raw) = raw else { return (desc.default_sort.clone(), None) };
    if desc.sortable_columns().contains(&raw) {
        (raw.to_string(), None)
    } else {
        (
            desc.default_sort.clone(),
            Some(Notification::warning(format!(
                "Unknown sort column '{}', using '{}'",
                raw, desc.default_sort
            ))),
        )
    }
}

fn parse_dir(raw: Option<&str>) -> (SortDir, Option<Notification>) {
    match raw {
        None => (SortDir::Asc, None),
        Some(s) if s.eq_ignore_ascii_case("asc") => (SortDir::Asc, None),
        Some(s) if s.eq_ignore_ascii_case("desc") => (SortDir::Desc, None),
        Some(s) => (
            SortDir::Asc,
            Some(Notification::warning(format!(
                "Invalid sort direction '{}', using 'asc'",
                s
            ))),
        ),
    }
}

fn parse_filter(
    raw: Option<&str>,
    desc: &ResourceDescriptor,
) -> (Option<(String, Value)>, Option<Notification>) {
    let Some(raw) = raw else { return (None, None) };
    let Some((field, value)) = raw.split_once(':') else {
        return (
            None,
            Some(Notification::warning(format!(
                "Ignoring malformed filter '{}', expected 'field:value'",
                raw
            ))),
        );
    };
    if field.is_empty() || value.is_empty() {
        return (
            None,
            Some(Notification::warning(format!(
                "Ignoring malformed filter '{}', expected 'field:value'",
                raw
            ))),
        );
    }
    if !desc.filterable_columns().contains(&field) {
        return (
            None,
            Some(Notification::warning(format!(
                "Ignoring filter on unknown field '{}'",
                field
            ))),
        );
    }
    let cast = desc
        .find_field(field)
        .map(|f| f.cast)
        .unwrap_or(FieldCast::Text);
    match coerce_filter_value(cast, value) {
        Some(coerced) => (Some((field.to_string(), coerced)), None),
        None => (
            None,
            Some(Notification::warning(format!(
                "Ignoring filter on '{}': '{}' is not a valid {}",
                field,
                value,
                cast_label(cast)
            ))),
        ),
    }
}

/// Coerce the raw filter value to the filtered column's type so the bind
/// matches. An uncoercible value drops the filter (never a DB error).
fn coerce_filter_value(cast: FieldCast, raw: &str) -> Option<Value> {
    match cast {
        FieldCast::Integer => raw.parse::<i64>().ok().map(|n| Value::Number(n.into())),
        FieldCast::Boolean if raw.eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
        FieldCast::Boolean if raw.eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
        FieldCast::Boolean => None,
        FieldCast::Decimal => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        FieldCast::Date => chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|_| Value::String(raw.to_string())),
        FieldCast::DateTime => {
            let ok = chrono::DateTime::parse_from_rfc3339(raw).is_ok()
                || chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").is_ok();
            ok.then(|| Value::String(raw.to_string()))
        }
        FieldCast::Json => serde_json::from_str(raw).ok(),
        FieldCast::Text | FieldCast::Email | FieldCast::Password => {
            Some(Value::String(raw.to_string()))
        }
    }
}

fn cast_label(cast: FieldCast) -> &'static str {
    match cast {
        FieldCast::Integer => "integer",
        FieldCast::Boolean => "boolean",
        FieldCast::Decimal => "number",
        FieldCast::Date => "date",
        FieldCast::DateTime => "datetime",
        FieldCast::Json => "JSON value",
        FieldCast::Text | FieldCast::Email | FieldCast::Password => "value",
    }
}

fn parse_search(raw: Option<&str>) -> (Option<String>, Option<Notification>) {
    let Some(raw) = raw else { return (None, None) };
    let term = raw.trim();
    if term.is_empty() {
        return (None, None);
    }
    if term.chars().count() < MIN_SEARCH_LEN {
        return (
            None,
            Some(Notification::warning(format!(
                "Search term must be at least {} characters, ignoring",
                MIN_SEARCH_LEN
            ))),
        );
    }
    (Some(term.to_string()), None)
}

/// Rebuild the query string without `page`/`per_page`, keys sorted so the
/// result is stable regardless of incoming parameter order.
fn non_paging_query(params: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> = params
        .iter()
        .filter(|(k, _)| k.as_str() != "page" && k.as_str() != "per_page")
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldDescriptor;
    use crate::response::NotificationKind;
    use serde_json::json;

    fn desc() -> ResourceDescriptor {
        ResourceDescriptor::new("Product", "products")
            .field(FieldDescriptor::new("name").sortable().searchable())
            .field(FieldDescriptor::new("status").filterable())
            .field(FieldDescriptor::new("category_id").filterable())
            .field(FieldDescriptor::new("enabled").filterable())
            .field(FieldDescriptor::new("price").filterable())
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_no_parameters_given() {
        let q = ListQuery::parse(&params(&[]), &desc());
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, DEFAULT_PER_PAGE);
        assert_eq!(q.sort, "id");
        assert_eq!(q.dir, SortDir::Asc);
        assert!(q.filter.is_none());
        assert!(q.search.is_none());
        assert!(q.notifications.is_empty());
    }

    #[test]
    fn page_zero_falls_back_with_exact_warning() {
        let q = ListQuery::parse(&params(&[("page", "0")]), &desc());
        assert_eq!(q.page, 1);
        assert_eq!(q.notifications.len(), 1);
        assert_eq!(q.notifications[0].kind, NotificationKind::Warning);
        assert_eq!(q.notifications[0].message, "Invalid page number '0', using page 1");
    }

    #[test]
    fn non_numeric_page_falls_back() {
        let q = ListQuery::parse(&params(&[("page", "abc")]), &desc());
        assert_eq!(q.page, 1);
        assert_eq!(q.notifications[0].message, "Invalid page number 'abc', using page 1");
    }

    #[test]
    fn per_page_clamps_to_nearer_bound_with_one_warning() {
        let q = ListQuery::parse(&params(&[("per_page", "150")]), &desc());
        assert_eq!(q.per_page, 100);
        assert_eq!(q.notifications.len(), 1);

        let q = ListQuery::parse(&params(&[("per_page", "0")]), &desc());
        assert_eq!(q.per_page, 1);
        assert_eq!(q.notifications.len(), 1);

        let q = ListQuery::parse(&params(&[("per_page", "lots")]), &desc());
        assert_eq!(q.per_page, DEFAULT_PER_PAGE);
        assert_eq!(q.notifications.len(), 1);
    }

    #[test]
    fn unknown_sort_column_uses_default() {
        let q = ListQuery::parse(&params(&[("sort", "secret")]), &desc());
        assert_eq!(q.sort, "id");
        assert_eq!(q.notifications[0].message, "Unknown sort column 'secret', using 'id'");

        let q = ListQuery::parse(&params(&[("sort", "name")]), &desc());
        assert_eq!(q.sort, "name");
        assert!(q.notifications.is_empty());
    }

    #[test]
    fn dir_is_case_insensitive() {
        let q = ListQuery::parse(&params(&[("dir", "DESC")]), &desc());
        assert_eq!(q.dir, SortDir::Desc);
        assert!(q.notifications.is_empty());

        let q = ListQuery::parse(&params(&[("dir", "sideways")]), &desc());
        assert_eq!(q.dir, SortDir::Asc);
        assert_eq!(q.notifications.len(), 1);
    }

    #[test]
    fn filter_requires_known_field_and_colon_syntax() {
        let q = ListQuery::parse(&params(&[("filter", "status:active")]), &desc());
        assert_eq!(q.filter, Some(("status".into(), json!("active"))));

        let q = ListQuery::parse(&params(&[("filter", "statusactive")]), &desc());
        assert!(q.filter.is_none());
        assert_eq!(q.notifications.len(), 1);

        let q = ListQuery::parse(&params(&[("filter", "name:widget")]), &desc());
        assert!(q.filter.is_none());
        assert_eq!(q.notifications[0].message, "Ignoring filter on unknown field 'name'");
    }

    #[test]
    fn filter_values_coerce_to_the_column_type() {
        let q = ListQuery::parse(&params(&[("filter", "category_id:7")]), &desc());
        assert_eq!(q.filter, Some(("category_id".into(), json!(7))));

        let q = ListQuery::parse(&params(&[("filter", "enabled:TRUE")]), &desc());
        assert_eq!(q.filter, Some(("enabled".into(), json!(true))));

        let q = ListQuery::parse(&params(&[("filter", "price:19.99")]), &desc());
        assert_eq!(q.filter, Some(("price".into(), json!(19.99))));
    }

    #[test]
    fn uncoercible_filter_value_is_dropped_with_warning() {
        let q = ListQuery::parse(&params(&[("filter", "category_id:abc")]), &desc());
        assert!(q.filter.is_none());
        assert_eq!(q.notifications.len(), 1);
        assert_eq!(q.notifications[0].kind, NotificationKind::Warning);
        assert_eq!(
            q.notifications[0].message,
            "Ignoring filter on 'category_id': 'abc' is not a valid integer"
        );

        let q = ListQuery::parse(&params(&[("filter", "enabled:maybe")]), &desc());
        assert!(q.filter.is_none());
        assert_eq!(
            q.notifications[0].message,
            "Ignoring filter on 'enabled': 'maybe' is not a valid boolean"
        );
    }

    #[test]
    fn short_search_terms_are_ignored_with_warning() {
        let q = ListQuery::parse(&params(&[("search", "a")]), &desc());
        assert!(q.search.is_none());
        assert_eq!(q.notifications.len(), 1);

        let q = ListQuery::parse(&params(&[("search", "ab")]), &desc());
        assert_eq!(q.search.as_deref(), Some("ab"));
    }

    #[test]
    fn url_query_drops_paging_parameters() {
        let q = ListQuery::parse(
            &params(&[("page", "3"), ("per_page", "50"), ("sort", "name"), ("dir", "desc")]),
            &desc(),
        );
        assert_eq!(q.url_query, "dir=desc&sort=name");
    }

    #[test]
    fn multiple_bad_parameters_accumulate_notifications() {
        let q = ListQuery::parse(
            &params(&[("page", "-1"), ("per_page", "9999"), ("dir", "up")]),
            &desc(),
        );
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, 100);
        assert_eq!(q.dir, SortDir::Asc);
        assert_eq!(q.notifications.len(), 3);
    }
}
