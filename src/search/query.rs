//! Query filter sets and their translation into backend queries

use crate::models::{OpinionType, Product};
use crate::search::document::{
    FIELD_CREATED, FIELD_HAS_URL, FIELD_LOCALE, FIELD_OS, FIELD_PRODUCT, FIELD_TYPE,
    FIELD_VERSION,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::ops::Bound;

const SECONDS_PER_DAY: i64 = 86_400;

/// Term token restricting results to opinions that carry a URL
const HAS_URL_TOKEN: &str = "url:*";

/// Characters with meaning in the backend query syntax
const QUERY_SYNTAX: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '\'', '~', '*', '?', ':',
    '\\', '/', '<', '>', '=',
];

/// Sort order for search results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Field and direction to sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSort {
    pub field: &'static str,
    pub order: SortOrder,
}

impl SearchSort {
    /// Reverse-chronological by creation time. Every opinion query uses this.
    pub fn newest_first() -> Self {
        Self {
            field: FIELD_CREATED,
            order: SortOrder::Descending,
        }
    }
}

/// Request-scoped set of search filters. Unset filters impose no constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilterSet {
    /// Free-text term; empty matches everything
    pub term: String,
    pub product: Option<Product>,
    pub version: Option<String>,
    pub os: Option<String>,
    pub opinion_type: Option<OpinionType>,
    pub locale: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
}

impl Default for QueryFilterSet {
    fn default() -> Self {
        Self::new("")
    }
}

impl QueryFilterSet {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            product: None,
            version: None,
            os: None,
            opinion_type: None,
            locale: None,
            date_start: None,
            date_end: None,
            page: 1,
            per_page: 20,
        }
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.product = Some(product);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = non_empty(version.into());
        self
    }

    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = non_empty(os.into());
        self
    }

    pub fn with_type(mut self, opinion_type: OpinionType) -> Self {
        self.opinion_type = Some(opinion_type);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = non_empty(locale.into());
        self
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.date_start = start;
        self.date_end = end;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Offset of the first result on the requested page
    pub fn offset(&self) -> usize {
        self.page.max(1).saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Creation-time constraint described by the date filters
    pub fn created_range(&self) -> CreatedRange {
        let lower = self.date_start.map(start_of_day);
        let upper = self.date_end.map(|d| start_of_day(d) + SECONDS_PER_DAY - 1);

        match (lower, upper) {
            (None, None) => CreatedRange::Any,
            (Some(lo), Some(hi)) if lo > hi => CreatedRange::Empty,
            (lo, hi) => CreatedRange::Within {
                lower: lo.map_or(Bound::Unbounded, Bound::Included),
                upper: hi.map_or(Bound::Unbounded, Bound::Included),
            },
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn start_of_day(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Creation-time constraint derived from a filter set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatedRange {
    /// No date filter
    Any,
    /// Inclusive bounds in unix seconds
    Within { lower: Bound<i64>, upper: Bound<i64> },
    /// Start after end; matches nothing
    Empty,
}

/// Neutralize query-syntax and control characters in a user-supplied term.
///
/// The result is plain lowercase words separated by single spaces, so the
/// backend never sees operators, field prefixes or unbalanced groups.
pub fn sanitize_term(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_control() || QUERY_SYNTAX.contains(&c) {
                ' '
            } else {
                c
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split the `url:*` token out of a raw term. Returns whether it was present
/// and the rest of the term.
pub fn extract_url_token(raw: &str) -> (bool, String) {
    let mut has_url = false;
    let rest: Vec<&str> = raw
        .split_whitespace()
        .filter(|word| {
            let is_token = word.eq_ignore_ascii_case(HAS_URL_TOKEN);
            has_url |= is_token;
            !is_token
        })
        .collect();
    (has_url, rest.join(" "))
}

/// How the free-text part of a query matches documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matching {
    /// Every document
    All,
    /// Documents containing all of these (sanitized) words
    Terms(String),
    /// No document
    Nothing,
}

/// A value for an exact-match constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    U64(u64),
    Text(String),
}

/// A single structured constraint on a catalog field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Exact {
        field: &'static str,
        value: FieldValue,
    },
    Range {
        field: &'static str,
        lower: Bound<i64>,
        upper: Bound<i64>,
    },
}

/// Count matches per value of a numeric field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBy {
    pub field: &'static str,
    pub values: Vec<u64>,
}

/// Backend-neutral query: text match, constraints, sort and page window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendQuery {
    pub matching: Matching,
    pub constraints: Vec<Constraint>,
    pub sort: SearchSort,
    pub offset: usize,
    /// Zero requests counts only
    pub limit: usize,
    pub group_by: Option<GroupBy>,
}

impl BackendQuery {
    /// Translate a filter set. The page window is clamped to `max_matches`;
    /// pages past the window get a count-only query.
    pub fn from_filters(filters: &QueryFilterSet, max_matches: usize) -> Self {
        let (has_url, term) = extract_url_token(&filters.term);
        let mut matching = if term.is_empty() {
            Matching::All
        } else {
            match sanitize_term(&term) {
                sanitized if sanitized.is_empty() => Matching::Nothing,
                sanitized => Matching::Terms(sanitized),
            }
        };

        let mut constraints = Vec::new();

        if has_url {
            constraints.push(Constraint::Exact {
                field: FIELD_HAS_URL,
                value: FieldValue::U64(1),
            });
        }

        if let Some(product) = filters.product {
            constraints.push(Constraint::Exact {
                field: FIELD_PRODUCT,
                value: FieldValue::U64(product.id()),
            });
        }
        if let Some(opinion_type) = filters.opinion_type {
            constraints.push(Constraint::Exact {
                field: FIELD_TYPE,
                value: FieldValue::U64(opinion_type.code()),
            });
        }
        for (field, value) in [
            (FIELD_VERSION, &filters.version),
            (FIELD_OS, &filters.os),
            (FIELD_LOCALE, &filters.locale),
        ] {
            if let Some(value) = value {
                constraints.push(Constraint::Exact {
                    field,
                    value: FieldValue::Text(value.clone()),
                });
            }
        }

        match filters.created_range() {
            CreatedRange::Any => {}
            CreatedRange::Within { lower, upper } => constraints.push(Constraint::Range {
                field: FIELD_CREATED,
                lower,
                upper,
            }),
            CreatedRange::Empty => matching = Matching::Nothing,
        }

        let offset = filters.offset();
        let limit = if offset >= max_matches {
            0
        } else {
            filters.per_page.min(max_matches - offset)
        };

        Self {
            matching,
            constraints,
            sort: SearchSort::newest_first(),
            offset,
            limit,
            group_by: Some(GroupBy {
                field: FIELD_TYPE,
                values: [
                    OpinionType::Praise,
                    OpinionType::Issue,
                    OpinionType::Suggestion,
                ]
                .iter()
                .map(|t| t.code())
                .collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_filter_set_builder() {
        let filters = QueryFilterSet::new("crash")
            .with_product(Product::Firefox)
            .with_version("3.6.3")
            .with_os("")
            .with_page(3)
            .with_per_page(20);

        assert_eq!(filters.term, "crash");
        assert_eq!(filters.version.as_deref(), Some("3.6.3"));
        assert!(filters.os.is_none());
        assert_eq!(filters.offset(), 40);
    }

    #[test]
    fn test_page_zero_is_first_page() {
        let filters = QueryFilterSet::default().with_page(0);
        assert_eq!(filters.page, 1);
        assert_eq!(filters.offset(), 0);
    }

    #[test]
    fn test_sanitize_term() {
        assert_eq!(sanitize_term("^"), "");
        assert_eq!(sanitize_term("  Firefox   CRASH "), "firefox crash");
        assert_eq!(sanitize_term("url:* (foo OR \"bar\")"), "url foo or bar");
        assert_eq!(sanitize_term("tab\u{0}\u{7}s"), "tab s");
        assert_eq!(sanitize_term("Schöne Grüße"), "schöne grüße");
    }

    #[test]
    fn test_single_day_range_is_inclusive() {
        let filters =
            QueryFilterSet::default().with_date_range(Some(date(2010, 5, 27)), Some(date(2010, 5, 27)));

        let start = start_of_day(date(2010, 5, 27));
        assert_eq!(
            filters.created_range(),
            CreatedRange::Within {
                lower: Bound::Included(start),
                upper: Bound::Included(start + SECONDS_PER_DAY - 1),
            }
        );
    }

    #[test]
    fn test_flipped_range_matches_nothing() {
        let filters =
            QueryFilterSet::default().with_date_range(Some(date(2010, 9, 1)), Some(date(2010, 6, 1)));
        assert_eq!(filters.created_range(), CreatedRange::Empty);

        let query = BackendQuery::from_filters(&filters, 1000);
        assert_eq!(query.matching, Matching::Nothing);
        assert!(query.constraints.is_empty());
    }

    #[test]
    fn test_translation() {
        let filters = QueryFilterSet::new("Firefox")
            .with_product(Product::Firefox)
            .with_type(OpinionType::Issue)
            .with_locale("de")
            .with_date_range(Some(date(2010, 1, 1)), None);

        let query = BackendQuery::from_filters(&filters, 1000);
        assert_eq!(query.matching, Matching::Terms("firefox".to_string()));
        assert_eq!(query.sort, SearchSort::newest_first());
        assert!(query.constraints.contains(&Constraint::Exact {
            field: FIELD_PRODUCT,
            value: FieldValue::U64(1),
        }));
        assert!(query.constraints.contains(&Constraint::Exact {
            field: FIELD_TYPE,
            value: FieldValue::U64(2),
        }));
        assert!(query.constraints.contains(&Constraint::Exact {
            field: FIELD_LOCALE,
            value: FieldValue::Text("de".to_string()),
        }));
        assert!(query.constraints.contains(&Constraint::Range {
            field: FIELD_CREATED,
            lower: Bound::Included(start_of_day(date(2010, 1, 1))),
            upper: Bound::Unbounded,
        }));
    }

    #[test]
    fn test_url_token() {
        assert_eq!(extract_url_token("url:*"), (true, String::new()));
        assert_eq!(extract_url_token("crash URL:* tabs"), (true, "crash tabs".to_string()));
        assert_eq!(extract_url_token("url:example"), (false, "url:example".to_string()));

        let query = BackendQuery::from_filters(&QueryFilterSet::new("url:*"), 1000);
        assert_eq!(query.matching, Matching::All);
        assert_eq!(
            query.constraints,
            vec![Constraint::Exact {
                field: FIELD_HAS_URL,
                value: FieldValue::U64(1),
            }]
        );
    }

    #[test]
    fn test_hostile_term_matches_nothing() {
        let query = BackendQuery::from_filters(&QueryFilterSet::new("^"), 1000);
        assert_eq!(query.matching, Matching::Nothing);
    }

    #[test]
    fn test_window_is_clamped() {
        let query = BackendQuery::from_filters(&QueryFilterSet::default().with_page(700), 1000);
        assert_eq!(query.limit, 0);

        let query = BackendQuery::from_filters(
            &QueryFilterSet::default().with_page(50).with_per_page(30),
            1000,
        );
        assert_eq!(query.offset, 1470);
        assert_eq!(query.limit, 0);

        let query = BackendQuery::from_filters(
            &QueryFilterSet::default().with_page(34).with_per_page(30),
            1000,
        );
        assert_eq!(query.offset, 990);
        assert_eq!(query.limit, 10);
    }
}
