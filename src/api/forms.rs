use crate::config::SiteConfig;
use crate::models::{OpinionType, Product};
use crate::search::QueryFilterSet;
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

/// Longest accepted search term, in characters
pub const MAX_QUERY_LENGTH: u64 = 200;

/// Accepted date formats, tried in order
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Raw search parameters as they arrive on the query string.
///
/// Everything is kept as text so that malformed values reach form
/// validation instead of being rejected by the extractor.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SearchParams {
    #[serde(default)]
    #[validate(length(max = MAX_QUERY_LENGTH))]
    pub q: String,
    pub product: Option<String>,
    pub version: Option<String>,
    pub os: Option<String>,
    #[serde(rename = "type")]
    pub opinion_type: Option<String>,
    pub locale: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub page: Option<String>,
}

/// The search form did not validate. Carries one message per bad field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid search form: {}", .0.join("; "))]
pub struct ValidationFailure(pub Vec<String>);

/// Outcome of cleaning a search form
#[derive(Debug, Clone)]
pub struct SearchForm {
    pub filters: QueryFilterSet,
    /// Product the results are for; the site default when the form is invalid
    pub product: Product,
    pub errors: Option<ValidationFailure>,
}

impl SearchForm {
    pub fn is_valid(&self) -> bool {
        self.errors.is_none()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, raw: &str, errors: &mut Vec<String>) -> Option<NaiveDate> {
    let parsed = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok());
    if parsed.is_none() {
        errors.push(format!("{field}: not a date: {raw:?}"));
    }
    parsed
}

impl SearchParams {
    /// Validate and convert into a filter set.
    ///
    /// A missing product uses the site default. On failure the returned
    /// form still names the site default product so callers can render an
    /// empty page for it.
    pub fn clean(&self, site: &SiteConfig, per_page: usize) -> SearchForm {
        let mut errors = Vec::new();

        if let Err(e) = self.validate() {
            errors.extend(e.field_errors().keys().map(|field| {
                format!("{field}: longer than {MAX_QUERY_LENGTH} characters")
            }));
        }

        let product = match present(&self.product) {
            None => Some(site.default_product),
            Some(raw) => {
                let product = Product::from_param(raw);
                if product.is_none() {
                    errors.push(format!("product: unknown product {raw:?}"));
                }
                product
            }
        };

        let opinion_type = present(&self.opinion_type).and_then(|raw| {
            let parsed = OpinionType::from_param(raw);
            if parsed.is_none() {
                errors.push(format!("type: unknown opinion type {raw:?}"));
            }
            parsed
        });

        let date_start = present(&self.date_start).and_then(|raw| parse_date("date_start", raw, &mut errors));
        let date_end = present(&self.date_end).and_then(|raw| parse_date("date_end", raw, &mut errors));

        let page = match present(&self.page) {
            None => 1,
            Some(raw) => raw.parse::<usize>().unwrap_or_else(|_| {
                errors.push(format!("page: not a number: {raw:?}"));
                1
            }),
        };

        let term = self.q.trim();

        if !errors.is_empty() {
            let product = site.default_product;
            return SearchForm {
                filters: QueryFilterSet::new(term)
                    .with_product(product)
                    .with_per_page(per_page),
                product,
                errors: Some(ValidationFailure(errors)),
            };
        }

        let product = product.unwrap_or(site.default_product);
        let mut filters = QueryFilterSet::new(term)
            .with_product(product)
            .with_date_range(date_start, date_end)
            .with_page(page)
            .with_per_page(per_page);

        if let Some(version) = present(&self.version) {
            filters = filters.with_version(version);
        }
        if let Some(os) = present(&self.os) {
            filters = filters.with_os(os);
        }
        if let Some(locale) = present(&self.locale) {
            filters = filters.with_locale(locale);
        }
        if let Some(opinion_type) = opinion_type {
            filters = filters.with_type(opinion_type);
        }

        SearchForm {
            filters,
            product,
            errors: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> SearchParams {
        let json: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
            .collect();
        serde_json::from_value(serde_json::Value::Object(json)).unwrap()
    }

    #[test]
    fn test_missing_product_uses_default() {
        let site = SiteConfig {
            default_product: Product::Mobile,
            ..Default::default()
        };
        let form = params(&[("q", "crash")]).clean(&site, 20);
        assert!(form.is_valid());
        assert_eq!(form.product, Product::Mobile);
        assert_eq!(form.filters.product, Some(Product::Mobile));
        assert_eq!(form.filters.term, "crash");
    }

    #[test]
    fn test_full_form() {
        let form = params(&[
            ("product", "firefox"),
            ("version", "3.6.3"),
            ("os", "mac"),
            ("type", "2"),
            ("locale", "de"),
            ("date_start", "01/01/2000"),
            ("date_end", "2011-01-01"),
            ("page", "3"),
        ])
        .clean(&SiteConfig::default(), 20);

        assert!(form.is_valid());
        let filters = form.filters;
        assert_eq!(filters.version.as_deref(), Some("3.6.3"));
        assert_eq!(filters.os.as_deref(), Some("mac"));
        assert_eq!(filters.opinion_type, Some(OpinionType::Issue));
        assert_eq!(filters.locale.as_deref(), Some("de"));
        assert_eq!(filters.date_start, NaiveDate::from_ymd_opt(2000, 1, 1));
        assert_eq!(filters.date_end, NaiveDate::from_ymd_opt(2011, 1, 1));
        assert_eq!(filters.page, 3);
    }

    #[test]
    fn test_invalid_fields_fail_form() {
        for pairs in [
            &[("product", "sunbird")][..],
            &[("type", "rant")][..],
            &[("date_start", "yesterday")][..],
            &[("page", "two")][..],
        ] {
            let form = params(pairs).clean(&SiteConfig::default(), 20);
            assert!(!form.is_valid(), "{pairs:?} should not validate");
            assert_eq!(form.product, Product::Firefox);
            assert_eq!(form.filters.product, Some(Product::Firefox));
        }
    }

    #[test]
    fn test_overlong_term_fails_form() {
        let long = "a".repeat(MAX_QUERY_LENGTH as usize + 1);
        let form = params(&[("q", long.as_str())]).clean(&SiteConfig::default(), 20);
        assert!(!form.is_valid());
    }

    #[test]
    fn test_empty_values_are_absent() {
        let form = params(&[("product", ""), ("version", " "), ("date_start", "")])
            .clean(&SiteConfig::default(), 20);
        assert!(form.is_valid());
        assert!(form.filters.version.is_none());
        assert!(form.filters.date_start.is_none());
    }
}
