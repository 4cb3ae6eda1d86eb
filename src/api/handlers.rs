use crate::api::forms::{SearchForm, SearchParams};
use crate::api::render::{render_template, SEARCH_FEED, SEARCH_PAGE};
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::metrics::{gather_metrics, SEARCH_VALIDATION_FAILURES_TOTAL};
use crate::models::{Opinion, OpinionType, Product};
use crate::search::{
    feed_title, get_sentiment, IndexStats, Pager, SearchError, SearchResultSet, SentimentSummary,
    TypeCount,
};
use axum::{
    extract::{Path, Query, RawQuery, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

/// Longest feed entry title before truncation, in characters
const FEED_TITLE_CHARS: usize = 60;

/// A cleaned search form together with the results it produced
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub form: SearchForm,
    pub results: SearchResultSet,
}

impl SearchOutcome {
    pub fn product(&self) -> Product {
        self.form.product
    }

    pub fn term(&self) -> &str {
        &self.form.filters.term
    }

    pub fn errors(&self) -> Vec<String> {
        self.form
            .errors
            .as_ref()
            .map(|failure| failure.0.clone())
            .unwrap_or_default()
    }
}

/// Shared lookup behind every search view.
///
/// An invalid form yields an empty result set for the site's default
/// product without contacting the backend. Backend failures propagate.
pub async fn get_results(
    state: &AppState,
    params: &SearchParams,
) -> std::result::Result<SearchOutcome, SearchError> {
    let form = params.clean(&state.site, state.client.config().per_page);

    if let Some(failure) = &form.errors {
        SEARCH_VALIDATION_FAILURES_TOTAL.inc();
        debug!(error = %failure, "Search form did not validate");
        let results = SearchResultSet::empty(1, form.filters.per_page);
        return Ok(SearchOutcome { form, results });
    }

    let results = state.client.query(&form.filters).await?;
    Ok(SearchOutcome { form, results })
}

/// Query string of the current request with `page` replaced
fn page_query(raw: Option<&str>, page: usize) -> String {
    let page_pair = format!("page={page}");
    let mut pairs: Vec<&str> = raw
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && *pair != "page" && !pair.starts_with("page="))
        .collect();
    pairs.push(&page_pair);
    pairs.join("&")
}

fn with_query(path: &str, raw: Option<&str>) -> String {
    match raw.filter(|q| !q.is_empty()) {
        Some(q) => format!("{path}?{q}"),
        None => path.to_string(),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

/// Opinion as shown on the search page
#[derive(Debug, Serialize)]
struct OpinionView<'a> {
    id: u64,
    #[serde(rename = "type")]
    opinion_type: OpinionType,
    description: &'a str,
    url: Option<&'a str>,
    locale: &'a str,
    version: &'a str,
    os: &'a str,
    created: String,
    detail_url: String,
}

impl<'a> OpinionView<'a> {
    fn new(opinion: &'a Opinion, detail_url: String) -> Self {
        Self {
            id: opinion.id,
            opinion_type: opinion.opinion_type,
            description: &opinion.description,
            url: opinion.url.as_deref(),
            locale: &opinion.locale,
            version: &opinion.version,
            os: &opinion.os,
            created: opinion.created.format("%Y-%m-%d %H:%M").to_string(),
            detail_url,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchPageContext<'a> {
    title: String,
    term: &'a str,
    product: &'static str,
    feed_url: String,
    total: u64,
    opinions: Vec<OpinionView<'a>>,
    pager: Pager,
    prev_url: Option<String>,
    next_url: Option<String>,
    sentiment: SentimentSummary,
    errors: Vec<String>,
}

/// HTML search page
pub async fn search_page(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    RawQuery(raw): RawQuery,
) -> Result<Html<String>> {
    let outcome = get_results(&state, &params).await?;
    let raw = raw.as_deref();
    let pager = outcome.results.pager();

    let context = SearchPageContext {
        title: feed_title(outcome.product(), outcome.term()),
        term: outcome.term(),
        product: outcome.product().short_name(),
        feed_url: with_query("/search/atom", raw),
        total: outcome.results.total,
        opinions: outcome
            .results
            .opinions
            .iter()
            .map(|o| OpinionView::new(o, format!("/{}/opinion/{}", state.site.default_locale, o.id)))
            .collect(),
        pager,
        prev_url: pager
            .previous_page()
            .map(|page| format!("/search?{}", page_query(raw, page))),
        next_url: pager
            .next_page()
            .map(|page| format!("/search?{}", page_query(raw, page))),
        sentiment: get_sentiment(&outcome.results.type_counts),
        errors: outcome.errors(),
    };

    Ok(Html(render_template(SEARCH_PAGE, &context)?))
}

#[derive(Debug, Serialize)]
struct FeedEntry {
    title: String,
    link: String,
    updated: String,
    category: OpinionType,
    summary: String,
}

#[derive(Debug, Serialize)]
struct FeedContext {
    title: String,
    feed_url: String,
    page_url: String,
    updated: String,
    entries: Vec<FeedEntry>,
}

/// Atom feed of the same results as the search page
pub async fn search_feed(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    RawQuery(raw): RawQuery,
) -> Result<Response> {
    let outcome = get_results(&state, &params).await?;
    let base = state.site.base_url.trim_end_matches('/');
    let raw = raw.as_deref();

    let updated = outcome
        .results
        .opinions
        .first()
        .map(|o| o.created)
        .unwrap_or_else(Utc::now);

    let context = FeedContext {
        title: feed_title(outcome.product(), outcome.term()),
        feed_url: format!("{base}{}", with_query("/search/atom", raw)),
        page_url: format!("{base}{}", with_query("/search", raw)),
        updated: updated.to_rfc3339(),
        entries: outcome
            .results
            .opinions
            .iter()
            .map(|o| FeedEntry {
                title: truncate_chars(&o.description, FEED_TITLE_CHARS),
                link: state.site.opinion_url(&state.site.default_locale, o.id),
                updated: o.created.to_rfc3339(),
                category: o.opinion_type,
                summary: o.description.clone(),
            })
            .collect(),
    };

    let body = render_template(SEARCH_FEED, &context)?;
    Ok((
        [(header::CONTENT_TYPE, "application/atom+xml; charset=utf-8")],
        body,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub product: Product,
    pub term: String,
    pub total: u64,
    pub page: usize,
    pub per_page: usize,
    /// Position of the first opinion on this page within the whole result
    pub offset: usize,
    pub num_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub opinions: Vec<Opinion>,
    pub type_counts: Vec<TypeCount>,
    pub sentiment: SentimentSummary,
    pub errors: Vec<String>,
}

/// JSON view of the search results
pub async fn search_json(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let outcome = get_results(&state, &params).await?;
    let pager = outcome.results.pager();
    let errors = outcome.errors();
    let product = outcome.product();
    let term = outcome.term().to_string();
    let results = outcome.results;

    Ok(Json(SearchResponse {
        product,
        term,
        total: results.total,
        page: pager.page,
        per_page: pager.per_page,
        offset: pager.offset(),
        num_pages: pager.num_pages,
        has_next: pager.has_next(),
        has_previous: pager.has_previous(),
        sentiment: get_sentiment(&results.type_counts),
        type_counts: results.type_counts,
        opinions: results.opinions,
        errors,
    }))
}

/// A single opinion
pub async fn opinion_detail(
    State(state): State<AppState>,
    Path((_locale, id)): Path<(String, u64)>,
) -> Result<Json<Opinion>> {
    state
        .store
        .get_opinion(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Opinion {} not found", id)))
}

#[derive(Debug, Serialize)]
pub struct IndexStatusResponse {
    pub running: bool,
    pub message: String,
}

/// Start serving queries
pub async fn admin_start(State(state): State<AppState>) -> Result<Json<IndexStatusResponse>> {
    state.index.start().await?;
    info!("Search index started via admin endpoint");
    Ok(Json(IndexStatusResponse {
        running: state.index.is_running(),
        message: "search index started".to_string(),
    }))
}

/// Stop serving queries
pub async fn admin_stop(State(state): State<AppState>) -> Result<Json<IndexStatusResponse>> {
    state.index.stop().await?;
    info!("Search index stopped via admin endpoint");
    Ok(Json(IndexStatusResponse {
        running: state.index.is_running(),
        message: "search index stopped".to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ReindexResponse {
    pub indexed: usize,
}

/// Rebuild the catalog from the store
pub async fn admin_reindex(State(state): State<AppState>) -> Result<Json<ReindexResponse>> {
    let indexed = state.index.reindex(state.store.as_ref()).await?;
    Ok(Json(ReindexResponse { indexed }))
}

/// Catalog statistics
pub async fn admin_stats(State(state): State<AppState>) -> Result<Json<IndexStats>> {
    Ok(Json(state.index.stats().await?))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub index_running: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let index_running = state.index.is_running();
    Json(HealthResponse {
        status: if index_running { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        index_running,
    })
}

/// Prometheus metrics endpoint
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}
