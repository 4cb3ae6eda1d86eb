//! Query client: runs a filter set against the backend and hydrates the hits

use crate::metrics::{SEARCH_QUERIES_TOTAL, SEARCH_QUERY_DURATION_SECONDS};
use crate::models::OpinionType;
use crate::search::backend::SearchBackend;
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};
use crate::search::query::{BackendQuery, QueryFilterSet};
use crate::search::results::{SearchResultSet, TypeCount};
use crate::state::OpinionStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Entry point for opinion searches.
///
/// One backend call per query, bounded by the configured timeout. There is
/// no retry: any fault, and any error the backend flags after the call,
/// fails the whole query.
#[derive(Clone)]
pub struct QueryClient {
    backend: Arc<dyn SearchBackend>,
    store: Arc<dyn OpinionStore>,
    config: SearchConfig,
}

impl QueryClient {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        store: Arc<dyn OpinionStore>,
        config: SearchConfig,
    ) -> Self {
        Self {
            backend,
            store,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run a query and return one page of opinions, newest first
    #[instrument(skip(self, filters), fields(term = %filters.term, page = filters.page))]
    pub async fn query(&self, filters: &QueryFilterSet) -> SearchResult<SearchResultSet> {
        let start = Instant::now();
        let outcome = self.run(filters).await;

        let label = match &outcome {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        SEARCH_QUERIES_TOTAL.with_label_values(&[label]).inc();
        SEARCH_QUERY_DURATION_SECONDS
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        match &outcome {
            Ok(results) => debug!(
                total = results.total,
                returned = results.opinions.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Search completed"
            ),
            Err(e) => warn!(error = %e, kind = e.kind(), "Search failed"),
        }

        outcome
    }

    async fn run(&self, filters: &QueryFilterSet) -> SearchResult<SearchResultSet> {
        let query = BackendQuery::from_filters(filters, self.config.max_matches);
        let timeout = self.config.query_timeout();

        let hits = match tokio::time::timeout(timeout, self.backend.execute(&query)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SearchError::Timeout(format!(
                    "no answer within {} ms",
                    timeout.as_millis()
                )))
            }
        };

        if let Some(message) = hits.last_error() {
            return Err(SearchError::LastError(message.to_string()));
        }

        let opinions = self
            .store
            .get_opinions(&hits.ids)
            .await
            .map_err(|e| SearchError::Persistence(e.to_string()))?;

        if opinions.len() < hits.ids.len() {
            warn!(
                hits = hits.ids.len(),
                hydrated = opinions.len(),
                "Search hits missing from the store; index may be stale"
            );
        }

        let type_counts = hits
            .groups
            .iter()
            .filter_map(|(code, count)| {
                OpinionType::from_code(*code).map(|t| TypeCount::new(t, *count))
            })
            .collect();

        Ok(SearchResultSet {
            opinions,
            total: hits.total,
            page: filters.page.max(1),
            per_page: filters.per_page,
            type_counts,
        })
    }
}
