//! Tantivy-backed search catalog: lifecycle, rebuilds and query execution

use crate::search::backend::{BackendFault, BackendHits, IndexMaintenance, IndexStats, SearchBackend};
use crate::search::config::SearchConfig;
use crate::search::document::{build_opinion_schema, OpinionDocument, FIELD_ID, TEXT_FIELDS};
use crate::search::error::{SearchError, SearchResult};
use crate::search::query::{BackendQuery, Constraint, FieldValue, Matching, SortOrder};
use crate::state::OpinionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{AllQuery, BooleanQuery, EmptyQuery, Occur, Query, QueryParser, RangeQuery, TermQuery};
use tantivy::schema::{IndexRecordOption, Schema, Value};
use tantivy::{Index, IndexReader, IndexWriter, Order, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info, warn};

/// An opened catalog that is serving queries
#[derive(Clone)]
struct RunningIndex {
    index: Index,
    reader: IndexReader,
}

/// Search backend over an on-disk Tantivy catalog.
///
/// The catalog is "running" between `start()` and `stop()`; queries against a
/// stopped backend fail with [`BackendFault::Unavailable`]. Rebuilds work in
/// either state and are serialized.
pub struct TantivyBackend {
    config: SearchConfig,
    schema: Schema,
    running: RwLock<Option<RunningIndex>>,
    last_reindex: Mutex<Option<DateTime<Utc>>>,
    reindex_lock: tokio::sync::Mutex<()>,
}

impl TantivyBackend {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            schema: build_opinion_schema(),
            running: RwLock::new(None),
            last_reindex: Mutex::new(None),
            reindex_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Check if a catalog exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    fn open_or_create(&self) -> SearchResult<Index> {
        let path = &self.config.index_path;
        std::fs::create_dir_all(path).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create index directory: {}", e))
        })?;

        if Self::index_exists(path) {
            let index = Index::open_in_dir(path).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
            })?;
            if index.schema() == self.schema {
                return Ok(index);
            }

            // Outdated catalog; the next reindex refills it
            warn!(path = ?path, "Search index schema is outdated; recreating an empty catalog");
            drop(index);
            std::fs::remove_dir_all(path)?;
            std::fs::create_dir_all(path)?;
        }

        Index::create_in_dir(path, self.schema.clone()).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
        })
    }

    fn open_reader(index: &Index) -> SearchResult<IndexReader> {
        index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))
    }

    fn directory_size(&self) -> u64 {
        std::fs::read_dir(&self.config.index_path)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl SearchBackend for TantivyBackend {
    async fn execute(&self, query: &BackendQuery) -> Result<BackendHits, BackendFault> {
        let running = self
            .running
            .read()
            .clone()
            .ok_or_else(|| BackendFault::Unavailable("search index is not running".to_string()))?;

        let schema = self.schema.clone();
        let query = query.clone();
        let hits = tokio::task::spawn_blocking(move || run_query(&running, &schema, &query))
            .await
            .map_err(|e| BackendFault::Execution(format!("search task failed: {}", e)))??;

        if let Some(first) = hits.last_error() {
            warn!(warnings = hits.warnings.len(), first = %first, "Search completed with warnings");
        }

        Ok(hits)
    }
}

#[async_trait]
impl IndexMaintenance for TantivyBackend {
    async fn start(&self) -> SearchResult<()> {
        if self.running.read().is_some() {
            debug!("Search index already running");
            return Ok(());
        }

        let index = self.open_or_create()?;
        let reader = Self::open_reader(&index)?;

        let mut running = self.running.write();
        if running.is_none() {
            *running = Some(RunningIndex { index, reader });
            crate::metrics::INDEX_RUNNING.set(1.0);
            info!(path = ?self.config.index_path, "Search index started");
        }
        Ok(())
    }

    async fn stop(&self) -> SearchResult<()> {
        match self.running.write().take() {
            Some(_) => {
                crate::metrics::INDEX_RUNNING.set(0.0);
                info!("Search index stopped");
            }
            None => debug!("Search index already stopped"),
        }
        Ok(())
    }

    async fn reindex(&self, store: &dyn OpinionStore) -> SearchResult<usize> {
        let _guard = self.reindex_lock.lock().await;

        let opinions = store
            .all_opinions()
            .await
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to load opinions: {}", e)))?;
        let documents: Vec<OpinionDocument> = opinions.iter().map(OpinionDocument::from).collect();

        let running = self.running.read().clone();
        let index = match running {
            Some(r) => r.index,
            None => self.open_or_create()?,
        };

        let schema = self.schema.clone();
        let heap_size = self.config.writer_heap_size;
        let indexed = tokio::task::spawn_blocking(move || -> SearchResult<usize> {
            let mut writer: IndexWriter = index.writer(heap_size).map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to create writer: {}", e))
            })?;

            writer.delete_all_documents().map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to clear index: {}", e))
            })?;

            for document in &documents {
                writer.add_document(document.to_tantivy_doc(&schema)).map_err(|e| {
                    SearchError::IndexingFailed(format!("Failed to add opinion {}: {}", document.id, e))
                })?;
            }

            writer
                .commit()
                .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit: {}", e)))?;
            writer.wait_merging_threads().map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to finish merges: {}", e))
            })?;

            Ok(documents.len())
        })
        .await
        .map_err(|e| SearchError::IndexingFailed(format!("Reindex task failed: {}", e)))??;

        // Reload the reader that is live now, which start() may have replaced
        let live = self.running.read().clone();
        if let Some(running) = live {
            running
                .reader
                .reload()
                .map_err(|e| SearchError::IndexingFailed(format!("Failed to reload reader: {}", e)))?;
        }

        *self.last_reindex.lock() = Some(Utc::now());
        crate::metrics::REINDEX_TOTAL.inc();
        info!(documents = indexed, "Search index rebuilt");

        Ok(indexed)
    }

    async fn stats(&self) -> SearchResult<IndexStats> {
        let running = self.running.read().clone();
        let reader = match &running {
            Some(r) => Some(r.reader.clone()),
            None if Self::index_exists(&self.config.index_path) => {
                Some(Self::open_reader(&self.open_or_create()?)?)
            }
            None => None,
        };

        let (total_documents, num_segments) = reader
            .map(|reader| {
                let searcher = reader.searcher();
                (searcher.num_docs(), searcher.segment_readers().len())
            })
            .unwrap_or((0, 0));

        Ok(IndexStats {
            running: running.is_some(),
            total_documents,
            num_segments,
            index_size_bytes: self.directory_size(),
            last_reindex: *self.last_reindex.lock(),
        })
    }

    fn is_running(&self) -> bool {
        self.running.read().is_some()
    }
}

fn execution_fault(context: &str) -> impl Fn(tantivy::TantivyError) -> BackendFault + '_ {
    move |e| BackendFault::Execution(format!("{}: {}", context, e))
}

/// Build the Tantivy query for a backend query
fn build_query(index: &Index, schema: &Schema, query: &BackendQuery) -> Result<Box<dyn Query>, BackendFault> {
    let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();

    match &query.matching {
        Matching::All => {}
        Matching::Nothing => return Ok(Box::new(EmptyQuery)),
        Matching::Terms(text) => {
            let fields = TEXT_FIELDS
                .iter()
                .filter_map(|name| schema.get_field(name).ok())
                .collect();
            let mut parser = QueryParser::for_index(index, fields);
            parser.set_conjunction_by_default();

            let (parsed, errors) = parser.parse_query_lenient(text);
            if let Some(first_error) = errors.first() {
                debug!(
                    error_count = errors.len(),
                    first_error = %first_error,
                    "Lenient query parse produced warnings"
                );
            }
            subqueries.push((Occur::Must, parsed));
        }
    }

    for constraint in &query.constraints {
        subqueries.push((Occur::Must, constraint_query(schema, constraint)?));
    }

    if subqueries.is_empty() {
        Ok(Box::new(AllQuery))
    } else {
        Ok(Box::new(BooleanQuery::from(subqueries)))
    }
}

fn constraint_query(schema: &Schema, constraint: &Constraint) -> Result<Box<dyn Query>, BackendFault> {
    match constraint {
        Constraint::Exact { field, value } => {
            let field = schema
                .get_field(field)
                .map_err(|e| BackendFault::Execution(format!("unknown filter field: {}", e)))?;
            let term = match value {
                FieldValue::U64(v) => Term::from_field_u64(field, *v),
                FieldValue::Text(s) => Term::from_field_text(field, s),
            };
            Ok(Box::new(TermQuery::new(term, IndexRecordOption::Basic)))
        }
        Constraint::Range { field, lower, upper } => Ok(Box::new(RangeQuery::new_i64_bounds(
            field.to_string(),
            *lower,
            *upper,
        ))),
    }
}

/// Execute a query against a running catalog. Problems that did not prevent
/// the call from completing are reported in the hits' warnings.
fn run_query(
    running: &RunningIndex,
    schema: &Schema,
    query: &BackendQuery,
) -> Result<BackendHits, BackendFault> {
    let tantivy_query = build_query(&running.index, schema, query)?;
    let searcher = running.reader.searcher();

    let total = searcher
        .search(&*tantivy_query, &Count)
        .map_err(execution_fault("count failed"))? as u64;

    let mut ids = Vec::new();
    let mut warnings = Vec::new();

    if query.limit > 0 {
        let order = match query.sort.order {
            SortOrder::Ascending => Order::Asc,
            SortOrder::Descending => Order::Desc,
        };
        let collector = TopDocs::with_limit(query.limit)
            .and_offset(query.offset)
            .order_by_fast_field::<i64>(query.sort.field, order);

        let top_docs = searcher
            .search(&*tantivy_query, &collector)
            .map_err(execution_fault("search failed"))?;

        let id_field = schema
            .get_field(FIELD_ID)
            .map_err(|e| BackendFault::Execution(format!("schema has no id field: {}", e)))?;

        for (_, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .map_err(execution_fault("failed to retrieve document"))?;

            match doc.get_first(id_field).and_then(|v| v.as_u64()) {
                Some(id) => ids.push(id),
                None => warnings.push(format!("document {:?} has no stored id", doc_address)),
            }
        }
    }

    let mut groups = Vec::new();
    if let Some(group_by) = &query.group_by {
        let field = schema
            .get_field(group_by.field)
            .map_err(|e| BackendFault::Execution(format!("unknown group field: {}", e)))?;

        for value in &group_by.values {
            let grouped = BooleanQuery::from(vec![
                (Occur::Must, tantivy_query.box_clone()),
                (
                    Occur::Must,
                    Box::new(TermQuery::new(
                        Term::from_field_u64(field, *value),
                        IndexRecordOption::Basic,
                    )) as Box<dyn Query>,
                ),
            ]);
            let count = searcher
                .search(&grouped, &Count)
                .map_err(execution_fault("group count failed"))?;
            groups.push((*value, count as u64));
        }
    }

    Ok(BackendHits {
        ids,
        total,
        groups,
        warnings,
    })
}
