//! Full-text opinion search powered by Tantivy
//!
//! The subsystem is split along the path a query takes:
//!
//! ```text
//!  QueryFilterSet ──► QueryClient ──► SearchBackend (TantivyBackend)
//!                         │                  ▲
//!                         ▼                  │ reindex()
//!                   OpinionStore ◄─── IndexMaintenance
//!                         │
//!                         ▼
//!                  SearchResultSet ──► Pager / get_sentiment
//! ```
//!
//! # Example
//!
//! ```no_run
//! use opinion_search::search::{QueryClient, QueryFilterSet, SearchConfig, TantivyBackend};
//! use opinion_search::search::IndexMaintenance;
//! use opinion_search::state::create_in_memory_store;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SearchConfig::default();
//!     let store = create_in_memory_store();
//!     let backend = Arc::new(TantivyBackend::new(config.clone()));
//!     backend.reindex(store.as_ref()).await?;
//!     backend.start().await?;
//!
//!     let client = QueryClient::new(backend, store, config);
//!     let results = client.query(&QueryFilterSet::new("crash")).await?;
//!     println!("Found {} opinions", results.total);
//!
//!     Ok(())
//! }
//! ```

mod backend;
mod client;
mod config;
mod document;
mod error;
mod index;
mod query;
mod results;
mod sentiment;

pub use backend::{BackendFault, BackendHits, IndexMaintenance, IndexStats, SearchBackend};
pub use client::QueryClient;
pub use config::{SearchConfig, SearchConfigBuilder};
pub use document::{build_opinion_schema, OpinionDocument};
pub use error::{SearchError, SearchResult};
pub use index::TantivyBackend;
pub use query::{
    sanitize_term, BackendQuery, Constraint, CreatedRange, FieldValue, GroupBy, Matching,
    QueryFilterSet, SearchSort, SortOrder,
};
pub use results::{Pager, SearchResultSet, TypeCount};
pub use sentiment::{feed_title, get_sentiment, Bucket, Mood, SentimentSummary};
