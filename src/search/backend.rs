//! Narrow interface between the query client and a full-text search provider

use crate::search::error::SearchResult;
use crate::search::query::BackendQuery;
use crate::state::OpinionStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Failure raised by a backend call
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendFault {
    /// The call did not complete in time
    #[error("timed out: {0}")]
    Timeout(String),

    /// The backend is not running or cannot be reached
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Any other execution fault
    #[error("execution fault: {0}")]
    Execution(String),
}

/// Raw result of a backend query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendHits {
    /// Matching record ids in sort order, already windowed
    pub ids: Vec<u64>,

    /// Total matches before windowing
    pub total: u64,

    /// Match count per grouped value, in the order the values were requested
    pub groups: Vec<(u64, u64)>,

    /// Errors flagged by this call even though it returned results
    pub warnings: Vec<String>,
}

impl BackendHits {
    /// First error flagged by the call, if any
    pub fn last_error(&self) -> Option<&str> {
        self.warnings.first().map(String::as_str)
    }
}

/// A full-text search provider
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Execute a structured query. Errors the backend flags without failing
    /// the call are returned in [`BackendHits::warnings`] of that call only.
    async fn execute(&self, query: &BackendQuery) -> Result<BackendHits, BackendFault>;
}

/// Catalog statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Whether the backend is serving queries
    pub running: bool,

    /// Total number of documents in the catalog
    pub total_documents: u64,

    /// Number of segments
    pub num_segments: usize,

    /// Catalog size in bytes
    pub index_size_bytes: u64,

    /// When the catalog was last rebuilt by this process
    pub last_reindex: Option<chrono::DateTime<chrono::Utc>>,
}

/// Lifecycle and catalog maintenance for a search backend
#[async_trait]
pub trait IndexMaintenance: Send + Sync {
    /// Begin serving queries. No-op if already running.
    async fn start(&self) -> SearchResult<()>;

    /// Stop serving queries. No-op if already stopped.
    async fn stop(&self) -> SearchResult<()>;

    /// Rebuild the whole catalog from persisted opinions. Returns the number
    /// of documents indexed.
    async fn reindex(&self, store: &dyn OpinionStore) -> SearchResult<usize>;

    /// Catalog statistics
    async fn stats(&self) -> SearchResult<IndexStats>;

    fn is_running(&self) -> bool;
}
