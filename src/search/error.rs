//! Error types for search operations

use crate::error::AppError;
use crate::search::backend::BackendFault;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while querying or maintaining the search index
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The backend did not answer within the query timeout
    #[error("Search timed out: {0}")]
    Timeout(String),

    /// The backend is stopped or unreachable
    #[error("Search backend unavailable: {0}")]
    Unavailable(String),

    /// The backend raised an execution fault
    #[error("Search execution failed: {0}")]
    Backend(String),

    /// The backend flagged an error after a call that returned results
    #[error("Search backend reported an error: {0}")]
    LastError(String),

    /// Matched records could not be loaded from the store
    #[error("Failed to load matched opinions: {0}")]
    Persistence(String),

    /// Catalog could not be opened or created
    #[error("Index initialization failed: {0}")]
    IndexInitFailed(String),

    /// Catalog could not be rebuilt
    #[error("Indexing failed: {0}")]
    IndexingFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::Timeout(_) => "timeout",
            SearchError::Unavailable(_) => "unavailable",
            SearchError::Backend(_) => "backend",
            SearchError::LastError(_) => "last_error",
            SearchError::Persistence(_) => "persistence",
            SearchError::IndexInitFailed(_) => "index_init",
            SearchError::IndexingFailed(_) => "indexing",
            SearchError::Io(_) => "io",
        }
    }
}

impl From<BackendFault> for SearchError {
    fn from(fault: BackendFault) -> Self {
        match fault {
            BackendFault::Timeout(msg) => SearchError::Timeout(msg),
            BackendFault::Unavailable(msg) => SearchError::Unavailable(msg),
            BackendFault::Execution(msg) => SearchError::Backend(msg),
        }
    }
}

impl From<tantivy::TantivyError> for SearchError {
    fn from(err: tantivy::TantivyError) -> Self {
        SearchError::Backend(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Io(err) => AppError::Io(err),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_backend_faults_map_to_search_errors() {
        assert!(matches!(
            SearchError::from(BackendFault::Timeout("slow".into())),
            SearchError::Timeout(_)
        ));
        assert!(matches!(
            SearchError::from(BackendFault::Unavailable("stopped".into())),
            SearchError::Unavailable(_)
        ));
        assert!(matches!(
            SearchError::from(BackendFault::Execution("boom".into())),
            SearchError::Backend(_)
        ));
    }

    #[test]
    fn test_search_errors_are_server_faults() {
        let app: AppError = SearchError::Timeout("slow".into()).into();
        assert_eq!(app.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let app: AppError = SearchError::LastError("flagged".into()).into();
        assert_eq!(app.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
