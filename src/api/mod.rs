pub mod forms;
pub mod handlers;
pub mod render;
pub mod routes;

pub use forms::{SearchForm, SearchParams, ValidationFailure};
pub use handlers::{get_results, SearchOutcome};
pub use routes::*;

use crate::config::{ServerConfig, SiteConfig};
use crate::search::{IndexMaintenance, QueryClient};
use crate::state::OpinionStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub client: QueryClient,
    pub index: Arc<dyn IndexMaintenance>,
    pub store: Arc<dyn OpinionStore>,
    pub site: SiteConfig,
    /// Upper bound on handling a single HTTP request
    pub request_timeout: Duration,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        client: QueryClient,
        index: Arc<dyn IndexMaintenance>,
        store: Arc<dyn OpinionStore>,
        site: SiteConfig,
    ) -> Self {
        Self {
            client,
            index,
            store,
            site,
            request_timeout: ServerConfig::default().request_timeout(),
            started_at: Instant::now(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
