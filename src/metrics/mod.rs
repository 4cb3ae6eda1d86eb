//! Prometheus metrics for the opinion search service.
//!
//! Metrics live in a process-wide registry and are exported in the Prometheus
//! text format at `/metrics`.
//!
//! ```no_run
//! use opinion_search::metrics::{init_metrics, SEARCH_QUERIES_TOTAL};
//!
//! init_metrics().expect("metrics registry");
//! SEARCH_QUERIES_TOTAL.with_label_values(&["ok"]).inc();
//! ```

mod middleware;

pub use middleware::track_metrics;

use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use prometheus::{CounterVec, Gauge, HistogramOpts, HistogramVec, IntCounter, Opts, Registry};

const NAMESPACE: &str = "opinion_search";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration in seconds
    ///
    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    // ============================================================================
    // Search Metrics
    // ============================================================================

    /// Search queries by outcome
    ///
    /// Labels: outcome (ok, timeout, unavailable, backend, last_error, persistence, ...)
    pub static ref SEARCH_QUERIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("search_queries_total", "Total number of search queries by outcome")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create SEARCH_QUERIES_TOTAL metric");

    /// End-to-end query latency, backend call plus hydration
    pub static ref SEARCH_QUERY_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "search_query_duration_seconds",
            "Search query duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["outcome"]
    ).expect("Failed to create SEARCH_QUERY_DURATION_SECONDS metric");

    /// Requests rejected by form validation before reaching the backend
    pub static ref SEARCH_VALIDATION_FAILURES_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("search_validation_failures_total", "Search requests with invalid parameters")
            .namespace(NAMESPACE)
    ).expect("Failed to create SEARCH_VALIDATION_FAILURES_TOTAL metric");

    // ============================================================================
    // Index Metrics
    // ============================================================================

    /// Completed catalog rebuilds
    pub static ref REINDEX_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("reindex_total", "Total number of completed catalog rebuilds")
            .namespace(NAMESPACE)
    ).expect("Failed to create REINDEX_TOTAL metric");

    /// 1 while the backend is serving queries
    pub static ref INDEX_RUNNING: Gauge = Gauge::with_opts(
        Opts::new("index_running", "Whether the search index is serving queries")
            .namespace(NAMESPACE)
    ).expect("Failed to create INDEX_RUNNING metric");
}

static REGISTERED: OnceCell<()> = OnceCell::new();

/// Register all metrics with the global registry. Safe to call more than once.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    REGISTERED
        .get_or_try_init(|| {
            PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(SEARCH_QUERIES_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(SEARCH_QUERY_DURATION_SECONDS.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(SEARCH_VALIDATION_FAILURES_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(REINDEX_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(INDEX_RUNNING.clone()))?;

            tracing::info!("Prometheus metrics registered");
            Ok(())
        })
        .map(|_| ())
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
