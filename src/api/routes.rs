use crate::api::{handlers, AppState};
use crate::metrics::track_metrics;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main router
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;

    Router::new()
        // Health and metrics
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // Search views
        .route("/search", get(handlers::search_page))
        .route("/search/atom", get(handlers::search_feed))
        .route("/v1/search", get(handlers::search_json))
        .route("/:locale/opinion/:id", get(handlers::opinion_detail))
        // Index administration
        .route("/admin/index/start", post(handlers::admin_start))
        .route("/admin/index/stop", post(handlers::admin_stop))
        .route("/admin/index/reindex", post(handlers::admin_reindex))
        .route("/admin/index/stats", get(handlers::admin_stats))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(track_metrics))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
