pub mod chart;
pub mod config;
pub mod error;
pub mod handlers;
pub mod payload;
pub mod provider;
pub mod registry;
pub mod render;
pub mod sampler;
pub mod session;
pub mod system_monitor;
pub mod types;

use axum::{Router, http::Method, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::handlers::{
    health::health_stream_endpoint, metrics::metrics_endpoint, root::root_endpoint,
    snapshot::health_snapshot_endpoint,
};
use crate::types::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_endpoint))
        .route("/health", get(health_stream_endpoint))
        .route("/health/snapshot", get(health_snapshot_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        )
        .with_state(state)
}
