use axum::extract::State;
use axum::http::{HeaderValue, header::CONTENT_TYPE};
use axum::response::IntoResponse;

use crate::types::AppState;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let handle = &state.prometheus_handle;
    handle.run_upkeep();
    (
        [(CONTENT_TYPE, HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE))],
        handle.render(),
    )
}
