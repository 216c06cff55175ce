use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::payload::{ERROR_PAYLOAD, TickPayload};
use crate::session::render_tick;
use crate::types::AppState;

fn render_page(payload: &TickPayload) -> String {
    let mut page = format!(
        "<h1>System Health</h1>\n<p>OS: {}</p>\n<p>CPU: {}</p>\n<p>Memory: {}</p>\n",
        payload.os, payload.cpu, payload.memory
    );
    if let Some(url) = &payload.cpu_chart_url {
        page.push_str(&format!("<img src=\"{}\" alt=\"CPU Load\">\n", url));
    }
    if let Some(url) = &payload.mem_chart_url {
        page.push_str(&format!("<img src=\"{}\" alt=\"Memory Usage\">\n", url));
    }
    page
}

/// One sampling cycle rendered as an HTML page.
pub async fn health_snapshot_endpoint(State(state): State<AppState>) -> Response {
    match state.sessions.sampler().sample().await {
        Ok(sample) => {
            let payload = render_tick(&sample, state.sessions.renderer()).await;
            Html(render_page(&payload)).into_response()
        }
        Err(e) => {
            tracing::error!("error retrieving system metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, ERROR_PAYLOAD).into_response()
        }
    }
}
