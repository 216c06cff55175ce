use async_stream::stream;
use axum::extract::State;
use axum::http::{HeaderValue, header::CONNECTION};
use axum::response::{
    IntoResponse,
    sse::{KeepAlive, Sse},
};
use std::convert::Infallible;

use crate::types::AppState;

/// Starts a streaming session for this observer and relays its frames as
/// server-sent events. Dropping the response body (observer disconnect)
/// cancels the session.
pub async fn health_stream_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let (session, mut rx) = state.sessions.open();
    let guard = session.disconnect_on_drop();
    tracing::debug!(session = session.id, "observer connected");

    let stream = stream! {
        let _guard = guard;
        while let Some(frame) = rx.recv().await {
            yield Ok::<_, Infallible>(frame.to_event());
        }
    };

    (
        [(CONNECTION, HeaderValue::from_static("keep-alive"))],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
}
