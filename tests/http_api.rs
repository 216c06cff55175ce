mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use common::{MockProvider, build_app};
use futures_util::StreamExt;
use healthstream::chart::{ChartSpec, ChartType};
use healthstream::error::RenderError;
use healthstream::render::{ChartRenderer, QuickChartRenderer};
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

#[tokio::test]
async fn root_serves_welcome() {
    let (app, _) = build_app(Arc::new(MockProvider::test_os()));
    let resp = app.oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).starts_with("Welcome"));
}

#[tokio::test]
async fn health_streams_event_frames() {
    let provider = Arc::new(MockProvider::test_os());
    let (app, sessions) = build_app(provider);

    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(resp.headers()[header::CONNECTION], "keep-alive");
    assert_eq!(sessions.active_sessions(), 1);

    let mut body = resp.into_body().into_data_stream();
    let chunk = body.next().await.unwrap().unwrap();
    let text = String::from_utf8(chunk.to_vec()).unwrap();
    assert!(text.starts_with("data: "), "{text}");
    assert!(text.ends_with("\n\n"), "{text}");

    let json: Value = serde_json::from_str(text.trim_start_matches("data: ").trim_end()).unwrap();
    assert_eq!(json["os"], "TestOS (x64)");
    assert_eq!(json["cpu"], "25%");
    assert_eq!(json["memory"], "1.86 GB used out of 7.45 GB");

    // dropping the body is the observer disconnecting
    drop(body);
    for _ in 0..50 {
        if sessions.active_sessions() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(sessions.active_sessions(), 0);
}

#[tokio::test]
async fn health_streams_plain_text_error_frames() {
    let (app, _) = build_app(Arc::new(MockProvider::with_total_bytes(0)));

    let resp = app.oneshot(get("/health")).await.unwrap();
    let mut body = resp.into_body().into_data_stream();
    let chunk = body.next().await.unwrap().unwrap();
    assert_eq!(&chunk[..], b"data: Error retrieving system metrics\n\n");
}

#[tokio::test]
async fn snapshot_renders_html() {
    let (app, sessions) = build_app(Arc::new(MockProvider::test_os()));
    let resp = app.oneshot(get("/health/snapshot")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("<p>OS: TestOS (x64)</p>"));
    assert!(html.contains("<img src=\"https://charts.test/memory\" alt=\"Memory Usage\">"));
    assert_eq!(sessions.active_sessions(), 0);
}

#[tokio::test]
async fn snapshot_reports_sampling_failure() {
    let (app, _) = build_app(Arc::new(MockProvider::with_total_bytes(0)));
    let resp = app.oneshot(get("/health/snapshot")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Error retrieving system metrics");
}

#[tokio::test]
async fn metrics_endpoint_is_prometheus_text() {
    let (app, _) = build_app(Arc::new(MockProvider::test_os()));
    let resp = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
}

fn cpu_spec() -> ChartSpec {
    ChartSpec {
        chart_type: ChartType::Line,
        labels: vec!["CPU 1".to_string(), "CPU 2".to_string()],
        series_label: "CPU Load (%)".to_string(),
        series: vec![10.0, 20.0],
        color: "rgba(75, 192, 192, 1)".to_string(),
        y_axis_min_zero: true,
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn renderer(base_url: &str) -> QuickChartRenderer {
    QuickChartRenderer::new(base_url, 500, 300, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn quickchart_renderer_returns_created_url() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let captured = seen.clone();
    let router = Router::new().route(
        "/chart/create",
        post(move |Json(body): Json<Value>| {
            let captured = captured.clone();
            async move {
                *captured.lock().unwrap() = Some(body);
                Json(json!({ "success": true, "url": "https://quickchart.test/chart/render/abc" }))
            }
        }),
    );
    let base_url = serve(router).await;

    let url = renderer(&base_url).resolve(&cpu_spec()).await.unwrap();
    assert_eq!(url, "https://quickchart.test/chart/render/abc");

    let body = seen.lock().unwrap().take().unwrap();
    assert_eq!(body["width"], 500);
    assert_eq!(body["chart"]["type"], "line");
    assert_eq!(body["chart"]["data"]["labels"][0], "CPU 1");
}

#[tokio::test]
async fn quickchart_renderer_reports_rejection() {
    let router = Router::new().route(
        "/chart/create",
        post(|| async { (StatusCode::BAD_REQUEST, "bad chart") }),
    );
    let base_url = serve(router).await;

    let err = renderer(&base_url).resolve(&cpu_spec()).await.unwrap_err();
    match err {
        RenderError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "bad chart");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn quickchart_renderer_requires_url() {
    let router = Router::new().route(
        "/chart/create",
        post(|| async { Json(json!({ "success": true })) }),
    );
    let base_url = serve(router).await;

    let err = renderer(&base_url).resolve(&cpu_spec()).await.unwrap_err();
    assert!(matches!(err, RenderError::Malformed(_)));
}

#[tokio::test]
async fn quickchart_renderer_reports_unreachable_service() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = renderer(&format!("http://{}", addr))
        .resolve(&cpu_spec())
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::Unreachable(_)));
}
