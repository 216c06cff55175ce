use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use healthstream::{
    app, config,
    registry::SessionRegistry,
    render::QuickChartRenderer,
    system_monitor::SystemMonitor,
    types::AppState,
};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    dotenv().ok();
    let app_config = config::load().context("failed to load configuration")?;

    // Install global Prometheus recorder and keep the handle for rendering metrics.
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install prometheus recorder")?;

    describe_gauge!(
        "health_sessions_active",
        "Number of observers currently streaming /health"
    );
    describe_counter!("health_sessions_total", "Total number of streaming sessions started");
    describe_counter!("health_ticks_total", "Total number of ticks pushed, by outcome");
    describe_counter!(
        "chart_render_failures_total",
        "Total number of chart links that could not be resolved"
    );
    describe_histogram!(
        "health_tick_duration_ms",
        "Time to sample and render one tick in milliseconds"
    );

    let renderer = QuickChartRenderer::new(
        &app_config.chart_base_url,
        app_config.chart_width,
        app_config.chart_height,
        app_config.chart_timeout(),
    )
    .context("failed to build chart client")?;

    let sessions = SessionRegistry::new(
        Arc::new(SystemMonitor::new()),
        Arc::new(renderer),
        app_config.tick_interval(),
    );

    let app = app(AppState {
        sessions: sessions.clone(),
        prometheus_handle: handle,
    });

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", app_config.host, app_config.port))
        .await
        .with_context(|| format!("failed to bind port {}", app_config.port))?;

    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {}", e);
                return;
            }
            sessions.shutdown();
        })
        .await?;

    Ok(())
}
