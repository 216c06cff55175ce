#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use healthstream::chart::ChartSpec;
use healthstream::error::RenderError;
use healthstream::provider::MetricsProvider;
use healthstream::registry::SessionRegistry;
use healthstream::render::ChartRenderer;
use healthstream::types::{AppState, LoadReading, MemoryReading, OsReading};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Provider returning fixed readings and counting how often it was sampled.
pub struct MockProvider {
    pub per_core: Vec<f64>,
    pub average: f64,
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub samples: AtomicUsize,
}

impl MockProvider {
    pub fn test_os() -> Self {
        Self {
            per_core: vec![10.0, 20.0, 30.0, 40.0],
            average: 25.0,
            used_bytes: 2_000_000_000,
            total_bytes: 8_000_000_000,
            samples: AtomicUsize::new(0),
        }
    }

    pub fn with_total_bytes(total_bytes: u64) -> Self {
        Self {
            used_bytes: 0,
            total_bytes,
            ..Self::test_os()
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsProvider for MockProvider {
    async fn current_load(&self) -> Result<LoadReading, String> {
        self.samples.fetch_add(1, Ordering::SeqCst);
        Ok(LoadReading {
            per_core: self.per_core.clone(),
            average: self.average,
        })
    }

    async fn memory(&self) -> Result<MemoryReading, String> {
        Ok(MemoryReading {
            total_bytes: self.total_bytes,
            used_bytes: self.used_bytes,
            free_bytes: self.total_bytes - self.used_bytes,
        })
    }

    async fn os_info(&self) -> Result<OsReading, String> {
        Ok(OsReading {
            distro: "TestOS".to_string(),
            arch: "x64".to_string(),
        })
    }
}

/// Renderer handing out deterministic links, optionally failing the memory chart.
pub struct MockRenderer {
    pub fail_memory: bool,
}

#[async_trait]
impl ChartRenderer for MockRenderer {
    async fn resolve(&self, spec: &ChartSpec) -> Result<String, RenderError> {
        if spec.labels == ["Used", "Free"] {
            if self.fail_memory {
                return Err(RenderError::Malformed("memory chart refused".to_string()));
            }
            return Ok("https://charts.test/memory".to_string());
        }
        Ok(format!("https://charts.test/cpu/{}", spec.series.len()))
    }
}

pub fn registry(provider: Arc<MockProvider>, fail_memory: bool) -> SessionRegistry {
    SessionRegistry::new(
        provider,
        Arc::new(MockRenderer { fail_memory }),
        Duration::from_secs(5),
    )
}

pub fn build_app(provider: Arc<MockProvider>) -> (Router, SessionRegistry) {
    let sessions = registry(provider, false);
    let handle = PrometheusBuilder::new().build_recorder().handle();
    let app = healthstream::app(AppState {
        sessions: sessions.clone(),
        prometheus_handle: handle,
    });
    (app, sessions)
}
