use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::registry::SessionRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReading {
    pub per_core: Vec<f64>, // percent, index = core id
    pub average: f64,       // provider's aggregate, percent
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryReading {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsReading {
    pub distro: String,
    pub arch: String,
}

/// One point-in-time snapshot of host metrics.
///
/// Only constructible through [`Sample::new`], which rejects readings that
/// would make the memory chart undefined, so every `Sample` is well formed.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    os_distro: String,
    os_arch: String,
    per_core_load: Vec<f64>,
    avg_load: f64,
    mem_used_bytes: u64,
    mem_total_bytes: u64,
    mem_free_bytes: u64,
}

impl Sample {
    pub fn new(
        load: LoadReading,
        memory: MemoryReading,
        os: OsReading,
    ) -> Result<Self, ProviderError> {
        if memory.total_bytes == 0 {
            return Err(ProviderError::Malformed(
                "total memory reported as zero".to_string(),
            ));
        }
        if memory.used_bytes > memory.total_bytes || memory.free_bytes > memory.total_bytes {
            return Err(ProviderError::Malformed(format!(
                "memory figures exceed total ({} used, {} free, {} total)",
                memory.used_bytes, memory.free_bytes, memory.total_bytes
            )));
        }
        if load.per_core.is_empty() {
            return Err(ProviderError::Malformed(
                "no per-core load reported".to_string(),
            ));
        }
        if !load.average.is_finite() || load.per_core.iter().any(|l| !l.is_finite()) {
            return Err(ProviderError::Malformed(
                "non-finite cpu load reported".to_string(),
            ));
        }

        Ok(Self {
            os_distro: os.distro,
            os_arch: os.arch,
            per_core_load: load.per_core,
            avg_load: load.average,
            mem_used_bytes: memory.used_bytes,
            mem_total_bytes: memory.total_bytes,
            mem_free_bytes: memory.free_bytes,
        })
    }

    pub fn os_distro(&self) -> &str {
        &self.os_distro
    }

    pub fn os_arch(&self) -> &str {
        &self.os_arch
    }

    pub fn per_core_load(&self) -> &[f64] {
        &self.per_core_load
    }

    pub fn avg_load(&self) -> f64 {
        self.avg_load
    }

    pub fn mem_used_bytes(&self) -> u64 {
        self.mem_used_bytes
    }

    pub fn mem_total_bytes(&self) -> u64 {
        self.mem_total_bytes
    }

    pub fn mem_free_bytes(&self) -> u64 {
        self.mem_free_bytes
    }

    /// `(used, free)` as percentages of total memory.
    pub fn memory_percentages(&self) -> (f64, f64) {
        let total = self.mem_total_bytes as f64;
        (
            self.mem_used_bytes as f64 / total * 100.0,
            self.mem_free_bytes as f64 / total * 100.0,
        )
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_tick_interval_ms() -> u64 {
    5000
}

fn default_chart_base_url() -> String {
    "https://quickchart.io".to_string()
}

fn default_chart_width() -> u32 {
    500
}

fn default_chart_height() -> u32 {
    300
}

fn default_chart_timeout_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64, // in milliseconds
    #[serde(default = "default_chart_base_url")]
    pub chart_base_url: String,
    #[serde(default = "default_chart_width")]
    pub chart_width: u32, // in pixels
    #[serde(default = "default_chart_height")]
    pub chart_height: u32, // in pixels
    #[serde(default = "default_chart_timeout_ms")]
    pub chart_timeout_ms: u64, // in milliseconds
}

impl AppConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn chart_timeout(&self) -> Duration {
        Duration::from_millis(self.chart_timeout_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tick_interval_ms: default_tick_interval_ms(),
            chart_base_url: default_chart_base_url(),
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
            chart_timeout_ms: default_chart_timeout_ms(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub prometheus_handle: PrometheusHandle,
}
