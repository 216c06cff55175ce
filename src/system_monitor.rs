use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use async_trait::async_trait;
use sysinfo::{MINIMUM_CPU_UPDATE_INTERVAL, System};

use crate::provider::MetricsProvider;
use crate::types::{LoadReading, MemoryReading, OsReading};

struct HostState {
    system: System,
    last_cpu_refresh: Instant,
}

/// [`MetricsProvider`] backed by `sysinfo`, shared by every session.
pub struct SystemMonitor {
    state: Mutex<HostState>,
}

impl SystemMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        // cpu usage is a delta between two refreshes, prime the first one
        system.refresh_cpu_usage();
        system.refresh_memory();

        Self {
            state: Mutex::new(HostState {
                system,
                last_cpu_refresh: Instant::now(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("system monitor mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl MetricsProvider for SystemMonitor {
    async fn current_load(&self) -> Result<LoadReading, String> {
        let wait = {
            let state = self.lock();
            MINIMUM_CPU_UPDATE_INTERVAL.saturating_sub(state.last_cpu_refresh.elapsed())
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        let mut state = self.lock();
        state.system.refresh_cpu_usage();
        state.last_cpu_refresh = Instant::now();

        let per_core: Vec<f64> = state
            .system
            .cpus()
            .iter()
            .map(|cpu| round2(cpu.cpu_usage() as f64))
            .collect();
        if per_core.is_empty() {
            return Err("no cpus reported".to_string());
        }

        Ok(LoadReading {
            per_core,
            average: round2(state.system.global_cpu_usage() as f64),
        })
    }

    async fn memory(&self) -> Result<MemoryReading, String> {
        let mut state = self.lock();
        state.system.refresh_memory();

        let total_bytes = state.system.total_memory();
        let used_bytes = state.system.used_memory().min(total_bytes);

        // free is everything not in use, so used + free == total
        Ok(MemoryReading {
            total_bytes,
            used_bytes,
            free_bytes: total_bytes - used_bytes,
        })
    }

    async fn os_info(&self) -> Result<OsReading, String> {
        let distro = match (System::name(), System::os_version()) {
            (Some(name), Some(version)) => format!("{name} {version}"),
            (Some(name), None) => name,
            (None, _) => return Err("operating system name unavailable".to_string()),
        };

        let arch: Option<String> = System::cpu_arch().into();
        let arch = arch
            .filter(|arch| !arch.is_empty())
            .unwrap_or_else(|| std::env::consts::ARCH.to_string());

        Ok(OsReading { distro, arch })
    }
}
