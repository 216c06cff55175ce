use async_trait::async_trait;

use crate::types::{LoadReading, MemoryReading, OsReading};

/// Source of raw host readings.
///
/// Each read is independent of the others; errors are reported as plain
/// messages and tagged with the failing query by the sampler.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn current_load(&self) -> Result<LoadReading, String>;

    async fn memory(&self) -> Result<MemoryReading, String>;

    async fn os_info(&self) -> Result<OsReading, String>;
}
