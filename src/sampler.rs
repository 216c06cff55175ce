use std::sync::Arc;

use crate::error::{MetricsQuery, ProviderError};
use crate::provider::MetricsProvider;
use crate::types::Sample;

/// Assembles a [`Sample`] from the three provider reads.
#[derive(Clone)]
pub struct MetricsSampler {
    provider: Arc<dyn MetricsProvider>,
}

impl MetricsSampler {
    pub fn new(provider: Arc<dyn MetricsProvider>) -> Self {
        Self { provider }
    }

    /// Reads load, memory and OS info concurrently. Any failing read fails the
    /// whole sample; a partially populated sample is never returned.
    pub async fn sample(&self) -> Result<Sample, ProviderError> {
        let tag = |query: MetricsQuery| move |reason: String| ProviderError::Query { query, reason };

        let (load, memory, os) = tokio::try_join!(
            async { self.provider.current_load().await.map_err(tag(MetricsQuery::Load)) },
            async { self.provider.memory().await.map_err(tag(MetricsQuery::Memory)) },
            async { self.provider.os_info().await.map_err(tag(MetricsQuery::OsInfo)) },
        )?;

        Sample::new(load, memory, os)
    }
}
