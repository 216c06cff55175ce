use std::fmt;

/// The three independent reads a sample is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsQuery {
    Load,
    Memory,
    OsInfo,
}

impl fmt::Display for MetricsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricsQuery::Load => "load",
            MetricsQuery::Memory => "memory",
            MetricsQuery::OsInfo => "os_info",
        };
        f.write_str(name)
    }
}

/// The metrics source was unavailable or answered with something unusable.
///
/// Recovered per tick: the observer receives an error frame and the session
/// keeps running.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("metrics query `{query}` failed: {reason}")]
    Query { query: MetricsQuery, reason: String },

    #[error("malformed metrics response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// The sub-query that failed, if the failure came from a single read.
    pub fn query(&self) -> Option<MetricsQuery> {
        match self {
            ProviderError::Query { query, .. } => Some(*query),
            ProviderError::Malformed(_) => None,
        }
    }
}

/// The chart rendering service could not produce a link for one chart.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("chart service unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("chart service rejected the chart (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("chart service response malformed: {0}")]
    Malformed(String),
}

/// A push to the observer failed because its connection is gone.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("observer connection closed")]
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
