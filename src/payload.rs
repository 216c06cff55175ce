use axum::response::sse::Event;
use serde::{Deserialize, Serialize};

use crate::types::Sample;

pub const ERROR_PAYLOAD: &str = "Error retrieving system metrics";

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickPayload {
    pub os: String,
    pub cpu: String,
    pub memory: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_chart_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem_chart_url: Option<String>,
}

impl TickPayload {
    pub fn new(
        sample: &Sample,
        cpu_chart_url: Option<String>,
        mem_chart_url: Option<String>,
    ) -> Self {
        Self {
            os: format!("{} ({})", sample.os_distro(), sample.os_arch()),
            cpu: format!("{}%", sample.avg_load()),
            memory: format!(
                "{:.2} GB used out of {:.2} GB",
                sample.mem_used_bytes() as f64 / GIB,
                sample.mem_total_bytes() as f64 / GIB
            ),
            cpu_chart_url,
            mem_chart_url,
        }
    }
}

/// One message pushed to an observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Tick(TickPayload),
    Error,
}

impl Frame {
    /// The `data:` body of this frame: JSON for ticks, plain text for errors.
    pub fn data(&self) -> String {
        match self {
            Frame::Tick(payload) => match serde_json::to_string(payload) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("failed to serialize tick payload: {}", e);
                    ERROR_PAYLOAD.to_string()
                }
            },
            Frame::Error => ERROR_PAYLOAD.to_string(),
        }
    }

    pub fn to_event(&self) -> Event {
        Event::default().data(self.data())
    }
}
