use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::chart::ChartSpec;
use crate::error::RenderError;

/// Turns a chart spec into a link the observer can load.
///
/// Only the link is obtained; the image itself is never fetched here.
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn resolve(&self, spec: &ChartSpec) -> Result<String, RenderError>;
}

#[derive(Deserialize)]
struct CreateChartResponse {
    success: bool,
    url: Option<String>,
}

/// Renderer backed by a QuickChart-compatible `/chart/create` endpoint.
pub struct QuickChartRenderer {
    client: reqwest::Client,
    create_url: String,
    width: u32,
    height: u32,
}

impl QuickChartRenderer {
    pub fn new(
        base_url: &str,
        width: u32,
        height: u32,
        timeout: Duration,
    ) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            create_url: format!("{}/chart/create", base_url.trim_end_matches('/')),
            width,
            height,
        })
    }
}

#[async_trait]
impl ChartRenderer for QuickChartRenderer {
    async fn resolve(&self, spec: &ChartSpec) -> Result<String, RenderError> {
        let body = json!({
            "chart": spec.to_config(),
            "width": self.width,
            "height": self.height,
            "backgroundColor": "transparent",
        });

        let resp = self.client.post(&self.create_url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(text) => text,
                Err(e) => format!("[failed to read response body: {}]", e),
            };
            return Err(RenderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreateChartResponse = resp
            .json()
            .await
            .map_err(|e| RenderError::Malformed(e.to_string()))?;

        if !created.success {
            return Err(RenderError::Rejected {
                status: status.as_u16(),
                body: "success: false".to_string(),
            });
        }

        match created.url {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(RenderError::Malformed("response carried no url".to_string())),
        }
    }
}
