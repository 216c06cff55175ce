//! Chart specifications built from a [`Sample`].
//!
//! A [`ChartSpec`] is a plain description of a line chart. It serializes to
//! the Chart.js configuration object accepted by QuickChart-compatible
//! rendering services.

use serde::Serialize;
use serde_json::{Value, json};

use crate::types::Sample;

pub const CPU_CHART_COLOR: &str = "rgba(75, 192, 192, 1)";
pub const MEMORY_CHART_COLOR: &str = "rgba(255, 99, 132, 1)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub labels: Vec<String>,
    pub series_label: String,
    pub series: Vec<f64>,
    pub color: String,
    pub y_axis_min_zero: bool,
}

impl ChartSpec {
    /// Chart.js configuration for this chart.
    pub fn to_config(&self) -> Value {
        json!({
            "type": self.chart_type,
            "data": {
                "labels": self.labels,
                "datasets": [{
                    "label": self.series_label,
                    "data": self.series,
                    "borderColor": self.color,
                    "fill": false,
                }],
            },
            "options": {
                "scales": {
                    "y": { "beginAtZero": self.y_axis_min_zero },
                },
            },
        })
    }
}

pub fn build_cpu_chart(sample: &Sample) -> ChartSpec {
    let series = sample.per_core_load().to_vec();
    let labels = (1..=series.len()).map(|core| format!("CPU {core}")).collect();

    ChartSpec {
        chart_type: ChartType::Line,
        labels,
        series_label: "CPU Load (%)".to_string(),
        series,
        color: CPU_CHART_COLOR.to_string(),
        y_axis_min_zero: true,
    }
}

pub fn build_memory_chart(sample: &Sample) -> ChartSpec {
    let (used, free) = sample.memory_percentages();

    ChartSpec {
        chart_type: ChartType::Line,
        labels: vec!["Used".to_string(), "Free".to_string()],
        series_label: "Memory Usage (%)".to_string(),
        series: vec![used, free],
        color: MEMORY_CHART_COLOR.to_string(),
        y_axis_min_zero: true,
    }
}
