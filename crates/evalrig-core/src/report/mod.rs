//! Report generation for evaluation results
//!
//! Reports are read-only views of a [`MetricRegistry`]: per algorithm, one row
//! per dataset pair and a cross-dataset mean row.

mod json;
mod markdown;
mod table;

pub use json::JsonReporter;
pub use markdown::MarkdownReporter;
pub use table::TableReporter;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::{Metric, MetricKind, MetricRegistry};

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Table,
    Markdown,
    Json,
}

impl ReportFormat {
    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            "table" => Some(ReportFormat::Table),
            _ => None,
        }
    }
}

/// One metric's reportable number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub name: String,
    pub kind: MetricKind,
    pub summary: Option<f64>,
}

/// Results of one algorithm on one dataset pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetReport {
    pub dataset_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    pub metrics: Vec<MetricSummary>,
}

/// Results of one algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmReport {
    pub name: String,
    pub datasets: Vec<DatasetReport>,
    /// Cross-dataset mean per metric
    pub mean: Vec<MetricSummary>,
}

/// Report model shared by every format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub generated_at: DateTime<Utc>,
    pub metric_names: Vec<String>,
    pub algorithms: Vec<AlgorithmReport>,
}

impl EvalReport {
    pub fn from_registry(registry: &MetricRegistry) -> Self {
        let metric_names: Vec<String> = registry
            .metric_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let algorithms = registry
            .algorithm_names()
            .into_iter()
            .map(|algorithm| {
                let datasets = registry
                    .dataset_ids()
                    .into_iter()
                    .filter_map(|dataset_id| {
                        let metrics: Vec<MetricSummary> = registry
                            .by_unit(algorithm, dataset_id)
                            .map(|w| summarize(w.metric.as_ref()))
                            .collect();
                        (!metrics.is_empty()).then(|| DatasetReport {
                            dataset_id,
                            locator: registry.locator(dataset_id).map(str::to_string),
                            metrics,
                        })
                    })
                    .collect();
                let mean = registry
                    .mean(algorithm)
                    .iter()
                    .map(|m| MetricSummary {
                        name: m.name().to_string(),
                        kind: registry
                            .by_metric_name(m.name())
                            .next()
                            .map(|w| w.metric.kind())
                            .unwrap_or(MetricKind::Aggregate),
                        summary: m.summary(),
                    })
                    .collect();
                AlgorithmReport {
                    name: algorithm.to_string(),
                    datasets,
                    mean,
                }
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            metric_names,
            algorithms,
        }
    }
}

fn summarize(metric: &dyn Metric) -> MetricSummary {
    MetricSummary {
        name: metric.name().to_string(),
        kind: metric.kind(),
        summary: metric.summary(),
    }
}

/// Look up a summary by metric name
pub(crate) fn summary_of(metrics: &[MetricSummary], name: &str) -> Option<f64> {
    metrics
        .iter()
        .find(|m| m.name == name)
        .and_then(|m| m.summary)
}

/// Render a summary cell
pub(crate) fn format_summary(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "-".to_string(),
    }
}

/// Generate a report in the specified format
pub fn generate_report(registry: &MetricRegistry, format: ReportFormat) -> Result<String> {
    let report = EvalReport::from_registry(registry);
    match format {
        ReportFormat::Json => JsonReporter::generate(&report),
        ReportFormat::Markdown => MarkdownReporter::generate(&report),
        ReportFormat::Table => TableReporter::generate(&report),
    }
}
