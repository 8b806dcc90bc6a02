//! Output formatting for CLI

use kino_dash::{MediaType, Representation, RepresentationSet};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Result of an inspect run
#[derive(Serialize)]
pub struct InspectReport {
    pub media_type: MediaType,
    pub data_index: usize,
    pub current_quality: usize,
    pub representations: Vec<Representation>,
}

impl InspectReport {
    pub fn from_set(set: &RepresentationSet) -> Self {
        Self {
            media_type: set.media_type(),
            data_index: set.data_index(),
            current_quality: set.current_quality(),
            representations: set.representations().to_vec(),
        }
    }
}

#[derive(Tabled)]
struct LadderRow {
    #[tabled(rename = "Q")]
    quality: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Bandwidth")]
    bandwidth: String,
    #[tabled(rename = "Resolution")]
    resolution: String,
    #[tabled(rename = "Codecs")]
    codecs: String,
    #[tabled(rename = "Base URL")]
    base_url: String,
}

/// Format a report in the selected format
pub fn format_report(report: &InspectReport, format: &str) -> String {
    match OutputFormat::from(format) {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Text => {
            let rows = report.representations.iter().map(|r| LadderRow {
                quality: if r.index == report.current_quality {
                    format!("*{}", r.index)
                } else {
                    r.index.to_string()
                },
                id: r.id.clone(),
                bandwidth: format!("{:.0} kbps", r.bandwidth as f64 / 1000.0),
                resolution: r
                    .resolution
                    .map(|res| format!("{} ({})", res, res.quality_name()))
                    .unwrap_or_else(|| "-".to_string()),
                codecs: r.codecs.clone().unwrap_or_else(|| "-".to_string()),
                base_url: r.base_url.to_string(),
            });

            format!(
                "Media type: {}\nAdaptation index: {}\nSelected quality: {}\n\n{}",
                report.media_type,
                report.data_index,
                report.current_quality,
                Table::new(rows)
            )
        }
    }
}
