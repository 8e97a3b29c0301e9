//! Documentation Export
//!
//! Renders [`ApiDocumentation`] to a file in the output directory. File names
//! are `<safe_title>_<YYYYMMDD_HHMMSS>.<ext>`.

mod json;
mod markdown;

pub use json::JsonExporter;
pub use markdown::MarkdownExporter;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{ApiDocumentation, Result, RouteSageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    #[default]
    Markdown,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Json, ExportFormat::Markdown];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "markdown",
        }
    }

    pub fn exporter(&self) -> Box<dyn Exporter> {
        match self {
            ExportFormat::Json => Box::new(JsonExporter),
            ExportFormat::Markdown => Box::new(MarkdownExporter),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = RouteSageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => Err(RouteSageError::Config(format!(
                "Export format '{}' not supported. Available formats: {}",
                other,
                list_formats().join(", ")
            ))),
        }
    }
}

/// Names of the supported export formats
pub fn list_formats() -> Vec<&'static str> {
    ExportFormat::ALL.iter().map(|f| f.as_str()).collect()
}

pub trait Exporter {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    fn render(&self, docs: &ApiDocumentation, generated_at: DateTime<Utc>) -> Result<String>;
}

/// Lowercase the title and replace every non-alphanumeric character with `_`
pub fn safe_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Render `docs` and write it into `output_dir`, returning the file path
pub async fn export(
    docs: &ApiDocumentation,
    format: ExportFormat,
    output_dir: &Path,
) -> Result<PathBuf> {
    let generated_at = Utc::now();
    let exporter = format.exporter();
    let content = exporter.render(docs, generated_at)?;

    tokio::fs::create_dir_all(output_dir).await?;
    let file_name = format!(
        "{}_{}.{}",
        safe_title(&docs.title),
        generated_at.format("%Y%m%d_%H%M%S"),
        exporter.extension()
    );
    let path = output_dir.join(file_name);
    tokio::fs::write(&path, content).await?;

    info!(path = %path.display(), format = %format, "Exported documentation");
    Ok(path)
}
