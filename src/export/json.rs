use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Exporter;
use crate::types::{ApiDocumentation, Result};

/// Pretty JSON with a `generated_at` timestamp
pub struct JsonExporter;

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(flatten)]
    docs: &'a ApiDocumentation,
    generated_at: String,
}

impl Exporter for JsonExporter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, docs: &ApiDocumentation, generated_at: DateTime<Utc>) -> Result<String> {
        Ok(serde_json::to_string_pretty(&JsonDocument {
            docs,
            generated_at: generated_at.to_rfc3339(),
        })?)
    }
}
