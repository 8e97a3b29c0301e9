//! Generate Command
//!
//! Analyze a file or directory, export the documentation, and print a
//! summary of accepted and unverified routes.

use std::path::PathBuf;

use tracing::info;

use crate::cli::Output;
use crate::config::{Config, ConfigLoader};
use crate::export::{self, ExportFormat};
use crate::pipeline::{self, AnalyzeOptions};
use crate::types::{Result, RouteSageError};

/// Flags of `routesage generate`; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    pub path: PathBuf,
    pub output: Option<PathBuf>,
    pub format: Option<ExportFormat>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub no_cache: bool,
    pub lenient: bool,
    pub min_confidence: Option<f64>,
    pub no_enhance: bool,
    pub no_write: bool,
    pub entry: Option<PathBuf>,
}

/// Resolved run: analysis options plus where and how to export
#[derive(Debug, Clone)]
pub struct GeneratePlan {
    pub options: AnalyzeOptions,
    pub format: ExportFormat,
    pub output_dir: PathBuf,
}

impl GenerateArgs {
    /// Apply the flags on top of loaded configuration
    pub fn resolve(&self, config: &Config) -> Result<GeneratePlan> {
        let mut options = AnalyzeOptions::from_config(config, &self.path);

        if let Some(provider) = &self.provider {
            options.backend.provider = provider.clone();
            // A model configured for another provider would be rejected
            if self.model.is_none() && *provider != config.llm.provider {
                options.backend.model = None;
            }
        }
        if let Some(model) = &self.model {
            options.backend.model = Some(model.clone());
        }
        if let Some(key) = &self.api_key {
            options.backend.api_key = Some(key.clone());
        }
        if self.no_cache {
            options.cache_dir = None;
        }
        if self.lenient {
            options.strict_verification = false;
        }
        if let Some(min_confidence) = self.min_confidence {
            if !(0.0..=1.0).contains(&min_confidence) {
                return Err(RouteSageError::Config(format!(
                    "--min-confidence must be between 0.0 and 1.0, got {}",
                    min_confidence
                )));
            }
            options.min_confidence = min_confidence;
        }
        if self.no_enhance {
            options.enhance_descriptions = false;
        }
        if self.no_write {
            options.write_back = false;
        }
        options.entry_point = self.entry.clone();

        Ok(GeneratePlan {
            options,
            format: self.format.unwrap_or(config.export.format),
            output_dir: self
                .output
                .clone()
                .unwrap_or_else(|| config.export.output_dir.clone()),
        })
    }
}

pub async fn run(args: GenerateArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let plan = args.resolve(&config)?;
    let output = Output::new();

    output.info(&format!(
        "Analyzing {} with {}",
        plan.options.source_path.display(),
        plan.options.backend.provider
    ));
    if !plan.options.strict_verification {
        output.warning("Lenient verification: routes not found in source are kept as unverified");
    }

    let docs = pipeline::analyze(&plan.options).await?;
    let path = export::export(&docs, plan.format, &plan.output_dir).await?;
    info!(path = %path.display(), "Documentation written");

    output.route_summary(&docs);
    println!();
    if docs.routes.is_empty() {
        output.warning("No routes documented");
    }
    output.success(&format!("Documentation saved to {}", path.display()));
    Ok(())
}
