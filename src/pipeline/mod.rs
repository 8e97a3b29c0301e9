//! Analysis Pipeline
//!
//! Entry point tying the stages together for one file or a directory tree:
//!
//! ```text
//! source → ground truth ─┐
//!        → backend ──────┴→ verifier → rewriter (write back) → enhancement
//! ```
//!
//! Files are processed strictly one after another. A failing file is logged
//! and skipped; it never aborts the rest of the directory.

mod analysis;
mod options;

pub use analysis::Analyzer;
pub use options::AnalyzeOptions;

use crate::ai::ProviderRegistry;
use crate::types::{ApiDocumentation, Result};

/// Analyze `options.source_path` with the built-in providers
pub async fn analyze(options: &AnalyzeOptions) -> Result<ApiDocumentation> {
    let analyzer = Analyzer::from_options(options, &ProviderRegistry::new())?;
    analyzer.analyze(&options.source_path).await
}
