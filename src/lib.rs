//! RouteSage - Verified API Documentation for FastAPI
//!
//! Combines a statically derived ground truth of declared routes with
//! LLM-generated documentation, reconciles the two, and writes the approved
//! documentation back into the route decorators.
//!
//! ## Pipeline
//!
//! ```text
//! source ─→ StaticRouteExtractor ─→ ground truth ─┐
//!        ─→ GenerationClient (cache, rate limit,   │
//!           retry) ─→ payload ─→ RouteVerifier ←───┘
//!                                     ↓
//!                       SourceRewriter ─→ updated source
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use routesage::pipeline::{AnalyzeOptions, analyze};
//!
//! let mut options = AnalyzeOptions::new("app/main.py");
//! options.backend.provider = "anthropic".into();
//! let docs = analyze(&options).await?;
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: tree-sitter parsing, ground-truth extraction, file discovery
//! - [`ai`]: generation backends, response cache, rate limiter, retry
//! - [`synthesis`]: analysis prompt, payload parsing, description enhancement
//! - [`verifier`]: confidence and existence checks, strict/lenient policy
//! - [`rewriter`]: byte-preserving decorator rewrites
//! - [`pipeline`]: single-file and directory analysis
//! - [`export`]: JSON and Markdown renderers

pub mod ai;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod export;
pub mod pipeline;
pub mod rewriter;
pub mod synthesis;
pub mod types;
pub mod verifier;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};

pub use types::error::{ErrorCategory, LlmError, Result, RouteSageError};
pub use types::route::{ApiDocumentation, ParameterKind, RouteInfo, RouteParameter};

pub use analyzer::{GroundTruth, StaticRouteExtractor};
pub use export::ExportFormat;
pub use pipeline::{AnalyzeOptions, Analyzer, analyze};
pub use rewriter::SourceRewriter;
pub use synthesis::LlmDocumentationSynthesizer;
pub use verifier::RouteVerifier;
