//! Code Analyzer Module
//!
//! Static analysis of Python web applications:
//! - Syntax trees via tree-sitter
//! - Ground-truth route extraction
//! - Route file discovery with gitignore support

pub mod extractor;
pub mod parser;
pub mod scanner;

pub use extractor::{GroundTruth, StaticRouteExtractor};
pub use scanner::FileScanner;
