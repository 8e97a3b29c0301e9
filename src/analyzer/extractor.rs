//! Static Route Extraction
//!
//! Computes the ground truth: the set of route paths provably declared in
//! source through a recognized routing decorator with a literal path.
//! Dynamic paths are skipped, so the set under-approximates real routes.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::parser::{index_route_decorators, parse_python};
use crate::types::Result;

/// Set of literal route paths declared in one source unit
pub type GroundTruth = BTreeSet<String>;

#[derive(Debug, Clone, Default)]
pub struct StaticRouteExtractor;

impl StaticRouteExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract declared route paths.
    ///
    /// Fails with a parse error only when the source has no valid syntax tree.
    pub fn extract(&self, label: &str, source: &str) -> Result<GroundTruth> {
        let tree = parse_python(label, source)?;
        let paths: GroundTruth = index_route_decorators(&tree, source)
            .into_iter()
            .map(|decorator| decorator.path)
            .collect();

        debug!(file = %label, routes = paths.len(), "Extracted ground-truth routes");
        Ok(paths)
    }

    /// Like [`extract`](Self::extract), but an unparseable source yields an
    /// empty ground truth with a warning.
    pub fn extract_or_empty(&self, label: &str, source: &str) -> GroundTruth {
        match self.extract(label, source) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(file = %label, error = %e, "Static route extraction failed; using empty ground truth");
                GroundTruth::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RouteSageError;

    #[test]
    fn test_extracts_literal_path() {
        let extractor = StaticRouteExtractor::new();
        let code = r#"
@app.get("/users")
def get_users():
    return {"users": []}
"#;
        let routes = extractor.extract("app.py", code).unwrap();
        assert_eq!(routes, BTreeSet::from(["/users".to_string()]));
    }

    #[test]
    fn test_duplicate_paths_collapse() {
        let extractor = StaticRouteExtractor::new();
        let code = r#"
@app.get("/items")
def list_items():
    pass

@app.post("/items")
def create_item():
    pass
"#;
        let routes = extractor.extract("app.py", code).unwrap();
        assert_eq!(routes.len(), 1);
        assert!(routes.contains("/items"));
    }

    #[test]
    fn test_parse_error_propagates() {
        let extractor = StaticRouteExtractor::new();
        let err = extractor.extract("broken.py", "@app.get(\"/x\"\ndef f(:\n").unwrap_err();
        assert!(matches!(err, RouteSageError::Parse { .. }));
    }

    #[test]
    fn test_parse_error_yields_empty_at_boundary() {
        let extractor = StaticRouteExtractor::new();
        let routes = extractor.extract_or_empty("broken.py", "def f(:\n");
        assert!(routes.is_empty());
    }

    #[test]
    fn test_no_routes() {
        let extractor = StaticRouteExtractor::new();
        let routes = extractor
            .extract("util.py", "def helper():\n    return 42\n")
            .unwrap();
        assert!(routes.is_empty());
    }
}
