//! Source Rewriter
//!
//! Injects approved documentation into route decorators:
//!
//! 1. parse the source and index routing decorators with byte ranges
//! 2. plan edits for decorators whose literal path has approved documentation
//! 3. splice the edits into the original text
//! 4. re-parse the result and check the declared routes did not change
//!
//! Bytes outside the edited keyword values are copied unchanged. Existing
//! `description=` and `tags=` keywords are overwritten in place, so running
//! the rewrite again with the same documentation changes nothing. Any failure
//! returns the original text.

use std::collections::HashMap;
use std::ops::Range;

use tracing::{debug, warn};

use crate::analyzer::parser::{index_route_decorators, parse_python};
use crate::types::{ApiDocumentation, Result, RouteInfo, RouteSageError};

/// One replacement of `range` in the original text by `text`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    range: Range<usize>,
    text: String,
}

impl Edit {
    fn replace(range: Range<usize>, text: String) -> Self {
        Self { range, text }
    }

    fn insert(at: usize, text: String) -> Self {
        Self {
            range: at..at,
            text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SourceRewriter;

impl SourceRewriter {
    pub fn new() -> Self {
        Self
    }

    /// Rewrite `source`, or return it unchanged if anything goes wrong
    pub fn rewrite(&self, label: &str, source: &str, docs: &ApiDocumentation) -> String {
        match self.try_rewrite(label, source, docs) {
            Ok(updated) => updated,
            Err(e) => {
                warn!(file = %label, error = %e, "Rewrite abandoned; source left unchanged");
                source.to_string()
            }
        }
    }

    pub fn try_rewrite(&self, label: &str, source: &str, docs: &ApiDocumentation) -> Result<String> {
        let tree = parse_python(label, source)?;
        let decorators = index_route_decorators(&tree, source);

        let mut lookup: HashMap<&str, &RouteInfo> = HashMap::new();
        for route in &docs.routes {
            lookup.entry(route.path.as_str()).or_insert(route);
        }

        let mut edits = Vec::new();
        for decorator in &decorators {
            let Some(route) = lookup.get(decorator.path.as_str()) else {
                continue;
            };

            if let Some(description) = &route.description {
                let literal = python_string(description);
                edits.push(match &decorator.description_value {
                    Some(range) => Edit::replace(range.clone(), literal),
                    None => Edit::insert(decorator.insert_at, format!(", description={}", literal)),
                });
            }

            if !route.tags.is_empty() {
                let literal = python_string_list(&route.tags);
                edits.push(match &decorator.tags_value {
                    Some(range) => Edit::replace(range.clone(), literal),
                    None => Edit::insert(decorator.insert_at, format!(", tags={}", literal)),
                });
            }
        }

        if edits.is_empty() {
            return Ok(source.to_string());
        }

        let updated = apply_edits(source, edits)?;

        let reparsed = parse_python(label, &updated)?;
        let before: Vec<&str> = decorators.iter().map(|d| d.path.as_str()).collect();
        let after_index = index_route_decorators(&reparsed, &updated);
        let after: Vec<&str> = after_index.iter().map(|d| d.path.as_str()).collect();
        if before != after {
            return Err(RouteSageError::parse(
                label,
                "rewrite changed the set of declared routes",
            ));
        }

        debug!(file = %label, decorators = decorators.len(), "Rewrote route decorators");
        Ok(updated)
    }
}

/// Splice edits into `source`. Edits are applied in ascending order; inserts
/// at the same offset keep their planned order.
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Result<String> {
    edits.sort_by_key(|e| e.range.start);

    let mut out = String::with_capacity(source.len() + edits.iter().map(|e| e.text.len()).sum::<usize>());
    let mut cursor = 0;

    for edit in edits {
        if edit.range.start < cursor || edit.range.end > source.len() {
            return Err(RouteSageError::parse("", "overlapping rewrite edits"));
        }
        let (Some(kept), true) = (
            source.get(cursor..edit.range.start),
            source.is_char_boundary(edit.range.end),
        ) else {
            return Err(RouteSageError::parse("", "rewrite edit splits a character"));
        };
        out.push_str(kept);
        out.push_str(&edit.text);
        cursor = edit.range.end;
    }

    out.push_str(&source[cursor..]);
    Ok(out)
}

/// Render a double-quoted Python string literal
pub fn python_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Render a Python list of string literals: `["a", "b"]`
pub fn python_string_list(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| python_string(v)).collect();
    format!("[{}]", items.join(", "))
}
