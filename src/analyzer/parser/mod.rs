//! Python Parser Module
//!
//! Tree-sitter helpers shared by route extraction and source rewriting.
//!
//! ```rust,ignore
//! use routesage::analyzer::parser::{parse_python, index_route_decorators};
//!
//! let tree = parse_python("app.py", source)?;
//! let decorators = index_route_decorators(&tree, source);
//! ```

pub mod python;

pub use python::{AppInfo, RouteDecorator, extract_app_info, index_route_decorators};

use tree_sitter::{Node, Tree};

use crate::types::{Result, RouteSageError};

/// Create a tree-sitter parser for Python.
pub fn create_ts_parser() -> Result<tree_sitter::Parser> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| RouteSageError::parse("", format!("Failed to set Python language: {}", e)))?;
    Ok(parser)
}

/// Parse Python source into a syntax tree.
///
/// A tree containing error or missing nodes counts as unparseable: route
/// facts and rewrites are only derived from syntactically valid source.
pub fn parse_python(label: &str, content: &str) -> Result<Tree> {
    let mut parser = create_ts_parser().map_err(|e| match e {
        RouteSageError::Parse { message, .. } => RouteSageError::parse(label, message),
        other => other,
    })?;

    let tree = parser
        .parse(content, None)
        .ok_or_else(|| RouteSageError::parse(label, "Failed to parse Python source"))?;

    let root = tree.root_node();
    if root.has_error() {
        let position = first_error_position(root)
            .map(|(row, col)| format!(" near line {}, column {}", row + 1, col + 1))
            .unwrap_or_default();
        return Err(RouteSageError::parse(
            label,
            format!("Source is not valid Python{}", position),
        ));
    }

    Ok(tree)
}

/// Extract text content from a tree-sitter node.
/// Returns empty string if extraction fails (with debug logging).
#[inline]
pub fn get_node_text<'a>(node: Node, content: &'a [u8]) -> &'a str {
    node.utf8_text(content).unwrap_or_else(|e| {
        tracing::debug!(
            "UTF-8 extraction failed at {}:{}-{}:{}: {}",
            node.start_position().row + 1,
            node.start_position().column,
            node.end_position().row + 1,
            node.end_position().column,
            e
        );
        ""
    })
}

/// Named children of a node, comments excluded
pub fn named_children_no_comments(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Pre-order walk over every named node below (and including) `root`.
pub fn for_each_named_node<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_named() {
            visit(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn first_error_position(root: Node<'_>) -> Option<(usize, usize)> {
    let mut found = None;
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            found = Some((pos.row, pos.column));
            break;
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return found;
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_python() {
        let tree = parse_python("ok.py", "def f():\n    return 1\n").unwrap();
        assert_eq!(tree.root_node().kind(), "module");
    }

    #[test]
    fn test_parse_invalid_python() {
        let err = parse_python("bad.py", "def f(:\n    return\n").unwrap_err();
        match err {
            RouteSageError::Parse { path, message } => {
                assert_eq!(path, "bad.py");
                assert!(message.contains("not valid Python"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_walk_visits_nested_nodes() {
        let src = "class A:\n    def f(self):\n        pass\n";
        let tree = parse_python("walk.py", src).unwrap();
        let mut kinds = Vec::new();
        for_each_named_node(tree.root_node(), |n| kinds.push(n.kind().to_string()));
        assert!(kinds.contains(&"class_definition".to_string()));
        assert!(kinds.contains(&"function_definition".to_string()));
    }
}
