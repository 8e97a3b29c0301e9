use std::ops::Range;

use tree_sitter::{Node, Tree};

use super::{for_each_named_node, get_node_text, named_children_no_comments};
use crate::constants::routes::{HTTP_VERBS, ROUTER_OBJECTS};

/// A routing decorator with a literal path, located in the source.
///
/// Byte ranges address the original text so edits can be applied without
/// re-serializing unrelated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecorator {
    /// Literal route path (first positional argument)
    pub path: String,
    /// Routing object the verb is called on (`app`, `router`, ...)
    pub receiver: String,
    /// HTTP verb attribute, lowercase as written
    pub verb: String,
    /// Name of the decorated function
    pub function_name: String,
    /// 1-based line of the decorator
    pub line: usize,
    /// Byte offset right after the last argument; new keywords go here
    pub insert_at: usize,
    /// Value range of an existing `description=` keyword
    pub description_value: Option<Range<usize>>,
    /// Value range of an existing `tags=` keyword
    pub tags_value: Option<Range<usize>>,
}

/// Index every routing decorator on a function-like declaration, in source order.
///
/// Decorators whose path argument is not a plain string literal are skipped:
/// only routes that provably exist are reported.
pub fn index_route_decorators(tree: &Tree, content: &str) -> Vec<RouteDecorator> {
    let bytes = content.as_bytes();
    let mut found = Vec::new();

    for_each_named_node(tree.root_node(), |node| {
        if node.kind() != "decorated_definition" {
            return;
        }
        let Some(definition) = node.child_by_field_name("definition") else {
            return;
        };
        if definition.kind() != "function_definition" {
            return;
        }
        let function_name = definition
            .child_by_field_name("name")
            .map(|n| get_node_text(n, bytes).to_string())
            .unwrap_or_default();

        for decorator in named_children_no_comments(node) {
            if decorator.kind() != "decorator" {
                continue;
            }
            if let Some(route) = route_from_decorator(decorator, bytes, &function_name) {
                found.push(route);
            }
        }
    });

    found
}

fn route_from_decorator(
    decorator: Node<'_>,
    bytes: &[u8],
    function_name: &str,
) -> Option<RouteDecorator> {
    let call = named_children_no_comments(decorator).into_iter().next()?;
    if call.kind() != "call" {
        return None;
    }

    let callee = call.child_by_field_name("function")?;
    if callee.kind() != "attribute" {
        return None;
    }
    let receiver = callee.child_by_field_name("object")?;
    let verb = callee.child_by_field_name("attribute")?;
    if receiver.kind() != "identifier" {
        return None;
    }
    let receiver_name = get_node_text(receiver, bytes);
    let verb_name = get_node_text(verb, bytes);
    if !ROUTER_OBJECTS.contains(&receiver_name) || !HTTP_VERBS.contains(&verb_name) {
        return None;
    }

    let arguments = call.child_by_field_name("arguments")?;
    if arguments.kind() != "argument_list" {
        return None;
    }
    let args = named_children_no_comments(arguments);

    let first_positional = args.iter().find(|a| {
        !matches!(
            a.kind(),
            "keyword_argument" | "list_splat" | "dictionary_splat"
        )
    })?;
    let path = string_literal_value(*first_positional, bytes)?;

    let mut description_value = None;
    let mut tags_value = None;
    for arg in args.iter().filter(|a| a.kind() == "keyword_argument") {
        let (Some(name), Some(value)) = (
            arg.child_by_field_name("name"),
            arg.child_by_field_name("value"),
        ) else {
            continue;
        };
        match get_node_text(name, bytes) {
            "description" if description_value.is_none() => {
                description_value = Some(value.byte_range());
            }
            "tags" if tags_value.is_none() => {
                tags_value = Some(value.byte_range());
            }
            _ => {}
        }
    }

    let insert_at = args.last()?.end_byte();

    Some(RouteDecorator {
        path,
        receiver: receiver_name.to_string(),
        verb: verb_name.to_string(),
        function_name: function_name.to_string(),
        line: decorator.start_position().row + 1,
        insert_at,
        description_value,
        tags_value,
    })
}

/// Literal application metadata from a `FastAPI(...)` constructor call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
}

/// Find the first `FastAPI(...)` / `x.FastAPI(...)` call and read its literal
/// `title`, `description` and `version` keywords.
pub fn extract_app_info(tree: &Tree, content: &str) -> Option<AppInfo> {
    let bytes = content.as_bytes();
    let mut info: Option<AppInfo> = None;

    for_each_named_node(tree.root_node(), |node| {
        if info.is_some() || node.kind() != "call" {
            return;
        }
        let Some(callee) = node.child_by_field_name("function") else {
            return;
        };
        let callee_name = match callee.kind() {
            "identifier" => get_node_text(callee, bytes),
            "attribute" => callee
                .child_by_field_name("attribute")
                .map(|a| get_node_text(a, bytes))
                .unwrap_or_default(),
            _ => return,
        };
        if callee_name != "FastAPI" {
            return;
        }

        let mut app = AppInfo::default();
        if let Some(arguments) = node.child_by_field_name("arguments") {
            for arg in named_children_no_comments(arguments) {
                if arg.kind() != "keyword_argument" {
                    continue;
                }
                let (Some(name), Some(value)) = (
                    arg.child_by_field_name("name"),
                    arg.child_by_field_name("value"),
                ) else {
                    continue;
                };
                let slot = match get_node_text(name, bytes) {
                    "title" => &mut app.title,
                    "description" => &mut app.description,
                    "version" => &mut app.version,
                    _ => continue,
                };
                *slot = string_literal_value(value, bytes);
            }
        }
        info = Some(app);
    });

    info
}

/// Decode a plain Python string literal.
///
/// Returns `None` for f-strings, byte strings, implicit concatenations and
/// anything that is not a `string` node.
pub fn string_literal_value(node: Node<'_>, bytes: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let mut cursor = node.walk();
    if node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "interpolation")
    {
        return None;
    }

    let text = get_node_text(node, bytes);
    let quote_start = text.find(['"', '\''])?;
    let prefix = text[..quote_start].to_lowercase();
    if prefix.contains('f') || prefix.contains('b') {
        return None;
    }
    let raw = prefix.contains('r');

    let body = &text[quote_start..];
    let delimiter = if body.starts_with("\"\"\"") || body.starts_with("'''") {
        &body[..3]
    } else {
        &body[..1]
    };
    let inner = body
        .strip_prefix(delimiter)?
        .strip_suffix(delimiter)?;

    if raw {
        Some(inner.to_string())
    } else {
        unescape(inner)
    }
}

/// Decode Python escape sequences.
///
/// `\N{...}` needs the Unicode name table, so literals using it are treated
/// as unresolvable and yield `None`, as do invalid code points.
fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0c}'),
            Some('v') => out.push('\u{0b}'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some('x') => out.push(hex_escape(&mut chars, 2)?),
            Some('u') => out.push(hex_escape(&mut chars, 4)?),
            Some('U') => out.push(hex_escape(&mut chars, 8)?),
            Some('N') => return None,
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8)?;
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value)?);
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Some(out)
}

/// Exactly `digits` hex digits as one code point
fn hex_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, digits: usize) -> Option<char> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(value)
}
