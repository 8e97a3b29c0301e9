//! Structured documentation payload parsing.
//!
//! The whole payload is rejected when its shape is wrong (not an object,
//! a route without `path` or `methods`, a parameter without `name`).
//! Parameters of an unknown kind are dropped with a warning.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::ai::extract_json_from_response;
use crate::constants::synthesis::{DEFAULT_CONFIDENCE, DEFAULT_TITLE, DEFAULT_VERSION};
use crate::types::{
    ApiDocumentation, ParameterKind, Result, RouteInfo, RouteParameter, RouteSageError,
    clamp_confidence, normalize_methods,
};

#[derive(Debug, Deserialize)]
struct RawDocumentation {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    routes: Vec<RawRoute>,
    #[serde(default)]
    tags: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    path: String,
    methods: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Vec<RawParameter>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    deprecated: bool,
    #[serde(default)]
    confidence_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    data_type: Option<String>,
}

/// Parse backend text into unverified documentation
pub fn parse_documentation(raw: &str) -> Result<ApiDocumentation> {
    let value = extract_json_from_response(raw)?;
    if !value.is_object() {
        return Err(RouteSageError::MalformedPayload(
            "top-level value is not an object".to_string(),
        ));
    }

    let doc: RawDocumentation = serde_json::from_value(value)
        .map_err(|e| RouteSageError::MalformedPayload(e.to_string()))?;

    let routes = doc
        .routes
        .into_iter()
        .map(convert_route)
        .collect::<Result<Vec<_>>>()?;

    Ok(ApiDocumentation {
        title: non_blank(doc.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description: non_blank(doc.description),
        version: doc
            .version
            .and_then(|v| match v {
                Value::String(s) => non_blank(Some(s)),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        routes,
        tags: doc.tags.map(convert_tags).unwrap_or_default(),
    })
}

fn convert_route(raw: RawRoute) -> Result<RouteInfo> {
    let methods = normalize_methods(&raw.methods);
    if methods.is_empty() {
        return Err(RouteSageError::MalformedPayload(format!(
            "route '{}' has no HTTP methods",
            raw.path
        )));
    }

    let parameters = raw
        .parameters
        .into_iter()
        .filter_map(|p| match p.kind.parse::<ParameterKind>() {
            Ok(kind) => {
                let mut param = RouteParameter::new(p.name, kind).required(p.required);
                if let Some(description) = non_blank(p.description) {
                    param = param.with_description(description);
                }
                if let Some(data_type) = non_blank(p.data_type) {
                    param = param.with_data_type(data_type);
                }
                Some(param)
            }
            Err(e) => {
                warn!(path = %raw.path, parameter = %p.name, "Dropping parameter: {}", e);
                None
            }
        })
        .collect();

    Ok(RouteInfo {
        path: raw.path,
        methods,
        summary: non_blank(raw.summary),
        description: non_blank(raw.description),
        parameters,
        tags: raw
            .tags
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect(),
        deprecated: raw.deprecated,
        confidence_score: clamp_confidence(raw.confidence_score.unwrap_or(DEFAULT_CONFIDENCE)),
        verified: false,
        source_file: None,
    })
}

/// Accepts `{"name": "description"}` or `[{"name": ..., "description": ...}]`
fn convert_tags(value: Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(name, desc)| desc.as_str().map(|d| (name, d.to_string())))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?;
                let desc = item.get("description").and_then(Value::as_str).unwrap_or("");
                Some((name.to_string(), desc.to_string()))
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let raw = r#"```json
{
  "title": "Shop API",
  "description": "Sells things",
  "version": "2.0.0",
  "routes": [
    {
      "path": "/items/{id}",
      "methods": ["get"],
      "summary": "Get item",
      "description": "Returns one item",
      "parameters": [
        {"name": "id", "type": "path", "required": true, "data_type": "integer"},
        {"name": "file", "type": "form", "required": false}
      ],
      "tags": ["items"],
      "deprecated": true,
      "confidence_score": 1.7
    }
  ],
  "tags": {"items": "Item operations"}
}
```"#;
        let doc = parse_documentation(raw).unwrap();
        assert_eq!(doc.title, "Shop API");
        assert_eq!(doc.version, "2.0.0");
        assert_eq!(doc.tags.get("items").map(String::as_str), Some("Item operations"));

        let route = &doc.routes[0];
        assert_eq!(route.methods, vec!["GET"]);
        assert_eq!(route.parameters.len(), 1);
        assert_eq!(route.parameters[0].kind, ParameterKind::Path);
        assert_eq!(route.parameters[0].data_type, "integer");
        assert!(route.deprecated);
        assert_eq!(route.confidence_score, 1.0);
        assert!(!route.verified);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let doc = parse_documentation(
            r#"{"routes": [{"path": "/users", "methods": ["GET"], "description": ""}]}"#,
        )
        .unwrap();
        assert_eq!(doc.title, "FastAPI Application");
        assert_eq!(doc.version, "1.0.0");
        assert!(doc.description.is_none());
        assert_eq!(doc.routes[0].confidence_score, 0.7);
        assert!(doc.routes[0].description.is_none());
    }

    #[test]
    fn test_route_without_path_rejects_payload() {
        let err = parse_documentation(r#"{"routes": [{"methods": ["GET"]}]}"#).unwrap_err();
        assert!(matches!(err, RouteSageError::MalformedPayload(_)));
    }

    #[test]
    fn test_route_without_methods_rejects_payload() {
        let err = parse_documentation(r#"{"routes": [{"path": "/a", "methods": []}]}"#).unwrap_err();
        assert!(matches!(err, RouteSageError::MalformedPayload(_)));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(parse_documentation("[1, 2, 3]").is_err());
        assert!(parse_documentation("not json at all").is_err());
    }

    #[test]
    fn test_tag_list_form() {
        let doc = parse_documentation(
            r#"{"routes": [], "tags": [{"name": "users", "description": "User ops"}, {"name": "misc"}]}"#,
        )
        .unwrap();
        assert_eq!(doc.tags.len(), 2);
        assert_eq!(doc.tags["users"], "User ops");
        assert_eq!(doc.tags["misc"], "");
    }
}
