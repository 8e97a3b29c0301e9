//! Route documentation model
//!
//! `ApiDocumentation` is the single unit of exchange between synthesis,
//! verification, rewriting and export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::synthesis::DEFAULT_CONFIDENCE;

/// Where a route parameter is carried
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Path,
    Query,
    Body,
    Header,
    Cookie,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Body => "body",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ParameterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "path" => Ok(Self::Path),
            "query" => Ok(Self::Query),
            "body" => Ok(Self::Body),
            "header" => Ok(Self::Header),
            "cookie" => Ok(Self::Cookie),
            other => Err(format!("unknown parameter kind '{}'", other)),
        }
    }
}

/// A single documented route parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_data_type")]
    pub data_type: String,
}

fn default_data_type() -> String {
    "string".to_string()
}

impl RouteParameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
            data_type: default_data_type(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }
}

/// Documentation for one route declaration.
///
/// The exact `path` string is the identity key used for reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteInfo {
    pub path: String,
    pub methods: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<RouteParameter>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default = "default_confidence")]
    pub confidence_score: f64,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

impl RouteInfo {
    pub fn new<I, S>(path: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            path: path.into(),
            methods: normalize_methods(methods),
            summary: None,
            description: None,
            parameters: Vec::new(),
            tags: Vec::new(),
            deprecated: false,
            confidence_score: DEFAULT_CONFIDENCE,
            verified: false,
            source_file: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_confidence(mut self, score: f64) -> Self {
        self.confidence_score = clamp_confidence(score);
        self
    }

    /// First tag, used as the grouping key in rendered output
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    /// Route description is missing or too short to be useful
    pub fn needs_description(&self, min_chars: usize) -> bool {
        self.description
            .as_deref()
            .is_none_or(|d| d.trim().chars().count() < min_chars)
    }
}

/// Uppercase, de-duplicate and keep first-seen order
pub fn normalize_methods<I, S>(methods: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for method in methods {
        let upper = method.as_ref().trim().to_uppercase();
        if !upper.is_empty() && !out.contains(&upper) {
            out.push(upper);
        }
    }
    out
}

/// Force a score into [0, 1]; NaN counts as no confidence at all
pub fn clamp_confidence(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Documentation for one analysis unit (a file or an aggregated directory)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiDocumentation {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    #[serde(default)]
    pub routes: Vec<RouteInfo>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ApiDocumentation {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            version: crate::constants::synthesis::DEFAULT_VERSION.to_string(),
            routes: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Placeholder returned when no usable documentation could be produced
    pub fn failed() -> Self {
        Self {
            description: Some("Failed to analyze application".to_string()),
            ..Self::new(crate::constants::synthesis::DEFAULT_TITLE)
        }
    }

    pub fn verified_count(&self) -> usize {
        self.routes.iter().filter(|r| r.verified).count()
    }

    pub fn unverified_count(&self) -> usize {
        self.routes.len() - self.verified_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_methods() {
        let methods = normalize_methods(["get", "Post", "GET", " "]);
        assert_eq!(methods, vec!["GET", "POST"]);
    }

    #[test]
    fn test_route_defaults() {
        let route = RouteInfo::new("/users", ["get"]);
        assert_eq!(route.confidence_score, 0.7);
        assert!(!route.verified);
        assert!(route.source_file.is_none());
        assert!(route.primary_tag().is_none());
    }

    #[test]
    fn test_route_deserialize_defaults() {
        let route: RouteInfo =
            serde_json::from_str(r#"{"path": "/items", "methods": ["GET"]}"#).unwrap();
        assert_eq!(route.confidence_score, 0.7);
        assert!(route.parameters.is_empty());
        assert!(!route.deprecated);
    }

    #[test]
    fn test_parameter_kind_serde() {
        let param: RouteParameter =
            serde_json::from_str(r#"{"name": "id", "type": "path", "required": true}"#).unwrap();
        assert_eq!(param.kind, ParameterKind::Path);
        assert_eq!(param.data_type, "string");
        assert!("form".parse::<ParameterKind>().is_err());
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(1.4), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(0.42), 0.42);
    }

    #[test]
    fn test_needs_description() {
        let route = RouteInfo::new("/a", ["GET"]);
        assert!(route.needs_description(50));

        let route = route.with_description("Short");
        assert!(route.needs_description(50));
        assert!(!route.needs_description(3));
    }

    #[test]
    fn test_failed_documentation() {
        let docs = ApiDocumentation::failed();
        assert_eq!(docs.title, "FastAPI Application");
        assert_eq!(docs.version, "1.0.0");
        assert!(docs.routes.is_empty());
    }
}
