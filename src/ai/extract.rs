//! JSON Extraction
//!
//! Pulls a JSON document out of model output. Handles the usual wrapping:
//! - Markdown code fences (```json ... ```)
//! - Byte order mark and surrounding whitespace
//! - JSON embedded in explanatory text
//!
//! Truncated or otherwise broken JSON is never repaired. A response that was
//! cut off mid-document is malformed, not partially usable.

use serde_json::Value;
use tracing::debug;

use crate::types::{Result, RouteSageError};

/// Extract and parse the JSON document contained in a model response
pub fn extract_json_from_response(raw: &str) -> Result<Value> {
    let cleaned = preprocess(raw);

    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(value);
    }

    debug!("Direct JSON parse failed, looking for embedded document");

    // Documents are objects; a bracketed aside in the prose must not win
    for open in ['{', '['] {
        if let Some(extracted) = balanced_span(&cleaned, open)
            && let Ok(value) = serde_json::from_str::<Value>(extracted)
        {
            return Ok(value);
        }
    }

    Err(RouteSageError::MalformedPayload(format!(
        "response is not valid JSON. Content preview: {}...",
        cleaned.chars().take(200).collect::<String>()
    )))
}

fn preprocess(raw: &str) -> String {
    let stripped = strip_code_fences(raw.trim());
    stripped.trim_start_matches('\u{feff}').trim().to_string()
}

fn strip_code_fences(s: &str) -> &str {
    let mut result = s;

    if result.starts_with("```")
        && let Some(first_newline) = result.find('\n')
    {
        result = &result[first_newline + 1..];
    }

    if let Some(body) = result.strip_suffix("```") {
        result = body.trim_end();
    }

    result
}

/// Slice out the balanced span starting at the first `open` in `s`
fn balanced_span(s: &str, open: char) -> Option<&str> {
    let start = s.find(open)?;
    let end_char = if open == '{' { '}' } else { ']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (ch == end_char).then(|| &s[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let value = extract_json_from_response(r#"{"title": "API"}"#).unwrap();
        assert_eq!(value["title"], "API");
    }

    #[test]
    fn test_strip_code_fences() {
        let input = "```json\n{\"routes\": []}\n```";
        let value = extract_json_from_response(input).unwrap();
        assert!(value["routes"].is_array());
    }

    #[test]
    fn test_extract_from_mixed() {
        let input = r#"Here is the documentation:
{"title": "Shop", "routes": [{"path": "/a{b}"}]}
Let me know if you need more."#;
        let value = extract_json_from_response(input).unwrap();
        assert_eq!(value["title"], "Shop");
        assert_eq!(value["routes"][0]["path"], "/a{b}");
    }

    #[test]
    fn test_object_preferred_over_bracketed_prose() {
        let input = r#"[note] {"title": "Shop", "routes": []}"#;
        let value = extract_json_from_response(input).unwrap();
        assert_eq!(value["title"], "Shop");
    }

    #[test]
    fn test_bare_array_in_prose() {
        let value = extract_json_from_response("Routes: [1, 2] done").unwrap();
        assert_eq!(value, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_truncated_json_is_not_repaired() {
        let input = r#"{"title": "Shop", "routes": [{"path": "/users""#;
        let err = extract_json_from_response(input).unwrap_err();
        assert!(matches!(err, RouteSageError::MalformedPayload(_)));
    }

    #[test]
    fn test_prose_only() {
        assert!(extract_json_from_response("I cannot help with that.").is_err());
    }
}
