//! Google Gemini generateContent Provider

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    BackendConfig, GenerationBackend, ProviderSpec, SharedBackend, http_client, non_empty,
    resolve_api_key, resolve_model, send_json,
};
use crate::types::Result;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub(super) const SPEC: ProviderSpec = ProviderSpec {
    name: "gemini",
    default_model: "gemini-1.5-pro",
    models: &["gemini-1.5-pro", "gemini-1.0-pro"],
    factory: create,
};

fn create(config: &BackendConfig) -> Result<SharedBackend> {
    Ok(Arc::new(GeminiProvider::new(config)?))
}

pub struct GeminiProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let api_key = resolve_api_key(config.api_key.as_deref(), "GEMINI_API_KEY", SPEC.name)?;
        let model = resolve_model(&SPEC, config.model.as_deref())?;
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            client: http_client(config.timeout_secs, SPEC.name)?,
        })
    }

    fn build_request(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
        max_tokens: usize,
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: system_prompt.map(|text| Content {
                role: None,
                parts: vec![Part {
                    text: text.to_string(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: max_tokens,
            },
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiProvider {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        info!(
            "Generating with Gemini (model: {}, temperature: {})",
            self.model, temperature
        );

        let request = self.build_request(prompt, system_prompt, temperature, max_tokens);
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);

        debug!("Sending request to Gemini API");

        let body: GenerateContentResponse = send_json(
            self.client
                .post(&url)
                .header("x-goog-api-key", self.api_key.expose_secret())
                .json(&request),
            SPEC.name,
        )
        .await?;

        non_empty(body.into_text(), SPEC.name)
    }

    fn models(&self) -> &[&'static str] {
        SPEC.models
    }

    fn name(&self) -> &str {
        SPEC.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(&BackendConfig::new("gemini").with_api_key("g-test")).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let request = provider().build_request("source", Some("rules"), 0.3, 2048);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "rules");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "source");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_response_text() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "hello"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_text().as_deref(), Some("hello"));

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert!(blocked.into_text().is_none());
    }

    #[test]
    fn test_defaults() {
        let p = provider();
        assert_eq!(p.model(), "gemini-1.5-pro");
        assert_eq!(p.models(), &["gemini-1.5-pro", "gemini-1.0-pro"]);
        assert!(!format!("{:?}", p).contains("g-test"));
    }
}
