//! Anthropic Messages API Provider

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

const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

pub(super) const SPEC: ProviderSpec = ProviderSpec {
    name: "anthropic",
    default_model: "claude-3-opus",
    models: &["claude-3-opus", "claude-3-sonnet", "claude-3-haiku"],
    factory: create,
};

fn create(config: &BackendConfig) -> Result<SharedBackend> {
    Ok(Arc::new(AnthropicProvider::new(config)?))
}

pub struct AnthropicProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let api_key = resolve_api_key(config.api_key.as_deref(), "ANTHROPIC_API_KEY", SPEC.name)?;
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
    ) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            system: system_prompt.map(str::to_string),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl GenerationBackend for AnthropicProvider {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        info!(
            "Generating with Anthropic (model: {}, temperature: {})",
            self.model, temperature
        );

        let request = self.build_request(prompt, system_prompt, temperature, max_tokens);
        let url = format!("{}/messages", self.api_base);

        debug!("Sending request to Anthropic API");

        let body: MessagesResponse = send_json(
            self.client
                .post(&url)
                .header("x-api-key", self.api_key.expose_secret())
                .header("anthropic-version", API_VERSION)
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
struct MessagesRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

impl MessagesResponse {
    /// Concatenated text blocks
    fn into_text(self) -> Option<String> {
        let text: String = self
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}
