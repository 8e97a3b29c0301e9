//! OpenAI API Provider
//!
//! Chat Completions API. DeepSeek exposes the same wire format, so both
//! providers share this implementation and differ only in their flavor.

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

pub(super) const OPENAI_SPEC: ProviderSpec = ProviderSpec {
    name: "openai",
    default_model: "gpt-3.5-turbo",
    models: &["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo-preview"],
    factory: create_openai,
};

pub(super) const DEEPSEEK_SPEC: ProviderSpec = ProviderSpec {
    name: "deepseek",
    default_model: "deepseek-coder",
    models: &["deepseek-coder", "deepseek-chat"],
    factory: create_deepseek,
};

/// Endpoint details that distinguish OpenAI-compatible services
struct Flavor {
    spec: ProviderSpec,
    api_base: &'static str,
    key_env: &'static str,
}

const OPENAI: Flavor = Flavor {
    spec: OPENAI_SPEC,
    api_base: "https://api.openai.com/v1",
    key_env: "OPENAI_API_KEY",
};

const DEEPSEEK: Flavor = Flavor {
    spec: DEEPSEEK_SPEC,
    api_base: "https://api.deepseek.com/v1",
    key_env: "DEEPSEEK_API_KEY",
};

fn create_openai(config: &BackendConfig) -> Result<SharedBackend> {
    Ok(Arc::new(OpenAiProvider::with_flavor(config, &OPENAI)?))
}

fn create_deepseek(config: &BackendConfig) -> Result<SharedBackend> {
    Ok(Arc::new(OpenAiProvider::with_flavor(config, &DEEPSEEK)?))
}

/// OpenAI-compatible provider with secure API key handling
pub struct OpenAiProvider {
    name: &'static str,
    models: &'static [&'static str],
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        Self::with_flavor(config, &OPENAI)
    }

    pub fn deepseek(config: &BackendConfig) -> Result<Self> {
        Self::with_flavor(config, &DEEPSEEK)
    }

    fn with_flavor(config: &BackendConfig, flavor: &Flavor) -> Result<Self> {
        let name = flavor.spec.name;
        let api_key = resolve_api_key(config.api_key.as_deref(), flavor.key_env, name)?;
        let model = resolve_model(&flavor.spec, config.model.as_deref())?;
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| flavor.api_base.to_string());

        Ok(Self {
            name,
            models: flavor.spec.models,
            api_key: SecretString::from(api_key),
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            client: http_client(config.timeout_secs, name)?,
        })
    }

    fn build_request(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
        max_tokens: usize,
    ) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature,
            max_tokens: Some(max_tokens),
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAiProvider {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        info!(
            "Generating with {} (model: {}, temperature: {})",
            self.name, self.model, temperature
        );

        let request = self.build_request(prompt, system_prompt, temperature, max_tokens);
        let url = format!("{}/chat/completions", self.api_base);

        debug!("Sending request to {} API", self.name);

        let body: ChatCompletionResponse = send_json(
            self.client
                .post(&url)
                .header(
                    "Authorization",
                    format!("Bearer {}", self.api_key.expose_secret()),
                )
                .json(&request),
            self.name,
        )
        .await?;

        non_empty(body.into_content(), self.name)
    }

    fn models(&self) -> &[&'static str] {
        self.models
    }

    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    fn into_content(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(model: Option<&str>) -> OpenAiProvider {
        let mut config = BackendConfig::new("openai").with_api_key("sk-test");
        config.model = model.map(str::to_string);
        OpenAiProvider::new(&config).unwrap()
    }

    #[test]
    fn test_default_model_and_debug() {
        let p = provider(None);
        assert_eq!(p.model(), "gpt-3.5-turbo");
        assert_eq!(p.name(), "openai");
        let debug = format!("{:?}", p);
        assert!(!debug.contains("sk-test"));
    }

    #[test]
    fn test_unsupported_model_rejected() {
        let config = BackendConfig::new("openai")
            .with_api_key("sk-test")
            .with_model("gpt-5-imaginary");
        assert!(OpenAiProvider::new(&config).is_err());
    }

    #[test]
    fn test_deepseek_flavor() {
        let config = BackendConfig::new("deepseek").with_api_key("ds-test");
        let p = OpenAiProvider::deepseek(&config).unwrap();
        assert_eq!(p.name(), "deepseek");
        assert_eq!(p.model(), "deepseek-coder");
        assert_eq!(p.api_base, "https://api.deepseek.com/v1");
        assert_eq!(p.models(), &["deepseek-coder", "deepseek-chat"]);
    }

    #[test]
    fn test_request_shape() {
        let p = provider(Some("gpt-4"));
        let request = p.build_request("source", Some("be precise"), 0.3, 512);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "source");
        assert_eq!(json["max_tokens"], 512);

        let request = p.build_request("source", None, 0.7, 512);
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_response_content() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{}"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_content().as_deref(), Some("{}"));

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(empty.into_content().is_none());
    }
}
