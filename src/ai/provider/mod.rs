//! Generation Backend Abstraction
//!
//! Defines the [`GenerationBackend`] trait and the [`ProviderRegistry`] that
//! maps provider names to constructors. Adding a backend means registering a
//! [`ProviderSpec`], never branching on type at the call site.
//!
//! ## Providers
//!
//! - `openai`: Chat Completions API
//! - `deepseek`: OpenAI-compatible API
//! - `anthropic`: Messages API
//! - `gemini`: generateContent API

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::types::{Result, RouteSageError};

/// Shared backend handle passed down the pipeline
pub type SharedBackend = Arc<dyn GenerationBackend>;

// =============================================================================
// Backend Configuration
// =============================================================================

/// Configuration for one generation backend
///
/// Note: API keys are never serialized to output and are redacted in debug
/// output. Each provider converts the key to SecretString internally.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Provider name as registered: "openai", "anthropic", ...
    pub provider: String,
    /// Model name; the provider default when absent
    pub model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Never serialized to output for security
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            timeout_secs: 30,
            api_key: None,
            api_base: None,
        }
    }
}

impl BackendConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

// =============================================================================
// Generation Backend Trait
// =============================================================================

/// A text generation capability
///
/// Implementations must return a categorized [`RouteSageError::Backend`] on
/// transport failures, non-2xx responses and empty bodies. They never return
/// a partial response as if it were complete.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String>;

    /// Model identifiers this backend accepts
    fn models(&self) -> &[&'static str];

    /// Provider name, also the rate-limit and cache identity
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

// =============================================================================
// Provider Registry
// =============================================================================

pub type BackendFactory = fn(&BackendConfig) -> Result<SharedBackend>;

/// Static description of a provider plus its constructor
#[derive(Clone, Copy)]
pub struct ProviderSpec {
    pub name: &'static str,
    pub default_model: &'static str,
    pub models: &'static [&'static str],
    pub factory: BackendFactory,
}

impl std::fmt::Debug for ProviderSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSpec")
            .field("name", &self.name)
            .field("default_model", &self.default_model)
            .field("models", &self.models)
            .finish()
    }
}

/// Name-to-constructor map for generation backends
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<&'static str, ProviderSpec>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(openai::OPENAI_SPEC);
        registry.register(openai::DEEPSEEK_SPEC);
        registry.register(anthropic::SPEC);
        registry.register(gemini::SPEC);
        registry
    }
}

impl ProviderRegistry {
    /// Registry seeded with the built-in providers
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// Add or replace a provider
    pub fn register(&mut self, spec: ProviderSpec) {
        self.providers.insert(spec.name, spec);
    }

    pub fn get(&self, name: &str) -> Option<&ProviderSpec> {
        self.providers.get(name)
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.keys().copied().collect()
    }

    pub fn specs(&self) -> impl Iterator<Item = &ProviderSpec> {
        self.providers.values()
    }

    /// Construct the backend named by `config.provider`
    pub fn create(&self, config: &BackendConfig) -> Result<SharedBackend> {
        let spec = self
            .get(&config.provider)
            .ok_or_else(|| RouteSageError::UnknownProvider {
                name: config.provider.clone(),
                available: self.names().join(", "),
            })?;
        (spec.factory)(config)
    }
}

// =============================================================================
// Shared helpers for provider constructors
// =============================================================================

/// Requested model, or the provider default; rejects unsupported models
pub(crate) fn resolve_model(spec: &ProviderSpec, requested: Option<&str>) -> Result<String> {
    match requested {
        None => Ok(spec.default_model.to_string()),
        Some(model) if spec.models.contains(&model) => Ok(model.to_string()),
        Some(model) => Err(RouteSageError::Config(format!(
            "Model '{}' is not supported by {}. Supported: {}",
            model,
            spec.name,
            spec.models.join(", ")
        ))),
    }
}

/// Explicit key, or the provider's conventional environment variable
pub(crate) fn resolve_api_key(
    explicit: Option<&str>,
    env_var: &str,
    provider: &str,
) -> Result<String> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            RouteSageError::Config(format!(
                "{} API key not found. Set {} env var or pass --api-key",
                provider, env_var
            ))
        })
}

pub(crate) fn http_client(timeout_secs: u64, provider: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::Unknown,
                format!("Failed to create HTTP client: {}", e),
                provider,
            )
            .into()
        })
}

/// Send a request and return the body of a 2xx response as JSON
pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| ErrorClassifier::classify(&format!("request failed: {}", e), provider))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ErrorClassifier::classify_http_status(
            status.as_u16(),
            &format!("API error ({}): {}", status, body),
            provider,
        )
        .into());
    }

    response.json::<T>().await.map_err(|e| {
        LlmError::with_provider(
            ErrorCategory::Unknown,
            format!("Failed to parse response body: {}", e),
            provider,
        )
        .into()
    })
}

/// Reject missing or whitespace-only generated text
pub(crate) fn non_empty(text: Option<String>, provider: &str) -> Result<String> {
    text.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
        LlmError::with_provider(ErrorCategory::EmptyResponse, "No content in response", provider)
            .into()
    })
}
