//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/routesage/) and project (.routesage/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{rate_limit, retry, synthesis};
use crate::export::ExportFormat;
use crate::types::{Result, RouteSageError};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation backend settings
    pub llm: LlmConfig,

    /// Synthesis, verification and enhancement settings
    pub synthesis: SynthesisConfig,

    /// Response cache settings
    pub cache: CacheConfig,

    pub rate_limit: RateLimitConfig,

    /// Documentation output settings
    pub export: ExportConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `RouteSageError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.llm.timeout_secs == 0 {
            return Err(RouteSageError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(RouteSageError::Config(
                "LLM max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.synthesis.min_confidence) {
            return Err(RouteSageError::Config(format!(
                "min_confidence must be between 0.0 and 1.0, got {}",
                self.synthesis.min_confidence
            )));
        }

        if self.synthesis.max_retries == 0 {
            return Err(RouteSageError::Config(
                "synthesis max_retries must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.calls_per_minute == 0 {
            return Err(RouteSageError::Config(
                "rate_limit calls_per_minute must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Registered provider name: "openai", "deepseek", "anthropic", "gemini"
    pub provider: String,

    /// Model name (provider default when absent)
    pub model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum tokens to generate per call
    pub max_tokens: usize,

    /// API base URL override
    pub api_base: Option<String>,

    /// Never serialized to output; prefer the provider's env var
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            timeout_secs: 30,
            max_tokens: 4096,
            api_base: None,
            api_key: None,
        }
    }
}

// =============================================================================
// Synthesis Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Drop routes not declared in source (otherwise keep them as unverified)
    pub strict_verification: bool,

    /// Routes below this confidence are rejected
    pub min_confidence: f64,

    /// Attempts per backend call
    pub max_retries: u32,

    /// Base retry delay in milliseconds; attempt `n` waits `n` times this
    pub retry_delay_ms: u64,

    /// Ask the backend for longer descriptions of sparsely documented routes
    pub enhance_descriptions: bool,

    pub min_description_chars: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            strict_verification: true,
            min_confidence: synthesis::DEFAULT_MIN_CONFIDENCE,
            max_retries: retry::DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: retry::DEFAULT_RETRY_DELAY_MS,
            enhance_descriptions: true,
            min_description_chars: synthesis::MIN_DESCRIPTION_CHARS,
        }
    }
}

// =============================================================================
// Cache / Rate Limit / Export
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Overrides the per-user cache directory
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Calls admitted per backend in any 60-second window
    pub calls_per_minute: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            calls_per_minute: rate_limit::DEFAULT_CALLS_PER_MINUTE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Markdown,
            output_dir: PathBuf::from("./docs"),
        }
    }
}
