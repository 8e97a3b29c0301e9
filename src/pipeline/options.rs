use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::BackendConfig;
use crate::config::{Config, ConfigLoader};
use crate::constants::{rate_limit, retry, synthesis};

/// Everything one analysis run needs, resolved from config and CLI flags
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// File or directory to analyze
    pub source_path: PathBuf,
    /// Provider, model, key, endpoint and timeout
    pub backend: BackendConfig,
    pub max_tokens: usize,
    pub strict_verification: bool,
    pub min_confidence: f64,
    /// Attempts per backend call
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub calls_per_minute: usize,
    /// Response cache location; `None` disables caching
    pub cache_dir: Option<PathBuf>,
    pub enhance_descriptions: bool,
    pub min_description_chars: usize,
    /// Write rewritten sources back to disk
    pub write_back: bool,
    /// File whose metadata titles an aggregated directory
    pub entry_point: Option<PathBuf>,
}

impl AnalyzeOptions {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            backend: BackendConfig::default(),
            max_tokens: 4096,
            strict_verification: true,
            min_confidence: synthesis::DEFAULT_MIN_CONFIDENCE,
            max_retries: retry::DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(retry::DEFAULT_RETRY_DELAY_MS),
            calls_per_minute: rate_limit::DEFAULT_CALLS_PER_MINUTE,
            cache_dir: None,
            enhance_descriptions: true,
            min_description_chars: synthesis::MIN_DESCRIPTION_CHARS,
            write_back: true,
            entry_point: None,
        }
    }

    /// Options from loaded configuration; CLI flags are applied on top
    pub fn from_config(config: &Config, source_path: &Path) -> Self {
        let backend = BackendConfig {
            provider: config.llm.provider.clone(),
            model: config.llm.model.clone(),
            timeout_secs: config.llm.timeout_secs,
            api_key: config.llm.api_key.clone(),
            api_base: config.llm.api_base.clone(),
        };

        Self {
            source_path: source_path.to_path_buf(),
            backend,
            max_tokens: config.llm.max_tokens,
            strict_verification: config.synthesis.strict_verification,
            min_confidence: config.synthesis.min_confidence,
            max_retries: config.synthesis.max_retries,
            retry_delay: Duration::from_millis(config.synthesis.retry_delay_ms),
            calls_per_minute: config.rate_limit.calls_per_minute,
            cache_dir: if config.cache.enabled {
                ConfigLoader::cache_dir(config)
            } else {
                None
            },
            enhance_descriptions: config.synthesis.enhance_descriptions,
            min_description_chars: config.synthesis.min_description_chars,
            write_back: true,
            entry_point: None,
        }
    }
}
