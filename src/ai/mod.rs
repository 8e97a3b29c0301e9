//! AI Integration Layer
//!
//! Generation backends and the call discipline around them: response cache,
//! per-backend rate limiting and retry.

pub mod cache;
pub mod client;
pub mod extract;
pub mod provider;
pub mod rate_limiter;
pub mod retry;

pub use cache::{CacheKey, CacheStats, ResponseCache};
pub use client::GenerationClient;
pub use extract::extract_json_from_response;
pub use provider::{
    BackendConfig, ErrorCategory, ErrorClassifier, GenerationBackend, LlmError,
    ProviderRegistry, ProviderSpec, SharedBackend,
};
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
