//! Backend call glue: response cache, then rate limiter, then retried
//! backend call, then cache population.

use std::sync::Arc;

use tracing::debug;

use super::cache::{CacheKey, ResponseCache};
use super::provider::SharedBackend;
use super::rate_limiter::RateLimiter;
use super::retry::RetryPolicy;
use crate::types::Result;

/// A backend wrapped with the shared call discipline
#[derive(Clone)]
pub struct GenerationClient {
    backend: SharedBackend,
    cache: Option<Arc<ResponseCache>>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    max_tokens: usize,
}

impl GenerationClient {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            cache: None,
            limiter: Arc::new(RateLimiter::default()),
            retry: RetryPolicy::default(),
            max_tokens: 4096,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Generate text, serving from cache when possible
    pub async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
    ) -> Result<String> {
        self.generate_validated(prompt, system_prompt, temperature, |text| {
            Ok(text.to_string())
        })
        .await
    }

    /// Generate text and convert it with `validate`.
    ///
    /// Only responses that pass `validate` are cached. A cached entry that no
    /// longer validates counts as a miss and is replaced by a fresh call.
    pub async fn generate_validated<T, F>(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
        validate: F,
    ) -> Result<T>
    where
        F: Fn(&str) -> Result<T>,
    {
        let key = CacheKey {
            provider: self.backend.name(),
            model: self.backend.model(),
            prompt,
            system_prompt,
            temperature,
        };

        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(&key).await
        {
            match validate(&hit) {
                Ok(value) => return Ok(value),
                Err(e) => debug!(error = %e, "Cached response rejected; regenerating"),
            }
        }

        let backend_id = self.backend.name();
        let response = self
            .retry
            .run(backend_id, || async {
                self.limiter.wait(backend_id).await;
                self.backend
                    .generate(prompt, system_prompt, temperature, self.max_tokens)
                    .await
            })
            .await?;

        debug!(
            provider = %backend_id,
            chars = response.len(),
            "Backend response received"
        );

        let value = validate(&response)?;
        if let Some(cache) = &self.cache {
            cache.set(&key, &response).await;
        }
        Ok(value)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{ScriptedBackend, transient_error};
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(ScriptedBackend::ok(["first"]));
        let client = GenerationClient::new(backend.clone())
            .with_cache(Arc::new(ResponseCache::new(dir.path())));

        assert_eq!(client.generate("p", Some("s"), 0.3).await.unwrap(), "first");
        assert_eq!(client.generate("p", Some("s"), 0.3).await.unwrap(), "first");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_through_limiter() {
        let backend = Arc::new(ScriptedBackend::new([
            Err(transient_error()),
            Ok("second time".to_string()),
        ]));
        let limiter = Arc::new(RateLimiter::new(60));
        let client = GenerationClient::new(backend.clone())
            .with_rate_limiter(limiter.clone())
            .with_retry(RetryPolicy::new(3, Duration::from_millis(100)));

        assert_eq!(client.generate("p", None, 0.7).await.unwrap(), "second time");
        assert_eq!(backend.call_count(), 2);
        assert_eq!(limiter.recent_calls("scripted"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(ResponseCache::new(dir.path()));
        let backend = Arc::new(ScriptedBackend::new(Vec::new()));
        let client = GenerationClient::new(backend.clone())
            .with_cache(cache.clone())
            .with_retry(RetryPolicy::new(2, Duration::from_millis(1)));

        assert!(client.generate("p", None, 0.3).await.is_err());
        assert_eq!(backend.call_count(), 2);
        assert_eq!(cache.stats().await.unwrap().entry_count, 0);
    }

    fn must_be_json(text: &str) -> crate::types::Result<serde_json::Value> {
        crate::ai::extract_json_from_response(text)
    }

    #[tokio::test]
    async fn test_rejected_response_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(ResponseCache::new(dir.path()));
        let backend = Arc::new(ScriptedBackend::ok(["not json at all", r#"{"ok": true}"#]));
        let client = GenerationClient::new(backend.clone()).with_cache(cache.clone());

        let first = client.generate_validated("p", Some("s"), 0.3, must_be_json).await;
        assert!(matches!(
            first,
            Err(crate::types::RouteSageError::MalformedPayload(_))
        ));
        assert_eq!(cache.stats().await.unwrap().entry_count, 0);

        let second = client
            .generate_validated("p", Some("s"), 0.3, must_be_json)
            .await
            .unwrap();
        assert_eq!(second["ok"], true);
        assert_eq!(backend.call_count(), 2);

        // Now served from cache
        let third = client
            .generate_validated("p", Some("s"), 0.3, must_be_json)
            .await
            .unwrap();
        assert_eq!(third["ok"], true);
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_cached_entry_is_regenerated() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(ResponseCache::new(dir.path()));
        let backend = Arc::new(ScriptedBackend::ok([r#"{"ok": 1}"#]));
        let client = GenerationClient::new(backend.clone()).with_cache(cache.clone());

        let key = CacheKey {
            provider: "scripted",
            model: "scripted-1",
            prompt: "p",
            system_prompt: None,
            temperature: 0.3,
        };
        assert!(cache.set(&key, "stale prose").await);

        let value = client
            .generate_validated("p", None, 0.3, must_be_json)
            .await
            .unwrap();
        assert_eq!(value["ok"], 1);
        assert_eq!(backend.call_count(), 1);
        assert_eq!(cache.get(&key).await.as_deref(), Some(r#"{"ok": 1}"#));
    }
}
