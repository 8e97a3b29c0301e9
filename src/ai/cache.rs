//! Response Cache
//!
//! Content-addressed store for backend responses, one JSON file per request
//! fingerprint. Entries never expire; [`ResponseCache::clear`] is the only
//! removal path.
//!
//! Reads fail open: a missing, unreadable or corrupt entry is a miss.
//! Writes fail open too: a failed write is logged and the response is still
//! returned to the caller.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::constants::cache::{MAX_RESPONSE_CHARS, NO_SYSTEM_PROMPT};
use crate::types::Result;

/// The five inputs that identify one generation request
#[derive(Debug, Clone, Copy)]
pub struct CacheKey<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub prompt: &'a str,
    pub system_prompt: Option<&'a str>,
    pub temperature: f32,
}

impl CacheKey<'_> {
    /// SHA-256 hex digest over all five inputs
    pub fn digest(&self) -> String {
        let material = format!(
            "{}::{}::{}::{}::{}",
            self.provider,
            self.model,
            self.prompt,
            self.system_prompt.unwrap_or(NO_SYSTEM_PROMPT),
            self.temperature
        );
        let hash = Sha256::digest(material.as_bytes());
        hash.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// On-disk cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub provider: String,
    pub model: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub response: String,
}

/// File-backed response cache
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{}.json", digest))
    }

    /// Look up a previously stored response
    pub async fn get(&self, key: &CacheKey<'_>) -> Option<String> {
        let path = self.entry_path(&key.digest());

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Unreadable cache entry");
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) if is_cacheable(&entry.response) => {
                debug!(provider = %key.provider, model = %key.model, "Cache hit");
                Some(entry.response)
            }
            Ok(_) => None,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Corrupt cache entry");
                None
            }
        }
    }

    /// Store a response. Returns whether it was written.
    ///
    /// Empty, whitespace-only and oversized responses are never stored.
    pub async fn set(&self, key: &CacheKey<'_>, response: &str) -> bool {
        if !is_cacheable(response) {
            debug!(
                chars = response.chars().count(),
                "Response not cacheable (empty or oversized)"
            );
            return false;
        }

        let entry = CacheEntry {
            provider: key.provider.to_string(),
            model: key.model.to_string(),
            prompt: key.prompt.to_string(),
            system_prompt: key.system_prompt.map(str::to_string),
            temperature: key.temperature,
            response: response.to_string(),
        };

        match self.write_entry(&key.digest(), &entry).await {
            Ok(()) => true,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Failed to write cache entry");
                false
            }
        }
    }

    async fn write_entry(&self, digest: &str, entry: &CacheEntry) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_string_pretty(entry)?;
        tokio::fs::write(self.entry_path(digest), content).await?;
        Ok(())
    }

    /// Remove every cache entry. Returns the number removed.
    pub async fn clear(&self) -> Result<usize> {
        let mut count = 0;

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                tokio::fs::remove_file(&path).await?;
                count += 1;
            }
        }

        info!("Cleared {} cache entries", count);
        Ok(count)
    }

    /// Count entries and their total size
    pub async fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(stats),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json")
                && let Ok(metadata) = entry.metadata().await
            {
                stats.entry_count += 1;
                stats.total_size_bytes += metadata.len();
            }
        }

        Ok(stats)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_size_bytes: u64,
}

fn is_cacheable(response: &str) -> bool {
    !response.trim().is_empty() && response.chars().count() <= MAX_RESPONSE_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key<'a>(prompt: &'a str, system: Option<&'a str>) -> CacheKey<'a> {
        CacheKey {
            provider: "openai",
            model: "gpt-4",
            prompt,
            system_prompt: system,
            temperature: 0.3,
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path());
        let k = key("source", Some("system"));

        assert!(cache.get(&k).await.is_none());
        assert!(cache.set(&k, "{\"routes\": []}").await);
        assert_eq!(cache.get(&k).await.as_deref(), Some("{\"routes\": []}"));
    }

    #[tokio::test]
    async fn test_key_covers_every_input() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path());
        cache.set(&key("p", None), "a").await;

        assert!(cache.get(&key("p", Some("s"))).await.is_none());
        assert!(cache.get(&key("q", None)).await.is_none());

        let mut hotter = key("p", None);
        hotter.temperature = 0.7;
        assert!(cache.get(&hotter).await.is_none());

        let mut other_model = key("p", None);
        other_model.model = "gpt-3.5-turbo";
        assert!(cache.get(&other_model).await.is_none());
    }

    #[tokio::test]
    async fn test_rejects_empty_and_oversized() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path());

        assert!(!cache.set(&key("empty", None), "   \n").await);
        assert!(cache.get(&key("empty", None)).await.is_none());

        let huge = "x".repeat(MAX_RESPONSE_CHARS + 1);
        assert!(!cache.set(&key("huge", None), &huge).await);
        assert!(cache.get(&key("huge", None)).await.is_none());

        let at_limit = "x".repeat(MAX_RESPONSE_CHARS);
        assert!(cache.set(&key("limit", None), &at_limit).await);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path());
        let k = key("p", None);
        std::fs::write(dir.path().join(format!("{}.json", k.digest())), "{not json").unwrap();

        assert!(cache.get(&k).await.is_none());
    }

    #[tokio::test]
    async fn test_entry_layout() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path());
        let k = key("prompt", None);
        cache.set(&k, "resp").await;

        let raw = std::fs::read_to_string(dir.path().join(format!("{}.json", k.digest()))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["provider"], "openai");
        assert_eq!(value["model"], "gpt-4");
        assert_eq!(value["prompt"], "prompt");
        assert!(value["system_prompt"].is_null());
        assert_eq!(value["response"], "resp");
    }

    #[tokio::test]
    async fn test_clear_and_stats() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path().join("nested"));

        assert_eq!(cache.stats().await.unwrap().entry_count, 0);
        assert_eq!(cache.clear().await.unwrap(), 0);

        cache.set(&key("a", None), "1").await;
        cache.set(&key("b", None), "2").await;
        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entry_count, 2);
        assert!(stats.total_size_bytes > 0);

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert!(cache.get(&key("a", None)).await.is_none());
    }

    #[test]
    fn test_digest_is_stable_hex() {
        let d = key("p", None).digest();
        assert_eq!(d.len(), 64);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(d, key("p", None).digest());
    }
}
