//! Cache Command
//!
//! Response cache maintenance. Clearing is the only way entries are removed.

use std::path::PathBuf;

use crate::ai::ResponseCache;
use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::types::{Result, RouteSageError};

fn open_cache() -> Result<ResponseCache> {
    let config = ConfigLoader::load()?;
    let dir: PathBuf = ConfigLoader::cache_dir(&config).ok_or_else(|| {
        RouteSageError::Config("Cannot determine cache directory; set cache.dir".to_string())
    })?;
    Ok(ResponseCache::new(dir))
}

pub async fn clear() -> Result<()> {
    let cache = open_cache()?;
    let output = Output::new();

    let cleared = cache.clear().await?;
    if cleared > 0 {
        output.success(&format!("Cleared {} cached responses", cleared));
    } else {
        output.info("Cache is already empty");
    }
    Ok(())
}

pub async fn stats() -> Result<()> {
    let cache = open_cache()?;
    let output = Output::new();

    let stats = cache.stats().await?;
    output.section("Response cache");
    output.field("Directory", cache.dir().display());
    output.field("Entries", stats.entry_count);
    output.field("Size", format_bytes(stats.total_size_bytes));
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
