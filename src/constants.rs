//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Synthesis and verification constants
pub mod synthesis {
    /// Confidence assigned to a route when the model omits one
    pub const DEFAULT_CONFIDENCE: f64 = 0.7;

    /// Routes below this score are rejected before existence checking
    pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

    /// Sampling temperature for the structured analysis call
    pub const ANALYSIS_TEMPERATURE: f32 = 0.3;

    /// Sampling temperature for free-text description enhancement
    pub const ENHANCEMENT_TEMPERATURE: f32 = 0.7;

    /// Descriptions shorter than this are enhanced
    pub const MIN_DESCRIPTION_CHARS: usize = 50;

    /// Title used when nothing better is known
    pub const DEFAULT_TITLE: &str = "FastAPI Application";

    /// Version used when nothing better is known
    pub const DEFAULT_VERSION: &str = "1.0.0";
}

/// Backend retry constants
pub mod retry {
    /// Attempts per backend call, including the first
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Base delay; attempt `n` waits `n * base` before the next try (milliseconds)
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
}

/// Rate limiter constants
pub mod rate_limit {
    /// Calls admitted per backend within one window
    pub const DEFAULT_CALLS_PER_MINUTE: usize = 60;

    /// Sliding window length (seconds)
    pub const WINDOW_SECS: u64 = 60;
}

/// Response cache constants
pub mod cache {
    /// Responses longer than this (in characters) are never cached
    pub const MAX_RESPONSE_CHARS: usize = 1_000_000;

    /// Placeholder hashed in place of an absent system prompt
    pub const NO_SYSTEM_PROMPT: &str = "<none>";
}

/// Route recognition constants
pub mod routes {
    /// Receiver names recognized as routing objects
    pub const ROUTER_OBJECTS: &[&str] = &["app", "router", "api_router", "blueprint"];

    /// Attribute names recognized as HTTP verbs
    pub const HTTP_VERBS: &[&str] = &[
        "get", "post", "put", "delete", "patch", "options", "head", "trace",
    ];

    /// Directories never scanned for route files
    pub const SKIP_DIRS: &[&str] = &[
        ".git",
        "__pycache__",
        ".venv",
        "venv",
        "env",
        ".tox",
        ".mypy_cache",
        "node_modules",
        "build",
        "dist",
    ];
}
