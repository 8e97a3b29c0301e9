use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::options::AnalyzeOptions;
use crate::ai::{GenerationClient, ProviderRegistry, RateLimiter, ResponseCache, RetryPolicy};
use crate::analyzer::parser::{AppInfo, extract_app_info, index_route_decorators, parse_python};
use crate::analyzer::scanner::{FileScanner, ScannedFile};
use crate::constants::synthesis::{DEFAULT_TITLE, DEFAULT_VERSION};
use crate::rewriter::SourceRewriter;
use crate::synthesis::{DescriptionEnhancer, LlmDocumentationSynthesizer};
use crate::types::{ApiDocumentation, Result};
use crate::verifier::RouteVerifier;

/// What one scanned file contributed to a directory analysis
struct FileFacts {
    path: PathBuf,
    relative_path: String,
    app_info: Option<AppInfo>,
    documentation: Option<ApiDocumentation>,
}

impl FileFacts {
    fn stem_looks_like_entry(&self) -> bool {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .is_some_and(|stem| stem.contains("main") || stem.contains("app"))
    }
}

pub struct Analyzer {
    synthesizer: LlmDocumentationSynthesizer,
    enhancer: Option<DescriptionEnhancer>,
    rewriter: SourceRewriter,
    write_back: bool,
    entry_point: Option<PathBuf>,
}

impl Analyzer {
    /// Analyzer without enhancement that writes rewritten sources back
    pub fn new(client: GenerationClient, verifier: RouteVerifier) -> Self {
        Self {
            synthesizer: LlmDocumentationSynthesizer::new(client, verifier),
            enhancer: None,
            rewriter: SourceRewriter::new(),
            write_back: true,
            entry_point: None,
        }
    }

    /// Build the backend named in `options` and wrap it with cache, rate
    /// limiter and retry policy
    pub fn from_options(options: &AnalyzeOptions, registry: &ProviderRegistry) -> Result<Self> {
        let backend = registry.create(&options.backend)?;
        info!(
            provider = %backend.name(),
            model = %backend.model(),
            "Using generation backend"
        );

        let mut client = GenerationClient::new(backend)
            .with_retry(RetryPolicy::new(options.max_retries, options.retry_delay))
            .with_rate_limiter(Arc::new(RateLimiter::new(options.calls_per_minute)))
            .with_max_tokens(options.max_tokens);
        if let Some(dir) = &options.cache_dir {
            client = client.with_cache(Arc::new(ResponseCache::new(dir)));
        }

        let verifier = RouteVerifier::new(options.strict_verification)
            .with_min_confidence(options.min_confidence);

        let mut analyzer = Self::new(client, verifier).with_write_back(options.write_back);
        if options.enhance_descriptions {
            analyzer = analyzer.with_enhancement(options.min_description_chars);
        }
        if let Some(entry) = &options.entry_point {
            analyzer = analyzer.with_entry_point(entry);
        }
        Ok(analyzer)
    }

    /// Enhance descriptions shorter than `min_chars` after synthesis
    pub fn with_enhancement(mut self, min_chars: usize) -> Self {
        let client = self.synthesizer.client().clone();
        self.enhancer = Some(DescriptionEnhancer::new(client).with_min_chars(min_chars));
        self
    }

    pub fn with_write_back(mut self, write_back: bool) -> Self {
        self.write_back = write_back;
        self
    }

    /// File (relative to the analyzed directory) that titles the aggregate
    pub fn with_entry_point(mut self, entry: impl Into<PathBuf>) -> Self {
        self.entry_point = Some(entry.into());
        self
    }

    /// Analyze a single file or every Python file below a directory
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn analyze(&self, path: &Path) -> Result<ApiDocumentation> {
        let metadata = tokio::fs::metadata(path).await?;
        let mut docs = if metadata.is_dir() {
            self.analyze_directory(path).await?
        } else {
            self.analyze_file(path).await?
        };

        if let Some(enhancer) = &self.enhancer
            && !docs.routes.is_empty()
        {
            enhancer.enhance(&mut docs).await;
        }

        info!(
            routes = docs.routes.len(),
            verified = docs.verified_count(),
            unverified = docs.unverified_count(),
            "Analysis complete"
        );
        Ok(docs)
    }

    async fn analyze_file(&self, path: &Path) -> Result<ApiDocumentation> {
        let label = path.display().to_string();
        let source = tokio::fs::read_to_string(path).await?;

        let Some(docs) = self.synthesizer.synthesize(&label, &source).await else {
            warn!(file = %label, "No usable documentation produced");
            return Ok(ApiDocumentation::failed());
        };

        if !docs.routes.is_empty() {
            self.write_rewritten(path, &label, &source, &docs).await?;
        } else {
            warn!(file = %label, "No routes documented");
        }
        Ok(docs)
    }

    async fn analyze_directory(&self, dir: &Path) -> Result<ApiDocumentation> {
        let files = FileScanner::new(dir).scan()?;
        info!(files = files.len(), "Scanning directory for routes");

        let mut facts = Vec::with_capacity(files.len());
        for file in &files {
            match self.analyze_scanned(file).await {
                Ok(Some(f)) => facts.push(f),
                Ok(None) => {}
                Err(e) => warn!(file = %file.relative_path, error = %e, "Skipping file"),
            }
        }

        let mut aggregate = ApiDocumentation::new(DEFAULT_TITLE);
        for fact in &facts {
            let Some(docs) = &fact.documentation else {
                continue;
            };
            for route in &docs.routes {
                let mut route = route.clone();
                route.source_file = Some(fact.relative_path.clone());
                aggregate.routes.push(route);
            }
            for (tag, description) in &docs.tags {
                aggregate
                    .tags
                    .entry(tag.clone())
                    .or_insert_with(|| description.clone());
            }
        }

        match self.select_entry_point(dir, &facts) {
            Some(entry) => {
                debug!(entry = %entry.relative_path, "Selected entry point");
                apply_entry_metadata(&mut aggregate, entry);
            }
            None => debug!("No entry point found; using default metadata"),
        }

        Ok(aggregate)
    }

    /// Facts for one file, `None` when it cannot be parsed
    async fn analyze_scanned(&self, file: &ScannedFile) -> Result<Option<FileFacts>> {
        let label = file.relative_path.as_str();
        let source = tokio::fs::read_to_string(&file.path).await?;

        let tree = match parse_python(label, &source) {
            Ok(tree) => tree,
            Err(e) => {
                warn!(file = %label, error = %e, "Unparseable file skipped");
                return Ok(None);
            }
        };
        let has_routes = !index_route_decorators(&tree, &source).is_empty();
        let app_info = extract_app_info(&tree, &source);

        // Strict mode could only reject every route of such a file
        let worth_asking = has_routes || !self.synthesizer.verifier().is_strict();

        let documentation = if worth_asking {
            let docs = self.synthesizer.synthesize(label, &source).await;
            if let Some(docs) = &docs
                && !docs.routes.is_empty()
            {
                self.write_rewritten(&file.path, label, &source, docs).await?;
            }
            docs
        } else {
            debug!(file = %label, "No declared routes in strict mode; skipping synthesis");
            None
        };

        Ok(Some(FileFacts {
            path: file.path.clone(),
            relative_path: file.relative_path.clone(),
            app_info,
            documentation,
        }))
    }

    async fn write_rewritten(
        &self,
        path: &Path,
        label: &str,
        source: &str,
        docs: &ApiDocumentation,
    ) -> Result<()> {
        if !self.write_back {
            return Ok(());
        }
        let updated = self.rewriter.rewrite(label, source, docs);
        if updated != source {
            tokio::fs::write(path, updated).await?;
            info!(file = %label, "Source updated with documentation");
        }
        Ok(())
    }

    /// Explicit designation, else the first `FastAPI(...)` file, else the
    /// first file whose stem mentions main or app
    fn select_entry_point<'a>(&self, dir: &Path, facts: &'a [FileFacts]) -> Option<&'a FileFacts> {
        if let Some(entry) = &self.entry_point {
            let joined = dir.join(entry);
            let found = facts.iter().find(|f| {
                f.path == *entry || f.path == joined || Path::new(&f.relative_path) == entry
            });
            if found.is_some() {
                return found;
            }
            warn!(entry = %entry.display(), "Designated entry point not found; guessing");
        }

        facts
            .iter()
            .find(|f| f.app_info.is_some())
            .or_else(|| facts.iter().find(|f| f.stem_looks_like_entry()))
    }
}

fn apply_entry_metadata(aggregate: &mut ApiDocumentation, entry: &FileFacts) {
    if let Some(docs) = &entry.documentation {
        aggregate.title = docs.title.clone();
        aggregate.description = docs.description.clone();
        aggregate.version = docs.version.clone();
    } else if let Some(info) = &entry.app_info {
        aggregate.title = info.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string());
        aggregate.description = info.description.clone();
        aggregate.version = info
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::testing::ScriptedBackend;
    use std::time::Duration;
    use tempfile::TempDir;

    const USERS_SOURCE: &str = r#"from fastapi import FastAPI

app = FastAPI()


@app.get("/users")
def list_users():
    return []
"#;

    const USERS_PAYLOAD: &str = r#"{
        "title": "Users API",
        "version": "1.0.0",
        "routes": [
            {"path": "/users", "methods": ["GET"], "description": "List users", "tags": ["users"], "confidence_score": 0.9},
            {"path": "/admin", "methods": ["GET"], "description": "Admin panel", "confidence_score": 0.95}
        ]
    }"#;

    fn analyzer(backend: Arc<ScriptedBackend>) -> Analyzer {
        let client = GenerationClient::new(backend)
            .with_retry(RetryPolicy::new(2, Duration::from_millis(1)));
        Analyzer::new(client, RouteVerifier::new(true))
    }

    fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_single_file_strict_and_written_back() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "main.py", USERS_SOURCE);
        let backend = Arc::new(ScriptedBackend::ok([USERS_PAYLOAD]));

        let docs = analyzer(backend.clone()).analyze(&file).await.unwrap();

        assert_eq!(docs.title, "Users API");
        assert_eq!(docs.routes.len(), 1);
        assert_eq!(docs.routes[0].path, "/users");
        assert!(docs.routes[0].verified);
        assert!(docs.routes[0].source_file.is_none());

        let updated = std::fs::read_to_string(&file).unwrap();
        assert!(updated.contains(r#"@app.get("/users", description="List users", tags=["users"])"#));
        assert!(updated.contains("def list_users():\n    return []\n"));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_single_file_without_write_back() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "main.py", USERS_SOURCE);
        let backend = Arc::new(ScriptedBackend::ok([USERS_PAYLOAD]));

        analyzer(backend).with_write_back(false).analyze(&file).await.unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), USERS_SOURCE);
    }

    #[tokio::test]
    async fn test_single_file_malformed_payload_yields_placeholder() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "main.py", USERS_SOURCE);
        let backend = Arc::new(ScriptedBackend::ok(["I could not find any routes, sorry."]));

        let docs = analyzer(backend.clone()).analyze(&file).await.unwrap();

        assert_eq!(docs, ApiDocumentation::failed());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), USERS_SOURCE);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_path_is_io_error() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(ScriptedBackend::ok(Vec::<String>::new()));
        let err = analyzer(backend)
            .analyze(&dir.path().join("nope.py"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::types::RouteSageError::Io(_)));
    }

    #[tokio::test]
    async fn test_directory_aggregation() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "main.py",
            "from fastapi import FastAPI\n\napp = FastAPI(title=\"Shop\", version=\"2.0.0\")\n",
        );
        let items = write(
            dir.path(),
            "routers/items.py",
            "from fastapi import APIRouter\n\nrouter = APIRouter()\n\n\n@router.get(\"/items\")\ndef list_items():\n    return []\n",
        );
        write(dir.path(), "utils.py", "def helper():\n    return 1\n");
        write(dir.path(), "broken.py", "def f(:\n");

        let payload = r#"{
            "title": "Items API",
            "version": "0.1.0",
            "routes": [{"path": "/items", "methods": ["GET"], "description": "List items", "tags": ["items"]}],
            "tags": {"items": "Item operations"}
        }"#;
        let backend = Arc::new(ScriptedBackend::ok([payload]));

        let docs = analyzer(backend.clone()).analyze(dir.path()).await.unwrap();

        // Only the file with declared routes reaches the backend
        assert_eq!(backend.call_count(), 1);
        assert_eq!(docs.title, "Shop");
        assert_eq!(docs.version, "2.0.0");
        assert_eq!(docs.routes.len(), 1);
        assert_eq!(docs.routes[0].source_file.as_deref(), Some("routers/items.py"));
        assert_eq!(docs.tags.get("items").map(String::as_str), Some("Item operations"));

        let updated = std::fs::read_to_string(items).unwrap();
        assert!(updated.contains(r#"@router.get("/items", description="List items", tags=["items"])"#));
    }

    #[tokio::test]
    async fn test_directory_keeps_same_path_from_each_file() {
        let dir = TempDir::new().unwrap();
        let source = "@router.get(\"/health\")\ndef health():\n    return {}\n";
        write(dir.path(), "a.py", source);
        write(dir.path(), "b.py", source);

        let payload = r#"{"title": "T", "version": "1", "routes": [
            {"path": "/health", "methods": ["GET"], "confidence_score": 0.8}
        ], "tags": {"ops": "first"}}"#;
        let payload_b = r#"{"title": "T", "version": "1", "routes": [
            {"path": "/health", "methods": ["GET"], "confidence_score": 0.6}
        ], "tags": {"ops": "second"}}"#;
        let backend = Arc::new(ScriptedBackend::ok([payload, payload_b]));

        let docs = analyzer(backend)
            .with_write_back(false)
            .analyze(dir.path())
            .await
            .unwrap();

        let sources: Vec<_> = docs
            .routes
            .iter()
            .map(|r| (r.source_file.as_deref().unwrap(), r.confidence_score))
            .collect();
        assert_eq!(sources, vec![("a.py", 0.8), ("b.py", 0.6)]);
        assert_eq!(docs.tags["ops"], "first");
        assert_eq!(docs.title, DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_directory_backend_failure_is_local() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.py", "@app.get(\"/a\")\ndef a():\n    pass\n");
        write(dir.path(), "b.py", "@app.get(\"/b\")\ndef b():\n    pass\n");

        let payload_b = r#"{"title": "B", "version": "1", "routes": [
            {"path": "/b", "methods": ["GET"]}
        ]}"#;
        // a.py: malformed reply; b.py: usable reply
        let backend = Arc::new(ScriptedBackend::ok(["not json", payload_b]));

        let docs = analyzer(backend)
            .with_write_back(false)
            .analyze(dir.path())
            .await
            .unwrap();

        assert_eq!(docs.routes.len(), 1);
        assert_eq!(docs.routes[0].path, "/b");
    }

    #[tokio::test]
    async fn test_explicit_entry_point_wins() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.py", "from fastapi import FastAPI\napp = FastAPI(title=\"First\")\n");
        write(
            dir.path(),
            "service/server.py",
            "import fastapi\napi = fastapi.FastAPI(title=\"Second\", description=\"Chosen\")\n",
        );
        let backend = Arc::new(ScriptedBackend::ok(Vec::<String>::new()));

        let guessed = analyzer(backend.clone()).analyze(dir.path()).await.unwrap();
        assert_eq!(guessed.title, "First");

        let chosen = analyzer(backend.clone())
            .with_entry_point("service/server.py")
            .analyze(dir.path())
            .await
            .unwrap();
        assert_eq!(chosen.title, "Second");
        assert_eq!(chosen.description.as_deref(), Some("Chosen"));
        assert_eq!(chosen.version, DEFAULT_VERSION);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_enhancement_after_synthesis() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "main.py", USERS_SOURCE);
        let long = "Returns every registered user with their profile fields and account status.";
        let backend = Arc::new(ScriptedBackend::ok([USERS_PAYLOAD, long]));

        let docs = analyzer(backend.clone())
            .with_write_back(false)
            .with_enhancement(50)
            .analyze(&file)
            .await
            .unwrap();

        assert_eq!(docs.routes[0].description.as_deref(), Some(long));
        assert_eq!(backend.call_count(), 2);
        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[1].0.contains("Path: /users"));
        assert!(prompts[1].1.is_none());
    }

    #[tokio::test]
    async fn test_lenient_directory_keeps_dynamic_routes() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "routes.py",
            "PREFIX = \"/v1\"\n\n\n@app.get(PREFIX + \"/x\")\ndef x():\n    pass\n",
        );
        let payload = r#"{"title": "T", "version": "1", "routes": [
            {"path": "/v1/x", "methods": ["GET"], "confidence_score": 0.9}
        ]}"#;

        let strict_backend = Arc::new(ScriptedBackend::ok([payload]));
        let strict = analyzer(strict_backend.clone())
            .with_write_back(false)
            .analyze(dir.path())
            .await
            .unwrap();
        assert!(strict.routes.is_empty());
        assert_eq!(strict_backend.call_count(), 0);

        let lenient_backend = Arc::new(ScriptedBackend::ok([payload]));
        let client = GenerationClient::new(lenient_backend.clone())
            .with_retry(RetryPolicy::new(2, Duration::from_millis(1)));
        let lenient = Analyzer::new(client, RouteVerifier::new(false))
            .with_write_back(false)
            .analyze(dir.path())
            .await
            .unwrap();

        assert_eq!(lenient_backend.call_count(), 1);
        assert_eq!(lenient.routes.len(), 1);
        let route = &lenient.routes[0];
        assert_eq!(route.path, "/v1/x");
        assert!(!route.verified);
        assert_eq!(route.confidence_score, 0.45);
        assert_eq!(route.source_file.as_deref(), Some("routes.py"));
    }

    #[tokio::test]
    async fn test_cached_malformed_reply_does_not_stick() {
        let dir = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let file = write(dir.path(), "main.py", USERS_SOURCE);
        let backend = Arc::new(ScriptedBackend::ok(["not json at all", USERS_PAYLOAD]));
        let client = GenerationClient::new(backend.clone())
            .with_cache(Arc::new(ResponseCache::new(cache_dir.path())));
        let analyzer = Analyzer::new(client, RouteVerifier::new(true)).with_write_back(false);

        let first = analyzer.analyze(&file).await.unwrap();
        assert!(first.routes.is_empty());

        let second = analyzer.analyze(&file).await.unwrap();
        assert_eq!(second.routes.len(), 1);
        assert_eq!(backend.call_count(), 2);
    }
}
