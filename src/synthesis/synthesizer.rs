//! LLM Documentation Synthesizer
//!
//! ground truth → analysis prompt → backend (cache, rate limiter, retry)
//! → payload parsing → verification.

use tracing::{error, info};

use super::payload::parse_documentation;
use super::prompt::ANALYSIS_SYSTEM_PROMPT;
use crate::ai::GenerationClient;
use crate::analyzer::{GroundTruth, StaticRouteExtractor};
use crate::constants::synthesis::ANALYSIS_TEMPERATURE;
use crate::types::{ApiDocumentation, Result};
use crate::verifier::{RouteVerifier, SkippedRoute};

/// Verified documentation for one source unit, plus diagnostics
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub documentation: ApiDocumentation,
    pub ground_truth: GroundTruth,
    pub skipped: Vec<SkippedRoute>,
}

pub struct LlmDocumentationSynthesizer {
    client: GenerationClient,
    verifier: RouteVerifier,
    extractor: StaticRouteExtractor,
}

impl LlmDocumentationSynthesizer {
    pub fn new(client: GenerationClient, verifier: RouteVerifier) -> Self {
        Self {
            client,
            verifier,
            extractor: StaticRouteExtractor::new(),
        }
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    pub fn verifier(&self) -> &RouteVerifier {
        &self.verifier
    }

    /// Synthesize verified documentation.
    ///
    /// Returns `None` when the backend call or payload parsing failed, which
    /// is distinct from documentation with zero routes.
    pub async fn synthesize(&self, label: &str, source: &str) -> Option<ApiDocumentation> {
        match self.try_synthesize(label, source).await {
            Ok(synthesis) => Some(synthesis.documentation),
            Err(e) => {
                error!(file = %label, error = %e, "LLM analysis failed");
                None
            }
        }
    }

    pub async fn try_synthesize(&self, label: &str, source: &str) -> Result<Synthesis> {
        let ground_truth = self.extractor.extract_or_empty(label, source);

        // Parsed before caching: a malformed reply must not outlive this call
        let mut documentation = self
            .client
            .generate_validated(
                source,
                Some(ANALYSIS_SYSTEM_PROMPT),
                ANALYSIS_TEMPERATURE,
                parse_documentation,
            )
            .await?;
        let proposed = std::mem::take(&mut documentation.routes);
        let outcome = self.verifier.verify(proposed, &ground_truth);

        for skipped in &outcome.skipped {
            info!(file = %label, path = %skipped.path, reason = %skipped.reason, "Route skipped");
        }

        documentation.routes = outcome.accepted;
        Ok(Synthesis {
            documentation,
            ground_truth,
            skipped: outcome.skipped,
        })
    }
}
