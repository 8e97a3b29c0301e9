//! Route description enhancement.
//!
//! Routes are processed one at a time in declaration order. A route whose
//! backend call keeps failing keeps its previous description.

use tracing::{debug, error, info};

use super::prompt::description_prompt;
use crate::ai::GenerationClient;
use crate::constants::synthesis::{ENHANCEMENT_TEMPERATURE, MIN_DESCRIPTION_CHARS};
use crate::types::ApiDocumentation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnhancementStats {
    pub enhanced: usize,
    pub failed: usize,
}

pub struct DescriptionEnhancer {
    client: GenerationClient,
    min_chars: usize,
}

impl DescriptionEnhancer {
    pub fn new(client: GenerationClient) -> Self {
        Self {
            client,
            min_chars: MIN_DESCRIPTION_CHARS,
        }
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    pub async fn enhance(&self, docs: &mut ApiDocumentation) -> EnhancementStats {
        let mut stats = EnhancementStats::default();

        for route in docs.routes.iter_mut() {
            if !route.needs_description(self.min_chars) {
                continue;
            }

            let prompt = description_prompt(route);
            match self
                .client
                .generate(&prompt, None, ENHANCEMENT_TEMPERATURE)
                .await
            {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(path = %route.path, "Enhanced description");
                    route.description = Some(text.trim().to_string());
                    stats.enhanced += 1;
                }
                Ok(_) => {
                    error!(path = %route.path, "Empty description from backend");
                    stats.failed += 1;
                }
                Err(e) => {
                    error!(path = %route.path, error = %e, "Failed to enhance route");
                    stats.failed += 1;
                }
            }
        }

        info!(
            enhanced = stats.enhanced,
            failed = stats.failed,
            "Description enhancement complete"
        );
        stats
    }
}
