//! Documentation synthesis: analysis call, payload parsing, verification,
//! and description enhancement.

pub mod enhancer;
pub mod payload;
pub mod prompt;
pub mod synthesizer;

pub use enhancer::{DescriptionEnhancer, EnhancementStats};
pub use payload::parse_documentation;
pub use synthesizer::{LlmDocumentationSynthesizer, Synthesis};
