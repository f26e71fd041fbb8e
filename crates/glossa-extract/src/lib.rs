use thiserror::Error;

pub mod candidates;
pub mod config;
pub mod definitions;
pub mod extractor;
pub mod frequency;
mod lexicon;
pub mod normalize;
pub mod rules;
pub mod scoring;
pub mod tagger;
pub mod validator;

pub use candidates::CandidateGenerator;
pub use config::{
    DefinitionPattern, ListOverride, ModelPolicy, PipelineConfig, PipelineConfigBuilder,
};
pub use extractor::{NormalizedDocument, TermExtractor};
pub use normalize::normalize;
pub use scoring::{ScorerConfig, ScoringWeights};
pub use tagger::{LexiconTagger, ModelRegistry};
pub use validator::{RuleOutcome, TermRule, TermValidator};
// Re-export domain types from core (canonical definitions live there)
pub use glossa_core::{Document, ExtractError, ExtractionResult, Language, TermEntry};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl From<ConfigError> for ExtractError {
    fn from(e: ConfigError) -> Self {
        ExtractError::InvalidConfig(e.to_string())
    }
}

/// Extract a glossary from one document.
///
/// Pipeline:
/// 1. Normalize each page (Unicode, ligatures, OCR doubling, hyphenation)
/// 2. Generate candidates per page, model-backed or pattern-based
/// 3. Merge case variants and drop terms below the frequency threshold
/// 4. Validate each term against the rule chain
/// 5. Extract and rank definitions from context windows
/// 6. Score confidence and assign a tier
pub fn extract(document: &Document, config: &PipelineConfig) -> Result<ExtractionResult, ExtractError> {
    TermExtractor::new(config.clone()).extract(document)
}
