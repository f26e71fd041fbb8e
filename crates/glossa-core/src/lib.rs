use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config_file;
pub mod model;
pub mod pool;

// Re-export for convenience
pub use model::{EntitySpan, LanguageModel, PosTag, TaggedToken};
pub use pool::{DocumentExtractor, DocumentJob, ExtractionPool, ProgressEvent};

/// Languages the pipeline ships lexicons and patterns for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    De,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::De];

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "eng" | "english" => Ok(Language::En),
            "de" | "deu" | "ger" | "german" | "deutsch" => Ok(Language::De),
            other => Err(ExtractError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// A document handed over by the PDF-to-text collaborator.
///
/// Pages are kept in reading order. The pipeline only ever borrows a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub source_id: String,
    pub language: Language,
    pub pages: Vec<String>,
}

impl Document {
    pub fn new(source_id: impl Into<String>, language: Language, pages: Vec<String>) -> Self {
        Self {
            source_id: source_id.into(),
            language,
            pages,
        }
    }

    /// True when there are no pages or every page is whitespace.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// Half-open byte range into the normalized document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn shifted(&self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

/// One place a term was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    pub span: Span,
    /// 1-based page number; 0 while the candidate is still page-local.
    pub page: usize,
}

/// Which generation strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Nlp,
    Pattern,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Nlp => f.write_str("nlp"),
            Provenance::Pattern => f.write_str("pattern"),
        }
    }
}

/// A proposed term with every occurrence found so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTerm {
    pub text: String,
    pub occurrences: Vec<Occurrence>,
    pub provenance: Provenance,
}

impl CandidateTerm {
    /// A candidate for a single occurrence, as emitted by a generator.
    pub fn single(text: impl Into<String>, span: Span, provenance: Provenance) -> Self {
        Self {
            text: text.into(),
            occurrences: vec![Occurrence { span, page: 0 }],
            provenance,
        }
    }

    pub fn count(&self) -> usize {
        self.occurrences.len()
    }

    /// Distinct pages, in order of first appearance.
    pub fn pages(&self) -> Vec<usize> {
        let mut pages = Vec::new();
        for occ in &self.occurrences {
            if !pages.contains(&occ.page) {
                pages.push(occ.page);
            }
        }
        pages
    }

    pub fn first_offset(&self) -> usize {
        self.occurrences
            .iter()
            .map(|o| o.span.start)
            .min()
            .unwrap_or(usize::MAX)
    }
}

/// Why the validator rejected a candidate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionReason {
    StopWord,
    TooShort,
    TooLong,
    SymbolHeavy,
    Numeric,
    Fragment,
    UnknownAcronym,
    IncompletePhrase,
    OcrArtifact,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StopWord => "stop-word",
            Self::TooShort => "too-short",
            Self::TooLong => "too-long",
            Self::SymbolHeavy => "symbol-heavy",
            Self::Numeric => "numeric",
            Self::Fragment => "fragment",
            Self::UnknownAcronym => "unknown-acronym",
            Self::IncompletePhrase => "incomplete-phrase",
            Self::OcrArtifact => "ocr-artifact",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running a candidate through the validator chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub passed: bool,
    pub reason: Option<RejectionReason>,
    /// Name of the rule that produced a failing verdict.
    pub rule: Option<String>,
    pub detail: Option<String>,
    /// Distance from the nearest rejection threshold, in [0, 1]. Zero when failed.
    pub margin: f64,
}

impl ValidationVerdict {
    pub fn pass(margin: f64) -> Self {
        Self {
            passed: true,
            reason: None,
            rule: None,
            detail: None,
            margin: margin.clamp(0.0, 1.0),
        }
    }

    pub fn fail(reason: RejectionReason, rule: &str, detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason),
            rule: Some(rule.to_string()),
            detail: Some(detail.into()),
            margin: 0.0,
        }
    }
}

/// Text surrounding one occurrence of a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    pub text: String,
    pub page: usize,
    /// Where the window sits in the document text.
    pub span: Span,
    /// The occurrence the window was built around.
    pub term_span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    /// Matched a definitional clause such as "X is defined as ...".
    Structured,
    /// Best-effort excerpt of the surrounding sentences.
    Contextual,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionKind::Structured => f.write_str("structured"),
            DefinitionKind::Contextual => f.write_str("contextual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionCandidate {
    pub text: String,
    pub quality: f64,
    pub kind: DefinitionKind,
    /// Name of the definitional pattern that matched, for structured candidates.
    pub pattern: Option<String>,
    pub windows: Vec<ContextWindow>,
    /// Set when the excerpt recurs verbatim for unrelated terms (headers, footers).
    #[serde(default)]
    pub boilerplate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::High => f.write_str("high"),
            ConfidenceTier::Medium => f.write_str("medium"),
            ConfidenceTier::Low => f.write_str("low"),
        }
    }
}

/// A term that survived validation, ready for the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    pub term: String,
    pub frequency: usize,
    pub provenance: Provenance,
    pub confidence: f64,
    pub tier: ConfidenceTier,
    /// Best definitions first.
    pub definitions: Vec<DefinitionCandidate>,
    pub occurrences: Vec<Occurrence>,
    pub pages: Vec<usize>,
}

impl TermEntry {
    pub fn best_definition(&self) -> Option<&DefinitionCandidate> {
        self.definitions.first()
    }
}

/// Counters describing what happened to the candidates of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub pages: usize,
    pub candidates_generated: usize,
    pub distinct_forms: usize,
    pub below_frequency: usize,
    pub rejected: usize,
    pub rejected_by_reason: BTreeMap<RejectionReason, usize>,
    pub accepted: usize,
    pub without_definition: usize,
}

/// Result of extracting terms from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub source_id: String,
    pub language: Language,
    /// Accepted terms in order of first occurrence.
    pub terms: Vec<TermEntry>,
    pub stats: ExtractionStats,
}

impl ExtractionResult {
    pub fn empty(source_id: impl Into<String>, language: Language) -> Self {
        Self {
            source_id: source_id.into(),
            language,
            terms: Vec::new(),
            stats: ExtractionStats::default(),
        }
    }

    /// Case-insensitive lookup by term text.
    pub fn get(&self, term: &str) -> Option<&TermEntry> {
        let needle = term.to_lowercase();
        self.terms.iter().find(|t| t.term.to_lowercase() == needle)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A candidate that reached the validator and failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCandidate {
    pub candidate: CandidateTerm,
    pub verdict: ValidationVerdict,
}

/// Extraction result plus the candidates that did not make it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub result: ExtractionResult,
    pub rejected: Vec<RejectedCandidate>,
    pub below_frequency: Vec<CandidateTerm>,
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("document {source_id} has no text to extract from")]
    EmptyDocument { source_id: String },
    #[error("unsupported language tag: {0}")]
    UnsupportedLanguage(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("extraction of {source_id} failed: {message}")]
    StageFailure { source_id: String, message: String },
    #[error("extraction of {source_id} timed out after {secs}s")]
    Timeout { source_id: String, secs: u64 },
    #[error("extraction of {source_id} was cancelled")]
    Cancelled { source_id: String },
}
