use glossa_core::{
    CandidateTerm, DefinitionCandidate, Document, DocumentExtractor, ExtractError,
    ExtractionReport, ExtractionResult, ExtractionStats, Language, Occurrence, RejectedCandidate,
    Span, TermEntry, ValidationVerdict,
};

use crate::candidates::CandidateGenerator;
use crate::config::PipelineConfig;
use crate::tagger::ModelRegistry;
use crate::validator::TermValidator;
use crate::{definitions, frequency, normalize, scoring};

/// Normalized page texts joined into one document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    /// Pages joined with `\n`.
    pub text: String,
    /// Where each page sits in `text`, in page order.
    pub pages: Vec<Span>,
}

impl NormalizedDocument {
    /// 1-based page number containing `offset`.
    pub fn page_of(&self, offset: usize) -> usize {
        self.pages
            .partition_point(|p| p.start <= offset)
            .max(1)
    }

    pub fn page_text(&self, index: usize) -> &str {
        self.pages
            .get(index)
            .and_then(|p| self.text.get(p.start..p.end))
            .unwrap_or("")
    }
}

/// A configurable term extraction pipeline.
///
/// Holds a [`PipelineConfig`] and exposes each pipeline step as a method.
/// The candidate generation strategy for each language is chosen once here;
/// use [`TermExtractor::with_registry`] to supply other linguistic models.
pub struct TermExtractor {
    config: PipelineConfig,
    english: CandidateGenerator,
    german: CandidateGenerator,
    validator: TermValidator,
}

impl Default for TermExtractor {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl TermExtractor {
    /// Create an extractor backed by the global model registry.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_registry(config, ModelRegistry::global())
    }

    pub fn with_registry(config: PipelineConfig, registry: &ModelRegistry) -> Self {
        let english = CandidateGenerator::select(Language::En, &config, registry);
        let german = CandidateGenerator::select(Language::De, &config, registry);
        Self {
            config,
            english,
            german,
            validator: TermValidator::with_defaults(),
        }
    }

    /// Replace the validation rule chain.
    pub fn with_validator(mut self, validator: TermValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn generator(&self, language: Language) -> &CandidateGenerator {
        match language {
            Language::En => &self.english,
            Language::De => &self.german,
        }
    }

    /// Normalize every page and join them (step 1).
    pub fn normalize_pages(&self, document: &Document) -> NormalizedDocument {
        let mut text = String::new();
        let mut pages = Vec::with_capacity(document.pages.len());
        for (i, page) in document.pages.iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            let normalized = normalize::normalize_with_config(page, self.config.normalizer());
            let start = text.len();
            text.push_str(&normalized);
            pages.push(Span::new(start, text.len()));
        }
        NormalizedDocument { text, pages }
    }

    /// Generate per-occurrence candidates for every page (step 2). Spans are
    /// shifted into document coordinates and tagged with their page.
    pub fn generate(&self, document: &NormalizedDocument, language: Language) -> Vec<CandidateTerm> {
        let generator = self.generator(language);
        let mut candidates = Vec::new();
        for (i, page) in document.pages.iter().enumerate() {
            for mut candidate in generator.generate(document.page_text(i)) {
                for occ in &mut candidate.occurrences {
                    *occ = Occurrence {
                        span: occ.span.shifted(page.start),
                        page: i + 1,
                    };
                }
                candidates.push(candidate);
            }
        }
        candidates
    }

    /// Merge candidates and apply the frequency threshold (step 3). Returns
    /// `(kept, below_threshold)`.
    pub fn aggregate(&self, candidates: Vec<CandidateTerm>) -> (Vec<CandidateTerm>, Vec<CandidateTerm>) {
        frequency::aggregate_with_rejects(candidates, self.config.min_frequency())
    }

    /// Run the validation rule chain on one term (step 4).
    pub fn validate(&self, term: &str, language: Language) -> ValidationVerdict {
        self.validator
            .validate(term, self.config.validation(language))
    }

    /// Extract definition candidates around a term's occurrences (step 5).
    pub fn definitions(
        &self,
        term: &CandidateTerm,
        document_text: &str,
        language: Language,
    ) -> Vec<DefinitionCandidate> {
        definitions::extract_at(
            &term.text,
            document_text,
            &term.occurrences,
            self.config.definitions(language),
        )
    }

    /// Confidence for an accepted term (step 6).
    pub fn score(
        &self,
        term: &CandidateTerm,
        verdict: &ValidationVerdict,
        definitions: &[DefinitionCandidate],
    ) -> f64 {
        scoring::score(term, verdict, definitions, self.config.scorer())
    }

    /// Run the full pipeline on a document.
    pub fn extract(&self, document: &Document) -> Result<ExtractionResult, ExtractError> {
        self.extract_with_diagnostics(document).map(|report| report.result)
    }

    /// Run the full pipeline, also returning the candidates that were
    /// rejected or fell below the frequency threshold.
    pub fn extract_with_diagnostics(
        &self,
        document: &Document,
    ) -> Result<ExtractionReport, ExtractError> {
        if document.is_blank() {
            return Err(ExtractError::EmptyDocument {
                source_id: document.source_id.clone(),
            });
        }
        let language = document.language;
        let source_id = document.source_id.as_str();

        let normalized = self.normalize_pages(document);

        let mut stats = ExtractionStats {
            pages: document.pages.len(),
            ..Default::default()
        };

        let candidates = self.generate(&normalized, language);
        stats.candidates_generated = candidates.len();
        tracing::debug!(
            source_id,
            stage = "generate",
            generator = self.generator(language).name(),
            candidates = candidates.len(),
            "generated candidates"
        );

        let (kept, below) = self.aggregate(candidates);
        stats.distinct_forms = kept.len() + below.len();
        stats.below_frequency = below.len();

        let mut accepted: Vec<(CandidateTerm, ValidationVerdict)> = Vec::new();
        let mut rejected: Vec<RejectedCandidate> = Vec::new();
        for candidate in kept {
            let verdict = self.validate(&candidate.text, language);
            if verdict.passed {
                accepted.push((candidate, verdict));
            } else {
                if let Some(reason) = verdict.reason {
                    *stats.rejected_by_reason.entry(reason).or_insert(0) += 1;
                }
                rejected.push(RejectedCandidate { candidate, verdict });
            }
        }
        stats.rejected = rejected.len();
        stats.accepted = accepted.len();
        tracing::debug!(
            source_id,
            stage = "validate",
            accepted = accepted.len(),
            rejected = rejected.len(),
            "validated terms"
        );

        let mut per_term: Vec<Vec<DefinitionCandidate>> = accepted
            .iter()
            .map(|(candidate, _)| self.definitions(candidate, &normalized.text, language))
            .collect();
        definitions::mark_boilerplate(&mut per_term, self.config.definitions(language));

        let scorer = self.config.scorer();
        let mut terms = Vec::with_capacity(accepted.len());
        for ((candidate, verdict), defs) in accepted.into_iter().zip(per_term) {
            let ranked = scoring::rank_definitions(defs, scorer.max_definitions);
            let confidence = self.score(&candidate, &verdict, &ranked);
            let tier = scoring::tier(confidence, !ranked.is_empty(), scorer);
            if ranked.is_empty() {
                stats.without_definition += 1;
            }
            terms.push(TermEntry {
                pages: candidate.pages(),
                frequency: candidate.count(),
                term: candidate.text,
                provenance: candidate.provenance,
                confidence,
                tier,
                definitions: ranked,
                occurrences: candidate.occurrences,
            });
        }

        tracing::info!(
            source_id,
            language = %language,
            terms = terms.len(),
            rejected = stats.rejected,
            below_frequency = stats.below_frequency,
            "extracted terms"
        );

        Ok(ExtractionReport {
            result: ExtractionResult {
                source_id: document.source_id.clone(),
                language,
                terms,
                stats,
            },
            rejected,
            below_frequency: below,
        })
    }
}

impl DocumentExtractor for TermExtractor {
    fn extract(&self, document: &Document) -> Result<ExtractionResult, ExtractError> {
        TermExtractor::extract(self, document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfigBuilder;
    use glossa_core::{ConfidenceTier, RejectionReason};

    fn doc(pages: &[&str]) -> Document {
        Document::new(
            "test.pdf",
            Language::En,
            pages.iter().map(|p| p.to_string()).collect(),
        )
    }

    #[test]
    fn test_normalize_pages_tracks_offsets() {
        let ex = TermExtractor::default();
        let normalized = ex.normalize_pages(&doc(&["  First page. ", "TThhee second"]));
        assert_eq!(normalized.text, "First page.\nThe second");
        assert_eq!(normalized.page_text(0), "First page.");
        assert_eq!(normalized.page_text(1), "The second");
        assert_eq!(normalized.page_of(0), 1);
        assert_eq!(normalized.page_of(12), 2);
    }

    #[test]
    fn test_generate_shifts_spans_into_document() {
        let ex = TermExtractor::default();
        let normalized = ex.normalize_pages(&doc(&["Pump housing.", "The pump housing leaks."]));
        for c in ex.generate(&normalized, Language::En) {
            let occ = c.occurrences[0];
            assert_eq!(&normalized.text[occ.span.start..occ.span.end], c.text);
            assert_eq!(normalized.page_of(occ.span.start), occ.page);
        }
    }

    #[test]
    fn test_blank_document_is_an_error() {
        let ex = TermExtractor::default();
        let err = ex.extract(&doc(&[" ", "\n"])).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyDocument { ref source_id } if source_id == "test.pdf"));
        assert!(ex.extract(&doc(&[])).is_err());
    }

    #[test]
    fn test_no_terms_is_ok() {
        let result = TermExtractor::default()
            .extract(&doc(&["It is what it is."]))
            .unwrap();
        assert!(result.terms.iter().all(|t| t.term.to_lowercase() != "it"));
        assert_eq!(result.stats.pages, 1);
    }

    #[test]
    fn test_stats_add_up() {
        let ex = TermExtractor::new(PipelineConfigBuilder::new().min_frequency(1).build().unwrap());
        let report = ex
            .extract_with_diagnostics(&doc(&[
                "The centrifuge uses XYZ settings. The centrifuge is a machine that spins samples.",
            ]))
            .unwrap();
        let stats = &report.result.stats;
        assert_eq!(stats.distinct_forms, stats.below_frequency + stats.rejected + stats.accepted);
        assert_eq!(stats.rejected, report.rejected.len());
        assert_eq!(stats.accepted, report.result.terms.len());
        assert_eq!(
            stats.rejected_by_reason.values().sum::<usize>(),
            stats.rejected
        );
        assert!(
            report
                .rejected
                .iter()
                .any(|r| r.verdict.reason == Some(RejectionReason::UnknownAcronym))
        );
    }

    #[test]
    fn test_terms_without_definitions_sit_at_floor() {
        let config = PipelineConfigBuilder::new()
            .max_occurrences(0)
            .build()
            .unwrap();
        let result = TermExtractor::new(config)
            .extract(&doc(&["Centrifuge", "Centrifuge"]))
            .unwrap();
        let entry = result.get("Centrifuge").unwrap();
        assert!(entry.definitions.is_empty());
        assert_eq!(entry.confidence, 0.1);
        assert_eq!(entry.tier, ConfidenceTier::Low);
        assert_eq!(result.stats.without_definition, 1);
    }

    #[test]
    fn test_custom_validator_chain() {
        let document = doc(&["Check the XYZ.", "Replace the XYZ."]);
        assert!(TermExtractor::default().extract(&document).unwrap().get("XYZ").is_none());

        let ex = TermExtractor::default().with_validator(TermValidator::new());
        let result = ex.extract(&document).unwrap();
        assert_eq!(result.get("XYZ").unwrap().frequency, 2);
    }

    #[test]
    fn test_pattern_only_sets_provenance() {
        let ex = TermExtractor::new(PipelineConfigBuilder::new().pattern_only().build().unwrap());
        let result = ex
            .extract(&doc(&["The Centrifuge spins.", "Clean the Centrifuge."]))
            .unwrap();
        let entry = result.get("Centrifuge").unwrap();
        assert_eq!(entry.provenance, glossa_core::Provenance::Pattern);
        assert_eq!(entry.pages, vec![1, 2]);
    }
}
