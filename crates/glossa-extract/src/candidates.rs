//! Candidate generation: propose every plausible term occurrence in a page.
//!
//! Two strategies exist. The model-backed one chunks noun phrases from a
//! [`LanguageModel`]'s tags; the pattern one works on capitalization,
//! technical shapes and function-word boundaries alone. The strategy is
//! chosen once per language when the pipeline is built.

use std::collections::HashSet;
use std::sync::Arc;

use glossa_core::{CandidateTerm, Language, LanguageModel, Provenance, Span, TaggedToken};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{ModelPolicy, PipelineConfig};
use crate::tagger::ModelRegistry;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['\u{2019}-][\p{L}\p{N}]+)*").unwrap());

/// Pattern-based generator state for one language.
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    function_words: HashSet<String>,
    technical_patterns: Vec<Regex>,
}

impl PatternGenerator {
    pub fn new(function_words: HashSet<String>, technical_patterns: Vec<Regex>) -> Self {
        Self {
            function_words,
            technical_patterns,
        }
    }

    fn is_function_word(&self, word: &str) -> bool {
        self.function_words.contains(&word.to_lowercase())
    }

    fn generate(&self, text: &str, out: &mut Emitter) {
        let words: Vec<(usize, usize)> = WORD_RE
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect();

        self.capitalized_runs(text, &words, out);
        self.technical_terms(text, out);
        self.content_runs(text, &words, out);
    }

    /// Runs of capitalized words, trimmed of leading/trailing function words.
    fn capitalized_runs(&self, text: &str, words: &[(usize, usize)], out: &mut Emitter) {
        let is_cap = |&(s, e): &(usize, usize)| {
            text[s..e].chars().next().is_some_and(|c| c.is_uppercase())
        };

        let mut i = 0;
        while i < words.len() {
            if !is_cap(&words[i]) {
                i += 1;
                continue;
            }
            let mut j = i + 1;
            while j < words.len() && is_cap(&words[j]) && only_spaces(text, words[j - 1].1, words[j].0)
            {
                j += 1;
            }

            let mut run = &words[i..j];
            while let Some(first) = run.first()
                && self.is_function_word(&text[first.0..first.1])
            {
                run = &run[1..];
            }
            while let Some(last) = run.last()
                && self.is_function_word(&text[last.0..last.1])
            {
                run = &run[..run.len() - 1];
            }
            if let (Some(first), Some(last)) = (run.first(), run.last()) {
                out.emit(text, Span::new(first.0, last.1));
            }
            i = j;
        }
    }

    /// Matches of the technical patterns (`term` group, plus `abbr` when present).
    fn technical_terms(&self, text: &str, out: &mut Emitter) {
        for re in &self.technical_patterns {
            for caps in re.captures_iter(text) {
                let term = caps.name("term").or_else(|| caps.get(0));
                if let Some(m) = term {
                    out.emit(text, Span::new(m.start(), m.end()));
                }
                if let Some(m) = caps.name("abbr") {
                    out.emit(text, Span::new(m.start(), m.end()));
                }
            }
        }
    }

    /// Runs of content words bounded by punctuation, numbers and function words.
    fn content_runs(&self, text: &str, words: &[(usize, usize)], out: &mut Emitter) {
        let mut run: Option<(usize, usize)> = None;
        let mut prev_end = 0;

        for &(s, e) in words {
            let word = &text[s..e];
            let boundary = self.is_function_word(word)
                || word.chars().all(|c| c.is_numeric())
                || !only_spaces(text, prev_end, s);

            if boundary && let Some((rs, re)) = run.take() {
                out.emit(text, Span::new(rs, re));
            }
            if !self.is_function_word(word) && !word.chars().all(|c| c.is_numeric()) {
                run = Some(match run {
                    Some((rs, _)) => (rs, e),
                    None => (s, e),
                });
            }
            prev_end = e;
        }
        if let Some((rs, re)) = run {
            out.emit(text, Span::new(rs, re));
        }
    }
}

fn only_spaces(text: &str, from: usize, to: usize) -> bool {
    from <= to && text[from..to].chars().all(char::is_whitespace)
}

/// The generation strategy for one language.
#[derive(Clone)]
pub enum CandidateGenerator {
    /// Noun-phrase chunks and entities from a linguistic model.
    Model {
        model: Arc<dyn LanguageModel>,
        max_phrase_words: usize,
    },
    /// Capitalization, technical patterns and function-word boundaries.
    Pattern(PatternGenerator),
}

impl CandidateGenerator {
    /// Pick the strategy for `language`. Done once per pipeline, not per page.
    pub fn select(language: Language, config: &PipelineConfig, registry: &ModelRegistry) -> Self {
        if config.model_policy() == ModelPolicy::Auto {
            match registry.get(language) {
                Some(model) => {
                    tracing::debug!(language = %language, model = model.name(), "using model-backed candidate generation");
                    return CandidateGenerator::Model {
                        model,
                        max_phrase_words: config.max_phrase_words(),
                    };
                }
                None => {
                    tracing::warn!(language = %language, "no linguistic model registered, falling back to pattern generation");
                }
            }
        }
        Self::pattern(language, config)
    }

    pub fn pattern(language: Language, config: &PipelineConfig) -> Self {
        CandidateGenerator::Pattern(PatternGenerator::new(
            config.profile(language).function_words.clone(),
            config.technical_patterns().to_vec(),
        ))
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            CandidateGenerator::Model { .. } => Provenance::Nlp,
            CandidateGenerator::Pattern(_) => Provenance::Pattern,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &str {
        match self {
            CandidateGenerator::Model { model, .. } => model.name(),
            CandidateGenerator::Pattern(_) => "pattern",
        }
    }

    /// One candidate per occurrence, spans relative to `text`, page unset.
    pub fn generate(&self, text: &str) -> Vec<CandidateTerm> {
        let mut out = Emitter::new(self.provenance());
        match self {
            CandidateGenerator::Model {
                model,
                max_phrase_words,
            } => {
                let tokens = model.tag(text);
                emit_noun_chunks(text, &tokens, *max_phrase_words, &mut out);
                for entity in model.entities(text) {
                    out.emit(text, entity.span);
                }
            }
            CandidateGenerator::Pattern(p) => p.generate(text, &mut out),
        }
        out.finish()
    }
}

impl std::fmt::Debug for CandidateGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CandidateGenerator").field(&self.name()).finish()
    }
}

/// Generate candidates for `text` with the strategy `config` selects for
/// `language` against the global model registry.
pub fn generate(text: &str, language: Language, config: &PipelineConfig) -> Vec<CandidateTerm> {
    CandidateGenerator::select(language, config, ModelRegistry::global()).generate(text)
}

/// `(Adjective|Noun|ProperNoun)*` runs cut back at every head noun.
///
/// The full chunk ends at the last head. Each earlier head also closes a
/// shorter phrase, so "Bioreactor" is counted inside "Bioreactor overview".
fn emit_noun_chunks(
    text: &str,
    tokens: &[TaggedToken],
    max_phrase_words: usize,
    out: &mut Emitter,
) {
    let max = max_phrase_words.max(1);
    let mut i = 0;
    while i < tokens.len() {
        if !tokens[i].pos.is_nominal() {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < tokens.len() && tokens[j].pos.is_nominal() && !tokens[j].sentence_start {
            j += 1;
        }

        let run = &tokens[i..j];
        for (head, _) in run.iter().enumerate().filter(|(_, t)| t.pos.is_head()) {
            let first = (head + 1).saturating_sub(max);
            out.emit(text, Span::new(run[first].span.start, run[head].span.end));
        }
        i = j;
    }
}

/// Collects candidates, dropping exact `(span, text)` repeats. All spans
/// index the same text, so the span alone identifies the pair.
struct Emitter {
    provenance: Provenance,
    seen: HashSet<Span>,
    candidates: Vec<CandidateTerm>,
}

impl Emitter {
    fn new(provenance: Provenance) -> Self {
        Self {
            provenance,
            seen: HashSet::new(),
            candidates: Vec::new(),
        }
    }

    fn emit(&mut self, text: &str, span: Span) {
        if span.is_empty() || span.end > text.len() {
            return;
        }
        let Some(surface) = text.get(span.start..span.end) else {
            return;
        };
        if self.seen.insert(span) {
            self.candidates
                .push(CandidateTerm::single(surface, span, self.provenance));
        }
    }

    fn finish(mut self) -> Vec<CandidateTerm> {
        self.candidates.sort_by_key(|c| c.first_offset());
        self.candidates
    }
}
