use std::collections::HashSet;

use glossa_core::Language;
use glossa_core::config_file::ConfigFile;
use regex::Regex;

use crate::ConfigError;
use crate::lexicon;
use crate::scoring::{ScorerConfig, ScoringWeights};

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }

    /// Add values on top of whatever this override already does.
    pub fn push_all(&mut self, values: impl IntoIterator<Item = T>) {
        match self {
            ListOverride::Default => *self = ListOverride::Extend(values.into_iter().collect()),
            ListOverride::Replace(v) | ListOverride::Extend(v) => v.extend(values),
        }
    }
}

/// Whether the candidate generator may use a linguistic model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelPolicy {
    /// Use a registered model for the language, fall back to patterns otherwise.
    #[default]
    Auto,
    /// Always use the pattern-based generator.
    PatternOnly,
}

/// Settings for [`normalize_with_config`](crate::normalize::normalize_with_config).
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub repair_doubling: bool,
    pub fix_hyphenation: bool,
    /// Compound-word suffixes that keep their hyphen across a line break.
    pub compound_suffixes: ListOverride<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            repair_doubling: true,
            fix_hyphenation: true,
            compound_suffixes: ListOverride::Default,
        }
    }
}

/// Rule inputs for the term validator. One per language.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Lowercase stop words.
    pub stop_words: HashSet<String>,
    /// Minimum number of characters.
    pub min_length: usize,
    pub max_length: usize,
    pub max_words: usize,
    /// Largest tolerated share of characters that are neither letters, digits,
    /// spaces nor hyphens.
    pub max_symbol_ratio: f64,
    pub max_digit_ratio: f64,
    /// Characters of slack beyond a length bound that count as a full margin.
    pub margin_ramp: f64,
    /// Lowercase suffix/prefix fragments.
    pub fragments: HashSet<String>,
    pub acronym_whitelist: HashSet<String>,
    /// All-uppercase tokens up to this length must be whitelisted.
    pub acronym_max_len: usize,
    pub incomplete_phrase_patterns: Vec<Regex>,
    /// Runs of this many single-letter tokens count as letter-spaced OCR output.
    pub max_spaced_letters: usize,
    /// Longest tolerated run of one repeated letter ("Schifffahrt" needs 3).
    pub max_repeated_letters: usize,
}

impl ValidationConfig {
    /// Built-in defaults for `language`.
    pub fn for_language(language: Language) -> Self {
        Self {
            stop_words: lexicon::stop_words(language)
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_length: 3,
            max_length: 60,
            max_words: 6,
            max_symbol_ratio: 0.25,
            max_digit_ratio: 0.5,
            margin_ramp: 4.0,
            fragments: lexicon::fragments(language)
                .iter()
                .map(|s| s.to_string())
                .collect(),
            acronym_whitelist: lexicon::acronyms(language)
                .into_iter()
                .map(|s| s.to_string())
                .collect(),
            acronym_max_len: 4,
            incomplete_phrase_patterns: lexicon::incomplete_phrase_patterns(language)
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
            max_spaced_letters: 4,
            max_repeated_letters: match language {
                Language::En => 2,
                Language::De => 3,
            },
        }
    }
}

/// A named definitional clause template with a `{term}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionPattern {
    pub name: String,
    pub template: String,
}

impl DefinitionPattern {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    /// Compile the template for one term.
    pub fn compile_for(&self, term: &str) -> Result<Regex, regex::Error> {
        Regex::new(&self.template.replace("{term}", &term_pattern(term)))
    }
}

/// Regex fragment matching `term` as a whole word, tolerant to internal
/// whitespace and a short plural/inflection suffix.
pub(crate) fn term_pattern(term: &str) -> String {
    let body = term
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let lead = if term.chars().next().is_some_and(|c| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    let tail = if term.chars().last().is_some_and(|c| c.is_alphanumeric()) {
        r"(?:s|es|e|en|n)?\b"
    } else {
        ""
    };
    format!("{lead}{body}{tail}")
}

/// Settings for the definition extractor. One per language.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Bytes of context taken on each side of an occurrence.
    pub context_radius: usize,
    /// Occurrences examined per term; later ones add nothing new in practice.
    pub max_occurrences: usize,
    pub patterns: Vec<DefinitionPattern>,
    pub structured_base: f64,
    pub structured_span: f64,
    pub contextual_base: f64,
    pub contextual_span: f64,
    pub min_sentence_words: usize,
    pub max_sentence_words: usize,
    /// Excerpts shared verbatim by this many distinct terms are boilerplate.
    pub boilerplate_min_terms: usize,
    pub boilerplate_penalty: f64,
}

impl ExtractionConfig {
    pub fn for_language(language: Language) -> Self {
        Self {
            context_radius: 100,
            max_occurrences: 25,
            patterns: lexicon::definition_patterns(language)
                .iter()
                .map(|(name, template)| DefinitionPattern::new(*name, *template))
                .collect(),
            structured_base: 0.5,
            structured_span: 0.5,
            contextual_base: 0.15,
            contextual_span: 0.35,
            min_sentence_words: 5,
            max_sentence_words: 40,
            boilerplate_min_terms: 3,
            boilerplate_penalty: 0.25,
        }
    }
}

/// Everything the pipeline needs for one language.
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    pub validation: ValidationConfig,
    pub definitions: ExtractionConfig,
    /// Closed-class words that delimit pattern-generated candidates.
    pub function_words: HashSet<String>,
}

impl LanguageProfile {
    pub fn for_language(language: Language) -> Self {
        Self {
            validation: ValidationConfig::for_language(language),
            definitions: ExtractionConfig::for_language(language),
            function_words: lexicon::stop_words(language)
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Configuration for the whole extraction pipeline.
///
/// Passed by reference into every stage; nothing is read from process state.
/// Use [`PipelineConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // ── frequency.rs ──
    pub(crate) min_frequency: usize,

    // ── candidates.rs ──
    pub(crate) model_policy: ModelPolicy,
    pub(crate) max_phrase_words: usize,
    pub(crate) technical_patterns: Vec<Regex>,

    // ── normalize.rs ──
    pub(crate) normalizer: NormalizerConfig,

    // ── validator / definitions, per language ──
    pub(crate) english: LanguageProfile,
    pub(crate) german: LanguageProfile,

    // ── scoring.rs ──
    pub(crate) scorer: ScorerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_frequency: 2,
            model_policy: ModelPolicy::Auto,
            max_phrase_words: 6,
            technical_patterns: lexicon::TECHNICAL_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
            normalizer: NormalizerConfig::default(),
            english: LanguageProfile::for_language(Language::En),
            german: LanguageProfile::for_language(Language::De),
            scorer: ScorerConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn min_frequency(&self) -> usize {
        self.min_frequency
    }

    pub fn model_policy(&self) -> ModelPolicy {
        self.model_policy
    }

    pub fn max_phrase_words(&self) -> usize {
        self.max_phrase_words
    }

    pub fn technical_patterns(&self) -> &[Regex] {
        &self.technical_patterns
    }

    pub fn normalizer(&self) -> &NormalizerConfig {
        &self.normalizer
    }

    pub fn profile(&self, language: Language) -> &LanguageProfile {
        match language {
            Language::En => &self.english,
            Language::De => &self.german,
        }
    }

    pub fn validation(&self, language: Language) -> &ValidationConfig {
        &self.profile(language).validation
    }

    pub fn definitions(&self, language: Language) -> &ExtractionConfig {
        &self.profile(language).definitions
    }

    pub fn scorer(&self) -> &ScorerConfig {
        &self.scorer
    }
}

/// Per-language list overrides held by the builder.
#[derive(Debug, Clone, Default)]
struct LanguageLists {
    stop_words: ListOverride<String>,
    fragments: ListOverride<String>,
    acronyms: ListOverride<String>,
    incomplete_patterns: ListOverride<String>,
    definition_patterns: ListOverride<DefinitionPattern>,
}

/// Builder for [`PipelineConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast if any pattern is invalid or a threshold is out of range.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    min_frequency: Option<usize>,
    model_policy: Option<ModelPolicy>,
    max_phrase_words: Option<usize>,
    technical_patterns: ListOverride<String>,

    repair_doubling: Option<bool>,
    fix_hyphenation: Option<bool>,
    compound_suffixes: ListOverride<String>,

    min_length: Option<usize>,
    max_length: Option<usize>,
    max_words: Option<usize>,
    max_symbol_ratio: Option<f64>,
    max_digit_ratio: Option<f64>,
    acronym_max_len: Option<usize>,
    english: LanguageLists,
    german: LanguageLists,

    context_radius: Option<usize>,
    max_occurrences: Option<usize>,
    boilerplate_min_terms: Option<usize>,

    scoring_weights: Option<ScoringWeights>,
    confidence_floor: Option<f64>,
    frequency_saturation: Option<usize>,
    high_tier: Option<f64>,
    medium_tier: Option<f64>,
    max_definitions: Option<usize>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an on-disk config. List entries extend the defaults of
    /// every language.
    pub fn from_config_file(file: &ConfigFile) -> Self {
        let mut b = Self::new();

        if let Some(e) = &file.extraction {
            b.min_frequency = e.min_frequency;
            if e.pattern_only == Some(true) {
                b.model_policy = Some(ModelPolicy::PatternOnly);
            }
            b.max_phrase_words = e.max_phrase_words;
            b.repair_doubling = e.repair_ocr_doubling;
            b.fix_hyphenation = e.fix_hyphenation;
        }

        if let Some(v) = &file.validation {
            b.min_length = v.min_length;
            b.max_length = v.max_length;
            b.max_words = v.max_words;
            b.max_symbol_ratio = v.max_symbol_ratio;
            b.max_digit_ratio = v.max_digit_ratio;
            b.acronym_max_len = v.acronym_max_len;
            for lang in Language::ALL {
                if let Some(words) = &v.extra_stop_words {
                    b = b.add_stop_words(lang, words.clone());
                }
                if let Some(acronyms) = &v.extra_acronyms {
                    b = b.add_acronyms(lang, acronyms.clone());
                }
                if let Some(fragments) = &v.extra_fragments {
                    b = b.add_fragments(lang, fragments.clone());
                }
                if let Some(patterns) = &v.extra_incomplete_patterns {
                    b = b.add_incomplete_patterns(lang, patterns.clone());
                }
            }
        }

        if let Some(d) = &file.definitions {
            b.context_radius = d.context_radius;
            b.max_definitions = d.max_definitions;
            b.max_occurrences = d.max_occurrences;
            b.boilerplate_min_terms = d.boilerplate_min_terms;
        }

        if let Some(s) = &file.scoring {
            if s.frequency_weight.is_some() || s.margin_weight.is_some() || s.definition_weight.is_some()
            {
                let d = ScoringWeights::default();
                b.scoring_weights = Some(ScoringWeights {
                    frequency: s.frequency_weight.unwrap_or(d.frequency),
                    margin: s.margin_weight.unwrap_or(d.margin),
                    definition: s.definition_weight.unwrap_or(d.definition),
                });
            }
            b.confidence_floor = s.confidence_floor;
            b.frequency_saturation = s.frequency_saturation;
            b.high_tier = s.high_tier;
            b.medium_tier = s.medium_tier;
        }

        b
    }

    fn lists_mut(&mut self, language: Language) -> &mut LanguageLists {
        match language {
            Language::En => &mut self.english,
            Language::De => &mut self.german,
        }
    }

    // ── Frequency / generation ──

    pub fn min_frequency(mut self, n: usize) -> Self {
        self.min_frequency = Some(n);
        self
    }

    pub fn model_policy(mut self, policy: ModelPolicy) -> Self {
        self.model_policy = Some(policy);
        self
    }

    pub fn pattern_only(self) -> Self {
        self.model_policy(ModelPolicy::PatternOnly)
    }

    pub fn max_phrase_words(mut self, n: usize) -> Self {
        self.max_phrase_words = Some(n);
        self
    }

    pub fn set_technical_patterns(mut self, patterns: Vec<String>) -> Self {
        self.technical_patterns = ListOverride::Replace(patterns);
        self
    }

    pub fn add_technical_pattern(mut self, pattern: String) -> Self {
        self.technical_patterns.push_all([pattern]);
        self
    }

    // ── Normalizer ──

    pub fn repair_ocr_doubling(mut self, enabled: bool) -> Self {
        self.repair_doubling = Some(enabled);
        self
    }

    pub fn fix_hyphenation(mut self, enabled: bool) -> Self {
        self.fix_hyphenation = Some(enabled);
        self
    }

    pub fn set_compound_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.compound_suffixes = ListOverride::Replace(suffixes);
        self
    }

    pub fn add_compound_suffix(mut self, suffix: String) -> Self {
        self.compound_suffixes.push_all([suffix]);
        self
    }

    // ── Validation scalars ──

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn max_words(mut self, n: usize) -> Self {
        self.max_words = Some(n);
        self
    }

    pub fn max_symbol_ratio(mut self, ratio: f64) -> Self {
        self.max_symbol_ratio = Some(ratio);
        self
    }

    pub fn max_digit_ratio(mut self, ratio: f64) -> Self {
        self.max_digit_ratio = Some(ratio);
        self
    }

    pub fn acronym_max_len(mut self, n: usize) -> Self {
        self.acronym_max_len = Some(n);
        self
    }

    // ── Validation lists ──

    pub fn set_stop_words(mut self, language: Language, words: Vec<String>) -> Self {
        self.lists_mut(language).stop_words = ListOverride::Replace(words);
        self
    }

    pub fn add_stop_words(mut self, language: Language, words: Vec<String>) -> Self {
        self.lists_mut(language).stop_words.push_all(words);
        self
    }

    pub fn set_fragments(mut self, language: Language, fragments: Vec<String>) -> Self {
        self.lists_mut(language).fragments = ListOverride::Replace(fragments);
        self
    }

    pub fn add_fragments(mut self, language: Language, fragments: Vec<String>) -> Self {
        self.lists_mut(language).fragments.push_all(fragments);
        self
    }

    pub fn set_acronyms(mut self, language: Language, acronyms: Vec<String>) -> Self {
        self.lists_mut(language).acronyms = ListOverride::Replace(acronyms);
        self
    }

    pub fn add_acronyms(mut self, language: Language, acronyms: Vec<String>) -> Self {
        self.lists_mut(language).acronyms.push_all(acronyms);
        self
    }

    pub fn set_incomplete_patterns(mut self, language: Language, patterns: Vec<String>) -> Self {
        self.lists_mut(language).incomplete_patterns = ListOverride::Replace(patterns);
        self
    }

    pub fn add_incomplete_patterns(mut self, language: Language, patterns: Vec<String>) -> Self {
        self.lists_mut(language).incomplete_patterns.push_all(patterns);
        self
    }

    // ── Definitions ──

    pub fn context_radius(mut self, radius: usize) -> Self {
        self.context_radius = Some(radius);
        self
    }

    pub fn max_occurrences(mut self, n: usize) -> Self {
        self.max_occurrences = Some(n);
        self
    }

    pub fn boilerplate_min_terms(mut self, n: usize) -> Self {
        self.boilerplate_min_terms = Some(n);
        self
    }

    pub fn set_definition_patterns(
        mut self,
        language: Language,
        patterns: Vec<DefinitionPattern>,
    ) -> Self {
        self.lists_mut(language).definition_patterns = ListOverride::Replace(patterns);
        self
    }

    pub fn add_definition_pattern(mut self, language: Language, pattern: DefinitionPattern) -> Self {
        self.lists_mut(language).definition_patterns.push_all([pattern]);
        self
    }

    // ── Scoring ──

    /// Set custom weights for the confidence score.
    pub fn scoring_weights(mut self, weights: ScoringWeights) -> Self {
        self.scoring_weights = Some(weights);
        self
    }

    pub fn confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = Some(floor);
        self
    }

    pub fn frequency_saturation(mut self, n: usize) -> Self {
        self.frequency_saturation = Some(n);
        self
    }

    pub fn tier_thresholds(mut self, high: f64, medium: f64) -> Self {
        self.high_tier = Some(high);
        self.medium_tier = Some(medium);
        self
    }

    pub fn max_definitions(mut self, n: usize) -> Self {
        self.max_definitions = Some(n);
        self
    }

    /// Compile all string patterns and check ranges, producing a [`PipelineConfig`].
    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let defaults = PipelineConfig::default();

        let technical_patterns = compile_all(
            &self
                .technical_patterns
                .resolve(&to_owned(lexicon::TECHNICAL_PATTERNS)),
        )?;

        let normalizer = NormalizerConfig {
            repair_doubling: self.repair_doubling.unwrap_or(true),
            fix_hyphenation: self.fix_hyphenation.unwrap_or(true),
            compound_suffixes: self.compound_suffixes.clone(),
        };

        let english = self.build_profile(Language::En, &self.english)?;
        let german = self.build_profile(Language::De, &self.german)?;

        let scorer = ScorerConfig {
            weights: self.scoring_weights.clone().unwrap_or_default(),
            confidence_floor: self
                .confidence_floor
                .unwrap_or(defaults.scorer.confidence_floor),
            frequency_saturation: self
                .frequency_saturation
                .unwrap_or(defaults.scorer.frequency_saturation),
            high_tier: self.high_tier.unwrap_or(defaults.scorer.high_tier),
            medium_tier: self.medium_tier.unwrap_or(defaults.scorer.medium_tier),
            max_definitions: self
                .max_definitions
                .unwrap_or(defaults.scorer.max_definitions),
        };
        scorer.check()?;

        let config = PipelineConfig {
            min_frequency: self.min_frequency.unwrap_or(defaults.min_frequency),
            model_policy: self.model_policy.unwrap_or_default(),
            max_phrase_words: self.max_phrase_words.unwrap_or(defaults.max_phrase_words),
            technical_patterns,
            normalizer,
            english,
            german,
            scorer,
        };

        if config.max_phrase_words == 0 {
            return Err(ConfigError::InvalidValue(
                "max_phrase_words must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    fn build_profile(
        &self,
        language: Language,
        lists: &LanguageLists,
    ) -> Result<LanguageProfile, ConfigError> {
        let mut profile = LanguageProfile::for_language(language);

        let v = &mut profile.validation;
        v.min_length = self.min_length.unwrap_or(v.min_length);
        v.max_length = self.max_length.unwrap_or(v.max_length);
        v.max_words = self.max_words.unwrap_or(v.max_words);
        v.max_symbol_ratio = self.max_symbol_ratio.unwrap_or(v.max_symbol_ratio);
        v.max_digit_ratio = self.max_digit_ratio.unwrap_or(v.max_digit_ratio);
        v.acronym_max_len = self.acronym_max_len.unwrap_or(v.acronym_max_len);

        v.stop_words = lists
            .stop_words
            .resolve(&to_owned(lexicon::stop_words(language)))
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        v.fragments = lists
            .fragments
            .resolve(&to_owned(lexicon::fragments(language)))
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        v.acronym_whitelist = lists
            .acronyms
            .resolve(&to_owned(&lexicon::acronyms(language)))
            .into_iter()
            .collect();
        v.incomplete_phrase_patterns = compile_all(
            &lists
                .incomplete_patterns
                .resolve(&to_owned(lexicon::incomplete_phrase_patterns(language))),
        )?;

        if v.min_length == 0 || v.min_length > v.max_length {
            return Err(ConfigError::InvalidValue(format!(
                "length bounds must satisfy 0 < min ({}) <= max ({})",
                v.min_length, v.max_length
            )));
        }
        for (name, ratio) in [
            ("max_symbol_ratio", v.max_symbol_ratio),
            ("max_digit_ratio", v.max_digit_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must be within [0, 1], got {ratio}"
                )));
            }
        }

        let d = &mut profile.definitions;
        d.context_radius = self.context_radius.unwrap_or(d.context_radius);
        d.max_occurrences = self.max_occurrences.unwrap_or(d.max_occurrences);
        d.boilerplate_min_terms = self
            .boilerplate_min_terms
            .unwrap_or(d.boilerplate_min_terms)
            .max(2);
        d.patterns = lists.definition_patterns.resolve(&d.patterns);
        for pattern in &d.patterns {
            if !pattern.template.contains("{term}") {
                return Err(ConfigError::InvalidValue(format!(
                    "definition pattern {} has no {{term}} placeholder",
                    pattern.name
                )));
            }
            // Fail fast on broken templates rather than per term later.
            pattern.compile_for("term")?;
        }

        Ok(profile)
    }
}

fn to_owned<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items.iter().map(|s| s.as_ref().to_string()).collect()
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.min_frequency, 2);
        assert_eq!(config.model_policy, ModelPolicy::Auto);
        assert_eq!(config.validation(Language::En).min_length, 3);
        assert_eq!(config.definitions(Language::De).context_radius, 100);
        assert!(!config.technical_patterns.is_empty());
        assert!(config.validation(Language::En).stop_words.contains("the"));
        assert!(config.validation(Language::De).stop_words.contains("der"));
    }

    #[test]
    fn test_builder_basic() {
        let config = PipelineConfigBuilder::new()
            .min_frequency(3)
            .context_radius(150)
            .max_words(4)
            .pattern_only()
            .build()
            .unwrap();
        assert_eq!(config.min_frequency(), 3);
        assert_eq!(config.model_policy(), ModelPolicy::PatternOnly);
        assert_eq!(config.definitions(Language::En).context_radius, 150);
        assert_eq!(config.validation(Language::De).max_words, 4);
    }

    #[test]
    fn test_builder_per_language_lists() {
        let config = PipelineConfigBuilder::new()
            .add_acronyms(Language::En, vec!["XYZ".to_string()])
            .set_stop_words(Language::De, vec!["Foo".to_string()])
            .build()
            .unwrap();
        assert!(config.validation(Language::En).acronym_whitelist.contains("XYZ"));
        assert!(!config.validation(Language::De).acronym_whitelist.contains("XYZ"));
        let de = &config.validation(Language::De).stop_words;
        assert_eq!(de.len(), 1);
        assert!(de.contains("foo"));
    }

    #[test]
    fn test_builder_invalid_regex() {
        let result = PipelineConfigBuilder::new()
            .add_incomplete_patterns(Language::En, vec![r"[invalid".to_string()])
            .build();
        assert!(matches!(result, Err(ConfigError::Regex(_))));
    }

    #[test]
    fn test_builder_rejects_inverted_length_bounds() {
        let result = PipelineConfigBuilder::new().min_length(10).max_length(5).build();
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_builder_rejects_zero_confidence_floor() {
        let result = PipelineConfigBuilder::new()
            .confidence_floor(0.0)
            .max_occurrences(0)
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
        assert!(PipelineConfigBuilder::new().confidence_floor(0.01).build().is_ok());
    }

    #[test]
    fn test_builder_rejects_template_without_placeholder() {
        let result = PipelineConfigBuilder::new()
            .add_definition_pattern(Language::En, DefinitionPattern::new("bad", "no placeholder"))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_list_override_resolve() {
        let defaults = vec!["a".to_string(), "b".to_string()];

        let d: ListOverride<String> = ListOverride::Default;
        assert_eq!(d.resolve(&defaults), defaults);

        let r: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        assert_eq!(r.resolve(&defaults), vec!["x".to_string()]);

        let e: ListOverride<String> = ListOverride::Extend(vec!["c".to_string()]);
        assert_eq!(
            e.resolve(&defaults),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_push_all_keeps_replacement() {
        let mut o: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        o.push_all(["y".to_string()]);
        assert_eq!(o.resolve(&["a".to_string()]), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_from_config_file() {
        let file: ConfigFile = toml_like();
        let config = PipelineConfigBuilder::from_config_file(&file).build().unwrap();
        assert_eq!(config.min_frequency(), 3);
        assert_eq!(config.model_policy(), ModelPolicy::PatternOnly);
        assert!(config.validation(Language::De).acronym_whitelist.contains("HACCP"));
        assert!((config.scorer().weights.margin - 0.4).abs() < f64::EPSILON);
        assert!((config.scorer().confidence_floor - 0.05).abs() < f64::EPSILON);
    }

    fn toml_like() -> ConfigFile {
        use glossa_core::config_file::{ExtractionSection, ScoringSection, ValidationSection};
        ConfigFile {
            extraction: Some(ExtractionSection {
                min_frequency: Some(3),
                pattern_only: Some(true),
                ..Default::default()
            }),
            validation: Some(ValidationSection {
                extra_acronyms: Some(vec!["HACCP".to_string()]),
                ..Default::default()
            }),
            scoring: Some(ScoringSection {
                margin_weight: Some(0.4),
                confidence_floor: Some(0.05),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_term_pattern_matches_plural_and_spacing() {
        let re = Regex::new(&format!("(?i){}", term_pattern("bio reactor"))).unwrap();
        assert!(re.is_match("two Bio  reactors here"));
        assert!(!re.is_match("bioreactor"));
        let re = Regex::new(&format!("(?i){}", term_pattern("GMP"))).unwrap();
        assert!(re.is_match("under GMP rules"));
        assert!(!re.is_match("GMPX"));
    }
}
