//! Built-in lexicon tagger and the process-wide model registry.
//!
//! The tagger is deliberately small: closed-class words come from a lexicon,
//! open-class words are classified by capitalization and suffix morphology.
//! That is enough for noun-phrase chunking in technical prose.

use std::collections::HashMap;
use std::sync::Arc;

use glossa_core::{EntitySpan, Language, LanguageModel, PosTag, Span, TaggedToken};
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['\u{2019}-][\p{L}\p{N}]+)*|[^\s\p{L}\p{N}]").unwrap()
});

const EN_DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "any", "some", "no",
    "all", "both", "either", "neither", "such", "its", "their", "our", "your", "my", "his", "her",
];
const EN_PREPOSITIONS: &[&str] = &[
    "of", "in", "on", "at", "by", "for", "with", "from", "to", "into", "onto", "over", "under",
    "between", "through", "during", "before", "after", "above", "below", "about", "against",
    "within", "without", "via", "per", "across", "along", "among", "upon", "towards", "toward",
];
const EN_CONJUNCTIONS: &[&str] = &[
    "and", "or", "but", "nor", "so", "yet", "if", "then", "than", "because", "while", "whereas",
    "although", "unless", "whether", "as",
];
const EN_PRONOUNS: &[&str] = &[
    "it", "they", "them", "we", "us", "you", "he", "she", "him", "i", "me", "which", "who",
    "whom", "whose", "what", "there", "here",
];
const EN_VERBS: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "being", "am", "has", "have", "had", "do", "does",
    "did", "can", "could", "will", "would", "shall", "should", "may", "might", "must", "means",
    "refers", "denotes", "contains", "requires", "ensures", "describes", "uses", "makes",
];
const EN_ADVERBS: &[&str] = &[
    "not", "also", "very", "only", "always", "never", "often", "too", "again", "still", "just",
    "however", "thus", "therefore", "hence",
];

const DE_DETERMINERS: &[&str] = &[
    "der", "die", "das", "des", "dem", "den", "ein", "eine", "einer", "eines", "einem", "einen",
    "kein", "keine", "keiner", "keines", "keinem", "keinen", "dieser", "diese", "dieses",
    "diesem", "diesen", "jeder", "jede", "jedes", "jedem", "jeden", "alle", "sein", "seine",
    "ihr", "ihre", "ihren", "ihrem", "ihres", "seinen", "seinem", "seines",
];
const DE_PREPOSITIONS: &[&str] = &[
    "von", "vom", "zu", "zum", "zur", "mit", "für", "auf", "aus", "bei", "beim", "nach", "im",
    "in", "an", "am", "über", "unter", "durch", "gegen", "ohne", "um", "vor", "hinter",
    "zwischen", "neben", "während", "wegen", "gemäß", "laut", "innerhalb", "außerhalb", "bis",
    "ins", "ans",
];
const DE_CONJUNCTIONS: &[&str] = &[
    "und", "oder", "aber", "sowie", "bzw", "denn", "sondern", "dass", "weil", "wenn", "als",
    "ob", "damit", "sodass", "wie",
];
const DE_PRONOUNS: &[&str] = &[
    "es", "sie", "er", "wir", "ihr", "man", "sich", "ich", "du", "welche", "welcher", "welches",
    "was", "wer", "dies",
];
const DE_VERBS: &[&str] = &[
    "ist", "sind", "war", "waren", "wird", "werden", "wurde", "wurden", "hat", "haben", "hatte",
    "kann", "können", "muss", "müssen", "soll", "sollen", "darf", "dürfen", "sei", "versteht",
    "bezeichnet", "bedeutet", "beschreibt",
];
const DE_ADVERBS: &[&str] = &[
    "nicht", "auch", "sehr", "nur", "immer", "nie", "oft", "noch", "bereits", "hier", "dort",
    "jedoch", "daher", "somit",
];

const EN_ADJECTIVE_SUFFIXES: &[&str] = &["ous", "ive", "al", "ic", "able", "ible", "ful", "less"];
/// Nouns caught by the adjective suffixes above.
const EN_SUFFIX_NOUNS: &[&str] = &[
    "material", "manual", "interval", "signal", "terminal", "potential", "approval", "removal",
    "disposal", "proposal", "renewal", "individual", "logic", "topic", "traffic", "clinic",
    "fabric", "graphic", "plastic", "objective", "additive", "adhesive",
];
const DE_ADJECTIVE_SUFFIXES: &[&str] = &["ig", "lich", "isch", "bar", "sam", "los", "haft"];
const DE_INFLECTIONS: &[&str] = &["", "e", "er", "en", "es", "em"];

/// Lexicon + suffix-morphology tagger for one language.
#[derive(Debug, Clone)]
pub struct LexiconTagger {
    language: Language,
}

impl LexiconTagger {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    fn closed_class(&self, lower: &str) -> Option<PosTag> {
        let (det, prep, conj, pron, verb, adv) = match self.language {
            Language::En => (
                EN_DETERMINERS,
                EN_PREPOSITIONS,
                EN_CONJUNCTIONS,
                EN_PRONOUNS,
                EN_VERBS,
                EN_ADVERBS,
            ),
            Language::De => (
                DE_DETERMINERS,
                DE_PREPOSITIONS,
                DE_CONJUNCTIONS,
                DE_PRONOUNS,
                DE_VERBS,
                DE_ADVERBS,
            ),
        };
        [
            (det, PosTag::Determiner),
            (prep, PosTag::Preposition),
            (conj, PosTag::Conjunction),
            (pron, PosTag::Pronoun),
            (verb, PosTag::Verb),
            (adv, PosTag::Adverb),
        ]
        .into_iter()
        .find(|(list, _)| list.contains(&lower))
        .map(|(_, tag)| tag)
    }

    fn classify(&self, word: &str, sentence_start: bool) -> PosTag {
        if !word.chars().any(|c| c.is_alphanumeric()) {
            return PosTag::Punctuation;
        }
        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return PosTag::Numeral;
        }
        if is_acronym(word) {
            return PosTag::ProperNoun;
        }

        let lower = word.to_lowercase();
        let capitalized = word.chars().next().is_some_and(|c| c.is_uppercase());

        match self.language {
            Language::En => {
                if let Some(tag) = self.closed_class(&lower) {
                    return tag;
                }
                if capitalized && !sentence_start {
                    return PosTag::ProperNoun;
                }
                english_suffix_tag(&lower)
            }
            Language::De => {
                if capitalized {
                    if sentence_start && let Some(tag) = self.closed_class(&lower) {
                        return tag;
                    }
                    return PosTag::Noun;
                }
                if let Some(tag) = self.closed_class(&lower) {
                    return tag;
                }
                german_lowercase_tag(&lower)
            }
        }
    }
}

fn english_suffix_tag(lower: &str) -> PosTag {
    let long_enough = |suffix: &str| lower.len() >= suffix.len() + 2 && lower.ends_with(suffix);
    if EN_SUFFIX_NOUNS.contains(&lower.trim_end_matches('s')) {
        PosTag::Noun
    } else if long_enough("ly") {
        PosTag::Adverb
    } else if long_enough("ing") || long_enough("ed") {
        PosTag::Verb
    } else if EN_ADJECTIVE_SUFFIXES.iter().any(|s| long_enough(s)) {
        PosTag::Adjective
    } else {
        PosTag::Noun
    }
}

fn german_lowercase_tag(lower: &str) -> PosTag {
    let adjective = DE_ADJECTIVE_SUFFIXES.iter().any(|suffix| {
        DE_INFLECTIONS.iter().any(|infl| {
            let ending = format!("{suffix}{infl}");
            lower.len() > ending.len() + 1 && lower.ends_with(&ending)
        })
    });
    if adjective {
        PosTag::Adjective
    } else if lower.ends_with("en") || lower.ends_with("ern") || lower.ends_with("eln") {
        PosTag::Verb
    } else {
        PosTag::Other
    }
}

/// Two or more letters, all uppercase (digits allowed): `GMP`, `CO2`, `TÜV`.
fn is_acronym(word: &str) -> bool {
    let letters = word.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 2
        && word
            .chars()
            .all(|c| c.is_uppercase() || c.is_ascii_digit() || c == '-')
}

fn ends_sentence(token: &str) -> bool {
    matches!(token, "." | "!" | "?" | ";")
}

impl LanguageModel for LexiconTagger {
    fn name(&self) -> &str {
        match self.language {
            Language::En => "lexicon-en",
            Language::De => "lexicon-de",
        }
    }

    fn language(&self) -> Language {
        self.language
    }

    fn tag(&self, text: &str) -> Vec<TaggedToken> {
        let mut tokens = Vec::new();
        let mut sentence_start = true;
        for m in TOKEN_RE.find_iter(text) {
            let word = m.as_str();
            let pos = self.classify(word, sentence_start);
            tokens.push(TaggedToken {
                span: Span::new(m.start(), m.end()),
                pos,
                sentence_start,
            });
            sentence_start = ends_sentence(word);
        }
        tokens
    }

    fn entities(&self, text: &str) -> Vec<EntitySpan> {
        let tokens = self.tag(text);
        let mut entities = Vec::new();

        let mut i = 0;
        while i < tokens.len() {
            let tok = tokens[i];
            let word = &text[tok.span.start..tok.span.end];

            if is_acronym(word) {
                entities.push(EntitySpan {
                    span: tok.span,
                    label: "ACRONYM".to_string(),
                });
                i += 1;
                continue;
            }

            // Capitalized runs that do not start a sentence
            let is_cap = |t: &TaggedToken| {
                !t.sentence_start
                    && text[t.span.start..t.span.end]
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_uppercase())
                    && !is_acronym(&text[t.span.start..t.span.end])
                    && t.pos.is_nominal()
            };
            if is_cap(&tok) {
                let mut j = i + 1;
                while j < tokens.len()
                    && is_cap(&tokens[j])
                    && text[tokens[j - 1].span.end..tokens[j].span.start]
                        .chars()
                        .all(|c| c == ' ')
                {
                    j += 1;
                }
                if j - i >= 2 {
                    entities.push(EntitySpan {
                        span: Span::new(tok.span.start, tokens[j - 1].span.end),
                        label: "NAME".to_string(),
                    });
                }
                i = j;
                continue;
            }
            i += 1;
        }
        entities
    }
}

/// Read-only set of linguistic models, one per language.
#[derive(Default, Clone)]
pub struct ModelRegistry {
    models: HashMap<Language, Arc<dyn LanguageModel>>,
}

static GLOBAL_REGISTRY: Lazy<ModelRegistry> = Lazy::new(ModelRegistry::with_builtin);

impl ModelRegistry {
    /// An empty registry. Every language falls back to patterns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in [`LexiconTagger`] for every language.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for language in Language::ALL {
            registry.register(Arc::new(LexiconTagger::new(language)));
        }
        registry
    }

    /// Process-wide registry, initialized on first use and never mutated.
    pub fn global() -> &'static ModelRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register `model` for its language, replacing any previous one.
    pub fn register(&mut self, model: Arc<dyn LanguageModel>) {
        self.models.insert(model.language(), model);
    }

    pub fn get(&self, language: Language) -> Option<Arc<dyn LanguageModel>> {
        self.models.get(&language).cloned()
    }

    pub fn has(&self, language: Language) -> bool {
        self.models.contains_key(&language)
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.models.values().map(|m| m.name()).collect();
        names.sort_unstable();
        f.debug_struct("ModelRegistry").field("models", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(language: Language, text: &str) -> Vec<(String, PosTag)> {
        LexiconTagger::new(language)
            .tag(text)
            .into_iter()
            .map(|t| (text[t.span.start..t.span.end].to_string(), t.pos))
            .collect()
    }

    #[test]
    fn test_english_tags() {
        let t = tags(Language::En, "A bioreactor is a vessel used for biological reactions.");
        assert_eq!(t[0], ("A".to_string(), PosTag::Determiner));
        assert_eq!(t[1], ("bioreactor".to_string(), PosTag::Noun));
        assert_eq!(t[2], ("is".to_string(), PosTag::Verb));
        assert_eq!(t[5], ("used".to_string(), PosTag::Verb));
        assert_eq!(t[7], ("biological".to_string(), PosTag::Adjective));
        assert_eq!(t[8], ("reactions".to_string(), PosTag::Noun));
        assert_eq!(t[9], (".".to_string(), PosTag::Punctuation));
    }

    #[test]
    fn test_english_capitalized_mid_sentence_is_proper() {
        let t = tags(Language::En, "Clean the Bioreactor weekly.");
        assert_eq!(t[2], ("Bioreactor".to_string(), PosTag::ProperNoun));
        assert_eq!(t[3], ("weekly".to_string(), PosTag::Adverb));

        // Headings without a full stop leave the next sentence start undetected.
        let t = tags(Language::En, "Operating Manual The pressure sensor");
        assert_eq!(t[1], ("Manual".to_string(), PosTag::ProperNoun));
        assert_eq!(t[2], ("The".to_string(), PosTag::Determiner));
    }

    #[test]
    fn test_german_nouns_and_adjectives() {
        let t = tags(Language::De, "Der Bioreaktor ist ein geschlossener Behälter.");
        assert_eq!(t[0], ("Der".to_string(), PosTag::Determiner));
        assert_eq!(t[1], ("Bioreaktor".to_string(), PosTag::Noun));
        assert_eq!(t[2], ("ist".to_string(), PosTag::Verb));
        assert_eq!(t[5], ("Behälter".to_string(), PosTag::Noun));

        let t = tags(Language::De, "die biologische Sicherheit");
        assert_eq!(t[1], ("biologische".to_string(), PosTag::Adjective));

        // -lich forms used adverbially never head a noun phrase
        let t = tags(Language::De, "Der Bioreaktor wird monatlich geprüft.");
        assert_eq!(t[3], ("monatlich".to_string(), PosTag::Adjective));
        assert!(!t[3].1.is_head());
    }

    #[test]
    fn test_sentence_start_tracking() {
        let tokens = LexiconTagger::new(Language::En).tag("One. Two");
        assert!(tokens[0].sentence_start);
        assert!(!tokens[1].sentence_start);
        assert!(tokens[2].sentence_start);
    }

    #[test]
    fn test_entities() {
        let text = "We follow Good Manufacturing Practice and GMP rules.";
        let ents = LexiconTagger::new(Language::En).entities(text);
        let found: Vec<&str> = ents.iter().map(|e| &text[e.span.start..e.span.end]).collect();
        assert_eq!(found, vec!["Good Manufacturing Practice", "GMP"]);
    }

    #[test]
    fn test_global_registry_has_builtin_models() {
        let registry = ModelRegistry::global();
        for language in Language::ALL {
            assert!(registry.has(language));
            assert_eq!(registry.get(language).unwrap().language(), language);
        }
        assert!(!ModelRegistry::new().has(Language::En));
    }
}
