use crate::{Language, Span};

/// Coarse part-of-speech classes used for noun-phrase chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    Noun,
    ProperNoun,
    Adjective,
    Verb,
    Adverb,
    Determiner,
    Preposition,
    Conjunction,
    Pronoun,
    Numeral,
    Punctuation,
    Other,
}

impl PosTag {
    /// Tags that may appear inside a noun phrase.
    pub fn is_nominal(&self) -> bool {
        matches!(self, PosTag::Noun | PosTag::ProperNoun | PosTag::Adjective)
    }

    /// Tags that may close a noun phrase.
    pub fn is_head(&self) -> bool {
        matches!(self, PosTag::Noun | PosTag::ProperNoun)
    }
}

/// A tagged token with its byte span in the analyzed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedToken {
    pub span: Span,
    pub pos: PosTag,
    /// Set on the first token of each sentence.
    pub sentence_start: bool,
}

/// A named-entity span with a free-form label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub span: Span,
    pub label: String,
}

/// Trait for linguistic models used by the candidate generator.
///
/// Implementors are loaded once per process and shared read-only between
/// documents, so analysis must not mutate the model.
pub trait LanguageModel: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    fn language(&self) -> Language;

    /// Tokenize and tag `text`. Spans are byte offsets into `text`.
    fn tag(&self, text: &str) -> Vec<TaggedToken>;

    /// Named entities found in `text`. Spans are byte offsets into `text`.
    fn entities(&self, text: &str) -> Vec<EntitySpan>;
}
