//! Built-in word lists and pattern sets for English and German.
//!
//! Everything here is a default; [`PipelineConfigBuilder`](crate::PipelineConfigBuilder)
//! can replace or extend each list per language.

use glossa_core::Language;

pub(crate) const STOP_WORDS_EN: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "done", "down", "during", "each",
    "either", "etc", "even", "ever", "every", "few", "for", "from", "further", "had", "has",
    "have", "having", "he", "her", "here", "hers", "him", "his", "how", "however", "i", "if",
    "in", "into", "is", "it", "its", "itself", "just", "least", "less", "may", "me", "might",
    "more", "most", "must", "my", "neither", "no", "nor", "not", "now", "of", "off", "often",
    "on", "once", "only", "or", "other", "otherwise", "our", "ours", "out", "over", "own", "per",
    "rather", "same", "shall", "she", "should", "since", "so", "some", "such", "than", "that",
    "the", "their", "theirs", "them", "then", "there", "therefore", "these", "they", "this",
    "those", "through", "thus", "to", "too", "under", "until", "up", "upon", "us", "very", "via",
    "was", "we", "were", "what", "when", "where", "whether", "which", "while", "who", "whom",
    "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your", "yours",
];

pub(crate) const STOP_WORDS_DE: &[&str] = &[
    "aber", "alle", "allem", "allen", "aller", "alles", "als", "also", "am", "an", "ander",
    "andere", "anderen", "anderer", "auch", "auf", "aus", "bei", "beim", "bereits", "bin", "bis",
    "bist", "bzw", "da", "dabei", "dadurch", "daher", "dafür", "damit", "dann", "darf", "darin",
    "das", "dass", "dazu", "dem", "den", "denn", "der", "deren", "des", "dessen", "die", "dies",
    "diese", "diesem", "diesen", "dieser", "dieses", "doch", "dort", "du", "durch", "ein", "eine",
    "einem", "einen", "einer", "eines", "er", "es", "etwa", "euch", "für", "gegen", "hat",
    "hatte", "hier", "hin", "hinter", "ich", "ihm", "ihn", "ihnen", "ihr", "ihre", "ihrem",
    "ihren", "ihrer", "im", "in", "ist", "jede", "jedem", "jeden", "jeder", "jedes", "jedoch",
    "kann", "kein", "keine", "können", "man", "mehr", "mit", "muss", "müssen", "nach", "nicht",
    "noch", "nur", "ob", "oder", "ohne", "sehr", "sein", "seine", "sich", "sie", "sind", "so",
    "soll", "sollen", "sollte", "sowie", "um", "und", "uns", "unter", "vom", "von", "vor",
    "wann", "war", "waren", "was", "weil", "welche", "welchem", "welchen", "welcher", "welches",
    "wenn", "werden", "wie", "wir", "wird", "wo", "wurde", "wurden", "zu", "zum", "zur", "zwischen",
    "über",
];

/// Suffixes and prefixes that show up as stray tokens after bad segmentation.
pub(crate) const FRAGMENTS_EN: &[&str] = &[
    "ing", "ed", "ings", "tion", "tions", "sion", "sions", "ation", "ment", "ments", "ness",
    "able", "ible", "ity", "ities", "ous", "ive", "ize", "ise", "ful", "less", "ism", "ist",
    "ical", "ally", "al", "ly", "er", "ers", "est", "pre", "post", "non", "anti", "inter",
    "intra", "sub", "super", "trans", "multi", "semi", "micro", "macro", "un", "re", "dis",
    "mis", "over", "under", "ence", "ance",
];

pub(crate) const FRAGMENTS_DE: &[&str] = &[
    "ung", "ungen", "heit", "heiten", "keit", "keiten", "lich", "liche", "lichen", "isch",
    "ische", "schaft", "schaften", "tion", "tionen", "tät", "ig", "ige", "bar", "sam", "los",
    "nis", "tum", "chen", "lein", "ver", "ge", "be", "ent", "zer", "er", "en", "ern",
];

/// Short all-uppercase tokens that are legitimate terms in technical documents.
pub(crate) const ACRONYMS: &[&str] = &[
    "API", "ATP", "CAPA", "CE", "CFR", "CIP", "DIN", "DNA", "DQ", "EMA", "EN", "EP", "ERP", "EU",
    "FDA", "FMEA", "GC", "GCP", "GDP", "GLP", "GMP", "HPLC", "HVAC", "ICH", "IEC", "IQ", "IR",
    "ISO", "KPI", "LIMS", "MS", "NMR", "OOS", "OOT", "OQ", "PCR", "PLC", "PQ", "QA", "QC", "QM",
    "QMS", "RNA", "SI", "SIP", "SOP", "URS", "USP", "UV", "WFI", "WHO",
];

pub(crate) const ACRONYMS_DE: &[&str] = &["AMG", "DAB", "TÜV", "VDE", "VDI", "ZLG"];

pub(crate) const INCOMPLETE_PHRASE_EN: &[&str] = &[
    r"(?i)\b(?:of|and|or|the|a|an|to|in|for|with|by|on|at|from|as|than|via|per|into|versus)$",
    r"(?i)^(?:and|or|of|but|nor|to|with|by|for|from)\b",
    r"(?i)\bet\s+al\b",
    r"(?i)^(?:fig|figure|table|tab|section|sec|chapter|chap|eq|equation|page|pp?|appendix|annex)\.?\s*\d",
    r"\[\d+(?:\s*[,\u{2013}-]\s*\d+)*\]",
    r"(?i)\b(?:ibid|op\.\s*cit|cf)\b",
];

pub(crate) const INCOMPLETE_PHRASE_DE: &[&str] = &[
    r"(?i)\b(?:der|die|das|des|dem|den|ein|eine|einer|eines|einem|einen|und|oder|von|vom|zu|zum|zur|mit|für|auf|aus|bei|nach|im|in|an|am|über|unter|durch|gegen|ohne|um|als)$",
    r"(?i)^(?:und|oder|sowie|aber|bzw|von|mit|für)\b",
    r"(?i)\bet\s+al\b",
    r"(?i)^(?:abb|abbildung|tab|tabelle|kap|kapitel|abschnitt|anhang|seite|s)\.?\s*\d",
    r"\[\d+(?:\s*[,\u{2013}-]\s*\d+)*\]",
    r"(?i)\b(?:vgl|ebd|ders)\b",
];

/// Multi-word technical shapes picked up by the pattern generator. Each
/// pattern exposes the candidate as the `term` group; `abbr` is emitted too
/// when present.
pub(crate) const TECHNICAL_PATTERNS: &[&str] = &[
    // Good Manufacturing Practice (GMP)
    r"(?P<term>\p{Lu}\p{Ll}+(?:[ -]\p{L}+){0,4})\s*\((?P<abbr>\p{Lu}[\p{Lu}\d]{1,6})\)",
    // ISO 9001, DIN EN 12469, IEC 61508-3
    r"(?P<term>\b(?:ISO|DIN|EN|IEC|ASTM|VDI|VDE|USP|EP|CFR)(?:\s+(?:EN|ISO|IEC))*\s+\d{2,6}(?:[-:]\d+)*)",
    // clean-in-place, Edelstahl-Behälter
    r"(?P<term>\b\p{L}[\p{L}\d]*(?:-\p{L}[\p{L}\d]*)+\b)",
];

/// Compound suffixes that keep their hyphen across a line break.
pub(crate) const COMPOUND_SUFFIXES: &[&str] = &[
    "based", "driven", "aware", "oriented", "specific", "related", "dependent", "independent",
    "like", "free", "friendly", "scale", "level", "grade", "type", "style", "wise", "fold",
    "time", "site", "resistant", "proof", "controlled", "assisted", "induced", "mediated",
];

/// Words after which a line-break hyphen marks an elided compound
/// ("Ein- und Ausgang", "pre- and post-processing").
pub(crate) const HYPHEN_CONJUNCTIONS: &[&str] =
    &["and", "or", "und", "oder", "bzw", "sowie", "bis", "to"];

/// A named definitional clause template. `{term}` is replaced by a pattern
/// matching the term; the definition is captured as the `def` group.
pub(crate) const DEFINITION_PATTERNS_EN: &[(&str, &str)] = &[
    (
        "defined-as",
        r"(?i){term}\s+(?:is|are)\s+(?:defined|understood)\s+as\s+(?P<def>[^.!?]{3,}[.!?]?)",
    ),
    (
        "refers-to",
        r"(?i){term}\s+(?:refers\s+to|means|denotes|designates)\s+(?P<def>[^.!?]{3,}[.!?]?)",
    ),
    (
        "copula",
        r"(?i){term}\s+(?:is|are)\s+(?P<def>(?:an?|the)\s+[^.!?]{3,}[.!?]?)",
    ),
    (
        "appositive",
        r"(?i){term}\s*,\s*(?P<def>(?:an?|the)\s+[^,.;!?]*?\b(?:that|which|used|designed)\b[^,.;!?]*)[,.;]",
    ),
    (
        "called",
        r"(?i)(?P<def>\b(?:an?|the)\s+[^.!?,;]{3,}?)\s+(?:is|are)\s+(?:called|known\s+as|referred\s+to\s+as)\s+(?:an?\s+|the\s+)?{term}",
    ),
];

pub(crate) const DEFINITION_PATTERNS_DE: &[(&str, &str)] = &[
    (
        "definiert-als",
        r"(?i){term}\s+(?:ist|sind|wird|werden)\s+(?:definiert|bezeichnet)\s+als\s+(?P<def>[^.!?]{3,}[.!?]?)",
    ),
    (
        "versteht-man",
        r"(?i)unter\s+(?:(?:einem|einer|einen|dem|der|den|die|das)\s+)?{term}\s+(?:versteht\s+man|wird\s+verstanden|werden\s+verstanden)\s+(?P<def>[^.!?]{3,}[.!?]?)",
    ),
    (
        "bezeichnet",
        r"(?i){term}\s+(?:bezeichnet|bedeutet|beschreibt|meint)\s+(?P<def>[^.!?]{3,}[.!?]?)",
    ),
    (
        "kopula",
        r"(?i){term}\s+(?:ist|sind)\s+(?P<def>(?:ein|eine|einer|der|die|das)\s+[^.!?]{3,}[.!?]?)",
    ),
    (
        "apposition",
        r"(?i){term}\s*,\s*(?P<def>(?:ein|eine|einer|der|die|das)\s+[^,.;!?]*?\b(?:der|die|das|welche|welcher|zur|zum|für)\b[^,.;!?]*)[,.;]",
    ),
];

pub(crate) fn stop_words(language: Language) -> &'static [&'static str] {
    match language {
        Language::En => STOP_WORDS_EN,
        Language::De => STOP_WORDS_DE,
    }
}

pub(crate) fn fragments(language: Language) -> &'static [&'static str] {
    match language {
        Language::En => FRAGMENTS_EN,
        Language::De => FRAGMENTS_DE,
    }
}

pub(crate) fn acronyms(language: Language) -> Vec<&'static str> {
    let mut list = ACRONYMS.to_vec();
    if language == Language::De {
        list.extend_from_slice(ACRONYMS_DE);
    }
    list
}

pub(crate) fn incomplete_phrase_patterns(language: Language) -> &'static [&'static str] {
    match language {
        Language::En => INCOMPLETE_PHRASE_EN,
        Language::De => INCOMPLETE_PHRASE_DE,
    }
}

pub(crate) fn definition_patterns(language: Language) -> &'static [(&'static str, &'static str)] {
    match language {
        Language::En => DEFINITION_PATTERNS_EN,
        Language::De => DEFINITION_PATTERNS_DE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn builtin_patterns_compile() {
        for lang in Language::ALL {
            for p in incomplete_phrase_patterns(lang) {
                Regex::new(p).unwrap_or_else(|e| panic!("{p}: {e}"));
            }
            for (name, template) in definition_patterns(lang) {
                let compiled = template.replace("{term}", "widget");
                Regex::new(&compiled).unwrap_or_else(|e| panic!("{name}: {e}"));
            }
        }
        for p in TECHNICAL_PATTERNS {
            Regex::new(p).unwrap_or_else(|e| panic!("{p}: {e}"));
        }
    }

    #[test]
    fn stop_words_are_lowercase() {
        for lang in Language::ALL {
            for w in stop_words(lang) {
                assert_eq!(*w, w.to_lowercase(), "stop word {w} must be lowercase");
            }
        }
    }

    #[test]
    fn german_acronyms_include_shared_list() {
        let de = acronyms(Language::De);
        assert!(de.contains(&"GMP"));
        assert!(de.contains(&"TÜV"));
        assert!(!acronyms(Language::En).contains(&"TÜV"));
    }
}
