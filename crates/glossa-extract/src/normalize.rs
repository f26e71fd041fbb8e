//! Text normalization applied to every page before candidate generation.
//!
//! Normalization is pure and idempotent: `normalize(normalize(x)) == normalize(x)`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::NormalizerConfig;
use crate::lexicon::{COMPOUND_SUFFIXES, HYPHEN_CONJUNCTIONS};

/// Normalize page text with the default settings.
pub fn normalize(text: &str) -> String {
    normalize_with_config(text, &NormalizerConfig::default())
}

/// Config-aware version of [`normalize`].
pub fn normalize_with_config(text: &str, config: &NormalizerConfig) -> String {
    let composed: String = text.nfc().collect();
    let visible = strip_invisible(&composed);
    let mut text = expand_ligatures(&visible);

    if config.repair_doubling {
        text = repair_doubling(&text);
    }
    if config.fix_hyphenation {
        text = fix_hyphenation_with_config(&text, config);
    }

    collapse_whitespace(&text)
}

/// Drop control characters and invisible format characters, keeping line
/// structure for the hyphenation step.
fn strip_invisible(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            if matches!(c, '\n' | '\t' | '\r') {
                return true;
            }
            !(c.is_control()
                || matches!(
                    c,
                    '\u{00AD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'
                ))
        })
        .collect()
}

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Collapse OCR letter doubling: `"TThhee"` → `"The"`.
///
/// Only alphabetic runs made entirely of identical letter pairs, at least one
/// of them lowercase, are touched. Ordinary double letters (`"bookkeeping"`,
/// `"coffee"`) and all-caps codes or numerals (`"XXII"`) survive.
pub fn repair_doubling(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run: Vec<char> = Vec::new();

    for c in text.chars() {
        if c.is_alphabetic() {
            run.push(c);
        } else {
            flush_run(&mut run, &mut out);
            out.push(c);
        }
    }
    flush_run(&mut run, &mut out);
    out
}

fn flush_run(run: &mut Vec<char>, out: &mut String) {
    let mut word = std::mem::take(run);
    while is_doubled_run(&word) {
        word = word.iter().step_by(2).copied().collect();
    }
    out.extend(word);
}

pub(crate) fn is_doubled_run(run: &[char]) -> bool {
    run.len() >= 4
        && run.len() % 2 == 0
        && run.chunks_exact(2).all(|pair| pair[0] == pair[1])
        && run.iter().any(|c| c.is_lowercase())
}

/// Join words hyphenated across a line break while preserving compounds.
///
/// - `"detec-\ntion"` → `"detection"` (syllable break)
/// - `"data-\ndriven"` → `"data-driven"` (compound word)
/// - `"Ein-\nund Ausgang"` → `"Ein- und Ausgang"` (elided compound)
pub fn fix_hyphenation(text: &str) -> String {
    fix_hyphenation_with_config(text, &NormalizerConfig::default())
}

fn fix_hyphenation_with_config(text: &str, config: &NormalizerConfig) -> String {
    static RE: Lazy<Regex> = Lazy::new(|| {
        // word, hyphen, optional trailing blanks, newline, then the next word
        Regex::new(r"(\w+)-[ \t\r]*\n\s*(\w+)").unwrap()
    });

    let default_suffixes: Vec<String> = COMPOUND_SUFFIXES.iter().map(|s| s.to_string()).collect();
    let suffix_set: HashSet<String> = config
        .compound_suffixes
        .resolve(&default_suffixes)
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect();

    RE.replace_all(text, |caps: &regex::Captures| {
        let before = &caps[1];
        let after = &caps[2];
        let after_lower = after.to_lowercase();

        if HYPHEN_CONJUNCTIONS.contains(&after_lower.as_str()) {
            return format!("{before}- {after}");
        }

        // "ISO 9001-\n2", "Phase-\nII" style designations keep the hyphen
        if before.chars().last().is_some_and(|c| c.is_ascii_digit())
            || after.chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            return format!("{before}-{after}");
        }

        if suffix_set.contains(&after_lower) {
            return format!("{before}-{after}");
        }

        let joined = format!("{before}{after}");
        if config.repair_doubling {
            repair_doubling(&joined)
        } else {
            joined
        }
    })
    .into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListOverride;

    #[test]
    fn test_repairs_doubled_letters() {
        assert_eq!(normalize("TThhee"), "The");
        assert_eq!(normalize("TThhee ssyysstteemm works"), "The system works");
    }

    #[test]
    fn test_keeps_legitimate_double_letters() {
        assert_eq!(normalize("bookkeeping"), "bookkeeping");
        assert_eq!(normalize("coffee"), "coffee");
        assert_eq!(normalize("Wasserrohr"), "Wasserrohr");
        assert_eq!(normalize("aa"), "aa");
    }

    #[test]
    fn test_keeps_uppercase_pairs_and_mixed_case() {
        assert_eq!(
            normalize("Chapter XXII covers annex IIII and Aaee"),
            "Chapter XXII covers annex IIII and Aaee"
        );
        assert_eq!(normalize("TTHHEE AANNNNEEXX"), "TTHHEE AANNNNEEXX");
        assert_eq!(normalize("TThhee XXII"), "The XXII");
    }

    #[test]
    fn test_expand_ligatures() {
        assert_eq!(expand_ligatures("ﬁnding ﬂow"), "finding flow");
        assert_eq!(expand_ligatures("eﬃcient oﬄine"), "efficient offline");
        assert_eq!(normalize("Oberﬂäche"), "Oberfläche");
    }

    #[test]
    fn test_composes_umlauts() {
        let decomposed = "Pru\u{0308}fung";
        assert_eq!(normalize(decomposed), "Prüfung");
    }

    #[test]
    fn test_strips_invisible_characters() {
        assert_eq!(normalize("Bio\u{200B}reactor\u{0007}"), "Bioreactor");
        assert_eq!(normalize("\u{FEFF}Valve"), "Valve");
    }

    #[test]
    fn test_fix_hyphenation_syllable_break() {
        assert_eq!(normalize("detec-\ntion"), "detection");
        assert_eq!(normalize("Sterili-\n  sation"), "Sterilisation");
    }

    #[test]
    fn test_fix_hyphenation_keeps_compounds() {
        assert_eq!(normalize("data-\ndriven"), "data-driven");
        assert_eq!(normalize("Ein-\nund Ausgang"), "Ein- und Ausgang");
        assert_eq!(normalize("ISO 9001-\n2015"), "ISO 9001-2015");
    }

    #[test]
    fn test_hyphen_within_line_untouched() {
        assert_eq!(normalize("clean-in-place"), "clean-in-place");
        assert_eq!(normalize("detec- tion"), "detec- tion");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  a \t b\n\n c  "), "a b c");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_is_idempotent() {
        let samples = [
            "TThhee ssyysstteemm",
            "aaaabbbb",
            "TTh-\nhee",
            "detec-\ntion of data-\ndriven ﬁlters",
            "Ein-\nund Ausgang\u{00AD}",
            "  spaced\u{200D}  out\ttext\r\n",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input: {s:?}");
        }
    }

    #[test]
    fn test_custom_compound_suffix() {
        let config = NormalizerConfig {
            compound_suffixes: ListOverride::Extend(vec!["gesteuert".to_string()]),
            ..Default::default()
        };
        assert_eq!(
            normalize_with_config("SPS-\ngesteuert", &config),
            "SPS-gesteuert"
        );
        assert_eq!(normalize_with_config("data-\ndriven", &config), "data-driven");
    }

    #[test]
    fn test_steps_can_be_disabled() {
        let config = NormalizerConfig {
            repair_doubling: false,
            fix_hyphenation: false,
            ..Default::default()
        };
        assert_eq!(normalize_with_config("TThhee detec-\ntion", &config), "TThhee detec- tion");
    }
}
