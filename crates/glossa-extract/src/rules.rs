//! The built-in validation rules, in the order the default chain runs them.

use glossa_core::RejectionReason;

use crate::config::ValidationConfig;
use crate::normalize::is_doubled_run;
use crate::validator::{RuleOutcome, TermRule};

// ─── 1. stop words ──────────────────────────────────────────────────────────

/// Rejects a term that is a stop word, or made only of stop words.
pub struct StopWordRule;

impl TermRule for StopWordRule {
    fn name(&self) -> &str {
        "stop-word"
    }

    fn check(&self, term: &str, config: &ValidationConfig) -> RuleOutcome {
        let lower = term.to_lowercase();
        if config.stop_words.contains(&lower) {
            return RuleOutcome::fail(RejectionReason::StopWord, format!("'{term}' is a stop word"));
        }
        let mut tokens = lower.split_whitespace().peekable();
        if tokens.peek().is_some() && tokens.all(|t| config.stop_words.contains(t)) {
            return RuleOutcome::fail(
                RejectionReason::StopWord,
                "every word is a stop word".to_string(),
            );
        }
        RuleOutcome::pass()
    }
}

// ─── 2. length ──────────────────────────────────────────────────────────────

/// Character and word-count bounds.
pub struct LengthRule;

impl TermRule for LengthRule {
    fn name(&self) -> &str {
        "length"
    }

    fn check(&self, term: &str, config: &ValidationConfig) -> RuleOutcome {
        let chars = term.chars().count();
        let words = term.split_whitespace().count();

        if chars < config.min_length {
            return RuleOutcome::fail(
                RejectionReason::TooShort,
                format!("{chars} chars, minimum is {}", config.min_length),
            );
        }
        if chars > config.max_length {
            return RuleOutcome::fail(
                RejectionReason::TooLong,
                format!("{chars} chars, maximum is {}", config.max_length),
            );
        }
        if words > config.max_words {
            return RuleOutcome::fail(
                RejectionReason::TooLong,
                format!("{words} words, maximum is {}", config.max_words),
            );
        }

        let slack = (chars - config.min_length).min(config.max_length - chars) as f64;
        RuleOutcome::pass_with_margin(slack / config.margin_ramp.max(f64::EPSILON))
    }
}

// ─── 3. symbols and digits ──────────────────────────────────────────────────

/// Rejects terms dominated by punctuation/symbols or by numbers.
///
/// The symbol ratio is measured over non-space characters (hyphens don't
/// count); the digit ratio over words, so designations like "ISO 9001"
/// survive while "2019" does not.
pub struct SymbolDigitRule;

impl TermRule for SymbolDigitRule {
    fn name(&self) -> &str {
        "symbol-digit"
    }

    fn check(&self, term: &str, config: &ValidationConfig) -> RuleOutcome {
        let visible: Vec<char> = term.chars().filter(|c| !c.is_whitespace()).collect();
        if visible.is_empty() {
            return RuleOutcome::fail(RejectionReason::SymbolHeavy, "no visible characters");
        }

        let symbols = visible
            .iter()
            .filter(|c| !c.is_alphanumeric() && **c != '-')
            .count();
        let symbol_ratio = symbols as f64 / visible.len() as f64;
        if symbol_ratio > config.max_symbol_ratio {
            return RuleOutcome::fail(
                RejectionReason::SymbolHeavy,
                format!("symbol ratio {symbol_ratio:.2} exceeds {:.2}", config.max_symbol_ratio),
            );
        }

        if !visible.iter().any(|c| c.is_alphabetic()) {
            return RuleOutcome::fail(RejectionReason::Numeric, "no letters");
        }

        let words: Vec<&str> = term.split_whitespace().collect();
        let numeric_words = words
            .iter()
            .filter(|w| {
                w.chars().any(|c| c.is_numeric())
                    && w.chars().all(|c| !c.is_alphabetic())
            })
            .count();
        let digit_ratio = numeric_words as f64 / words.len() as f64;
        if digit_ratio > config.max_digit_ratio {
            return RuleOutcome::fail(
                RejectionReason::Numeric,
                format!("numeric ratio {digit_ratio:.2} exceeds {:.2}", config.max_digit_ratio),
            );
        }

        let headroom = |limit: f64, value: f64| {
            if limit <= 0.0 {
                1.0
            } else {
                (limit - value) / limit
            }
        };
        RuleOutcome::pass_with_margin(
            headroom(config.max_symbol_ratio, symbol_ratio)
                .min(headroom(config.max_digit_ratio, digit_ratio)),
        )
    }
}

// ─── 4. fragments ───────────────────────────────────────────────────────────

/// Rejects stray affixes and words cut at a hyphen.
pub struct FragmentRule;

impl TermRule for FragmentRule {
    fn name(&self) -> &str {
        "fragment"
    }

    fn check(&self, term: &str, config: &ValidationConfig) -> RuleOutcome {
        if config.fragments.contains(&term.to_lowercase()) {
            return RuleOutcome::fail(
                RejectionReason::Fragment,
                format!("'{term}' is a word fragment"),
            );
        }
        if term.starts_with('-') || term.ends_with('-') {
            return RuleOutcome::fail(RejectionReason::Fragment, "dangling hyphen");
        }
        RuleOutcome::pass()
    }
}

// ─── 5. acronyms ────────────────────────────────────────────────────────────

/// Short all-uppercase single-word terms must be on the whitelist.
pub struct AcronymRule;

impl TermRule for AcronymRule {
    fn name(&self) -> &str {
        "acronym"
    }

    fn check(&self, term: &str, config: &ValidationConfig) -> RuleOutcome {
        if term.split_whitespace().count() != 1 {
            return RuleOutcome::pass();
        }
        let letters = term.chars().filter(|c| c.is_alphabetic()).count();
        let all_upper = term
            .chars()
            .all(|c| !c.is_alphabetic() || c.is_uppercase());
        if letters >= 2
            && all_upper
            && term.chars().count() <= config.acronym_max_len
            && !config.acronym_whitelist.contains(term)
        {
            return RuleOutcome::fail(
                RejectionReason::UnknownAcronym,
                format!("'{term}' is not a known acronym"),
            );
        }
        RuleOutcome::pass()
    }
}

// ─── 6. phrase completeness ─────────────────────────────────────────────────

/// Rejects phrases that were cut mid-construction or carry citation debris.
pub struct PhraseCompletenessRule;

impl TermRule for PhraseCompletenessRule {
    fn name(&self) -> &str {
        "phrase-completeness"
    }

    fn check(&self, term: &str, config: &ValidationConfig) -> RuleOutcome {
        if let Some(re) = config
            .incomplete_phrase_patterns
            .iter()
            .find(|re| re.is_match(term))
        {
            return RuleOutcome::fail(
                RejectionReason::IncompletePhrase,
                format!("matches /{}/", re.as_str()),
            );
        }
        if !brackets_balanced(term) {
            return RuleOutcome::fail(RejectionReason::IncompletePhrase, "unbalanced brackets");
        }
        RuleOutcome::pass()
    }
}

fn brackets_balanced(term: &str) -> bool {
    let mut stack = Vec::new();
    for c in term.chars() {
        match c {
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(open) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

// ─── 7. OCR artifacts ───────────────────────────────────────────────────────

/// Rejects text the normalizer could not fully repair.
pub struct OcrArtifactRule;

impl TermRule for OcrArtifactRule {
    fn name(&self) -> &str {
        "ocr-artifact"
    }

    fn check(&self, term: &str, config: &ValidationConfig) -> RuleOutcome {
        if term.contains('\u{FFFD}') {
            return RuleOutcome::fail(RejectionReason::OcrArtifact, "replacement character");
        }

        let tokens: Vec<&str> = term.split_whitespace().collect();

        if let Some(t) = tokens.iter().find(|t| {
            let chars: Vec<char> = t.chars().collect();
            chars.iter().all(|c| c.is_alphabetic()) && is_doubled_run(&chars)
        }) {
            return RuleOutcome::fail(
                RejectionReason::OcrArtifact,
                format!("doubled letters in '{t}'"),
            );
        }

        let mut spaced = 0;
        for t in &tokens {
            if t.chars().count() == 1 && t.chars().all(char::is_alphabetic) {
                spaced += 1;
                if spaced >= config.max_spaced_letters {
                    return RuleOutcome::fail(RejectionReason::OcrArtifact, "letter-spaced text");
                }
            } else {
                spaced = 0;
            }
        }

        if let Some(run) = longest_letter_repeat(term)
            && run > config.max_repeated_letters
        {
            return RuleOutcome::fail(
                RejectionReason::OcrArtifact,
                format!("{run} repeated letters"),
            );
        }

        if let Some(t) = tokens.iter().find(|t| erratic_casing(t)) {
            return RuleOutcome::fail(
                RejectionReason::OcrArtifact,
                format!("erratic casing in '{t}'"),
            );
        }

        RuleOutcome::pass()
    }
}

fn longest_letter_repeat(term: &str) -> Option<usize> {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<char> = None;
    for c in term.chars().flat_map(char::to_lowercase) {
        if c.is_alphabetic() && prev == Some(c) {
            run += 1;
        } else {
            run = 1;
        }
        best = best.max(run);
        prev = Some(c);
    }
    (best > 0).then_some(best)
}

/// Case flips inside a word ("bIoReAcToR"). Camel case such as "PowerPoint"
/// flips too rarely to count.
fn erratic_casing(token: &str) -> bool {
    let letters: Vec<char> = token.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 4 {
        return false;
    }
    let flips = letters[1..]
        .windows(2)
        .filter(|w| w[0].is_uppercase() != w[1].is_uppercase())
        .count();
    flips >= 3 && flips * 2 > letters.len()
}
