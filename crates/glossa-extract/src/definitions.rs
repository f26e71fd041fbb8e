//! Definition extraction from the text surrounding each occurrence of a term.
//!
//! For every occurrence a window of `context_radius` bytes on each side is
//! cut from the document. The language's definitional templates are tried
//! first; a match becomes a [`DefinitionKind::Structured`] candidate. When no
//! template fits, the window is trimmed to whole sentences and kept as a
//! lower-quality [`DefinitionKind::Contextual`] excerpt.

use std::collections::{HashMap, HashSet};

use glossa_core::{ContextWindow, DefinitionCandidate, DefinitionKind, Occurrence, Span};
use regex::Regex;

use crate::config::{ExtractionConfig, term_pattern};

/// Find every occurrence of `term` in `document_text` (case-insensitive,
/// whole words) and extract definition candidates around them.
pub fn extract(
    term: &str,
    document_text: &str,
    config: &ExtractionConfig,
) -> Vec<DefinitionCandidate> {
    let Ok(finder) = Regex::new(&format!("(?i){}", term_pattern(term))) else {
        return Vec::new();
    };
    let occurrences: Vec<Occurrence> = finder
        .find_iter(document_text)
        .map(|m| Occurrence {
            span: Span::new(m.start(), m.end()),
            page: 0,
        })
        .collect();
    extract_at(term, document_text, &occurrences, config)
}

/// Extract definition candidates around known occurrences of `term`.
///
/// One candidate per occurrence that yields one, in document order. Repeated
/// texts are not merged here; see [`crate::scoring::rank_definitions`].
pub fn extract_at(
    term: &str,
    document_text: &str,
    occurrences: &[Occurrence],
    config: &ExtractionConfig,
) -> Vec<DefinitionCandidate> {
    let templates: Vec<(&str, Regex)> = config
        .patterns
        .iter()
        .filter_map(|p| match p.compile_for(term) {
            Ok(re) => Some((p.name.as_str(), re)),
            Err(e) => {
                tracing::debug!(pattern = %p.name, error = %e, "skipping definition pattern");
                None
            }
        })
        .collect();

    let mut found: Vec<DefinitionCandidate> = Vec::new();

    for occ in occurrences.iter().take(config.max_occurrences) {
        if occ.span.end > document_text.len() {
            continue;
        }
        let ws = floor_char_boundary(document_text, occ.span.start.saturating_sub(config.context_radius));
        let we = ceil_char_boundary(document_text, occ.span.end + config.context_radius);
        let window_text = &document_text[ws..we];
        let window = ContextWindow {
            text: window_text.to_string(),
            page: occ.page,
            span: Span::new(ws, we),
            term_span: occ.span,
        };
        let rel = Span::new(occ.span.start - ws, occ.span.end - ws);

        let clipped = (ws > 0, we < document_text.len());
        let candidate = structured(window_text, rel, &templates, config)
            .or_else(|| contextual(window_text, rel, clipped, config));

        if let Some((text, kind, pattern, quality)) = candidate {
            found.push(DefinitionCandidate {
                text,
                quality,
                kind,
                pattern,
                windows: vec![window],
                boilerplate: false,
            });
        }
    }

    found
}

type Extracted = (String, DefinitionKind, Option<String>, f64);

/// First template whose match covers this occurrence.
fn structured(
    window: &str,
    term: Span,
    templates: &[(&str, Regex)],
    config: &ExtractionConfig,
) -> Option<Extracted> {
    for (name, re) in templates {
        for caps in re.captures_iter(window) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.end() <= term.start || whole.start() >= term.end {
                continue;
            }
            let Some(def) = caps.name("def") else { continue };
            let text = def
                .as_str()
                .trim()
                .trim_end_matches([',', ';', ':'])
                .trim()
                .to_string();
            if text.split_whitespace().count() < 2 {
                continue;
            }
            let quality = config.structured_base
                + config.structured_span * sentence_quality(&text, config);
            return Some((
                text,
                DefinitionKind::Structured,
                Some(name.to_string()),
                quality.clamp(0.0, 1.0),
            ));
        }
    }
    None
}

/// The window trimmed to the sentences around the occurrence. `clipped`
/// says whether the window was cut from the document at (start, end).
fn contextual(
    window: &str,
    term: Span,
    clipped: (bool, bool),
    config: &ExtractionConfig,
) -> Option<Extracted> {
    let start = sentence_start(window, term.start, clipped.0);
    let end = sentence_end(window, term.end, clipped.1);
    let text = window.get(start..end)?.trim();
    if text.is_empty() {
        return None;
    }
    let quality =
        config.contextual_base + config.contextual_span * sentence_quality(text, config);
    Some((
        text.to_string(),
        DefinitionKind::Contextual,
        None,
        quality.clamp(0.0, 1.0),
    ))
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Byte offset just after the last sentence end before `pos`. Without one,
/// a word cut by a clipped window edge is skipped.
fn sentence_start(window: &str, pos: usize, clipped: bool) -> usize {
    let head = &window[..pos];
    let mut after: Option<char> = None;
    for (i, c) in head.char_indices().rev() {
        if is_terminator(c) && after.is_some_and(char::is_whitespace) {
            return i + c.len_utf8();
        }
        after = Some(c);
    }
    if clipped {
        head.find(char::is_whitespace).unwrap_or(0)
    } else {
        0
    }
}

/// Byte offset just after the first sentence end at or after `pos`. Without
/// one, a word cut by a clipped window edge is dropped.
fn sentence_end(window: &str, pos: usize, clipped: bool) -> usize {
    let tail = &window[pos..];
    let mut iter = tail.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if is_terminator(c) {
            let next = iter.peek().map(|&(_, n)| n);
            if next.is_none_or(char::is_whitespace) {
                return pos + i + c.len_utf8();
            }
        }
    }
    if clipped && let Some(i) = tail.rfind(char::is_whitespace) {
        return pos + i;
    }
    window.len()
}

/// Heuristic in [0, 1]: capitalized start, terminal punctuation, and a
/// sentence-like word count each contribute a third.
pub fn sentence_quality(text: &str, config: &ExtractionConfig) -> f64 {
    let text = text.trim();
    let mut score = 0.0;
    if text
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit())
    {
        score += 1.0;
    }
    if text.ends_with(is_terminator) {
        score += 1.0;
    }
    let words = text.split_whitespace().count();
    if (config.min_sentence_words..=config.max_sentence_words).contains(&words) {
        score += 1.0;
    }
    score / 3.0
}

/// Flag contextual excerpts that recur verbatim for many distinct terms
/// (running headers, footers, legal boilerplate) and penalize their quality.
///
/// `per_term` holds the candidates of each term, one entry per term.
pub fn mark_boilerplate(per_term: &mut [Vec<DefinitionCandidate>], config: &ExtractionConfig) {
    let mut owners: HashMap<String, HashSet<usize>> = HashMap::new();
    for (idx, defs) in per_term.iter().enumerate() {
        for d in defs.iter().filter(|d| d.kind == DefinitionKind::Contextual) {
            owners.entry(d.text.clone()).or_default().insert(idx);
        }
    }

    let threshold = config.boilerplate_min_terms.max(2);
    let mut flagged = 0usize;
    for defs in per_term.iter_mut() {
        for d in defs.iter_mut() {
            if d.kind != DefinitionKind::Contextual || d.boilerplate {
                continue;
            }
            if owners.get(&d.text).is_some_and(|o| o.len() >= threshold) {
                d.boilerplate = true;
                d.quality = (d.quality * config.boilerplate_penalty).clamp(0.0, 1.0);
                flagged += 1;
            }
        }
    }
    if flagged > 0 {
        tracing::debug!(stage = "definitions", flagged, "marked boilerplate excerpts");
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::Language;

    fn en() -> ExtractionConfig {
        ExtractionConfig::for_language(Language::En)
    }

    fn de() -> ExtractionConfig {
        ExtractionConfig::for_language(Language::De)
    }

    #[test]
    fn test_structured_copula() {
        let text = "Bioreactor. A bioreactor is a vessel used for biological reactions. Clean it.";
        let defs = extract("Bioreactor", text, &en());
        let structured: Vec<_> = defs
            .iter()
            .filter(|d| d.kind == DefinitionKind::Structured)
            .collect();
        assert_eq!(structured.len(), 1);
        assert_eq!(structured[0].text, "a vessel used for biological reactions.");
        assert_eq!(structured[0].pattern.as_deref(), Some("copula"));
        assert!(structured[0].quality >= 0.5);
    }

    #[test]
    fn test_structured_defined_as_beats_copula() {
        let text = "A dead leg is defined as a section of pipe where fluid can stagnate.";
        let defs = extract("dead leg", text, &en());
        assert_eq!(defs[0].kind, DefinitionKind::Structured);
        assert_eq!(defs[0].pattern.as_deref(), Some("defined-as"));
        assert_eq!(defs[0].text, "a section of pipe where fluid can stagnate.");
    }

    #[test]
    fn test_german_patterns() {
        let text = "Unter einem Bioreaktor versteht man einen Behälter für biologische Prozesse.";
        let defs = extract("Bioreaktor", text, &de());
        assert_eq!(defs[0].kind, DefinitionKind::Structured);
        assert_eq!(defs[0].pattern.as_deref(), Some("versteht-man"));
        assert!(defs[0].text.starts_with("einen Behälter"));

        let text = "Die Validierung ist ein dokumentierter Nachweis der Eignung.";
        let defs = extract("Validierung", text, &de());
        assert_eq!(defs[0].pattern.as_deref(), Some("kopula"));
    }

    #[test]
    fn test_contextual_fallback_trims_to_sentence() {
        let text = "Pumps are serviced yearly. The pump housing must stay dry at all times. Other text follows here.";
        let defs = extract("pump housing", text, &en());
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].kind, DefinitionKind::Contextual);
        assert_eq!(defs[0].text, "The pump housing must stay dry at all times.");
        assert!(defs[0].quality < 0.5 + f64::EPSILON);
    }

    #[test]
    fn test_one_candidate_per_occurrence() {
        let text = "Valve check. Valve check.";
        let defs = extract("Valve", text, &en());
        // Each occurrence yields its own sentence; both read "Valve check."
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].text, defs[1].text);
        assert_ne!(defs[0].windows[0].term_span, defs[1].windows[0].term_span);
    }

    #[test]
    fn test_window_respects_char_boundaries() {
        let config = ExtractionConfig {
            context_radius: 3,
            ..de()
        };
        let text = "Größere Prüfgeräte prüfen Öfen.";
        let defs = extract("Prüfgeräte", text, &config);
        assert!(!defs.is_empty());
        for w in &defs[0].windows {
            assert!(text.is_char_boundary(w.span.start));
            assert!(text.is_char_boundary(w.span.end));
        }
    }

    #[test]
    fn test_max_occurrences() {
        let config = ExtractionConfig {
            max_occurrences: 2,
            ..en()
        };
        let text = "Pump one. Pump two. Pump three. Pump four.";
        let defs = extract("Pump", text, &config);
        let windows: usize = defs.iter().map(|d| d.windows.len()).sum();
        assert_eq!(windows, 2);
    }

    #[test]
    fn test_sentence_quality() {
        let config = en();
        assert!((sentence_quality("The vessel holds the culture medium.", &config) - 1.0).abs() < 1e-9);
        assert_eq!(sentence_quality("vessel", &config), 0.0);
    }

    #[test]
    fn test_mark_boilerplate() {
        let config = en();
        let footer = |q: f64| DefinitionCandidate {
            text: "Company confidential. Page footer text here.".to_string(),
            quality: q,
            kind: DefinitionKind::Contextual,
            pattern: None,
            windows: Vec::new(),
            boilerplate: false,
        };
        let mut per_term = vec![vec![footer(0.4)], vec![footer(0.4)], vec![footer(0.4)], vec![]];
        mark_boilerplate(&mut per_term, &config);
        for defs in &per_term[..3] {
            assert!(defs[0].boilerplate);
            assert!((defs[0].quality - 0.1).abs() < 1e-9);
        }

        let mut pair = vec![vec![footer(0.4)], vec![footer(0.4)]];
        mark_boilerplate(&mut pair, &config);
        assert!(!pair[0][0].boilerplate);
    }

    #[test]
    fn test_no_occurrences_no_definitions() {
        assert!(extract("Centrifuge", "Nothing relevant here.", &en()).is_empty());
    }
}
