//! Confidence scoring for accepted terms.
//!
//! Confidence combines three signals in [0, 1]: how often the term occurs,
//! how comfortably it passed validation, and how good its best definition
//! is. The result is lifted onto `[confidence_floor, 1]`.

use glossa_core::{CandidateTerm, ConfidenceTier, DefinitionCandidate, ValidationVerdict};

use crate::ConfigError;

/// Weights for the confidence score.
///
/// - `frequency`: log-scaled occurrence count
/// - `margin`: validation pass margin
/// - `definition`: quality of the best definition
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    pub frequency: f64,
    pub margin: f64,
    pub definition: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        // Hand-set, not yet fitted against a labelled glossary.
        Self {
            frequency: 0.3,
            margin: 0.2,
            definition: 0.5,
        }
    }
}

impl ScoringWeights {
    fn sum(&self) -> f64 {
        self.frequency + self.margin + self.definition
    }
}

#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub weights: ScoringWeights,
    /// Confidence of a term with no definitions; the lowest any term scores.
    pub confidence_floor: f64,
    /// Occurrence count at which the frequency signal reaches 1.
    pub frequency_saturation: usize,
    pub high_tier: f64,
    pub medium_tier: f64,
    /// Definitions kept per term after ranking.
    pub max_definitions: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            confidence_floor: 0.1,
            frequency_saturation: 10,
            high_tier: 0.7,
            medium_tier: 0.45,
            max_definitions: 3,
        }
    }
}

impl ScorerConfig {
    pub(crate) fn check(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        if [w.frequency, w.margin, w.definition]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(ConfigError::InvalidValue(
                "scoring weights must be non-negative".into(),
            ));
        }
        if w.sum() <= 0.0 {
            return Err(ConfigError::InvalidValue(
                "scoring weights must not all be zero".into(),
            ));
        }
        if !(self.confidence_floor > 0.0 && self.confidence_floor < 1.0) {
            return Err(ConfigError::InvalidValue(format!(
                "confidence_floor must be within (0, 1), got {}",
                self.confidence_floor
            )));
        }
        if !(0.0 <= self.medium_tier && self.medium_tier <= self.high_tier && self.high_tier <= 1.0)
        {
            return Err(ConfigError::InvalidValue(format!(
                "tier thresholds must satisfy 0 <= medium ({}) <= high ({}) <= 1",
                self.medium_tier, self.high_tier
            )));
        }
        if self.frequency_saturation == 0 || self.max_definitions == 0 {
            return Err(ConfigError::InvalidValue(
                "frequency_saturation and max_definitions must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Log-scaled occurrence signal, 1.0 at `saturation` occurrences and above.
pub fn frequency_signal(count: usize, saturation: usize) -> f64 {
    let denom = (1.0 + saturation.max(1) as f64).ln();
    ((1.0 + count as f64).ln() / denom).min(1.0)
}

/// Confidence in [0, 1] for an accepted term.
///
/// A term without definitions scores exactly `confidence_floor`; a failed
/// verdict scores 0.
pub fn score(
    term: &CandidateTerm,
    verdict: &ValidationVerdict,
    definitions: &[DefinitionCandidate],
    config: &ScorerConfig,
) -> f64 {
    if !verdict.passed {
        return 0.0;
    }
    let Some(best) = definitions
        .iter()
        .map(|d| d.quality)
        .max_by(|a, b| a.total_cmp(b))
    else {
        return config.confidence_floor;
    };

    let w = &config.weights;
    let freq = frequency_signal(term.count(), config.frequency_saturation);
    let mean = (w.frequency * freq
        + w.margin * verdict.margin.clamp(0.0, 1.0)
        + w.definition * best.clamp(0.0, 1.0))
        / w.sum();

    (config.confidence_floor + (1.0 - config.confidence_floor) * mean).clamp(0.0, 1.0)
}

/// Map a confidence to a tier. Terms without definitions are always `Low`.
pub fn tier(confidence: f64, has_definitions: bool, config: &ScorerConfig) -> ConfidenceTier {
    if !has_definitions {
        ConfidenceTier::Low
    } else if confidence >= config.high_tier {
        ConfidenceTier::High
    } else if confidence >= config.medium_tier {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

/// Best definitions first, at most `max` kept.
///
/// Candidates with identical text collapse into the best-scoring one, which
/// collects the context windows of all of them.
pub fn rank_definitions(
    mut definitions: Vec<DefinitionCandidate>,
    max: usize,
) -> Vec<DefinitionCandidate> {
    // Stable: equal qualities keep document order.
    definitions.sort_by(|a, b| b.quality.total_cmp(&a.quality));

    let mut merged: Vec<DefinitionCandidate> = Vec::with_capacity(definitions.len());
    for d in definitions {
        match merged.iter_mut().find(|m| m.text == d.text) {
            Some(existing) => existing.windows.extend(d.windows),
            None => merged.push(d),
        }
    }
    merged.truncate(max);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::{ContextWindow, DefinitionKind, Provenance, RejectionReason, Span};

    fn term(count: usize) -> CandidateTerm {
        let mut t = CandidateTerm::single("Bioreactor", Span::new(0, 10), Provenance::Nlp);
        for i in 1..count {
            t.occurrences.push(glossa_core::Occurrence {
                span: Span::new(i * 20, i * 20 + 10),
                page: 1,
            });
        }
        t
    }

    fn def(text: &str, quality: f64) -> DefinitionCandidate {
        DefinitionCandidate {
            text: text.to_string(),
            quality,
            kind: DefinitionKind::Contextual,
            pattern: None,
            windows: Vec::new(),
            boilerplate: false,
        }
    }

    #[test]
    fn test_scoring_weights_default_sum() {
        let w = ScoringWeights::default();
        assert!((w.sum() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_no_definitions_scores_floor() {
        let config = ScorerConfig::default();
        let c = score(&term(7), &ValidationVerdict::pass(1.0), &[], &config);
        assert_eq!(c, config.confidence_floor);
        assert_eq!(tier(c, false, &config), ConfidenceTier::Low);
    }

    #[test]
    fn test_failed_verdict_scores_zero() {
        let verdict = ValidationVerdict::fail(RejectionReason::Fragment, "fragment", "x");
        let c = score(&term(3), &verdict, &[def("a def", 1.0)], &ScorerConfig::default());
        assert_eq!(c, 0.0);
    }

    #[test]
    fn test_score_bounds() {
        let config = ScorerConfig::default();
        for count in [1, 2, 5, 50, 5000] {
            for margin in [0.0, 0.5, 1.0] {
                for quality in [0.0, 0.4, 1.0] {
                    let c = score(
                        &term(count),
                        &ValidationVerdict::pass(margin),
                        &[def("d", quality)],
                        &config,
                    );
                    assert!((config.confidence_floor..=1.0).contains(&c), "{c}");
                }
            }
        }
    }

    #[test]
    fn test_perfect_signals_score_one() {
        let c = score(
            &term(10),
            &ValidationVerdict::pass(1.0),
            &[def("d", 1.0)],
            &ScorerConfig::default(),
        );
        assert!((c - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_frequency_signal_saturates() {
        assert_eq!(frequency_signal(0, 10), 0.0);
        assert!((frequency_signal(10, 10) - 1.0).abs() < 1e-12);
        assert_eq!(frequency_signal(1000, 10), 1.0);
        assert!(frequency_signal(2, 10) < frequency_signal(3, 10));
    }

    #[test]
    fn test_better_definition_scores_higher() {
        let config = ScorerConfig::default();
        let v = ValidationVerdict::pass(0.5);
        let low = score(&term(3), &v, &[def("d", 0.2)], &config);
        let high = score(&term(3), &v, &[def("d", 0.9)], &config);
        assert!(high > low);
    }

    #[test]
    fn test_tiers() {
        let config = ScorerConfig::default();
        assert_eq!(tier(0.8, true, &config), ConfidenceTier::High);
        assert_eq!(tier(0.5, true, &config), ConfidenceTier::Medium);
        assert_eq!(tier(0.2, true, &config), ConfidenceTier::Low);
        assert_eq!(tier(0.9, false, &config), ConfidenceTier::Low);
    }

    #[test]
    fn test_rank_definitions() {
        let ranked = rank_definitions(
            vec![
                def("first", 0.4),
                def("second", 0.9),
                def("first", 0.4),
                def("third", 0.4),
                def("fourth", 0.1),
            ],
            3,
        );
        let texts: Vec<&str> = ranked.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first", "third"]);
    }

    #[test]
    fn test_rank_definitions_merges_windows() {
        let window = |start: usize| ContextWindow {
            text: "Valve check.".to_string(),
            page: 1,
            span: Span::new(start, start + 12),
            term_span: Span::new(start, start + 5),
        };
        let mut a = def("Valve check.", 0.4);
        a.windows.push(window(0));
        let mut b = def("Valve check.", 0.4);
        b.windows.push(window(13));

        let ranked = rank_definitions(vec![a, b], 3);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].windows.len(), 2);
        assert_eq!(ranked[0].windows[1].term_span, Span::new(13, 18));
    }

    #[test]
    fn test_check_rejects_bad_values() {
        let mut config = ScorerConfig::default();
        config.confidence_floor = 1.0;
        assert!(config.check().is_err());
        config.confidence_floor = 0.0;
        assert!(config.check().is_err());
        config.confidence_floor = f64::NAN;
        assert!(config.check().is_err());

        let mut config = ScorerConfig::default();
        config.weights = ScoringWeights {
            frequency: 0.0,
            margin: 0.0,
            definition: 0.0,
        };
        assert!(config.check().is_err());

        let mut config = ScorerConfig::default();
        config.medium_tier = 0.8;
        assert!(config.check().is_err());

        assert!(ScorerConfig::default().check().is_ok());
    }
}
