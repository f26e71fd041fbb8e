//! Term validation: an ordered chain of [`TermRule`]s.
//!
//! Rules run in registration order and the first failure decides the
//! verdict. Passing rules may report how far the term sits from their
//! rejection threshold; the verdict keeps the smallest such margin.
//!
//! ```rust,ignore
//! use glossa_extract::validator::TermValidator;
//!
//! let validator = TermValidator::with_defaults();
//! let verdict = validator.validate("Bioreactor", config.validation(Language::En));
//! assert!(verdict.passed);
//! ```

use glossa_core::{RejectionReason, ValidationVerdict};
use once_cell::sync::Lazy;

use crate::config::ValidationConfig;
use crate::rules::{
    AcronymRule, FragmentRule, LengthRule, OcrArtifactRule, PhraseCompletenessRule,
    StopWordRule, SymbolDigitRule,
};

/// What a single rule decided about a term.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// `margin` is the normalized distance to this rule's threshold, when the
    /// rule has one.
    Pass { margin: Option<f64> },
    Fail {
        reason: RejectionReason,
        detail: String,
    },
}

impl RuleOutcome {
    pub fn pass() -> Self {
        RuleOutcome::Pass { margin: None }
    }

    pub fn pass_with_margin(margin: f64) -> Self {
        RuleOutcome::Pass {
            margin: Some(margin.clamp(0.0, 1.0)),
        }
    }

    pub fn fail(reason: RejectionReason, detail: impl Into<String>) -> Self {
        RuleOutcome::Fail {
            reason,
            detail: detail.into(),
        }
    }
}

/// A single validation rule.
///
/// Rules are stateless and `Send + Sync` so one chain can serve every
/// document in a process.
pub trait TermRule: Send + Sync {
    /// Short, stable identifier reported in failing verdicts.
    fn name(&self) -> &str;

    fn check(&self, term: &str, config: &ValidationConfig) -> RuleOutcome;
}

/// Ordered rule chain.
pub struct TermValidator {
    rules: Vec<Box<dyn TermRule>>,
}

impl TermValidator {
    /// A chain with no rules; every term passes with margin 1.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The built-in chain, cheapest checks first.
    pub fn with_defaults() -> Self {
        let mut validator = Self::new();
        validator.add_rule(Box::new(StopWordRule));
        validator.add_rule(Box::new(LengthRule));
        validator.add_rule(Box::new(SymbolDigitRule));
        validator.add_rule(Box::new(FragmentRule));
        validator.add_rule(Box::new(AcronymRule));
        validator.add_rule(Box::new(PhraseCompletenessRule));
        validator.add_rule(Box::new(OcrArtifactRule));
        validator
    }

    /// Append a rule to the end of the chain.
    pub fn add_rule(&mut self, rule: Box<dyn TermRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, term: &str, config: &ValidationConfig) -> ValidationVerdict {
        let term = term.trim();
        let mut margin: f64 = 1.0;

        for rule in &self.rules {
            match rule.check(term, config) {
                RuleOutcome::Pass { margin: Some(m) } => margin = margin.min(m),
                RuleOutcome::Pass { margin: None } => {}
                RuleOutcome::Fail { reason, detail } => {
                    return ValidationVerdict::fail(reason, rule.name(), detail);
                }
            }
        }
        ValidationVerdict::pass(margin)
    }
}

impl Default for TermValidator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

static DEFAULT_VALIDATOR: Lazy<TermValidator> = Lazy::new(TermValidator::with_defaults);

/// Validate `term` against the default rule chain.
pub fn validate(term: &str, config: &ValidationConfig) -> ValidationVerdict {
    DEFAULT_VALIDATOR.validate(term, config)
}
