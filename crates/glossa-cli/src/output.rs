use std::io::Write;

use glossa_core::{
    CandidateTerm, ConfidenceTier, DefinitionKind, ExtractError, ExtractionResult,
    RejectedCandidate, TermEntry, ValidationVerdict,
};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn print_header(w: &mut dyn Write, title: &str, color: ColorMode) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", title.bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "{}", title)?;
        writeln!(w, "{}", sep)?;
    }
    Ok(())
}

fn tier_label(tier: ConfidenceTier, color: ColorMode) -> String {
    let label = tier.to_string().to_uppercase();
    if !color.enabled() {
        return label;
    }
    match tier {
        ConfidenceTier::High => label.green().to_string(),
        ConfidenceTier::Medium => label.yellow().to_string(),
        ConfidenceTier::Low => label.red().to_string(),
    }
}

/// Print the glossary extracted from one document.
pub fn print_document_report(
    w: &mut dyn Write,
    result: &ExtractionResult,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    print_header(
        w,
        &format!("{} ({}, {} pages)", result.source_id, result.language, result.stats.pages),
        color,
    )?;

    if result.terms.is_empty() {
        if color.enabled() {
            writeln!(w, "  {}", "No terms found.".dimmed())?;
        } else {
            writeln!(w, "  No terms found.")?;
        }
        return Ok(());
    }

    for entry in &result.terms {
        print_term(w, entry, color)?;
    }
    Ok(())
}

fn print_term(w: &mut dyn Write, entry: &TermEntry, color: ColorMode) -> std::io::Result<()> {
    let pages = entry
        .pages
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let meta = format!(
        "x{} pages {} ({})",
        entry.frequency, pages, entry.provenance
    );

    writeln!(w)?;
    if color.enabled() {
        writeln!(
            w,
            "{} [{} {:.2}] {}",
            entry.term.bold().cyan(),
            tier_label(entry.tier, color),
            entry.confidence,
            meta.dimmed()
        )?;
    } else {
        writeln!(
            w,
            "{} [{} {:.2}] {}",
            entry.term,
            tier_label(entry.tier, color),
            entry.confidence,
            meta
        )?;
    }

    if entry.definitions.is_empty() {
        if color.enabled() {
            writeln!(w, "  {}", "(no definition found)".dimmed())?;
        } else {
            writeln!(w, "  (no definition found)")?;
        }
    }
    for def in &entry.definitions {
        let source = match (&def.kind, &def.pattern) {
            (DefinitionKind::Structured, Some(p)) => format!("structured/{p}"),
            (kind, _) => kind.to_string(),
        };
        let mut line = format!("  - {} ({}, {:.2})", truncate(&def.text, 160), source, def.quality);
        if def.boilerplate {
            line.push_str(" [boilerplate]");
        }
        if color.enabled() && def.boilerplate {
            writeln!(w, "{}", line.dimmed())?;
        } else {
            writeln!(w, "{}", line)?;
        }
    }
    Ok(())
}

/// Print rejected and below-threshold candidates for one document.
pub fn print_rejected(
    w: &mut dyn Write,
    rejected: &[RejectedCandidate],
    below_frequency: &[CandidateTerm],
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    let dash_sep = "-".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", dash_sep.dimmed())?;
        writeln!(w, "{}", "Rejected candidates".bold())?;
    } else {
        writeln!(w, "{}", dash_sep)?;
        writeln!(w, "Rejected candidates")?;
    }

    for r in rejected {
        let reason = r
            .verdict
            .reason
            .map(|reason| reason.to_string())
            .unwrap_or_default();
        let detail = r.verdict.detail.as_deref().unwrap_or("");
        if color.enabled() {
            writeln!(
                w,
                "  {} x{} {} {}",
                r.candidate.text,
                r.candidate.count(),
                reason.red(),
                detail.dimmed()
            )?;
        } else {
            writeln!(
                w,
                "  {} x{} {} {}",
                r.candidate.text,
                r.candidate.count(),
                reason,
                detail
            )?;
        }
    }

    if !below_frequency.is_empty() {
        let names: Vec<&str> = below_frequency.iter().map(|c| c.text.as_str()).collect();
        let msg = format!(
            "Below frequency threshold ({}): {}",
            below_frequency.len(),
            truncate(&names.join(", "), 400)
        );
        if color.enabled() {
            writeln!(w, "  {}", msg.dimmed())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }
    Ok(())
}

/// Print a document that could not be processed.
pub fn print_failure(
    w: &mut dyn Write,
    source_id: &str,
    error: &ExtractError,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}: {}", "FAILED".red(), source_id.bold(), error)?;
    } else {
        writeln!(w, "FAILED {}: {}", source_id, error)?;
    }
    Ok(())
}

/// Print the final summary over all documents.
pub fn print_summary(
    w: &mut dyn Write,
    results: &[ExtractionResult],
    failed: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let terms: usize = results.iter().map(|r| r.terms.len()).sum();
    let count_tier = |tier: ConfidenceTier| {
        results
            .iter()
            .flat_map(|r| &r.terms)
            .filter(|t| t.tier == tier)
            .count()
    };
    let without_definition: usize = results.iter().map(|r| r.stats.without_definition).sum();
    let rejected: usize = results.iter().map(|r| r.stats.rejected).sum();
    let below: usize = results.iter().map(|r| r.stats.below_frequency).sum();

    writeln!(w)?;
    print_header(w, "SUMMARY", color)?;

    writeln!(w, "  Documents processed: {}", results.len())?;
    writeln!(w, "  Terms extracted: {}", terms)?;
    let msg = format!(
        "Rejected by validation: {}, below frequency threshold: {}",
        rejected, below
    );
    if color.enabled() {
        writeln!(w, "  {}", msg.dimmed())?;
    } else {
        writeln!(w, "  {}", msg)?;
    }
    writeln!(w)?;

    if color.enabled() {
        writeln!(w, "  {} {}", "High confidence:".green(), count_tier(ConfidenceTier::High))?;
        writeln!(w, "  {} {}", "Medium confidence:".yellow(), count_tier(ConfidenceTier::Medium))?;
        writeln!(w, "  {} {}", "Low confidence:".red(), count_tier(ConfidenceTier::Low))?;
    } else {
        writeln!(w, "  High confidence: {}", count_tier(ConfidenceTier::High))?;
        writeln!(w, "  Medium confidence: {}", count_tier(ConfidenceTier::Medium))?;
        writeln!(w, "  Low confidence: {}", count_tier(ConfidenceTier::Low))?;
    }
    if without_definition > 0 {
        writeln!(w, "  Without definition: {}", without_definition)?;
    }
    if failed > 0 {
        if color.enabled() {
            writeln!(w, "  {} {}", "Failed documents:".red(), failed)?;
        } else {
            writeln!(w, "  Failed documents: {}", failed)?;
        }
    }

    writeln!(w)?;
    Ok(())
}

/// Print the verdict of the validation rule chain for one term.
pub fn print_verdict(
    w: &mut dyn Write,
    term: &str,
    verdict: &ValidationVerdict,
    color: ColorMode,
) -> std::io::Result<()> {
    if verdict.passed {
        if color.enabled() {
            writeln!(w, "{} {} (margin {:.2})", "PASS".green(), term.bold(), verdict.margin)?;
        } else {
            writeln!(w, "PASS {} (margin {:.2})", term, verdict.margin)?;
        }
        return Ok(());
    }

    let reason = verdict.reason.map(|r| r.to_string()).unwrap_or_default();
    let rule = verdict.rule.as_deref().unwrap_or("?");
    if color.enabled() {
        writeln!(w, "{} {}: {} (rule {})", "FAIL".red(), term.bold(), reason.red(), rule)?;
    } else {
        writeln!(w, "FAIL {}: {} (rule {})", term, reason, rule)?;
    }
    if let Some(detail) = &verdict.detail {
        writeln!(w, "  {}", detail)?;
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::{
        DefinitionCandidate, ExtractionStats, Language, Provenance, RejectionReason, Span,
    };

    fn result() -> ExtractionResult {
        ExtractionResult {
            source_id: "sop.txt".to_string(),
            language: Language::En,
            terms: vec![TermEntry {
                term: "Bioreactor".to_string(),
                frequency: 3,
                provenance: Provenance::Nlp,
                confidence: 0.82,
                tier: ConfidenceTier::High,
                definitions: vec![DefinitionCandidate {
                    text: "a vessel used for biological reactions.".to_string(),
                    quality: 0.83,
                    kind: DefinitionKind::Structured,
                    pattern: Some("copula".to_string()),
                    windows: Vec::new(),
                    boilerplate: false,
                }],
                occurrences: Vec::new(),
                pages: vec![1, 2],
            }],
            stats: ExtractionStats {
                pages: 2,
                accepted: 1,
                ..Default::default()
            },
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> std::io::Result<()>) -> String {
        let mut buf: Vec<u8> = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_document_report_plain() {
        let out = render(|w| print_document_report(w, &result(), ColorMode(false)));
        assert!(out.contains("sop.txt (en, 2 pages)"));
        assert!(out.contains("Bioreactor [HIGH 0.82] x3 pages 1, 2 (nlp)"));
        assert!(out.contains("a vessel used for biological reactions. (structured/copula, 0.83)"));
    }

    #[test]
    fn test_summary_counts_tiers() {
        let out = render(|w| print_summary(w, &[result()], 1, ColorMode(false)));
        assert!(out.contains("Terms extracted: 1"));
        assert!(out.contains("High confidence: 1"));
        assert!(out.contains("Failed documents: 1"));
    }

    #[test]
    fn test_verdict_and_rejected() {
        let verdict = ValidationVerdict::fail(RejectionReason::UnknownAcronym, "acronym", "XYZ is not whitelisted");
        let out = render(|w| print_verdict(w, "XYZ", &verdict, ColorMode(false)));
        assert!(out.starts_with("FAIL XYZ: unknown-acronym (rule acronym)"));

        let rejected = vec![RejectedCandidate {
            candidate: CandidateTerm::single("XYZ", Span::new(0, 3), Provenance::Nlp),
            verdict,
        }];
        let below = vec![CandidateTerm::single("vessel", Span::new(5, 11), Provenance::Nlp)];
        let out = render(|w| print_rejected(w, &rejected, &below, ColorMode(false)));
        assert!(out.contains("XYZ x1 unknown-acronym"));
        assert!(out.contains("Below frequency threshold (1): vessel"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("Prüfgerät", 3), "Prü...");
        assert_eq!(truncate("kurz", 10), "kurz");
    }
}
