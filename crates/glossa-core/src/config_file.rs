use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionSection>,
    pub validation: Option<ValidationSection>,
    pub definitions: Option<DefinitionsSection>,
    pub scoring: Option<ScoringSection>,
    pub concurrency: Option<ConcurrencySection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSection {
    pub min_frequency: Option<usize>,
    /// Skip the linguistic model even when one is available.
    pub pattern_only: Option<bool>,
    pub max_phrase_words: Option<usize>,
    pub repair_ocr_doubling: Option<bool>,
    pub fix_hyphenation: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSection {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub max_words: Option<usize>,
    pub max_symbol_ratio: Option<f64>,
    pub max_digit_ratio: Option<f64>,
    pub acronym_max_len: Option<usize>,
    /// Added to the built-in stop words of every language.
    pub extra_stop_words: Option<Vec<String>>,
    pub extra_acronyms: Option<Vec<String>>,
    pub extra_fragments: Option<Vec<String>>,
    /// Regex patterns marking incomplete phrases.
    pub extra_incomplete_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionsSection {
    pub context_radius: Option<usize>,
    pub max_definitions: Option<usize>,
    pub max_occurrences: Option<usize>,
    pub boilerplate_min_terms: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringSection {
    pub frequency_weight: Option<f64>,
    pub margin_weight: Option<f64>,
    pub definition_weight: Option<f64>,
    pub confidence_floor: Option<f64>,
    pub frequency_saturation: Option<usize>,
    pub high_tier: Option<f64>,
    pub medium_tier: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencySection {
    pub num_workers: Option<usize>,
    pub document_timeout_secs: Option<u64>,
}

/// Platform config directory path: `<config_dir>/glossa/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("glossa").join("config.toml"))
}

/// Load config by cascading CWD `.glossa.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".glossa.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Overlay value wins, base value fills the gaps.
fn pick<S, T>(base: &Option<S>, overlay: &Option<S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (be, oe) = (&base.extraction, &overlay.extraction);
    let (bv, ov) = (&base.validation, &overlay.validation);
    let (bd, od) = (&base.definitions, &overlay.definitions);
    let (bs, os) = (&base.scoring, &overlay.scoring);
    let (bc, oc) = (&base.concurrency, &overlay.concurrency);

    ConfigFile {
        extraction: Some(ExtractionSection {
            min_frequency: pick(be, oe, |e| e.min_frequency),
            pattern_only: pick(be, oe, |e| e.pattern_only),
            max_phrase_words: pick(be, oe, |e| e.max_phrase_words),
            repair_ocr_doubling: pick(be, oe, |e| e.repair_ocr_doubling),
            fix_hyphenation: pick(be, oe, |e| e.fix_hyphenation),
        }),
        validation: Some(ValidationSection {
            min_length: pick(bv, ov, |v| v.min_length),
            max_length: pick(bv, ov, |v| v.max_length),
            max_words: pick(bv, ov, |v| v.max_words),
            max_symbol_ratio: pick(bv, ov, |v| v.max_symbol_ratio),
            max_digit_ratio: pick(bv, ov, |v| v.max_digit_ratio),
            acronym_max_len: pick(bv, ov, |v| v.acronym_max_len),
            extra_stop_words: pick(bv, ov, |v| v.extra_stop_words.clone()),
            extra_acronyms: pick(bv, ov, |v| v.extra_acronyms.clone()),
            extra_fragments: pick(bv, ov, |v| v.extra_fragments.clone()),
            extra_incomplete_patterns: pick(bv, ov, |v| v.extra_incomplete_patterns.clone()),
        }),
        definitions: Some(DefinitionsSection {
            context_radius: pick(bd, od, |d| d.context_radius),
            max_definitions: pick(bd, od, |d| d.max_definitions),
            max_occurrences: pick(bd, od, |d| d.max_occurrences),
            boilerplate_min_terms: pick(bd, od, |d| d.boilerplate_min_terms),
        }),
        scoring: Some(ScoringSection {
            frequency_weight: pick(bs, os, |s| s.frequency_weight),
            margin_weight: pick(bs, os, |s| s.margin_weight),
            definition_weight: pick(bs, os, |s| s.definition_weight),
            confidence_floor: pick(bs, os, |s| s.confidence_floor),
            frequency_saturation: pick(bs, os, |s| s.frequency_saturation),
            high_tier: pick(bs, os, |s| s.high_tier),
            medium_tier: pick(bs, os, |s| s.medium_tier),
        }),
        concurrency: Some(ConcurrencySection {
            num_workers: pick(bc, oc, |c| c.num_workers),
            document_timeout_secs: pick(bc, oc, |c| c.document_timeout_secs),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_parses() {
        let toml_str = "[extraction]\nmin_frequency = 3\n\n[scoring]\nconfidence_floor = 0.2\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.extraction.unwrap().min_frequency, Some(3));
        assert_eq!(parsed.scoring.unwrap().confidence_floor, Some(0.2));
        assert!(parsed.validation.is_none());
    }

    #[test]
    fn round_trip_toml() {
        let config = ConfigFile {
            validation: Some(ValidationSection {
                extra_acronyms: Some(vec!["HACCP".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.validation.unwrap().extra_acronyms.unwrap(),
            vec!["HACCP".to_string()]
        );
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            extraction: Some(ExtractionSection {
                min_frequency: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            extraction: Some(ExtractionSection {
                min_frequency: Some(4),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        assert_eq!(merged.extraction.unwrap().min_frequency, Some(4));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            definitions: Some(DefinitionsSection {
                context_radius: Some(150),
                ..Default::default()
            }),
            concurrency: Some(ConcurrencySection {
                num_workers: Some(3),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.definitions.unwrap().context_radius, Some(150));
        assert_eq!(merged.concurrency.unwrap().num_workers, Some(3));
    }

    #[test]
    fn missing_file_loads_as_none() {
        assert!(load_from_path(Path::new("/nonexistent/glossa/config.toml")).is_none());
    }
}
