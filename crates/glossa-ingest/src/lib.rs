use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use glossa_extract::config::LanguageProfile;

// Re-export domain types for convenience
pub use glossa_core::{Document, Language};

/// File extensions [`load_document`] understands.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "json"];

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("unsupported language tag: {0}")]
    UnsupportedLanguage(String),
}

/// On-disk shape of a `.json` document.
#[derive(Debug, Deserialize)]
struct JsonDocument {
    source_id: Option<String>,
    language: Option<String>,
    pages: Vec<String>,
}

/// Whether `path` has an extension [`load_document`] can read.
pub fn is_supported_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Expand directories into the supported files they contain (sorted, not
/// recursive). Plain file paths are passed through unchanged.
pub fn collect_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, IngestError> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|source| IngestError::Io {
                path: path.clone(),
                source,
            })?;
            let mut found: Vec<PathBuf> = entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_supported_path(p))
                .collect();
            found.sort();
            out.extend(found);
        } else {
            out.push(path.clone());
        }
    }
    Ok(out)
}

/// Load a document from a page-text file.
///
/// Dispatches on the file extension:
/// - `.txt` → pages separated by form feeds (`pdftotext` output)
/// - `.json` → `{ "source_id"?, "language"?, "pages": [..] }`
///
/// `language` overrides whatever the file declares. With neither, the
/// language is guessed from the text.
pub fn load_document(path: &Path, language: Option<Language>) -> Result<Document, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let raw = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let default_id = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let (source_id, declared, pages) = match ext.as_str() {
        "txt" => (default_id, None, split_pages(&raw)),
        "json" => {
            let doc: JsonDocument =
                serde_json::from_str(&raw).map_err(|source| IngestError::Json {
                    path: path.to_path_buf(),
                    source,
                })?;
            let declared = doc
                .language
                .map(|tag| {
                    tag.parse::<Language>()
                        .map_err(|_| IngestError::UnsupportedLanguage(tag))
                })
                .transpose()?;
            (doc.source_id.unwrap_or(default_id), declared, doc.pages)
        }
        _ => return Err(IngestError::UnsupportedFormat(path.to_path_buf())),
    };

    let language = match language.or(declared) {
        Some(l) => l,
        None => {
            let guessed = guess_language(&pages);
            tracing::debug!(source_id = %source_id, language = %guessed, "guessed document language");
            guessed
        }
    };

    Ok(Document::new(source_id, language, pages))
}

/// Split `pdftotext` output into pages. A trailing form feed does not open
/// a new page.
pub fn split_pages(text: &str) -> Vec<String> {
    let text = text.strip_suffix('\u{000C}').unwrap_or(text);
    text.split('\u{000C}').map(str::to_string).collect()
}

/// Guess the document language by counting stop-word hits. Ties go to English.
pub fn guess_language(pages: &[String]) -> Language {
    let profiles: Vec<(Language, HashSet<String>)> = Language::ALL
        .iter()
        .map(|&l| (l, LanguageProfile::for_language(l).function_words))
        .collect();

    let mut best = (Language::En, 0usize);
    for (language, words) in &profiles {
        let hits = pages
            .iter()
            .flat_map(|p| p.split(|c: char| !c.is_alphabetic()))
            .filter(|w| !w.is_empty() && words.contains(&w.to_lowercase()))
            .count();
        if hits > best.1 {
            best = (*language, hits);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_txt_splits_on_form_feed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "manual.txt", "Page one text.\x0cPage two text.\x0c");
        let doc = load_document(&path, Some(Language::En)).unwrap();
        assert_eq!(doc.source_id, "manual.txt");
        assert_eq!(doc.pages, vec!["Page one text.", "Page two text."]);
        assert_eq!(doc.language, Language::En);
    }

    #[test]
    fn test_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "doc.json",
            r#"{"source_id": "SOP-12", "language": "german", "pages": ["Der Bioreaktor.", ""]}"#,
        );
        let doc = load_document(&path, None).unwrap();
        assert_eq!(doc.source_id, "SOP-12");
        assert_eq!(doc.language, Language::De);
        assert_eq!(doc.pages.len(), 2);

        // Explicit language wins over the declared one
        let doc = load_document(&path, Some(Language::En)).unwrap();
        assert_eq!(doc.language, Language::En);
    }

    #[test]
    fn test_json_defaults_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "plain.json", r#"{"pages": ["The pump is on the left."]}"#);
        let doc = load_document(&path, None).unwrap();
        assert_eq!(doc.source_id, "plain.json");
        assert_eq!(doc.language, Language::En);

        let bad = write(&dir, "bad.json", r#"{"pages": "nope"}"#);
        assert!(matches!(load_document(&bad, None), Err(IngestError::Json { .. })));

        let fr = write(&dir, "fr.json", r#"{"language": "fr", "pages": []}"#);
        assert!(matches!(
            load_document(&fr, None),
            Err(IngestError::UnsupportedLanguage(ref t)) if t == "fr"
        ));
    }

    #[test]
    fn test_unsupported_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write(&dir, "paper.pdf", "%PDF-1.7");
        assert!(matches!(
            load_document(&pdf, None),
            Err(IngestError::UnsupportedFormat(_))
        ));
        let missing = dir.path().join("missing.txt");
        assert!(matches!(load_document(&missing, None), Err(IngestError::Io { .. })));
    }

    #[test]
    fn test_guess_language() {
        let de = vec!["Der Bioreaktor wird mit dem Dampf und der Lauge gereinigt.".to_string()];
        assert_eq!(guess_language(&de), Language::De);
        let en = vec!["The bioreactor is cleaned with steam and the caustic.".to_string()];
        assert_eq!(guess_language(&en), Language::En);
        assert_eq!(guess_language(&[]), Language::En);
    }

    #[test]
    fn test_is_supported_path() {
        assert!(is_supported_path(Path::new("a/b.txt")));
        assert!(is_supported_path(Path::new("b.JSON")));
        assert!(!is_supported_path(Path::new("b.pdf")));
        assert!(!is_supported_path(Path::new("README")));
    }

    #[test]
    fn test_collect_paths_expands_directories() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "b.txt", "x");
        write(&dir, "a.json", "{}");
        write(&dir, "c.pdf", "x");
        let single = PathBuf::from("explicit.txt");
        let paths = collect_paths(&[dir.path().to_path_buf(), single.clone()]).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.txt", "explicit.txt"]);
    }
}
