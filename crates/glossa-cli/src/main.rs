use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};
use glossa_core::config_file::{self, ConfigFile};
use glossa_core::pool::{default_workers, extract_all};
use glossa_core::{
    Document, DocumentExtractor, ExtractError, ExtractionReport, ExtractionResult, Language,
    ProgressEvent,
};
use glossa_extract::{PipelineConfigBuilder, TermExtractor};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Glossa - build bilingual glossaries from technical documents
#[derive(Parser, Debug)]
#[command(name = "glossa", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract terms and definitions from page-text files (.txt or .json)
    Extract {
        /// Files or directories to process
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Document language (en, de); guessed from the text when omitted
        #[arg(short, long)]
        language: Option<Language>,

        /// Minimum occurrences for a term to be kept
        #[arg(long)]
        min_frequency: Option<usize>,

        /// Context window radius around each occurrence, in bytes
        #[arg(long)]
        radius: Option<usize>,

        /// Path to a TOML config overlaid on the default cascade
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use pattern-based candidate generation only
        #[arg(long)]
        pattern_only: bool,

        /// Emit JSON instead of the text report
        #[arg(long)]
        json: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of documents processed concurrently
        #[arg(long)]
        workers: Option<usize>,

        /// Per-document timeout in seconds (0 disables)
        #[arg(long)]
        timeout: Option<u64>,

        /// Also list rejected and below-threshold candidates
        #[arg(long)]
        show_rejected: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Run one term through the validation rules
    Validate {
        term: String,

        #[arg(short, long, default_value = "en")]
        language: Language,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        no_color: bool,
    },

    /// Print the normalized page text of a file
    Normalize {
        file: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            files,
            language,
            min_frequency,
            radius,
            config,
            pattern_only,
            json,
            output,
            workers,
            timeout,
            show_rejected,
            no_color,
        } => {
            extract(ExtractArgs {
                files,
                language,
                min_frequency,
                radius,
                config,
                pattern_only,
                json,
                output,
                workers,
                timeout,
                show_rejected,
                no_color,
            })
            .await
        }
        Command::Validate {
            term,
            language,
            config,
            no_color,
        } => validate(&term, language, config.as_deref(), no_color),
        Command::Normalize { file, config } => normalize(&file, config.as_deref()),
    }
}

struct ExtractArgs {
    files: Vec<PathBuf>,
    language: Option<Language>,
    min_frequency: Option<usize>,
    radius: Option<usize>,
    config: Option<PathBuf>,
    pattern_only: bool,
    json: bool,
    output: Option<PathBuf>,
    workers: Option<usize>,
    timeout: Option<u64>,
    show_rejected: bool,
    no_color: bool,
}

/// Platform and working-directory config, with `explicit` overlaid last.
fn resolve_config_file(explicit: Option<&Path>) -> anyhow::Result<ConfigFile> {
    let base = config_file::load_config();
    let Some(path) = explicit else {
        return Ok(base);
    };
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    let overlay = config_file::load_from_path(path)
        .ok_or_else(|| anyhow::anyhow!("Could not parse config file {}", path.display()))?;
    Ok(config_file::merge(base, overlay))
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Give a document whose source id is already taken its full path instead.
fn dedupe_source_id(document: &mut Document, path: &Path, seen: &mut HashSet<String>) {
    if !seen.insert(document.source_id.clone()) {
        document.source_id = path.display().to_string();
        seen.insert(document.source_id.clone());
    }
}

/// Keeps the rejected and below-threshold candidates of the tracked
/// documents, by document index, until they are taken for reporting.
struct DiagnosticExtractor {
    inner: TermExtractor,
    index: HashMap<String, usize>,
    reports: Mutex<HashMap<usize, ExtractionReport>>,
}

impl DiagnosticExtractor {
    /// `tracked` lists the source ids whose reports are kept; an empty list
    /// keeps none.
    fn new(inner: TermExtractor, tracked: &[String]) -> Self {
        Self {
            inner,
            index: tracked
                .iter()
                .enumerate()
                .map(|(i, id)| (id.clone(), i))
                .collect(),
            reports: Mutex::new(HashMap::new()),
        }
    }

    fn take_report(&self, index: usize) -> Option<ExtractionReport> {
        self.reports.lock().ok()?.remove(&index)
    }
}

impl DocumentExtractor for DiagnosticExtractor {
    fn extract(&self, document: &Document) -> Result<ExtractionResult, ExtractError> {
        let Some(&index) = self.index.get(&document.source_id) else {
            return self.inner.extract(document);
        };
        let report = self.inner.extract_with_diagnostics(document)?;
        let result = report.result.clone();
        if let Ok(mut reports) = self.reports.lock() {
            reports.insert(index, report);
        }
        Ok(result)
    }
}

async fn extract(args: ExtractArgs) -> anyhow::Result<()> {
    use owo_colors::OwoColorize;

    // Resolve configuration: CLI flags > env vars > config file > defaults
    let file_config = resolve_config_file(args.config.as_deref())?;
    let mut builder = PipelineConfigBuilder::from_config_file(&file_config);
    if let Some(n) = args
        .min_frequency
        .or_else(|| env_parse("GLOSSA_MIN_FREQUENCY"))
    {
        builder = builder.min_frequency(n);
    }
    if let Some(radius) = args.radius {
        builder = builder.context_radius(radius);
    }
    if args.pattern_only {
        builder = builder.pattern_only();
    }
    let pipeline = builder.build()?;

    let concurrency = file_config.concurrency.clone().unwrap_or_default();
    let num_workers = args
        .workers
        .or_else(|| env_parse("GLOSSA_WORKERS"))
        .or(concurrency.num_workers)
        .unwrap_or_else(default_workers)
        .max(1);
    let timeout = args
        .timeout
        .or_else(|| env_parse("GLOSSA_TIMEOUT"))
        .or(concurrency.document_timeout_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    // Determine color mode and output writer
    let color = ColorMode(!args.no_color && args.output.is_none() && !args.json);
    let mut writer: Box<dyn Write> = if let Some(ref output_path) = args.output {
        Box::new(std::fs::File::create(output_path)?)
    } else {
        Box::new(std::io::stdout())
    };

    // Load documents; unreadable files are reported and skipped
    let paths = glossa_ingest::collect_paths(&args.files)?;
    let mut documents = Vec::with_capacity(paths.len());
    let mut seen = HashSet::new();
    for path in &paths {
        match glossa_ingest::load_document(path, args.language) {
            Ok(mut doc) => {
                dedupe_source_id(&mut doc, path, &mut seen);
                documents.push(doc);
            }
            Err(e) => {
                if color.enabled() {
                    eprintln!("{} {}", "SKIPPED".yellow(), e);
                } else {
                    eprintln!("SKIPPED {}", e);
                }
            }
        }
    }
    if documents.is_empty() {
        anyhow::bail!("No readable documents among the given paths");
    }
    let source_ids: Vec<String> = documents.iter().map(|d| d.source_id.clone()).collect();

    let tracked: &[String] = if args.show_rejected { &source_ids } else { &[] };
    let extractor = Arc::new(DiagnosticExtractor::new(TermExtractor::new(pipeline), tracked));

    // Progress bar for multi-document runs
    let bar = if documents.len() > 1 {
        let bar = indicatif::ProgressBar::new(documents.len() as u64);
        bar.set_style(indicatif::ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}",
        )?);
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    } else {
        indicatif::ProgressBar::hidden()
    };
    let progress_cb = {
        let bar = bar.clone();
        move |event: ProgressEvent| match event {
            ProgressEvent::Started { source_id, .. } => bar.set_message(source_id),
            ProgressEvent::Finished { .. } | ProgressEvent::Skipped { .. } => bar.inc(1),
            ProgressEvent::Failed {
                source_id, message, ..
            } => {
                bar.println(format!("FAILED {source_id}: {message}"));
                bar.inc(1);
            }
        }
    };

    let cancel = CancellationToken::new();

    // Set up Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    tracing::info!(documents = documents.len(), workers = num_workers, "starting extraction");
    let results = extract_all(
        extractor.clone(),
        documents,
        cancel.clone(),
        num_workers,
        timeout,
        progress_cb,
    )
    .await;
    bar.finish_and_clear();

    let failed = results.iter().filter(|r| r.is_err()).count();

    if args.json {
        if args.show_rejected {
            let reports: Vec<ExtractionReport> = results
                .iter()
                .enumerate()
                .filter_map(|(i, r)| Some((i, r.as_ref().ok()?)))
                .map(|(i, r)| {
                    extractor
                        .take_report(i)
                        .unwrap_or_else(|| ExtractionReport {
                            result: r.clone(),
                            rejected: Vec::new(),
                            below_frequency: Vec::new(),
                        })
                })
                .collect();
            serde_json::to_writer_pretty(&mut writer, &reports)?;
        } else {
            let successes: Vec<&ExtractionResult> =
                results.iter().filter_map(|r| r.as_ref().ok()).collect();
            serde_json::to_writer_pretty(&mut writer, &successes)?;
        }
        writeln!(writer)?;
        for (source_id, result) in source_ids.iter().zip(&results) {
            if let Err(e) = result {
                output::print_failure(&mut std::io::stderr(), source_id, e, ColorMode(false))?;
            }
        }
    } else {
        let mut successes = Vec::with_capacity(results.len());
        for (i, (source_id, result)) in source_ids.iter().zip(results).enumerate() {
            match result {
                Ok(result) => {
                    output::print_document_report(&mut writer, &result, color)?;
                    if let Some(report) = extractor.take_report(i)
                    {
                        output::print_rejected(
                            &mut writer,
                            &report.rejected,
                            &report.below_frequency,
                            color,
                        )?;
                    }
                    successes.push(result);
                }
                Err(e) => output::print_failure(&mut writer, source_id, &e, color)?,
            }
        }
        output::print_summary(&mut writer, &successes, failed, color)?;
    }

    if cancel.is_cancelled() {
        eprintln!("Cancelled; remaining documents were skipped.");
    }
    if failed == source_ids.len() {
        anyhow::bail!("All {} documents failed", failed);
    }
    Ok(())
}

fn validate(
    term: &str,
    language: Language,
    config: Option<&Path>,
    no_color: bool,
) -> anyhow::Result<()> {
    let file_config = resolve_config_file(config)?;
    let pipeline = PipelineConfigBuilder::from_config_file(&file_config).build()?;
    let verdict = glossa_extract::validator::validate(term, pipeline.validation(language));
    output::print_verdict(&mut std::io::stdout(), term, &verdict, ColorMode(!no_color))?;
    Ok(())
}

fn normalize(file: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let file_config = resolve_config_file(config)?;
    let pipeline = PipelineConfigBuilder::from_config_file(&file_config).build()?;
    let document = glossa_ingest::load_document(file, None)?;
    let normalized = TermExtractor::new(pipeline).normalize_pages(&document);

    let mut out = std::io::stdout().lock();
    for i in 0..normalized.pages.len() {
        if i > 0 {
            write!(out, "\u{000C}")?;
        }
        writeln!(out, "{}", normalized.page_text(i))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(source_id: &str) -> Document {
        Document::new(
            source_id,
            Language::En,
            vec!["The Centrifuge is a machine that spins samples.".to_string(); 2],
        )
    }

    #[test]
    fn test_dedupe_source_id() {
        let mut seen = HashSet::new();
        let mut first = doc("manual.txt");
        let mut second = doc("manual.txt");
        dedupe_source_id(&mut first, Path::new("a/manual.txt"), &mut seen);
        dedupe_source_id(&mut second, Path::new("b/manual.txt"), &mut seen);
        assert_eq!(first.source_id, "manual.txt");
        assert_eq!(second.source_id, Path::new("b/manual.txt").display().to_string());
    }

    #[test]
    fn test_reports_kept_only_for_tracked_documents() {
        let untracked = DiagnosticExtractor::new(TermExtractor::default(), &[]);
        assert!(untracked.extract(&doc("a.txt")).is_ok());
        assert!(untracked.take_report(0).is_none());

        let ids = vec!["a.txt".to_string(), "b.txt".to_string()];
        let tracked = DiagnosticExtractor::new(TermExtractor::default(), &ids);
        tracked.extract(&doc("b.txt")).unwrap();
        assert!(tracked.take_report(0).is_none());
        let report = tracked.take_report(1).unwrap();
        assert_eq!(report.result.source_id, "b.txt");
        // Taking a report frees it.
        assert!(tracked.take_report(1).is_none());
    }
}
