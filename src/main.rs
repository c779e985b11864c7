//! simcheck - duplicate detection across student project submissions.
//!
//! Usage:
//!   simcheck batch <SUBMISSIONS>    Fingerprint every submission and report
//!   simcheck analyze                Re-analyze an existing registry
//!   simcheck consolidate <PROJECT>  Write one project as a single listing
//!   simcheck profiles               List extension profiles
//!   simcheck --help                 Show help

mod logging;

use std::path::{Path, PathBuf};
use std::thread;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use strum::IntoEnumIterator;

use simcheck_analyze::{
    AnalyzerConfig, DuplicationAnalyzer, REPORT_FILE_NAME, SimilarityReport,
};
use simcheck_core::{
    ExtensionProfile, LoadStatus, ProfileKind, ProjectRegistry, REGISTRY_FILE_NAME,
    RegistryStore, ScanConfig,
};
use simcheck_scan::{
    BatchConfig, BatchProgress, BatchRunner, BatchSummary, LISTING_DIR, Listing, ListingHeader,
    detect_project_type, load_submission, mode_label, write_listing,
};

#[derive(Parser)]
#[command(
    name = "simcheck",
    version,
    about = "Duplicate detection across student project submissions",
    long_about = "simcheck fingerprints every submission in a directory, keeps the \
                  fingerprints in a JSON registry and reports identical projects, \
                  partial copies and the files copied most often."
)]
struct Cli {
    /// Log progress (overridden by SIMCHECK_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fingerprint all submissions, update the registry and write the report
    Batch {
        /// Directory with one subdirectory per submitter
        submissions: PathBuf,

        /// Output directory for the registry and the report
        #[arg(short, long, default_value = "resultados")]
        output: PathBuf,

        /// Also write a consolidated listing per submission under <OUTPUT>/consolidado
        #[arg(short, long)]
        consolidate: bool,

        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        thresholds: Thresholds,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Analyze an existing registry without scanning
    Analyze {
        /// Registry file
        #[arg(short, long, default_value = "resultados/hashes_database.json")]
        registry: PathBuf,

        /// Report file (defaults to reporte_similitud.json next to the registry)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        thresholds: Thresholds,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a single project directory as one consolidated listing
    Consolidate {
        /// Project directory
        project: PathBuf,

        /// Listing file (defaults to <PROJECT NAME>_consolidated.md)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Student name for the listing header
        #[arg(long)]
        student: Option<String>,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// List the available extension profiles
    Profiles,
}

#[derive(Args)]
struct ScanArgs {
    /// Extension profile
    #[arg(short, long, default_value = "full")]
    mode: ProfileKind,

    /// Comma-separated extensions for the custom profile (e.g. ".java,.xml")
    #[arg(short, long)]
    extensions: Option<String>,

    /// Also descend into directories whose name contains "test"
    #[arg(long)]
    include_tests: bool,

    /// Extra glob patterns to ignore, relative to the project root
    #[arg(short, long)]
    ignore: Vec<String>,
}

impl ScanArgs {
    fn config(self) -> Result<ScanConfig> {
        let profile = ExtensionProfile::from_kind(self.mode, self.extensions.as_deref())
            .context("Invalid extension profile")?;
        ScanConfig::builder()
            .profile(profile)
            .include_tests(self.include_tests)
            .ignore_patterns(self.ignore)
            .build()
            .context("Invalid scan configuration")
    }
}

#[derive(Args)]
struct Thresholds {
    /// Shared files needed to report a partial copy
    #[arg(long, default_value = "3")]
    min_common: usize,

    /// Submitters needed to list a file as widely copied
    #[arg(long, default_value = "3")]
    min_shared: usize,
}

impl Thresholds {
    fn analyzer(&self) -> Result<DuplicationAnalyzer> {
        let config = AnalyzerConfig::builder()
            .min_common_files(self.min_common)
            .min_shared_submitters(self.min_shared)
            .build()
            .context("Invalid analysis thresholds")?;
        Ok(DuplicationAnalyzer::with_config(config))
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    match cli.command {
        Command::Batch {
            submissions,
            output,
            consolidate,
            scan,
            thresholds,
            format,
        } => {
            let scan = scan.config()?;
            let analyzer = thresholds.analyzer()?;
            let config = BatchConfig::new(submissions, scan);
            run_batch(config, &output, consolidate, &analyzer, format)?;
        }
        Command::Analyze {
            registry,
            output,
            thresholds,
            format,
        } => {
            let analyzer = thresholds.analyzer()?;
            run_analyze(&registry, output, &analyzer, format)?;
        }
        Command::Consolidate {
            project,
            output,
            student,
            scan,
        } => {
            run_consolidate(&project, output, student, &scan.config()?)?;
        }
        Command::Profiles => print_profiles(),
    }

    Ok(())
}

/// Fingerprint every submission, persist the registry and report.
fn run_batch(
    config: BatchConfig,
    output: &Path,
    consolidate: bool,
    analyzer: &DuplicationAnalyzer,
    format: OutputFormat,
) -> Result<()> {
    let store = RegistryStore::in_dir(output);
    let (mut registry, status) = store.load();
    report_load_status(&store, &status);

    eprintln!(
        "Processing {} (profile: {})...",
        config.submissions_root.display(),
        config.scan.profile.kind()
    );

    let mut runner = BatchRunner::new();
    if consolidate {
        runner = runner.with_listings(output);
    }
    let progress_rx = runner.subscribe();
    let printer = thread::spawn(move || print_progress(progress_rx));

    let summary = runner.run(&config, &mut registry);
    drop(runner);
    let _ = printer.join();
    let summary = summary.context("Batch failed")?;

    store
        .save(&mut registry)
        .wrap_err_with(|| format!("Could not save registry {}", store.path().display()))?;

    if let OutputFormat::Text = format {
        print_tally(&summary);
        if consolidate {
            let written = summary
                .outcomes
                .iter()
                .filter(|o| o.result.as_ref().is_ok_and(|stats| stats.listing.is_some()))
                .count();
            println!(
                " {written} listing(s) written to {}",
                output.join(LISTING_DIR).display()
            );
        }
    }
    if summary.succeeded() == 0 && !summary.is_empty() {
        tracing::warn!("no submission could be fingerprinted");
    }

    let report_path = output.join(REPORT_FILE_NAME);
    analyze_and_write(&registry, analyzer, &report_path, format)
}

/// Re-run the analysis over a stored registry.
fn run_analyze(
    registry_path: &Path,
    output: Option<PathBuf>,
    analyzer: &DuplicationAnalyzer,
    format: OutputFormat,
) -> Result<()> {
    if !registry_path.is_file() {
        bail!("Registry not found: {}", registry_path.display());
    }

    let store = RegistryStore::new(registry_path);
    let (registry, status) = store.load();
    report_load_status(&store, &status);
    if let LoadStatus::Recovered { reason } = status {
        bail!("Registry {} is unusable: {reason}", registry_path.display());
    }

    let report_path = output.unwrap_or_else(|| {
        registry_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(REPORT_FILE_NAME)
    });
    analyze_and_write(&registry, analyzer, &report_path, format)
}

/// Render one project directory as a consolidated listing.
fn run_consolidate(
    project: &Path,
    output: Option<PathBuf>,
    student: Option<String>,
    scan: &ScanConfig,
) -> Result<()> {
    if !project.is_dir() {
        bail!("Project directory not found: {}", project.display());
    }

    let name = project
        .canonicalize()
        .ok()
        .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "project".to_string());
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{name}_consolidated.md")));

    let project_type = detect_project_type(project);
    let sources = load_submission(project, scan)
        .wrap_err_with(|| format!("Could not collect sources from {}", project.display()))?;
    let mut header = ListingHeader::new(name, project, project_type, mode_label(scan));
    if let Some(student) = student {
        header = header.with_student(student);
    }

    let stats = write_listing(&output, &Listing::new(&header, &sources))
        .wrap_err_with(|| format!("Could not write listing {}", output.display()))?;

    let size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
    println!(" Project type: {project_type}");
    println!(
        " {} files, {} lines ({} Java, {} other)",
        stats.files,
        stats.lines,
        stats.java_files,
        stats.other_files()
    );
    println!(" Listing written to {} ({})", output.display(), format_size(size));
    Ok(())
}

fn analyze_and_write(
    registry: &ProjectRegistry,
    analyzer: &DuplicationAnalyzer,
    report_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let result = analyzer.analyze(registry);
    let report = SimilarityReport::assemble(registry, &result);
    report
        .write_json(report_path)
        .wrap_err_with(|| format!("Could not write report {}", report_path.display()))?;

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Similarity Report");
            println!("{}", "─".repeat(70));
            println!();
            for line in report.summary_lines() {
                println!(" {line}");
            }
            println!();
            let size = std::fs::metadata(report_path).map(|m| m.len()).unwrap_or(0);
            println!(
                " Report written to {} ({})",
                report_path.display(),
                format_size(size)
            );
        }
        OutputFormat::Json => {
            println!("{}", report.to_json()?);
        }
    }

    Ok(())
}

fn report_load_status(store: &RegistryStore, status: &LoadStatus) {
    match status {
        LoadStatus::Loaded { projects } => {
            eprintln!("Loaded {} ({} projects)", store.path().display(), projects);
        }
        LoadStatus::Fresh => {
            eprintln!("Starting a new registry at {}", store.path().display());
        }
        LoadStatus::Recovered { reason } => {
            eprintln!(
                "Warning: ignoring unusable registry {} ({reason})",
                store.path().display()
            );
        }
    }
}

/// Print one line per processed submission until the runner is dropped.
fn print_progress(mut rx: tokio::sync::broadcast::Receiver<BatchProgress>) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        match rx.blocking_recv() {
            Ok(progress) => eprintln!(
                "  [{:>3}/{}] {}",
                progress.processed, progress.total, progress.current
            ),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_tally(summary: &BatchSummary) {
    println!();
    println!(
        " {} submissions: {} fingerprinted, {} failed ({:.2}s)",
        summary.len(),
        summary.succeeded(),
        summary.failed(),
        summary.elapsed.as_secs_f64()
    );

    for outcome in &summary.outcomes {
        let Ok(stats) = &outcome.result else {
            continue;
        };
        if !stats.unreadable.is_empty() {
            println!(
                "   {}: {} unreadable file(s) skipped",
                outcome.identity,
                stats.unreadable.len()
            );
        }
        if stats.ignored_archives > 0 {
            println!(
                "   {}: {} extra archive(s) ignored",
                outcome.identity, stats.ignored_archives
            );
        }
    }

    let failures: Vec<_> = summary.failures().collect();
    if !failures.is_empty() {
        println!();
        println!(" Failed submissions:");
        for outcome in failures {
            println!(
                "   {:<24} {}",
                outcome.identity,
                outcome.reason().unwrap_or_default()
            );
        }
    }
}

fn print_profiles() {
    println!();
    for kind in ProfileKind::iter() {
        println!(" {:<8} {}", kind.to_string(), kind.description());
        if let Ok(profile) = ExtensionProfile::from_kind(kind, None) {
            println!("          {}", profile.extensions().join(" "));
        }
    }
    println!();
    println!(" Registry file: {REGISTRY_FILE_NAME}");
    println!(" Report file:   {REPORT_FILE_NAME}");
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
