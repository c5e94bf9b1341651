// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! mediadate: Photo & Video Renamer
//!
//! Renames photos and videos after their capture date, optionally sorting
//! them into dated folders. Every real batch is recorded in a hidden history
//! file in the target directory so it can be undone.

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, info, warn};

use mediadate::config::AppConfig;
use mediadate::dates::ffprobe_available;
use mediadate::engine::{BatchReport, ExistingPolicy, OutcomeKind, RenameEngine, RenameOutcome, ScanPartition};
use mediadate::history::HistoryLedger;
use mediadate::{organizer, template, MediadateError, Result};

/// How many already-named files to show before asking what to do
const EXISTING_EXAMPLES: usize = 5;

/// mediadate CLI - Photo & Video Renamer
#[derive(Parser, Debug)]
#[command(name = "mediadate")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.3.0")]
#[command(about = "Rename photos and videos by capture date", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "mediadate.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rename media files in a directory (recursively)
    Rename {
        /// Directory to process
        dir: PathBuf,

        /// Show what would happen without renaming anything
        #[arg(long)]
        dry_run: bool,

        /// Naming template (overrides config)
        #[arg(short, long)]
        template: Option<String>,

        /// Folder scheme: none, year, year-month, date (overrides config)
        #[arg(short, long)]
        organize: Option<String>,

        /// What to do with files that already have a generated name
        #[arg(long, default_value = "ask", value_parser = ["ask", "skip", "rerename", "abort"])]
        existing: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Do not record this batch in the history
        #[arg(long)]
        no_history: bool,
    },

    /// List media files and whether they already have a generated name
    Scan {
        /// Directory to scan
        dir: PathBuf,
    },

    /// Undo the most recent batch in a directory
    Undo {
        /// Directory whose last batch should be undone
        dir: PathBuf,

        /// Show what would be undone
        #[arg(long)]
        dry_run: bool,
    },

    /// History operations
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show template variables and folder schemes
    Templates,
}

#[derive(Subcommand, Debug)]
enum HistoryCommands {
    /// List recorded batches
    List {
        /// Directory whose history to show
        dir: PathBuf,
    },

    /// Clear all history
    Clear {
        /// Directory whose history to clear
        dir: PathBuf,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "mediadate.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration file
    Validate,
}

/// Options of the `rename` subcommand
#[derive(Debug)]
struct RenameOptions {
    dry_run: bool,
    template: Option<String>,
    organize: Option<String>,
    existing: String,
    yes: bool,
    no_history: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    debug!("mediadate v1.3.0");

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Rename { dir, dry_run, template, organize, existing, yes, no_history } => {
            let options = RenameOptions { dry_run, template, organize, existing, yes, no_history };
            run_rename(config, dir, options, &cli.format, cli.quiet).await
        }
        Commands::Scan { dir } => run_scan(config, dir, &cli.format),
        Commands::Undo { dir, dry_run } => run_undo(dir, dry_run),
        Commands::History { action } => run_history_command(action, &cli.format),
        Commands::Config { action } => run_config_command(config, action, &cli.config),
        Commands::Templates => {
            println!("{}", template::help_text());
            println!();
            println!("{}", organizer::help_text());
            Ok(())
        }
    }
}

/// Run a rename batch
async fn run_rename(
    mut config: AppConfig,
    dir: PathBuf,
    options: RenameOptions,
    format: &str,
    quiet: bool,
) -> Result<()> {
    if let Some(template) = options.template {
        config.naming.template = template;
    }
    if let Some(scheme) = options.organize {
        config.naming.folder_scheme = scheme.parse()?;
    }
    config.validate()?;

    let engine = Arc::new(RenameEngine::from_config(&config)?);
    info!("Template: {}", engine.template());
    if engine.organizer().is_enabled() {
        info!("Folder scheme: {}", engine.organizer().description());
    }

    if config.metadata.use_ffprobe && !ffprobe_available(&config.metadata.ffprobe_path) {
        warn!(
            "'{}' not found; videos will be dated from file timestamps",
            config.metadata.ffprobe_path
        );
    }

    let partition = engine.scan(&dir)?;
    if partition.total() == 0 {
        println!("No supported media files found in {}", dir.display());
        return Ok(());
    }

    let policy = match options.existing.as_str() {
        "ask" if partition.already_named.is_empty() => ExistingPolicy::Skip,
        "ask" => ask_existing(&partition)?,
        other => other.parse()?,
    };

    let Some(files) = partition.select(policy) else {
        println!("Cancelled.");
        return Ok(());
    };
    if policy == ExistingPolicy::Skip && !partition.already_named.is_empty() && !quiet {
        println!("Skipping {} already-named file(s)", partition.already_named.len());
    }
    if files.is_empty() {
        println!("Nothing to rename.");
        return Ok(());
    }

    if options.dry_run {
        warn!("DRY RUN MODE - files will not be renamed");
    } else if !options.yes {
        let question = format!("Rename {} file(s) in {}?", files.len(), dir.display());
        if !confirm(&question)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    // Setup cooperative cancellation
    let cancel = Arc::new(AtomicBool::new(false));
    let signal_flag = Arc::clone(&cancel);
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Interrupted, stopping after the current file...");
        signal_flag.store(true, Ordering::Relaxed);
    });

    let worker = {
        let engine = Arc::clone(&engine);
        let cancel = Arc::clone(&cancel);
        let root = dir.clone();
        let format = format.to_string();
        let dry_run = options.dry_run;
        tokio::task::spawn_blocking(move || {
            engine.process_files(&root, &files, dry_run, Some(&*cancel), &mut |outcome| {
                print_outcome(outcome, &format, quiet)
            })
        })
    };
    let report = worker.await.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    signal_task.abort();

    if !options.dry_run && config.history.enabled && !options.no_history {
        let pairs = report.ledger_pairs();
        if !pairs.is_empty() {
            let mut ledger = HistoryLedger::open(&dir);
            ledger.record(pairs, "rename")?;
            debug!("History written to {:?}", ledger.path());
        }
    }

    print_summary(&report, format, options.dry_run);
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

fn print_outcome(outcome: &RenameOutcome, format: &str, quiet: bool) {
    match format {
        "jsonl" => match serde_json::to_string(outcome) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Cannot serialize outcome: {}", e),
        },
        "json" => {}
        _ => {
            if quiet && outcome.kind != OutcomeKind::Failed {
                return;
            }
            let marker = match outcome.kind {
                OutcomeKind::Renamed => "→",
                OutcomeKind::Failed => "✗",
                _ => "-",
            };
            println!("  {} {}", marker, outcome.message);
        }
    }
}

fn print_summary(report: &BatchReport, format: &str, dry_run: bool) {
    if format == "json" {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Cannot serialize report: {}", e),
        }
        return;
    }
    if format != "text" {
        return;
    }

    let stats = report.stats;
    println!();
    if report.cancelled {
        println!("Cancelled after {} file(s).", stats.total);
    }
    println!(
        "{}{} file(s): {} renamed, {} skipped, {} failed",
        if dry_run { "[DRY RUN] " } else { "" },
        stats.total,
        stats.renamed,
        stats.skipped,
        stats.failed
    );
}

/// Ask how to treat files that already carry a generated name
fn ask_existing(partition: &ScanPartition) -> Result<ExistingPolicy> {
    let count = partition.already_named.len();
    println!("{} file(s) already have a generated name, for example:", count);
    for path in partition.already_named.iter().take(EXISTING_EXAMPLES) {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("  {}", name);
    }
    if count > EXISTING_EXAMPLES {
        println!("  ... and {} more", count - EXISTING_EXAMPLES);
    }

    println!();
    println!("  [1] Skip them");
    println!("  [2] Rename them again");
    println!("  [0] Cancel");

    loop {
        let answer = prompt("Choice [1]: ")?;
        match answer.as_str() {
            "" | "1" => return Ok(ExistingPolicy::Skip),
            "2" => return Ok(ExistingPolicy::Rerename),
            "0" => return Ok(ExistingPolicy::Abort),
            _ => println!("Please enter 1, 2 or 0"),
        }
    }
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} Are you sure? [y/N]: ", question))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Read one trimmed line from stdin; end of input reads as empty
fn prompt(text: &str) -> Result<String> {
    print!("{}", text);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// List supported files without changing anything
fn run_scan(config: AppConfig, dir: PathBuf, format: &str) -> Result<()> {
    let engine = RenameEngine::from_config(&config)?;
    let partition = engine.scan(&dir)?;
    let rel = |p: &PathBuf| p.strip_prefix(&dir).unwrap_or(p.as_path()).to_string_lossy().into_owned();

    match format {
        "json" => {
            let output = serde_json::json!({
                "to_rename": partition.to_rename.iter().map(rel).collect::<Vec<_>>(),
                "already_named": partition.already_named.iter().map(rel).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "jsonl" => {
            for (path, named) in partition.to_rename.iter().map(|p| (p, false))
                .chain(partition.already_named.iter().map(|p| (p, true)))
            {
                let line = serde_json::json!({ "path": rel(path), "already_named": named });
                println!("{}", serde_json::to_string(&line)?);
            }
        }
        _ => {
            println!("To rename ({}):", partition.to_rename.len());
            for path in &partition.to_rename {
                println!("  {}", rel(path));
            }
            println!("Already named ({}):", partition.already_named.len());
            for path in &partition.already_named {
                println!("  {}", rel(path));
            }
        }
    }

    Ok(())
}

/// Undo the last recorded batch in `dir`
fn run_undo(dir: PathBuf, dry_run: bool) -> Result<()> {
    if !dir.is_dir() {
        return Err(MediadateError::NotADirectory(dir));
    }

    let mut ledger = HistoryLedger::open(&dir);
    if ledger.is_empty() {
        println!("{}", MediadateError::NothingToUndo);
        return Ok(());
    }

    if dry_run {
        for (pair, check) in ledger.plan_undo() {
            println!("  {:?}: {} -> {}", check, pair.new, pair.old);
        }
        return Ok(());
    }

    let report = ledger.undo();
    for line in &report.successes {
        println!("  → {}", line);
    }
    for line in &report.errors {
        println!("  ✗ {}", line);
    }
    println!(
        "Undone {} file(s), {} problem(s)",
        report.successes.len(),
        report.errors.len()
    );

    Ok(())
}

/// Run history commands
fn run_history_command(action: HistoryCommands, format: &str) -> Result<()> {
    match action {
        HistoryCommands::List { dir } => {
            let ledger = HistoryLedger::open(&dir);
            match format {
                "json" => println!("{}", serde_json::to_string_pretty(ledger.entries())?),
                "jsonl" => {
                    for entry in ledger.entries() {
                        println!("{}", serde_json::to_string(entry)?);
                    }
                }
                _ => print_history(&ledger),
            }
        }
        HistoryCommands::Clear { dir, force } => {
            if !force {
                eprintln!("Use --force to confirm clearing history");
                return Ok(());
            }
            let mut ledger = HistoryLedger::open(&dir);
            ledger.clear()?;
            println!("History cleared");
        }
    }

    Ok(())
}

fn print_history(ledger: &HistoryLedger) {
    if ledger.is_empty() {
        println!("No history in {}", ledger.base_dir().display());
        return;
    }

    println!("History ({} entries, most recent first):", ledger.len());
    for (i, entry) in ledger.entries().iter().enumerate() {
        println!("{:3}. [{}] {} ({} file(s))", i + 1, entry.timestamp, entry.operation, entry.files.len());
        for pair in &entry.files {
            println!("       {} -> {}", pair.old, pair.new);
        }
    }
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output, force } => {
            if output.exists() && !force {
                return Err(MediadateError::Config(format!(
                    "{:?} already exists. Use --force to overwrite", output
                )));
            }
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Template: {}", config.naming.template);
            println!("  Folder scheme: {}", config.naming.folder_scheme);
            println!(
                "  Extensions: {} photo, {} video",
                config.media.photo_extensions.len(),
                config.media.video_extensions.len()
            );
        }
    }

    Ok(())
}
