// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! mediadate Undo Utility
//!
//! Reverses batches recorded in a directory's rename history.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use mediadate::history::{HistoryLedger, UndoCheck};

#[derive(Parser, Debug)]
#[command(name = "mediadate-undo")]
#[command(version = "1.3.0")]
#[command(about = "Undo mediadate renames")]
struct Args {
    /// Directory holding the rename history
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Number of batches to undo (default: 1, use 0 for all)
    #[arg(short, long, default_value = "1")]
    count: usize,

    /// Dry run - show what the next undo would do without doing it
    #[arg(long)]
    dry_run: bool,

    /// List all entries in history
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let dir = args.dir.canonicalize()
        .with_context(|| format!("Cannot open directory {:?}", args.dir))?;
    if !dir.is_dir() {
        bail!("Not a directory: {:?}", dir);
    }

    let mut ledger = HistoryLedger::open(&dir);
    if ledger.is_empty() {
        println!("No history entries found in {:?}.", dir);
        return Ok(());
    }

    if args.list {
        println!("Rename History ({} entries):", ledger.len());
        println!("{:-<80}", "");
        for (i, entry) in ledger.entries().iter().enumerate() {
            println!(
                "{:3}. [{}] {} ({} file(s))",
                i + 1,
                entry.timestamp.get(..19).unwrap_or(&entry.timestamp), // Trim offset
                entry.operation,
                entry.files.len()
            );
            for pair in &entry.files {
                println!("     {} -> {}", pair.old, pair.new);
            }
        }
        return Ok(());
    }

    if args.dry_run {
        let plan = ledger.plan_undo();
        let ready = plan.iter().filter(|(_, check)| *check == UndoCheck::Ready).count();
        println!("[DRY RUN] Next undo covers {} file(s):", plan.len());
        for (pair, check) in &plan {
            let note = match check {
                UndoCheck::Ready => "would restore",
                UndoCheck::Missing => "skip, file not found",
                UndoCheck::Occupied => "skip, original path already exists",
                UndoCheck::Invalid => "skip, invalid entry",
            };
            println!("  {} -> {} ({})", pair.new, pair.old, note);
        }
        println!();
        println!("Dry run complete. {} file(s) would be restored.", ready);
        return Ok(());
    }

    let count = if args.count == 0 {
        ledger.len()
    } else {
        args.count.min(ledger.len())
    };
    println!("Undoing {} batch(es)...", count);

    let mut undone = 0;
    let mut failed = 0;

    for _ in 0..count {
        let report = ledger.undo();
        if let Some(entry) = &report.entry {
            println!("Batch from {}:", entry.timestamp);
        }
        for line in &report.successes {
            println!("  {}", line);
        }
        for line in &report.errors {
            eprintln!("  Skip: {}", line);
        }
        undone += report.successes.len();
        failed += report.errors.len();
    }

    println!();
    println!("Done. {} undone, {} failed/skipped.", undone, failed);
    if !ledger.is_empty() {
        println!("{} batch(es) left in history. Run again to undo more.", ledger.len());
    }

    Ok(())
}
