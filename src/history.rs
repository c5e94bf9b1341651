// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! History management for undo support
//!
//! Each base directory keeps its own ledger in `.rename_history.json`: a JSON
//! array of batches, newest first, capped at [`MAX_HISTORY_SIZE`]. Paths in
//! the ledger are relative to the base directory and use `/` separators, so
//! the directory can be moved without invalidating its history.

use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::{MediadateError, Result};

/// Name of the ledger file inside the base directory
pub const HISTORY_FILENAME: &str = ".rename_history.json";

/// Number of batches kept
pub const MAX_HISTORY_SIZE: usize = 10;

fn default_operation() -> String {
    "rename".to_string()
}

/// One renamed file, both paths relative to the base directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePair {
    #[serde(default)]
    pub old: String,
    #[serde(default)]
    pub new: String,
}

impl FilePair {
    /// Pair for two relative paths, `None` if either is not a plain relative path
    pub fn new(old: &Path, new: &Path) -> Option<Self> {
        Some(Self {
            old: to_ledger_path(old)?,
            new: to_ledger_path(new)?,
        })
    }
}

/// A recorded batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    #[serde(default = "default_operation")]
    pub operation: String,
    #[serde(default)]
    pub files: Vec<FilePair>,
}

/// Write a relative path with `/` separators.
///
/// Returns `None` for empty paths and for paths with a root, a prefix or
/// `..`, which could not be replayed inside the base directory.
pub fn to_ledger_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Marks the ledger file hidden on platforms that have such an attribute
pub trait FileHider: Send + Sync {
    fn hide(&self, path: &Path) -> io::Result<()>;
    fn unhide(&self, path: &Path) -> io::Result<()>;
}

/// For platforms where the leading dot already hides the file
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHide;

impl FileHider for NoHide {
    fn hide(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn unhide(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// Sets the Windows hidden attribute through `attrib`
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct AttribHider;

#[cfg(windows)]
impl AttribHider {
    fn attrib(flag: &str, path: &Path) -> io::Result<()> {
        let status = std::process::Command::new("attrib")
            .arg(flag)
            .arg(path)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::Other, format!("attrib {} failed", flag)))
        }
    }
}

#[cfg(windows)]
impl FileHider for AttribHider {
    fn hide(&self, path: &Path) -> io::Result<()> {
        Self::attrib("+h", path)
    }

    fn unhide(&self, path: &Path) -> io::Result<()> {
        Self::attrib("-h", path)
    }
}

/// Hider for the current platform
pub fn platform_hider() -> Box<dyn FileHider> {
    #[cfg(windows)]
    {
        Box::new(AttribHider)
    }
    #[cfg(not(windows))]
    {
        Box::new(NoHide)
    }
}

/// State of one pair when the undo is attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoCheck {
    /// Can be moved back
    Ready,
    /// The renamed file is gone
    Missing,
    /// Something already sits at the original path
    Occupied,
    /// Empty, absolute or escaping path in the ledger
    Invalid,
}

/// Outcome of [`HistoryLedger::undo`]
#[derive(Debug, Clone, Default)]
pub struct UndoReport {
    /// True if at least one file was moved back
    pub any_success: bool,
    pub successes: Vec<String>,
    pub errors: Vec<String>,
    /// The entry that was consumed, if any
    pub entry: Option<HistoryEntry>,
}

/// Ledger of recent batches for one base directory
pub struct HistoryLedger {
    base_dir: PathBuf,
    path: PathBuf,
    entries: Vec<HistoryEntry>,
    hider: Box<dyn FileHider>,
}

impl HistoryLedger {
    /// Open the ledger of `base_dir`; missing or unreadable files give an empty ledger
    pub fn open(base_dir: &Path) -> Self {
        Self::with_hider(base_dir, platform_hider())
    }

    pub fn with_hider(base_dir: &Path, hider: Box<dyn FileHider>) -> Self {
        let path = base_dir.join(HISTORY_FILENAME);
        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("{}; starting with empty history", e);
                Vec::new()
            }
        };

        Self {
            base_dir: base_dir.to_path_buf(),
            path,
            entries,
            hider,
        }
    }

    fn load(path: &Path) -> Result<Vec<HistoryEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| MediadateError::LedgerCorrupt(format!("{:?}: {}", path, e)))?;
        serde_json::from_str(&content)
            .map_err(|e| MediadateError::LedgerCorrupt(format!("{:?}: {}", path, e)))
    }

    fn save(&self) -> Result<()> {
        if self.path.exists() {
            if let Err(e) = self.hider.unhide(&self.path) {
                debug!("Could not clear hidden attribute on {:?}: {}", self.path, e);
            }
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;

        if let Err(e) = self.hider.hide(&self.path) {
            debug!("Could not hide {:?}: {}", self.path, e);
        }

        Ok(())
    }

    /// Record a batch of renames; an empty batch is ignored.
    ///
    /// The in-memory ledger is updated even if writing the file fails.
    pub fn record(&mut self, files: Vec<FilePair>, operation: &str) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }

        let entry = HistoryEntry {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            operation: operation.to_string(),
            files,
        };
        info!("Recording {} file(s) in history", entry.files.len());

        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY_SIZE);

        self.save().map_err(|e| {
            error!("Failed to save history to {:?}: {}", self.path, e);
            e
        })
    }

    /// Check the most recent batch without touching anything
    pub fn plan_undo(&self) -> Vec<(FilePair, UndoCheck)> {
        self.entries
            .first()
            .map(|entry| {
                entry.files.iter()
                    .rev()
                    .map(|pair| (pair.clone(), self.check(pair)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check(&self, pair: &FilePair) -> UndoCheck {
        let (Some(current), Some(original)) = (self.resolve(&pair.new), self.resolve(&pair.old)) else {
            return UndoCheck::Invalid;
        };

        if !current.exists() {
            UndoCheck::Missing
        } else if original.exists() {
            UndoCheck::Occupied
        } else {
            UndoCheck::Ready
        }
    }

    /// Absolute path for a ledger path, refusing anything outside the base directory
    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        if relative.is_empty() {
            return None;
        }
        let relative = Path::new(relative);
        let inside = relative.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        inside.then(|| self.base_dir.join(relative))
    }

    /// Reverse the most recent batch.
    ///
    /// Pairs are processed last-to-first. A pair whose renamed file is gone,
    /// or whose original path is taken, is reported and skipped. The batch is
    /// removed from the ledger whatever happened to the individual pairs.
    pub fn undo(&mut self) -> UndoReport {
        let mut report = UndoReport::default();

        if self.entries.is_empty() {
            report.errors.push(MediadateError::NothingToUndo.to_string());
            return report;
        }

        let entry = self.entries.remove(0);
        info!("Undoing batch from {} ({} file(s))", entry.timestamp, entry.files.len());

        for pair in entry.files.iter().rev() {
            match self.check(pair) {
                UndoCheck::Invalid => {
                    report.errors.push(format!("Invalid history entry: {:?} -> {:?}", pair.old, pair.new));
                    continue;
                }
                UndoCheck::Missing => {
                    report.errors.push(format!("File missing (deleted or moved): {}", pair.new));
                    continue;
                }
                UndoCheck::Occupied => {
                    report.errors.push(format!("Target already exists: {}", pair.old));
                    continue;
                }
                UndoCheck::Ready => {}
            }

            let current = self.base_dir.join(&pair.new);
            let original = self.base_dir.join(&pair.old);

            match self.restore(&current, &original) {
                Ok(()) => {
                    debug!("Restored {:?} -> {:?}", current, original);
                    report.successes.push(format!("Restored: {} -> {}", pair.new, pair.old));
                    report.any_success = true;
                    self.prune_empty_parent(&current);
                }
                Err(e) => {
                    report.errors.push(format!("Failed to restore {}: {}", pair.new, e));
                }
            }
        }

        if let Err(e) = self.save() {
            error!("Failed to save history to {:?}: {}", self.path, e);
            report.errors.push(format!("Failed to save history: {}", e));
        }

        report.entry = Some(entry);
        report
    }

    fn restore(&self, current: &Path, original: &Path) -> io::Result<()> {
        if let Some(parent) = original.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::rename(current, original)
    }

    /// Remove the folder a file was moved out of, if it is now empty
    fn prune_empty_parent(&self, moved_from: &Path) {
        let Some(dir) = moved_from.parent() else {
            return;
        };
        if dir == self.base_dir {
            return;
        }
        // Fails on non-empty directories, which is expected
        if fs::remove_dir(dir).is_ok() {
            debug!("Removed empty directory {:?}", dir);
        }
    }

    /// Drop all history and delete the ledger file
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        if self.path.exists() {
            if let Err(e) = self.hider.unhide(&self.path) {
                debug!("Could not clear hidden attribute on {:?}: {}", self.path, e);
            }
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// Entries, newest first
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get history file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
