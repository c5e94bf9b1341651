// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Rename engine
//!
//! Processes files one at a time: classify, resolve a date, work out the
//! destination folder and a free name, then move the file. Each file yields a
//! [`RenameOutcome`]; one failing file never stops the batch.

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::dates::{DateResolver, MetadataDateResolver};
use crate::detector;
use crate::history::FilePair;
use crate::media::{DateSource, MediaClassifier, MediaKind, MediaRecord};
use crate::namer;
use crate::organizer::FolderOrganizer;
use crate::template::NamingTemplate;
use crate::{AppConfig, MediadateError, Result};

/// What happened to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Renamed,
    SkippedUnsupported,
    SkippedAlreadyNamed,
    SkippedNoChange,
    Failed,
}

impl OutcomeKind {
    pub fn is_skip(self) -> bool {
        matches!(
            self,
            OutcomeKind::SkippedUnsupported | OutcomeKind::SkippedAlreadyNamed | OutcomeKind::SkippedNoChange
        )
    }
}

/// Result of processing one file
#[derive(Debug, Clone, Serialize)]
pub struct RenameOutcome {
    pub kind: OutcomeKind,
    /// Path before the rename, relative to the batch root
    pub old_path: PathBuf,
    /// Path after the rename, relative to the batch root
    pub new_path: Option<PathBuf>,
    pub message: String,
    pub date_source: Option<DateSource>,
    pub simulated: bool,
}

impl RenameOutcome {
    fn skipped(kind: OutcomeKind, old_path: PathBuf, message: String) -> Self {
        Self { kind, old_path, new_path: None, message, date_source: None, simulated: false }
    }

    fn failed(old_path: PathBuf, message: String, date_source: Option<DateSource>) -> Self {
        Self { kind: OutcomeKind::Failed, old_path, new_path: None, message, date_source, simulated: false }
    }
}

/// Counts per outcome class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn add(&mut self, kind: OutcomeKind) {
        self.total += 1;
        match kind {
            OutcomeKind::Renamed => self.renamed += 1,
            OutcomeKind::Failed => self.failed += 1,
            _ => self.skipped += 1,
        }
    }
}

/// Outcomes of a batch plus totals
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<RenameOutcome>,
    pub stats: BatchStats,
    /// Stopped early through the cancel flag
    pub cancelled: bool,
    /// Abandoned before any file was processed
    pub aborted: bool,
}

impl BatchReport {
    fn push(&mut self, outcome: RenameOutcome) {
        self.stats.add(outcome.kind);
        self.outcomes.push(outcome);
    }

    /// Pairs to hand to the history ledger: real renames with relative paths
    pub fn ledger_pairs(&self) -> Vec<FilePair> {
        self.outcomes
            .iter()
            .filter(|o| o.kind == OutcomeKind::Renamed && !o.simulated)
            .filter_map(|o| FilePair::new(&o.old_path, o.new_path.as_ref()?))
            .collect()
    }
}

/// Supported files under a root, split by whether their name is already canonical
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPartition {
    pub already_named: Vec<PathBuf>,
    pub to_rename: Vec<PathBuf>,
}

impl ScanPartition {
    pub fn total(&self) -> usize {
        self.already_named.len() + self.to_rename.len()
    }

    /// Files to process under `policy`, `None` when the batch is abandoned.
    ///
    /// The policy only matters when canonical files were found.
    pub fn select(&self, policy: ExistingPolicy) -> Option<Vec<PathBuf>> {
        if self.already_named.is_empty() {
            return Some(self.to_rename.clone());
        }

        match policy {
            ExistingPolicy::Skip => Some(self.to_rename.clone()),
            ExistingPolicy::Rerename => {
                let mut all = self.to_rename.clone();
                all.extend(self.already_named.iter().cloned());
                Some(all)
            }
            ExistingPolicy::Abort => None,
        }
    }
}

/// What to do with files whose names are already canonical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingPolicy {
    /// Only process the others
    #[default]
    Skip,
    /// Process everything again
    Rerename,
    /// Do nothing
    Abort,
}

impl FromStr for ExistingPolicy {
    type Err = MediadateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skip" => Ok(ExistingPolicy::Skip),
            "rerename" => Ok(ExistingPolicy::Rerename),
            "abort" => Ok(ExistingPolicy::Abort),
            other => Err(MediadateError::Config(format!(
                "Unknown policy '{}'. Available: skip, rerename, abort", other
            ))),
        }
    }
}

/// Paths taken and given up by earlier files of a batch.
///
/// Tracked in memory so that a simulated batch sees the same free slots a
/// real one would.
#[derive(Debug, Default)]
struct BatchState {
    claimed: HashSet<PathBuf>,
    vacated: HashSet<PathBuf>,
}

impl BatchState {
    fn is_free(&self, candidate: &Path, source: &Path) -> bool {
        if self.claimed.contains(candidate) {
            return false;
        }
        candidate == source || self.vacated.contains(candidate) || !candidate.exists()
    }

    fn moved(&mut self, from: &Path, to: &Path) {
        self.vacated.insert(from.to_path_buf());
        self.claimed.insert(to.to_path_buf());
    }
}

/// The rename engine
pub struct RenameEngine {
    template: NamingTemplate,
    organizer: FolderOrganizer,
    classifier: MediaClassifier,
    resolver: Box<dyn DateResolver>,
}

impl RenameEngine {
    pub fn new<R>(
        template: NamingTemplate,
        organizer: FolderOrganizer,
        classifier: MediaClassifier,
        resolver: R,
    ) -> Self
    where
        R: DateResolver + 'static,
    {
        Self {
            template,
            organizer,
            classifier,
            resolver: Box::new(resolver),
        }
    }

    /// Engine configured from `config`, reading dates from file metadata
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            config.template()?,
            config.organizer(),
            MediaClassifier::from_config(&config.media),
            MetadataDateResolver::new(&config.metadata),
        ))
    }

    pub fn template(&self) -> &NamingTemplate {
        &self.template
    }

    pub fn organizer(&self) -> &FolderOrganizer {
        &self.organizer
    }

    pub fn classifier(&self) -> &MediaClassifier {
        &self.classifier
    }

    /// Recursively list supported files under `root` and split them by name
    pub fn scan(&self, root: &Path) -> Result<ScanPartition> {
        if !root.is_dir() {
            return Err(MediadateError::NotADirectory(root.to_path_buf()));
        }

        let mut files = Vec::new();
        walk(root, &mut files);
        files.sort();

        let mut partition = ScanPartition::default();
        for file in files {
            if !self.classifier.is_supported(&file) {
                continue;
            }
            if detector::is_canonical_path(&file) {
                partition.already_named.push(file);
            } else {
                partition.to_rename.push(file);
            }
        }

        debug!(
            "Scanned {:?}: {} already named, {} to rename",
            root,
            partition.already_named.len(),
            partition.to_rename.len()
        );
        Ok(partition)
    }

    /// Process a single file on its own
    pub fn process_one(&self, root: &Path, path: &Path, simulate: bool) -> RenameOutcome {
        self.process(root, path, simulate, &mut BatchState::default())
    }

    /// Process `files` in order.
    ///
    /// `cancel` is checked between files; `observer` sees each outcome as
    /// soon as it is produced.
    pub fn process_files(
        &self,
        root: &Path,
        files: &[PathBuf],
        simulate: bool,
        cancel: Option<&AtomicBool>,
        observer: &mut dyn FnMut(&RenameOutcome),
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut state = BatchState::default();

        for file in files {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                warn!("Batch cancelled after {} file(s)", report.stats.total);
                report.cancelled = true;
                break;
            }

            let outcome = self.process(root, file, simulate, &mut state);
            observer(&outcome);
            report.push(outcome);
        }

        info!(
            "Batch finished: {} total, {} renamed, {} skipped, {} failed",
            report.stats.total, report.stats.renamed, report.stats.skipped, report.stats.failed
        );
        report
    }

    /// Scan (unless `files` is given), apply `policy`, and process the result
    pub fn scan_and_process(
        &self,
        root: &Path,
        files: Option<Vec<PathBuf>>,
        policy: ExistingPolicy,
        simulate: bool,
    ) -> Result<BatchReport> {
        if let Some(files) = files {
            return Ok(self.process_files(root, &files, simulate, None, &mut |_| {}));
        }

        let partition = self.scan(root)?;
        let Some(selected) = partition.select(policy) else {
            info!("Batch abandoned: {} file(s) already named", partition.already_named.len());
            return Ok(BatchReport { aborted: true, ..BatchReport::default() });
        };

        let mut skipped = Vec::new();
        if policy == ExistingPolicy::Skip {
            for file in &partition.already_named {
                skipped.push(RenameOutcome::skipped(
                    OutcomeKind::SkippedAlreadyNamed,
                    relative_to(root, file),
                    format!("Already named: {}", display_name(file)),
                ));
            }
        }

        let mut report = self.process_files(root, &selected, simulate, None, &mut |_| {});
        for outcome in skipped {
            report.push(outcome);
        }
        Ok(report)
    }

    fn process(
        &self,
        root: &Path,
        path: &Path,
        simulate: bool,
        state: &mut BatchState,
    ) -> RenameOutcome {
        let name = display_name(path);
        let old_rel = match path.strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => {
                warn!("{:?} is outside the batch root {:?}", path, root);
                return RenameOutcome::failed(
                    path.to_path_buf(),
                    format!("Outside the batch root: {}", path.display()),
                    None,
                );
            }
        };

        let mut record = MediaRecord::new(path.to_path_buf(), &self.classifier);
        if record.kind == MediaKind::Unsupported {
            debug!("Unsupported file type: {:?}", path);
            return RenameOutcome::skipped(
                OutcomeKind::SkippedUnsupported,
                old_rel,
                format!("Skipped (unsupported format): {}", name),
            );
        }

        record.date = self.resolver.resolve(path, record.kind);
        let Some(resolved) = record.date else {
            warn!("Could not determine date for {:?}", path);
            return RenameOutcome::failed(old_rel, format!("Could not determine date: {}", name), None);
        };
        let source = Some(resolved.source);

        let parent = path.parent().unwrap_or(root);
        let base = self.organizer.anchor(parent, &resolved.date);
        let mut dest_dir = self.organizer.target_directory(base, &resolved.date);

        let rendered = self.template.render(&resolved.date, record.kind.label());
        let mut parts: Vec<&str> = rendered.split('/').filter(|p| !p.is_empty()).collect();
        let stem = match parts.pop() {
            Some(stem) if stem != "." && stem != ".." => stem,
            _ => {
                return RenameOutcome::failed(
                    old_rel,
                    format!("Template produced no usable name for {}", name),
                    source,
                );
            }
        };
        if parts.iter().any(|p| *p == "." || *p == "..") {
            return RenameOutcome::failed(
                old_rel,
                format!("Template produced a relative folder for {}: {}", name, rendered),
                source,
            );
        }
        for part in parts {
            dest_dir.push(part);
        }

        let is_free = |candidate: &Path| state.is_free(candidate, path);
        let new_name = match namer::unique_name_with(stem, &record.extension, &dest_dir, is_free) {
            Ok(new_name) => new_name,
            Err(e) => return RenameOutcome::failed(old_rel, format!("{}: {}", name, e), source),
        };
        let new_path = dest_dir.join(&new_name);

        if new_path == path {
            debug!("Name unchanged: {:?}", path);
            let mut outcome = RenameOutcome::skipped(
                OutcomeKind::SkippedNoChange,
                old_rel,
                format!("Already has the right name and place: {}", name),
            );
            outcome.date_source = source;
            return outcome;
        }

        if !simulate {
            if let Err(e) = move_file(path, &dest_dir, &new_path) {
                warn!("Failed to rename {:?}: {}", path, e);
                return RenameOutcome::failed(old_rel, format!("Failed to rename {}: {}", name, e), source);
            }
            info!("Renamed {:?} -> {:?}", path, new_path);
        }
        state.moved(path, &new_path);

        let mut message = format!(
            "{}{} -> {} (date: {})",
            if simulate { "[DRY RUN] " } else { "" },
            name,
            new_name,
            resolved.source
        );
        if dest_dir != parent {
            message.push_str(&format!(" (in {})", relative_to(root, &dest_dir).display()));
        }

        RenameOutcome {
            kind: OutcomeKind::Renamed,
            old_path: old_rel,
            new_path: Some(relative_to(root, &new_path)),
            message,
            date_source: source,
            simulated: simulate,
        }
    }
}

/// Create the destination folder if needed and move the file into it.
///
/// Folders created here are removed again if the move fails.
fn move_file(from: &Path, dest_dir: &Path, to: &Path) -> Result<()> {
    let top_created = highest_missing(dest_dir);
    FolderOrganizer::ensure_exists(dest_dir, false)?;

    if let Err(e) = fs::rename(from, to) {
        if let Some(top) = top_created {
            remove_empty_up_to(dest_dir, &top);
        }
        return Err(e.into());
    }
    Ok(())
}

/// Outermost ancestor of `dir` (or `dir` itself) that does not exist yet
fn highest_missing(dir: &Path) -> Option<PathBuf> {
    let mut missing = None;
    let mut current = Some(dir);
    while let Some(d) = current {
        if d.as_os_str().is_empty() || d.exists() {
            break;
        }
        missing = Some(d.to_path_buf());
        current = d.parent();
    }
    missing
}

/// Remove `dir` and its empty parents, stopping after `top`
fn remove_empty_up_to(dir: &Path, top: &Path) {
    let mut current = Some(dir);
    while let Some(d) = current {
        if fs::remove_dir(d).is_err() {
            break;
        }
        debug!("Removed empty directory {:?}", d);
        if d == top {
            break;
        }
        current = d.parent();
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Walk directory recursively, not following symlinked folders
fn walk(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read directory {:?}: {}", dir, e);
            return;
        }
    };

    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            walk(&path, files);
        } else if file_type.is_file() {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ResolvedDate;
    use crate::organizer::FolderScheme;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn fixed_resolver(s: &'static str) -> impl DateResolver {
        move |_: &Path, _: MediaKind| Some(ResolvedDate { date: date(s), source: DateSource::Metadata })
    }

    fn engine(scheme: FolderScheme) -> RenameEngine {
        RenameEngine::new(
            NamingTemplate::default(),
            FolderOrganizer::new(scheme),
            MediaClassifier::default(),
            fixed_resolver("2023-08-15 14:22:03"),
        )
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
    }

    #[test]
    fn test_process_one_renames_photo() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("IMG_0001.JPG"));

        let outcome = engine(FolderScheme::None).process_one(root, &root.join("IMG_0001.JPG"), false);

        assert_eq!(outcome.kind, OutcomeKind::Renamed, "{}", outcome.message);
        assert_eq!(outcome.old_path, PathBuf::from("IMG_0001.JPG"));
        assert_eq!(outcome.new_path, Some(PathBuf::from("Photo-2023-08-15_142203.jpg")));
        assert_eq!(outcome.date_source, Some(DateSource::Metadata));
        assert!(root.join("Photo-2023-08-15_142203.jpg").exists());
        assert!(!root.join("IMG_0001.JPG").exists());
    }

    #[test]
    fn test_unsupported_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("notes.txt"));

        let outcome = engine(FolderScheme::None).process_one(root, &root.join("notes.txt"), false);
        assert_eq!(outcome.kind, OutcomeKind::SkippedUnsupported);
        assert!(root.join("notes.txt").exists());
    }

    #[test]
    fn test_canonical_file_with_same_date_is_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let path = root.join("Photo-2023-08-15_142203.jpg");
        touch(&path);

        let outcome = engine(FolderScheme::None).process_one(root, &path, false);
        assert_eq!(outcome.kind, OutcomeKind::SkippedNoChange);
        assert!(path.exists());
    }

    #[test]
    fn test_failure_leaves_file_alone() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("clip.mp4"));

        let no_date = RenameEngine::new(
            NamingTemplate::default(),
            FolderOrganizer::default(),
            MediaClassifier::default(),
            |_: &Path, _: MediaKind| -> Option<ResolvedDate> { None },
        );
        let outcome = no_date.process_one(root, &root.join("clip.mp4"), false);
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(root.join("clip.mp4").exists());
    }

    #[test]
    fn test_vanished_file_fails_without_aborting_batch() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("b.jpg"));

        let files = vec![root.join("a.jpg"), root.join("b.jpg")];
        let report = engine(FolderScheme::None).process_files(root, &files, false, None, &mut |_| {});

        assert_eq!(report.stats, BatchStats { total: 2, renamed: 1, skipped: 0, failed: 1 });
        assert_eq!(report.outcomes[0].kind, OutcomeKind::Failed);
        assert!(root.join("Photo-2023-08-15_142203.jpg").exists());
    }

    #[test]
    fn test_collisions_within_batch() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            touch(&root.join(name));
        }

        let report = engine(FolderScheme::None)
            .scan_and_process(root, None, ExistingPolicy::Skip, false)
            .unwrap();

        let names: Vec<PathBuf> = report.outcomes.iter().filter_map(|o| o.new_path.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("Photo-2023-08-15_142203.jpg"),
                PathBuf::from("Photo-2023-08-15_142203_1.jpg"),
                PathBuf::from("Photo-2023-08-15_142203_2.jpg"),
            ]
        );
        assert_eq!(report.ledger_pairs().len(), 3);
    }

    #[test]
    fn test_simulation_predicts_real_names() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["a.jpg", "b.jpg"] {
            touch(&root.join(name));
        }
        let engine = engine(FolderScheme::None);

        let dry = engine.scan_and_process(root, None, ExistingPolicy::Skip, true).unwrap();
        assert!(root.join("a.jpg").exists());
        assert!(dry.ledger_pairs().is_empty());

        let real = engine.scan_and_process(root, None, ExistingPolicy::Skip, false).unwrap();
        let dry_names: Vec<_> = dry.outcomes.iter().map(|o| o.new_path.clone()).collect();
        let real_names: Vec<_> = real.outcomes.iter().map(|o| o.new_path.clone()).collect();
        assert_eq!(dry_names, real_names);
    }

    #[test]
    fn test_simulation_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("a.jpg"));
        touch(&root.join("Video-2020-01-01_000000.mp4"));
        touch(&root.join("sub/readme.md"));
        let engine = engine(FolderScheme::YearMonth);

        let classify = |report: &BatchReport| -> Vec<OutcomeKind> {
            report.outcomes.iter().map(|o| o.kind).collect()
        };
        let first = engine.scan_and_process(root, None, ExistingPolicy::Rerename, true).unwrap();
        let second = engine.scan_and_process(root, None, ExistingPolicy::Rerename, true).unwrap();

        assert_eq!(classify(&first), classify(&second));
        assert!(!root.join("2023").exists());
    }

    #[test]
    fn test_organizer_groups_under_each_folder() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("trip/a.jpg"));
        touch(&root.join("b.jpg"));

        let report = engine(FolderScheme::YearMonth)
            .scan_and_process(root, None, ExistingPolicy::Skip, false)
            .unwrap();

        assert!(root.join("2023/08/Photo-2023-08-15_142203.jpg").exists());
        assert!(root.join("trip/2023/08/Photo-2023-08-15_142203.jpg").exists());
        let pairs = report.ledger_pairs();
        assert_eq!(pairs, vec![
            FilePair {
                old: "b.jpg".to_string(),
                new: "2023/08/Photo-2023-08-15_142203.jpg".to_string(),
            },
            FilePair {
                old: "trip/a.jpg".to_string(),
                new: "trip/2023/08/Photo-2023-08-15_142203.jpg".to_string(),
            },
        ]);
        assert!(report.outcomes[1].message.contains("(in trip"));

        // Running again finds the files already in place
        let again = engine(FolderScheme::YearMonth)
            .scan_and_process(root, None, ExistingPolicy::Rerename, false)
            .unwrap();
        assert!(again.outcomes.iter().all(|o| o.kind == OutcomeKind::SkippedNoChange), "{:#?}", again.outcomes);
        assert!(!root.join("trip/2023/08/2023").exists());
    }

    #[test]
    fn test_simulation_sees_vacated_names() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("Photo-2023-01-01_000000.jpg"));
        touch(&root.join("Photo-2023-01-01_000000_1.jpg"));

        let by_name = RenameEngine::new(
            NamingTemplate::default(),
            FolderOrganizer::default(),
            MediaClassifier::default(),
            |path: &Path, _: MediaKind| -> Option<ResolvedDate> {
                let when = match path.file_name()?.to_str()? {
                    "Photo-2023-01-01_000000.jpg" => "2024-05-05 05:05:05",
                    _ => "2023-01-01 00:00:00",
                };
                Some(ResolvedDate { date: date(when), source: DateSource::Metadata })
            },
        );
        let summary = |report: &BatchReport| -> Vec<(OutcomeKind, Option<PathBuf>)> {
            report.outcomes.iter().map(|o| (o.kind, o.new_path.clone())).collect()
        };

        let dry = by_name.scan_and_process(root, None, ExistingPolicy::Rerename, true).unwrap();
        let real = by_name.scan_and_process(root, None, ExistingPolicy::Rerename, false).unwrap();

        assert_eq!(summary(&dry), summary(&real));
        assert_eq!(
            summary(&real),
            vec![
                (OutcomeKind::Renamed, Some(PathBuf::from("Photo-2024-05-05_050505.jpg"))),
                (OutcomeKind::Renamed, Some(PathBuf::from("Photo-2023-01-01_000000.jpg"))),
            ]
        );
    }

    #[test]
    fn test_file_outside_root_is_refused() {
        let root_dir = TempDir::new().unwrap();
        let other_dir = TempDir::new().unwrap();
        let outside = other_dir.path().join("a.jpg");
        touch(&outside);

        let report = engine(FolderScheme::None).process_files(
            root_dir.path(),
            &[outside.clone()],
            false,
            None,
            &mut |_| {},
        );

        assert_eq!(report.outcomes[0].kind, OutcomeKind::Failed);
        assert!(report.outcomes[0].message.contains("Outside the batch root"));
        assert!(outside.exists());
        assert!(!other_dir.path().join("Photo-2023-08-15_142203.jpg").exists());
    }

    #[test]
    fn test_failed_move_removes_created_folders() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let outcome = engine(FolderScheme::YearMonth).process_one(root, &root.join("gone.jpg"), false);

        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(!root.join("2023").exists());
    }

    #[test]
    fn test_template_with_folders() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("clip.MOV"));

        let engine = RenameEngine::new(
            NamingTemplate::compile("{YYYY}/{MM}/{type}_{YYYY}{MM}{DD}").unwrap(),
            FolderOrganizer::default(),
            MediaClassifier::default(),
            fixed_resolver("2023-08-15 14:22:03"),
        );
        let outcome = engine.process_one(root, &root.join("clip.MOV"), false);

        assert_eq!(outcome.kind, OutcomeKind::Renamed, "{}", outcome.message);
        assert!(root.join("2023/08/Video_20230815.mov").exists());
    }

    #[test]
    fn test_template_cannot_escape_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        touch(&root.join("a.jpg"));

        let engine = RenameEngine::new(
            NamingTemplate::compile("../{type}").unwrap(),
            FolderOrganizer::default(),
            MediaClassifier::default(),
            fixed_resolver("2023-08-15 14:22:03"),
        );
        let outcome = engine.process_one(&root, &root.join("a.jpg"), false);
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(root.join("a.jpg").exists());
    }

    #[test]
    fn test_partition_and_policies() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("a.jpg"));
        touch(&root.join("nested/Photo-2023-08-15_142203_4.JPG"));
        touch(&root.join("notes.txt"));

        let engine = engine(FolderScheme::None);
        let partition = engine.scan(root).unwrap();
        assert_eq!(partition.to_rename, vec![root.join("a.jpg")]);
        assert_eq!(partition.already_named, vec![root.join("nested/Photo-2023-08-15_142203_4.JPG")]);
        assert_eq!(partition.total(), 2);

        assert_eq!(partition.select(ExistingPolicy::Skip).unwrap().len(), 1);
        assert_eq!(partition.select(ExistingPolicy::Rerename).unwrap().len(), 2);
        assert!(partition.select(ExistingPolicy::Abort).is_none());

        let aborted = engine.scan_and_process(root, None, ExistingPolicy::Abort, false).unwrap();
        assert!(aborted.aborted);
        assert!(aborted.outcomes.is_empty());
        assert!(root.join("a.jpg").exists());

        let skipped = engine.scan_and_process(root, None, ExistingPolicy::Skip, true).unwrap();
        assert_eq!(skipped.stats, BatchStats { total: 2, renamed: 1, skipped: 1, failed: 0 });
        assert!(skipped.outcomes.iter().any(|o| o.kind == OutcomeKind::SkippedAlreadyNamed));
    }

    #[test]
    fn test_abort_without_canonical_files_still_runs() {
        let partition = ScanPartition {
            already_named: Vec::new(),
            to_rename: vec![PathBuf::from("a.jpg")],
        };
        assert_eq!(partition.select(ExistingPolicy::Abort), Some(vec![PathBuf::from("a.jpg")]));
    }

    #[test]
    fn test_cancel_flag_stops_batch() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let files = vec![root.join("a.jpg"), root.join("b.jpg")];
        for f in &files {
            touch(f);
        }

        let cancel = AtomicBool::new(false);
        let mut seen = 0;
        let report = engine(FolderScheme::None).process_files(root, &files, false, Some(&cancel), &mut |_| {
            seen += 1;
            cancel.store(true, Ordering::Relaxed);
        });

        assert!(report.cancelled);
        assert_eq!(seen, 1);
        assert_eq!(report.stats.total, 1);
        assert!(root.join("b.jpg").exists());
    }

    #[test]
    fn test_scan_requires_directory() {
        let err = engine(FolderScheme::None).scan(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, MediadateError::NotADirectory(_)));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("rerename".parse::<ExistingPolicy>().unwrap(), ExistingPolicy::Rerename);
        assert!("maybe".parse::<ExistingPolicy>().is_err());
    }
}
