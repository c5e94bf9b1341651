// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Date-based folder grouping

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::{MediadateError, Result};

/// How files are grouped into folders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FolderScheme {
    /// Files stay in their folder
    #[default]
    None,
    /// `2023/`
    Year,
    /// `2023/08/`
    YearMonth,
    /// `2023-08-15/`
    Date,
}

impl FolderScheme {
    pub const ALL: [FolderScheme; 4] = [
        FolderScheme::None,
        FolderScheme::Year,
        FolderScheme::YearMonth,
        FolderScheme::Date,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FolderScheme::None => "none",
            FolderScheme::Year => "year",
            FolderScheme::YearMonth => "year-month",
            FolderScheme::Date => "date",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FolderScheme::None => "No grouping (files stay where they are)",
            FolderScheme::Year => "By year (2023/, 2024/)",
            FolderScheme::YearMonth => "By year and month (2023/08/, 2024/01/)",
            FolderScheme::Date => "By date (2023-08-15/, 2024-01-10/)",
        }
    }
}

impl FromStr for FolderScheme {
    type Err = MediadateError;

    fn from_str(s: &str) -> Result<Self> {
        FolderScheme::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.as_str() == s)
            .ok_or_else(|| MediadateError::InvalidScheme(s.to_string()))
    }
}

impl fmt::Display for FolderScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a base directory and a date to a destination directory
#[derive(Debug, Clone, Copy, Default)]
pub struct FolderOrganizer {
    scheme: FolderScheme,
}

impl FolderOrganizer {
    pub fn new(scheme: FolderScheme) -> Self {
        Self { scheme }
    }

    /// Build from a scheme name, failing on anything outside the known set
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    pub fn scheme(&self) -> FolderScheme {
        self.scheme
    }

    pub fn is_enabled(&self) -> bool {
        self.scheme != FolderScheme::None
    }

    pub fn description(&self) -> &'static str {
        self.scheme.description()
    }

    /// Folder names this scheme adds for `date`, outermost first
    fn folders(&self, date: &NaiveDateTime) -> Vec<String> {
        let patterns: &[&str] = match self.scheme {
            FolderScheme::None => &[],
            FolderScheme::Year => &["%Y"],
            FolderScheme::YearMonth => &["%Y", "%m"],
            FolderScheme::Date => &["%Y-%m-%d"],
        };
        patterns.iter().map(|p| date.format(p).to_string()).collect()
    }

    /// Destination directory for a file dated `date`
    pub fn target_directory(&self, base: &Path, date: &NaiveDateTime) -> PathBuf {
        let mut dir = base.to_path_buf();
        dir.extend(self.folders(date));
        dir
    }

    /// Base directory for grouping a file that currently sits in `dir`.
    ///
    /// Normally `dir` itself. When `dir` already is the dated folder for
    /// `date` (e.g. `trip/2023/08` under year-month), the base is the folder
    /// above it, so grouping a second time leaves the file where it is.
    pub fn anchor<'a>(&self, dir: &'a Path, date: &NaiveDateTime) -> &'a Path {
        let mut anchor = dir;
        for name in self.folders(date).iter().rev() {
            if anchor.file_name().and_then(|n| n.to_str()) != Some(name.as_str()) {
                return dir;
            }
            match anchor.parent() {
                Some(parent) => anchor = parent,
                None => return dir,
            }
        }
        anchor
    }

    /// Create `dir` and missing ancestors; returns whether it had to be created.
    ///
    /// With `simulate` nothing is touched and the return value reports what
    /// would have happened.
    pub fn ensure_exists(dir: &Path, simulate: bool) -> Result<bool> {
        if dir.is_dir() {
            return Ok(false);
        }

        if simulate {
            debug!("Would create directory: {:?}", dir);
        } else {
            std::fs::create_dir_all(dir)?;
            debug!("Created directory: {:?}", dir);
        }

        Ok(true)
    }
}

/// Help text listing every scheme
pub fn help_text() -> String {
    let mut lines = vec!["Folder schemes:".to_string(), String::new()];
    for scheme in FolderScheme::ALL {
        lines.push(format!("  {:<11} - {}", scheme.as_str(), scheme.description()));
    }
    lines.join("\n")
}
