// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for mediadate

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mediadate operations
pub type Result<T> = std::result::Result<T, MediadateError>;

/// mediadate error types
#[derive(Error, Debug)]
pub enum MediadateError {
    #[error(
        "Unknown template variable(s): {}. Available: {}",
        braced(.unknown),
        braced(&crate::template::Variable::names())
    )]
    InvalidTemplate { unknown: Vec<String> },

    #[error("Unknown folder scheme '{0}'. Available: none, year, year-month, date")]
    InvalidScheme(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("History ledger is corrupt: {0}")]
    LedgerCorrupt(String),

    #[error("History is empty, nothing to undo")]
    NothingToUndo,

    #[error("No free name for '{name}' after {limit} attempts")]
    NamespaceExhausted { name: String, limit: u32 },

    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),
}

fn braced<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| format!("{{{}}}", n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
