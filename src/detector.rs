// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Recognition of names produced by the default template
//!
//! Matches `<Kind>-YYYY-MM-DD_HHMMSS[_N].<ext>` where Kind is `Photo` or
//! `Video` in any case. Digits are shape-matched only; `Photo-2023-13-45_999999.jpg`
//! still counts as canonical.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static CANONICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Photo|Video)-[0-9]{4}-[0-9]{2}-[0-9]{2}_[0-9]{6}(?:_[0-9]+)?\.\w+$").unwrap()
});

/// Return the kind prefix (case as found) if `filename` is canonical
pub fn detect(filename: &str) -> Option<&str> {
    CANONICAL
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether `filename` is already in canonical form
pub fn is_canonical(filename: &str) -> bool {
    detect(filename).is_some()
}

/// Same as [`is_canonical`] for the last component of a path
pub fn is_canonical_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(is_canonical)
        .unwrap_or(false)
}
