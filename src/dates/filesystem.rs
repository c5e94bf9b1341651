// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Filesystem timestamp fallback

use chrono::{DateTime, Local, NaiveDateTime};
use std::path::Path;
use std::time::SystemTime;

/// Earliest of creation time (where the platform reports one) and
/// modification time, as local naive time
pub fn file_date(path: &Path) -> Option<NaiveDateTime> {
    let meta = std::fs::metadata(path).ok()?;

    let modified = meta.modified().ok();
    let created = meta.created().ok();

    let earliest: SystemTime = match (created, modified) {
        (Some(c), Some(m)) => c.min(m),
        (Some(t), None) | (None, Some(t)) => t,
        (None, None) => return None,
    };

    Some(DateTime::<Local>::from(earliest).naive_local())
}
