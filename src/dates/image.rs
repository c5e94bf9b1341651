// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! EXIF capture dates for photos

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// Tags consulted, in priority order
const DATE_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTime, Tag::DateTimeDigitized];

/// Read the capture date from a photo's EXIF block
pub fn exif_date(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            trace!("No EXIF in {:?}: {}", path, e);
            return None;
        }
    };

    DATE_TAGS.iter().find_map(|tag| {
        let field = exif.get_field(*tag, In::PRIMARY)?;
        let value = field.display_value().to_string();
        parse_exif_datetime(&value)
    })
}

/// Parse `2023:08:15 14:22:03` or `2023-08-15 14:22:03` (extra text ignored)
pub fn parse_exif_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim().trim_matches('"');
    let head = value.get(..19)?;

    ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(head, fmt).ok())
}
