// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Capture-date resolution
//!
//! Photos are read through EXIF, videos through `ffprobe`. When neither
//! yields a date the filesystem timestamp is used, so a resolver only comes
//! back empty-handed when the file cannot even be stat'ed.

pub mod filesystem;
pub mod image;
pub mod video;

use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::MetadataConfig;
use crate::media::{DateSource, MediaKind, ResolvedDate};

pub use video::ffprobe_available;

/// Supplies a date for a media file
pub trait DateResolver: Send + Sync {
    fn resolve(&self, path: &Path, kind: MediaKind) -> Option<ResolvedDate>;
}

impl<F> DateResolver for F
where
    F: Fn(&Path, MediaKind) -> Option<ResolvedDate> + Send + Sync,
{
    fn resolve(&self, path: &Path, kind: MediaKind) -> Option<ResolvedDate> {
        self(path, kind)
    }
}

/// Metadata first, filesystem timestamp second
#[derive(Debug, Clone)]
pub struct MetadataDateResolver {
    use_exif: bool,
    use_ffprobe: bool,
    ffprobe_path: String,
    probe_timeout: Duration,
}

impl MetadataDateResolver {
    pub fn new(config: &MetadataConfig) -> Self {
        Self {
            use_exif: config.use_exif,
            use_ffprobe: config.use_ffprobe,
            ffprobe_path: config.ffprobe_path.clone(),
            probe_timeout: config.probe_timeout(),
        }
    }

    /// A resolver that only looks at filesystem timestamps
    pub fn filesystem_only() -> Self {
        Self {
            use_exif: false,
            use_ffprobe: false,
            ffprobe_path: String::new(),
            probe_timeout: Duration::ZERO,
        }
    }
}

impl Default for MetadataDateResolver {
    fn default() -> Self {
        Self::new(&MetadataConfig::default())
    }
}

impl DateResolver for MetadataDateResolver {
    fn resolve(&self, path: &Path, kind: MediaKind) -> Option<ResolvedDate> {
        let from_metadata = match kind {
            MediaKind::Photo if self.use_exif => image::exif_date(path),
            MediaKind::Video if self.use_ffprobe => {
                video::creation_date(path, &self.ffprobe_path, self.probe_timeout)
            }
            _ => None,
        };

        if let Some(date) = from_metadata {
            return Some(ResolvedDate { date, source: DateSource::Metadata });
        }

        debug!("No metadata date for {:?}, falling back to file system", path);
        filesystem::file_date(path).map(|date| ResolvedDate {
            date,
            source: DateSource::FileSystem,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_falls_back_to_file_system() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("not_really.jpg");
        std::fs::write(&path, b"no exif here").unwrap();

        let resolved = MetadataDateResolver::default()
            .resolve(&path, MediaKind::Photo)
            .unwrap();
        assert_eq!(resolved.source, DateSource::FileSystem);
    }

    #[test]
    fn test_missing_file_has_no_date() {
        let resolver = MetadataDateResolver::filesystem_only();
        assert!(resolver.resolve(Path::new("/definitely/not/here.jpg"), MediaKind::Photo).is_none());
    }

    #[test]
    fn test_closure_resolver() {
        let date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap();
        let resolver = move |_: &Path, _: MediaKind| {
            Some(ResolvedDate { date, source: DateSource::Metadata })
        };
        let resolved = resolver.resolve(Path::new("x.mp4"), MediaKind::Video).unwrap();
        assert_eq!(resolved.date, date);
    }
}
