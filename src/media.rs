// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Media classification and per-file records

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::MediaConfig;

/// Kind of a file, decided by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Photo,
    Video,
    Unsupported,
}

impl MediaKind {
    /// Value used for the `{type}` template variable
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Photo => "Photo",
            MediaKind::Video => "Video",
            MediaKind::Unsupported => "Unsupported",
        }
    }

    pub fn is_video(self) -> bool {
        self == MediaKind::Video
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a file's date came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    Metadata,
    FileSystem,
}

impl DateSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DateSource::Metadata => "metadata",
            DateSource::FileSystem => "file_system",
        }
    }
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A date together with its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDateTime,
    pub source: DateSource,
}

/// Closed sets of photo and video extensions
#[derive(Debug, Clone)]
pub struct MediaClassifier {
    photo: HashSet<String>,
    video: HashSet<String>,
}

impl MediaClassifier {
    pub fn new<P, V>(photo: P, video: V) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        V: IntoIterator,
        V::Item: AsRef<str>,
    {
        let normalize = |e: &str| e.trim_start_matches('.').to_lowercase();
        Self {
            photo: photo.into_iter().map(|e| normalize(e.as_ref())).collect(),
            video: video.into_iter().map(|e| normalize(e.as_ref())).collect(),
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(&config.photo_extensions, &config.video_extensions)
    }

    /// Classify a lowercase extension (without dot)
    pub fn classify(&self, ext: &str) -> MediaKind {
        if self.photo.contains(ext) {
            MediaKind::Photo
        } else if self.video.contains(ext) {
            MediaKind::Video
        } else {
            MediaKind::Unsupported
        }
    }

    pub fn classify_path(&self, path: &Path) -> MediaKind {
        self.classify(&extension_of(path))
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.classify_path(path) != MediaKind::Unsupported
    }

    pub fn photo_count(&self) -> usize {
        self.photo.len()
    }

    pub fn video_count(&self) -> usize {
        self.video.len()
    }
}

impl Default for MediaClassifier {
    fn default() -> Self {
        Self::from_config(&MediaConfig::default())
    }
}

/// Lowercase extension of `path` without the dot, empty if none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// One file under consideration during a batch
#[derive(Debug, Clone)]
pub struct MediaRecord {
    pub path: PathBuf,
    pub extension: String,
    pub kind: MediaKind,
    pub date: Option<ResolvedDate>,
}

impl MediaRecord {
    pub fn new(path: PathBuf, classifier: &MediaClassifier) -> Self {
        let extension = extension_of(&path);
        let kind = classifier.classify(&extension);
        Self {
            path,
            extension,
            kind,
            date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let classifier = MediaClassifier::default();
        assert_eq!(classifier.classify_path(Path::new("a/IMG_1.JPG")), MediaKind::Photo);
        assert_eq!(classifier.classify_path(Path::new("b.heic")), MediaKind::Photo);
        assert_eq!(classifier.classify_path(Path::new("c.MOV")), MediaKind::Video);
        assert_eq!(classifier.classify_path(Path::new("d.m2ts")), MediaKind::Video);
        assert_eq!(classifier.classify_path(Path::new("e.txt")), MediaKind::Unsupported);
        assert_eq!(classifier.classify_path(Path::new("noext")), MediaKind::Unsupported);
        assert_eq!(classifier.photo_count(), 24);
        assert_eq!(classifier.video_count(), 22);
    }

    #[test]
    fn test_custom_sets_are_normalized() {
        let classifier = MediaClassifier::new([".PNG"], ["Mp4"]);
        assert_eq!(classifier.classify("png"), MediaKind::Photo);
        assert_eq!(classifier.classify("mp4"), MediaKind::Video);
        assert_eq!(classifier.classify("jpg"), MediaKind::Unsupported);
    }

    #[test]
    fn test_record() {
        let record = MediaRecord::new(PathBuf::from("/x/Clip.MP4"), &MediaClassifier::default());
        assert_eq!(record.extension, "mp4");
        assert_eq!(record.kind, MediaKind::Video);
        assert!(record.date.is_none());
    }

    #[test]
    fn test_date_source_names() {
        assert_eq!(DateSource::FileSystem.to_string(), "file_system");
        assert_eq!(serde_json::to_string(&DateSource::Metadata).unwrap(), "\"metadata\"");
    }
}
