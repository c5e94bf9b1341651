// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for mediadate

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::organizer::{FolderOrganizer, FolderScheme};
use crate::template::{NamingTemplate, DEFAULT_TEMPLATE};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Naming rules
    #[serde(default)]
    pub naming: NamingConfig,

    /// Supported file types
    #[serde(default)]
    pub media: MediaConfig,

    /// Date extraction settings
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Undo history settings
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NamingConfig {
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default)]
    pub folder_scheme: FolderScheme,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MediaConfig {
    #[serde(default = "default_photo_extensions")]
    pub photo_extensions: Vec<String>,
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetadataConfig {
    #[serde(default = "default_true")]
    pub use_exif: bool,
    #[serde(default = "default_true")]
    pub use_ffprobe: bool,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

// Default value functions
fn default_template() -> String { DEFAULT_TEMPLATE.to_string() }
fn default_true() -> bool { true }
fn default_ffprobe_path() -> String { "ffprobe".to_string() }
fn default_probe_timeout() -> u64 { 30 }

fn default_photo_extensions() -> Vec<String> {
    vec![
        "jpg", "jpeg", "jpe", "jfif",
        "png", "gif", "bmp", "dib", "tif", "tiff", "webp",
        "heic", "heif",
        "raw", "cr2", "nef", "arw", "dng", "orf", "rw2",
        "psd", "ico", "pcx", "tga",
    ].into_iter().map(String::from).collect()
}

fn default_video_extensions() -> Vec<String> {
    vec![
        "mp4", "m4v", "m4p", "mov", "qt", "avi", "wmv", "asf",
        "flv", "f4v", "mkv", "webm", "mpg", "mpeg", "mpe",
        "3gp", "3g2", "vob", "ogv", "mts", "m2ts", "ts",
    ].into_iter().map(String::from).collect()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            folder_scheme: FolderScheme::default(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            photo_extensions: default_photo_extensions(),
            video_extensions: default_video_extensions(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            use_exif: true,
            use_ffprobe: true,
            ffprobe_path: default_ffprobe_path(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl MetadataConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::MediadateError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Compile the configured template
    pub fn template(&self) -> crate::Result<NamingTemplate> {
        NamingTemplate::compile(&self.naming.template)
    }

    pub fn organizer(&self) -> FolderOrganizer {
        FolderOrganizer::new(self.naming.folder_scheme)
    }

    /// Check everything that would otherwise fail halfway through a batch
    pub fn validate(&self) -> crate::Result<()> {
        self.template()?;

        if self.media.photo_extensions.is_empty() && self.media.video_extensions.is_empty() {
            return Err(crate::MediadateError::Config(
                "No photo or video extensions configured".to_string(),
            ));
        }

        let overlap: Vec<&String> = self.media.photo_extensions.iter()
            .filter(|e| self.media.video_extensions.iter().any(|v| v.eq_ignore_ascii_case(e)))
            .collect();
        if !overlap.is_empty() {
            return Err(crate::MediadateError::Config(format!(
                "Extensions listed as both photo and video: {:?}", overlap
            )));
        }

        if self.metadata.probe_timeout_secs == 0 {
            return Err(crate::MediadateError::Config(
                "metadata.probe_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
