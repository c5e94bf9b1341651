// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Collision-safe file naming
//!
//! Probes `stem.ext`, `stem_1.ext`, `stem_2.ext`, ... against the directory
//! at call time. The check and the later rename are not atomic; concurrent
//! writers in the same directory can still race us.

use std::path::Path;
use tracing::debug;

use crate::{MediadateError, Result};

/// Highest suffix tried before giving up
pub const MAX_COLLISION_SUFFIX: u32 = 10_000;

/// Join a stem and an extension (`ext` without the dot, may be empty)
pub fn file_name(stem: &str, ext: &str) -> String {
    if ext.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, ext)
    }
}

/// First free name for `stem`/`ext` in `dir`
pub fn unique_name(stem: &str, ext: &str, dir: &Path) -> Result<String> {
    unique_name_with(stem, ext, dir, |path| !path.exists())
}

/// First name for which `is_free` holds, probing in suffix order
pub fn unique_name_with<F>(stem: &str, ext: &str, dir: &Path, is_free: F) -> Result<String>
where
    F: Fn(&Path) -> bool,
{
    let candidate = file_name(stem, ext);
    if is_free(&dir.join(&candidate)) {
        return Ok(candidate);
    }

    for counter in 1..=MAX_COLLISION_SUFFIX {
        let candidate = file_name(&format!("{}_{}", stem, counter), ext);
        if is_free(&dir.join(&candidate)) {
            debug!("Name collision resolved with suffix: {}", candidate);
            return Ok(candidate);
        }
    }

    Err(MediadateError::NamespaceExhausted {
        name: file_name(stem, ext),
        limit: MAX_COLLISION_SUFFIX,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_empty_directory_keeps_name() {
        let temp_dir = TempDir::new().unwrap();
        let name = unique_name("Photo-2023-08-15_142203", "jpg", temp_dir.path()).unwrap();
        assert_eq!(name, "Photo-2023-08-15_142203.jpg");
    }

    #[test]
    fn test_collisions_get_suffixes() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        File::create(dir.join("Photo-2023-08-15_142203.jpg")).unwrap();
        File::create(dir.join("Photo-2023-08-15_142203_1.jpg")).unwrap();

        let name = unique_name("Photo-2023-08-15_142203", "jpg", dir).unwrap();
        assert_eq!(name, "Photo-2023-08-15_142203_2.jpg");
        assert!(!dir.join(&name).exists());
    }

    #[test]
    fn test_existence_is_checked_per_call() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        let first = unique_name("clip", "mp4", dir).unwrap();
        File::create(dir.join(&first)).unwrap();
        let second = unique_name("clip", "mp4", dir).unwrap();

        assert_eq!(first, "clip.mp4");
        assert_eq!(second, "clip_1.mp4");
    }

    #[test]
    fn test_no_extension() {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join("raw")).unwrap();
        assert_eq!(unique_name("raw", "", temp_dir.path()).unwrap(), "raw_1");
    }

    #[test]
    fn test_exhausted_namespace() {
        let err = unique_name_with("x", "jpg", Path::new("/"), |_| false).unwrap_err();
        match err {
            MediadateError::NamespaceExhausted { name, limit } => {
                assert_eq!(name, "x.jpg");
                assert_eq!(limit, MAX_COLLISION_SUFFIX);
            }
            other => panic!("Expected NamespaceExhausted, got {:?}", other),
        }
    }
}
