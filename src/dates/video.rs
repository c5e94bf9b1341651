// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Video creation dates via FFprobe

use chrono::NaiveDateTime;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Check if FFprobe is available
pub fn ffprobe_available(ffprobe: &str) -> bool {
    Command::new(ffprobe)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Read `format_tags=creation_time`, killing FFprobe after `timeout`
pub fn creation_date(path: &Path, ffprobe: &str, timeout: Duration) -> Option<NaiveDateTime> {
    let mut child = Command::new(ffprobe)
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_entries", "format_tags=creation_time",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| debug!("Failed to start {}: {}", ffprobe, e))
        .ok()?;

    let mut stdout = child.stdout.take()?;
    let reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).map(|_| buf)
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                warn!("FFprobe timed out after {:?} on {:?}", timeout, path);
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                debug!("Waiting for FFprobe failed: {}", e);
                return None;
            }
        }
    };

    let output = reader.join().ok()?.ok()?;
    if !status.success() {
        return None;
    }

    let json: serde_json::Value = serde_json::from_slice(&output).ok()?;
    let raw = json.get("format")?
        .get("tags")?
        .get("creation_time")?
        .as_str()?;

    parse_creation_time(raw)
}

/// Parse `2023-08-15T14:22:03.000000Z` or `2023-08-15 14:22:03`.
///
/// Fractional seconds and the `Z` are dropped; the result is naive time.
pub fn parse_creation_time(raw: &str) -> Option<NaiveDateTime> {
    let clean = raw.trim().replace('Z', "");
    let clean = clean.split('.').next()?;

    let fmt = if clean.contains('T') { "%Y-%m-%dT%H:%M:%S" } else { "%Y-%m-%d %H:%M:%S" };
    NaiveDateTime::parse_from_str(clean, fmt).ok()
}
