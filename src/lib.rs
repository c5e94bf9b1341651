// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! mediadate: Photo & Video Renamer
//!
//! Renames media files to names derived from their capture date, optionally
//! grouping them into dated folders, and keeps a per-directory history so a
//! batch can be undone.

pub mod config;
pub mod dates;
pub mod detector;
pub mod engine;
pub mod error;
pub mod history;
pub mod media;
pub mod namer;
pub mod organizer;
pub mod template;

pub use config::AppConfig;
pub use error::{MediadateError, Result};
