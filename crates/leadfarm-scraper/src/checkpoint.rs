//! Crawl-session checkpoints.
//!
//! A session persists its position as a small JSON sidecar next to the
//! output file. Writes go through a temp file and a rename so a crash
//! mid-write never leaves a truncated checkpoint behind.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CheckpointError;
use crate::source::Cursor;

/// Resumable position of one `(region, query)` crawl session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlCheckpoint {
    pub region: String,
    pub query: String,
    pub cursor: Cursor,
    /// Leads accepted so far, for progress reporting on resume.
    pub accepted: u64,
    pub updated_at: DateTime<Utc>,
}

/// Filesystem-safe session name derived from region and query.
///
/// Used to name both the output CSV and its checkpoint sidecar, so a resumed
/// session finds the files its predecessor wrote.
#[must_use]
pub fn session_slug(region: &str, query: &str) -> String {
    format!("{}_{}", slugify(region), slugify(query))
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_owned()
}

/// Write `checkpoint` to `path` atomically.
///
/// # Errors
///
/// Returns [`CheckpointError::Io`] when the temp file cannot be written or
/// renamed into place.
pub fn save_checkpoint(path: &Path, checkpoint: &CrawlCheckpoint) -> Result<(), CheckpointError> {
    let json = serde_json::to_string_pretty(checkpoint)
        .expect("checkpoint struct always serializes");
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Read a checkpoint previously written by [`save_checkpoint`].
///
/// # Errors
///
/// Returns [`CheckpointError::Io`] when the file cannot be read and
/// [`CheckpointError::Parse`] when its contents are not a valid checkpoint.
pub fn load_checkpoint(path: &Path) -> Result<CrawlCheckpoint, CheckpointError> {
    let json = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&json).map_err(|e| CheckpointError::Parse {
        path: path.display().to_string(),
        source: e,
    })
}

fn io_err(path: &Path, source: std::io::Error) -> CheckpointError {
    CheckpointError::Io {
        path: path.display().to_string(),
        source,
    }
}
