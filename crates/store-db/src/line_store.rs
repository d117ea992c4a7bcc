//! # Line Store
//!
//! The storage primitive every table is built on: one UTF-8 text file,
//! read whole and written whole.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  read_all()   → every line of the file; empty vec if it is missing     │
//! │  write_all()  → create parent dirs, truncate, rewrite the whole table  │
//! │                                                                         │
//! │  Last write wins. No partial-write atomicity beyond the file system.   │
//! │  Callers (the stores) serialize access with their own locks.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use crate::error::StoreDbResult;

/// A single named table backed by one flat file.
#[derive(Debug, Clone)]
pub struct LineStore {
    path: PathBuf,
}

impl LineStore {
    /// Creates a line store over the given file path. No I/O happens here.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LineStore { path: path.into() }
    }

    /// The file backing this table.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every line of the table.
    ///
    /// A missing file is an empty table, not an error: tables come into
    /// existence on first write.
    pub async fn read_all(&self) -> StoreDbResult<Vec<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrites the whole table.
    ///
    /// Creates the parent directory if needed, then truncates and writes
    /// all lines with a trailing newline.
    pub async fn write_all(&self, lines: &[String]) -> StoreDbResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

/// Returns true for rows that carry data: not blank, not a `#` comment.
///
/// Used by every table parser so hand-written comments in the data files
/// survive reads and rewrites.
pub fn is_data_row(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

// =============================================================================
// Unit Tests
// =============================================================================
