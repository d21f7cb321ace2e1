//! Public types produced by the scan orchestrator.
//!
//! A [`Publication`] is the unit the editor receives: the complete list of
//! diagnostics for one absolute path, replacing whatever it showed before.
//! [`DiagnosticsSnapshot`] is a read-only view over everything published.

use std::path::{Path, PathBuf};

use nudge_types::Diagnostic;

/// Full replacement of one file's diagnostics. Empty `items` clears the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    path: PathBuf,
    items: Vec<Diagnostic>,
}

impl Publication {
    #[must_use]
    pub fn new(path: PathBuf, items: Vec<Diagnostic>) -> Self {
        Self { path, items }
    }

    #[must_use]
    pub fn clear(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            items: Vec::new(),
        }
    }

    /// Absolute path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.items.is_empty()
    }
}

/// Immutable snapshot of all published diagnostics, sorted by path.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSnapshot {
    files: Vec<(PathBuf, Vec<Diagnostic>)>,
}

impl DiagnosticsSnapshot {
    pub(crate) fn new(files: Vec<(PathBuf, Vec<Diagnostic>)>) -> Self {
        Self { files }
    }

    #[must_use]
    pub fn files(&self) -> &[(PathBuf, Vec<Diagnostic>)] {
        &self.files
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&[Diagnostic]> {
        self.files
            .iter()
            .find(|(candidate, _)| candidate == path)
            .map(|(_, items)| items.as_slice())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total diagnostic count across all files.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.files.iter().map(|(_, items)| items.len()).sum()
    }

    /// Compact status like "nudge: 4 in 2 files". Empty when nothing is published.
    #[must_use]
    pub fn status_string(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let files = self.files.len();
        let noun = if files == 1 { "file" } else { "files" };
        format!("nudge: {} in {files} {noun}", self.total_count())
    }
}
