//! Per-file diagnostic mapping ordered by first insertion.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::Diagnostic;

/// Ordered mapping from file path to that file's diagnostics.
///
/// Files iterate in the order they were first seen; each file's diagnostics
/// keep their insertion order. Nothing is deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticSet {
    files: Vec<(PathBuf, Vec<Diagnostic>)>,
    index: HashMap<PathBuf, usize>,
}

impl DiagnosticSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `diagnostic` to the sequence for `path`.
    pub fn push(&mut self, path: PathBuf, diagnostic: Diagnostic) {
        if let Some(&slot) = self.index.get(&path) {
            self.files[slot].1.push(diagnostic);
            return;
        }
        self.index.insert(path.clone(), self.files.len());
        self.files.push((path, vec![diagnostic]));
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&[Diagnostic]> {
        self.index
            .get(path)
            .map(|&slot| self.files[slot].1.as_slice())
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    /// Files in first-insertion order.
    pub fn files(&self) -> impl Iterator<Item = (&Path, &[Diagnostic])> {
        self.files
            .iter()
            .map(|(path, items)| (path.as_path(), items.as_slice()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(path, _)| path.as_path())
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
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

    /// Re-key every file as `root.join(path)`, keeping order.
    ///
    /// Relative paths that collapse onto the same joined path are merged in
    /// first-seen order.
    #[must_use]
    pub fn rebase(self, root: &Path) -> Self {
        let mut rebased = Self::new();
        for (path, items) in self.files {
            let joined = root.join(path);
            for item in items {
                rebased.push(joined.clone(), item);
            }
        }
        rebased
    }
}
