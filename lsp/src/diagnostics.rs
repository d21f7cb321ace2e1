//! Aggregation of expanded diagnostics and the per-root published store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nudge_types::{Diagnostic, DiagnosticSet, SpanIssue};

use crate::annotation;
use crate::expand::expand;
use crate::types::{DiagnosticsSnapshot, Publication};

/// Group diagnostics by the path they carry, in a single pass.
pub fn aggregate(diagnostics: impl IntoIterator<Item = Diagnostic>) -> DiagnosticSet {
    let mut set = DiagnosticSet::new();
    for diagnostic in diagnostics {
        set.push(diagnostic.path().to_path_buf(), diagnostic);
    }
    set
}

/// Run analyzer output through parse, expand and aggregate.
///
/// Spans longer than [`nudge_types::MAX_SPAN_LINES`] are always dropped.
/// With `strict_spans`, records with any other span issue are dropped too;
/// otherwise they are expanded defensively.
pub fn collect_output(output: &str, strict_spans: bool) -> DiagnosticSet {
    let expanded = annotation::parse_output(output)
        .filter(|record| match record.span_issue() {
            None => true,
            Some(issue @ SpanIssue::TooLong { .. }) => {
                tracing::warn!(
                    path = record.path(),
                    line = record.start_line(),
                    "Dropping annotation: {issue}"
                );
                false
            }
            Some(issue) => {
                tracing::debug!(
                    path = record.path(),
                    line = record.start_line(),
                    strict = strict_spans,
                    "Degenerate annotation span: {issue}"
                );
                !strict_spans
            }
        })
        .flat_map(|record| expand(&record));
    aggregate(expanded)
}

/// Diagnostics currently published, keyed by monitored root.
///
/// Every mutation returns the publications that bring the editor in line
/// with the new state.
pub(crate) struct PublishedStore {
    roots: HashMap<PathBuf, DiagnosticSet>,
}

impl PublishedStore {
    pub fn new() -> Self {
        Self {
            roots: HashMap::new(),
        }
    }

    /// Replace everything published for `root` with `set`.
    ///
    /// `set` must already be keyed by absolute path. Files that were
    /// published before but are absent from `set` get an empty publication.
    pub fn replace(&mut self, root: &Path, set: DiagnosticSet) -> Vec<Publication> {
        let mut publications: Vec<Publication> = match self.roots.get(root) {
            Some(previous) => previous
                .paths()
                .filter(|path| !set.contains(path))
                .map(Publication::clear)
                .collect(),
            None => Vec::new(),
        };

        publications.extend(
            set.files()
                .map(|(path, items)| Publication::new(path.to_path_buf(), items.to_vec())),
        );

        if set.is_empty() {
            self.roots.remove(root);
        } else {
            self.roots.insert(root.to_path_buf(), set);
        }
        publications
    }

    /// Forget `root`, clearing every file it published.
    pub fn clear_root(&mut self, root: &Path) -> Vec<Publication> {
        self.roots
            .remove(root)
            .map(|set| set.paths().map(Publication::clear).collect())
            .unwrap_or_default()
    }

    /// Clear every root. Roots are visited in path order.
    pub fn clear_all(&mut self) -> Vec<Publication> {
        let mut roots: Vec<PathBuf> = self.roots.keys().cloned().collect();
        roots.sort();
        roots
            .iter()
            .flat_map(|root| self.clear_root(root))
            .collect()
    }

    pub fn get(&self, root: &Path) -> Option<&DiagnosticSet> {
        self.roots.get(root)
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let mut files: Vec<(PathBuf, Vec<Diagnostic>)> = self
            .roots
            .values()
            .flat_map(|set| {
                set.files()
                    .map(|(path, items)| (path.to_path_buf(), items.to_vec()))
            })
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        DiagnosticsSnapshot::new(files)
    }
}
