//! Scan orchestrator: owns the scan toggle, the monitored roots, and the
//! diagnostics published for each root.
//!
//! Each scan runs the analyzer on its own task and reports back over a
//! channel. Completions are applied in arrival order, so when two scans of
//! the same root overlap the later one wins. A completion only replaces a
//! root's diagnostics when the analyzer succeeded and scanning is still
//! active.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nudge_config::ScanConfig;
use nudge_types::DiagnosticSet;
use tokio::sync::mpsc;

use crate::analyzer::{Analyzer, AnalyzerError};
use crate::diagnostics::{PublishedStore, collect_output};
use crate::types::{DiagnosticsSnapshot, Publication};

/// Channel capacity for scan completions.
const COMPLETION_CHANNEL_CAPACITY: usize = 64;

/// Whether scans run. Starts inactive; only [`ScanOrchestrator::toggle`] flips it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    active: bool,
}

impl ScanState {
    #[must_use]
    pub fn is_active(self) -> bool {
        self.active
    }

    fn toggle(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }
}

/// Result of one analyzer invocation, delivered back to the orchestrator.
#[derive(Debug)]
pub struct ScanCompletion {
    root: PathBuf,
    outcome: Result<String, AnalyzerError>,
}

impl ScanCompletion {
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct ScanOrchestrator<A: Analyzer> {
    analyzer: Arc<A>,
    config: ScanConfig,
    state: ScanState,
    roots: Vec<PathBuf>,
    published: PublishedStore,
    completion_tx: mpsc::Sender<ScanCompletion>,
    completion_rx: mpsc::Receiver<ScanCompletion>,
    in_flight: usize,
}

impl<A: Analyzer> ScanOrchestrator<A> {
    #[must_use]
    pub fn new(analyzer: A, config: ScanConfig) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        Self {
            analyzer: Arc::new(analyzer),
            config,
            state: ScanState::default(),
            roots: Vec::new(),
            published: PublishedStore::new(),
            completion_tx,
            completion_rx,
            in_flight: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Number of analyzer invocations whose completion has not been applied.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start monitoring `root`. Scans it right away when active.
    ///
    /// Returns false if the root was already monitored.
    pub fn add_root(&mut self, root: PathBuf) -> bool {
        if self.roots.contains(&root) {
            return false;
        }
        tracing::info!(root = %root.display(), "Monitoring root");
        self.roots.push(root.clone());
        if self.is_active() {
            self.spawn_scan(root);
        }
        true
    }

    /// Stop monitoring `root` and clear what it published.
    pub fn remove_root(&mut self, root: &Path) -> Vec<Publication> {
        let before = self.roots.len();
        self.roots.retain(|r| r != root);
        if self.roots.len() != before {
            tracing::info!(root = %root.display(), "No longer monitoring root");
        }
        self.published.clear_root(root)
    }

    /// Flip the scan state.
    ///
    /// Activating scans every root; the diagnostics arrive later as
    /// completions. Deactivating clears everything published, returned here.
    pub fn toggle(&mut self) -> Vec<Publication> {
        if self.state.toggle() {
            tracing::info!(roots = self.roots.len(), "Scanning activated");
            self.scan_all();
            Vec::new()
        } else {
            tracing::info!("Scanning deactivated");
            self.published.clear_all()
        }
    }

    /// Save trigger. Scans every root when active and `language_id` is watched.
    ///
    /// Returns the number of scans started.
    pub fn on_document_saved(&mut self, language_id: &str) -> usize {
        if !self.is_active() {
            return 0;
        }
        if !self.config.watches_language(language_id) {
            tracing::trace!(language_id, "Ignoring save for unwatched language");
            return 0;
        }
        self.scan_all()
    }

    /// Start one scan per monitored root. Returns the number started.
    pub fn scan_all(&mut self) -> usize {
        let roots = self.roots.clone();
        let count = roots.len();
        for root in roots {
            self.spawn_scan(root);
        }
        count
    }

    fn spawn_scan(&mut self, root: PathBuf) {
        let analyzer = Arc::clone(&self.analyzer);
        let completion_tx = self.completion_tx.clone();
        self.in_flight += 1;
        tracing::debug!(root = %root.display(), "Scan started");
        tokio::spawn(async move {
            let outcome = analyzer.analyze(&root).await;
            let _ = completion_tx.send(ScanCompletion { root, outcome }).await;
        });
    }

    /// Wait for the next scan completion.
    ///
    /// Never resolves while no scan is outstanding, which makes it a safe
    /// branch in a `select!` loop.
    pub async fn next_completion(&mut self) -> Option<ScanCompletion> {
        self.completion_rx.recv().await
    }

    /// Apply a completion, returning the publications it causes.
    pub fn apply(&mut self, completion: ScanCompletion) -> Vec<Publication> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let ScanCompletion { root, outcome } = completion;

        let output = match outcome {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(root = %root.display(), "Scan failed, keeping previous diagnostics: {e}");
                return Vec::new();
            }
        };

        if !self.is_active() {
            tracing::debug!(root = %root.display(), "Discarding scan finished after deactivation");
            return Vec::new();
        }
        if !self.roots.contains(&root) {
            tracing::debug!(root = %root.display(), "Discarding scan of unmonitored root");
            return Vec::new();
        }

        let set = collect_output(&output, self.config.strict_spans).rebase(&root);
        tracing::info!(
            root = %root.display(),
            files = set.len(),
            diagnostics = set.total_count(),
            "Scan complete"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            for (path, items) in set.files() {
                for item in items {
                    tracing::trace!("{}", item.display_with_path(path));
                }
            }
        }
        self.published.replace(&root, set)
    }

    /// Diagnostics currently published for `root`, keyed by absolute path.
    #[must_use]
    pub fn published_for(&self, root: &Path) -> Option<&DiagnosticSet> {
        self.published.get(root)
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        self.published.snapshot()
    }
}
