//! Core domain types for nudge-ls.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Positions are 0-indexed as editors expect them; annotation records keep the
//! 1-indexed values the analyzer reported.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod set;
pub use set::DiagnosticSet;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Tag attached to every diagnostic produced from analyzer output.
pub const SOURCE_TAG: &str = "nudge";

/// Longest span, in lines, that is expanded into diagnostics.
pub const MAX_SPAN_LINES: u32 = 10_000;

// ============================================================================
// Positions
// ============================================================================

/// A 0-indexed position in a text document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open 0-indexed range. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// True when `end` does not come after `start`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Severity level for a diagnostic. Analyzer annotations are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    Information,
}

impl DiagnosticSeverity {
    /// LSP numeric severity.
    #[must_use]
    pub fn to_lsp(self) -> u8 {
        match self {
            Self::Information => 3,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Information => "info",
        }
    }
}

// ============================================================================
// Annotation records
// ============================================================================

/// One `::notice` annotation as the analyzer reported it.
///
/// Line and column values are 1-indexed and unvalidated; see
/// [`AnnotationRecord::span_issue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    path: String,
    start_line: u32,
    start_column: u32,
    end_line: u32,
    end_column: u32,
    message: String,
}

/// Why an annotation span cannot be displayed faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpanIssue {
    #[error("line numbers are 1-indexed, got 0")]
    ZeroLine,
    #[error("column numbers are 1-indexed, got 0")]
    ZeroColumn,
    #[error("span ends on line {end_line} before it starts on line {start_line}")]
    Reversed { start_line: u32, end_line: u32 },
    #[error("span covers {lines} lines, more than {}", MAX_SPAN_LINES)]
    TooLong { lines: u32 },
}

impl AnnotationRecord {
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            start_line,
            start_column,
            end_line,
            end_column,
            message: message.into(),
        }
    }

    /// Path relative to the scanned root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    #[must_use]
    pub fn start_column(&self) -> u32 {
        self.start_column
    }

    #[must_use]
    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    #[must_use]
    pub fn end_column(&self) -> u32 {
        self.end_column
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Number of physical lines the span covers. Reversed spans cover none.
    #[must_use]
    pub fn line_count(&self) -> u32 {
        if self.end_line < self.start_line {
            0
        } else {
            (self.end_line - self.start_line).saturating_add(1)
        }
    }

    /// First problem with the span, if any. Oversized spans are reported
    /// ahead of everything else.
    #[must_use]
    pub fn span_issue(&self) -> Option<SpanIssue> {
        let lines = self.line_count();
        if lines > MAX_SPAN_LINES {
            return Some(SpanIssue::TooLong { lines });
        }
        if self.start_line == 0 || self.end_line == 0 {
            return Some(SpanIssue::ZeroLine);
        }
        if self.start_column == 0 || self.end_column == 0 {
            return Some(SpanIssue::ZeroColumn);
        }
        if self.end_line < self.start_line {
            return Some(SpanIssue::Reversed {
                start_line: self.start_line,
                end_line: self.end_line,
            });
        }
        None
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// A positioned diagnostic ready for display.
///
/// Fields are private; external consumers read via accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Path exactly as the analyzer reported it (relative to the root).
    path: PathBuf,
    range: Range,
    message: String,
    severity: DiagnosticSeverity,
    source: &'static str,
}

impl Diagnostic {
    /// Information-level diagnostic tagged with [`SOURCE_TAG`].
    #[must_use]
    pub fn information(path: impl Into<PathBuf>, range: Range, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            range,
            message: message.into(),
            severity: DiagnosticSeverity::Information,
            source: SOURCE_TAG,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn range(&self) -> Range {
        self.range
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn severity(&self) -> DiagnosticSeverity {
        self.severity
    }

    #[must_use]
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Format as `path:line:col: severity: [source] message` (1-indexed for display).
    #[must_use]
    pub fn display_with_path(&self, path: &Path) -> String {
        format!(
            "{}:{}:{}: {}: [{}] {}",
            path.display(),
            self.range.start.line + 1,
            self.range.start.character + 1,
            self.severity.label(),
            self.source,
            self.message,
        )
    }
}
