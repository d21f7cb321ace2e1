//! Language server that runs the nudge analyzer over workspace roots and
//! publishes its annotations as editor diagnostics.
//!
//! The pipeline is: analyzer output ([`annotation`]) to per-line diagnostics
//! ([`expand`]) to per-file sets ([`aggregate`]), with the
//! [`ScanOrchestrator`] deciding when scans run and what stays published.

pub mod analyzer;
pub mod annotation;
pub mod codec;
pub mod expand;
pub mod orchestrator;
pub mod types;

pub(crate) mod diagnostics;
pub(crate) mod protocol;
pub(crate) mod server;

pub use analyzer::{Analyzer, AnalyzerError, CommandAnalyzer};
pub use annotation::{parse_line, parse_output};
pub use codec::{FrameReader, FrameWriter};
pub use diagnostics::{aggregate, collect_output};
pub use expand::expand;
pub use orchestrator::{ScanCompletion, ScanOrchestrator, ScanState};
pub use protocol::CHECK_WORKSPACE_COMMAND;
pub use server::LanguageServer;
pub use types::{DiagnosticsSnapshot, Publication};
