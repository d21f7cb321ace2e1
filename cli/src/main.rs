//! nudge-ls: binary entry point.
//!
//! Speaks LSP over stdin/stdout. Stdout carries the protocol, so logs go to
//! a file (`~/.nudge/logs/nudge-ls.log`) and never to the terminal.

use anyhow::Result;
use std::{
    env,
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use nudge_config::NudgeConfig;
use nudge_lsp::{CommandAnalyzer, LanguageServer};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than write into the protocol stream.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: next to the config file, ~/.nudge/logs/nudge-ls.log
    if let Some(config_path) = NudgeConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("nudge-ls.log"));
    }

    candidates.push(PathBuf::from(".nudge").join("logs").join("nudge-ls.log"));

    candidates
}

/// Handle `--version`. Other arguments, such as `--stdio`, are ignored.
fn print_version_if_asked() -> bool {
    let asked = env::args()
        .skip(1)
        .any(|arg| arg == "--version" || arg == "-V");
    if asked {
        println!("nudge-ls {}", env!("CARGO_PKG_VERSION"));
    }
    asked
}

#[tokio::main]
async fn main() -> Result<()> {
    if print_version_if_asked() {
        return Ok(());
    }

    init_tracing();

    let config = NudgeConfig::load();
    let analyzer = CommandAnalyzer::from_config(&config.analyzer);
    tracing::info!(
        command = %config.analyzer.command(),
        languages = ?config.scan.languages,
        "Starting nudge-ls"
    );

    let server = LanguageServer::new(analyzer, config.scan);
    let result = server.serve(tokio::io::stdin(), tokio::io::stdout()).await;
    if let Err(e) = &result {
        tracing::error!("Server stopped: {e:#}");
    }
    result
}
