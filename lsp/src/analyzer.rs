//! Invocation of the external analyzer.
//!
//! The orchestrator only needs the analyzer's standard output for one root,
//! or a reason it could not be had. [`CommandAnalyzer`] runs the configured
//! executable as `<command> <root> --format=<format> [args...]`.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use nudge_config::AnalyzerConfig;
use thiserror::Error;
use tokio::process::Command;

/// Longest stderr excerpt kept in an [`AnalyzerError::Exit`].
const STDERR_EXCERPT_BYTES: usize = 512;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("{command} not found in PATH")]
    NotFound {
        command: String,
        #[source]
        source: which::Error,
    },
    #[error("spawning {command}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("analyzer {}: {stderr}", describe_exit(*code))]
    Exit { code: Option<i32>, stderr: String },
    #[error("analyzer timed out after {}s", timeout.as_secs())]
    TimedOut { timeout: Duration },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Produces annotation output for a monitored root.
pub trait Analyzer: Send + Sync + 'static {
    fn analyze(&self, root: &Path) -> impl Future<Output = Result<String, AnalyzerError>> + Send;
}

/// Runs the analyzer as a subprocess.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    command: String,
    format: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAnalyzer {
    #[must_use]
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            command: config.command(),
            format: config.format.clone(),
            args: config.args.clone(),
            timeout: config.timeout(),
        }
    }

    /// Arguments that follow the root path.
    #[must_use]
    pub fn flags(&self) -> Vec<String> {
        let mut flags = vec![format!("--format={}", self.format)];
        flags.extend(self.args.iter().cloned());
        flags
    }

    fn resolve(&self) -> Result<PathBuf, AnalyzerError> {
        which::which(&self.command).map_err(|source| AnalyzerError::NotFound {
            command: self.command.clone(),
            source,
        })
    }

    async fn run(&self, root: &Path) -> Result<String, AnalyzerError> {
        let program = self.resolve()?;
        let mut cmd = Command::new(&program);
        cmd.arg(root)
            .args(self.flags())
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            program = %program.display(),
            root = %root.display(),
            "Running analyzer"
        );

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| AnalyzerError::TimedOut {
                timeout: self.timeout,
            })?
            .map_err(|source| AnalyzerError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnalyzerError::Exit {
                code: output.status.code(),
                stderr: excerpt(stderr.trim(), STDERR_EXCERPT_BYTES),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Analyzer for CommandAnalyzer {
    fn analyze(&self, root: &Path) -> impl Future<Output = Result<String, AnalyzerError>> + Send {
        self.run(root)
    }
}

/// Longest prefix of `text` within `max_bytes`, cut on a char boundary.
fn excerpt(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
