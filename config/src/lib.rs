//! Configuration loading for nudge-ls.
//!
//! Configuration lives in `~/.nudge/config.toml` unless `NUDGE_LS_CONFIG`
//! points elsewhere. Every field has a default, so a missing file or a
//! partial one is fine.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "NUDGE_LS_CONFIG";

const DEFAULT_COMMAND: &str = "nudge";
const DEFAULT_FORMAT: &str = "github";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LANGUAGES: [&str; 3] = ["go", "rust", "c"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    pub analyzer: AnalyzerConfig,
    pub scan: ScanConfig,
}

/// How the external analyzer is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Executable name or path. `${VAR}` references are expanded.
    pub command: String,
    /// Value passed as `--format=<format>`.
    pub format: String,
    /// Extra arguments appended after `--format`.
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            format: DEFAULT_FORMAT.to_string(),
            args: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AnalyzerConfig {
    /// Command with environment variables expanded.
    #[must_use]
    pub fn command(&self) -> String {
        expand_env_vars(&self.command)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// When scans run and how their output is filtered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Language identifiers whose saves trigger a scan.
    pub languages: Vec<String>,
    /// Activate scanning as soon as the client finishes initialization.
    pub start_active: bool,
    /// Drop annotations with zero or reversed spans instead of clamping them.
    pub strict_spans: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.iter().map(ToString::to_string).collect(),
            start_active: false,
            strict_spans: false,
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub fn watches_language(&self, language_id: &str) -> bool {
        self.languages.iter().any(|lang| lang == language_id)
    }
}

/// Replace `${VAR}` with the variable's value (empty when unset).
///
/// An unterminated `${` is kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

impl NudgeConfig {
    /// Load from the default location, falling back to defaults.
    ///
    /// Read and parse failures are logged, never fatal.
    #[must_use]
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(Some(config)) => {
                tracing::info!(path = %path.display(), "Loaded config");
                config
            }
            Ok(None) => Self::default(),
            Err(err) => {
                tracing::warn!("Ignoring config at {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Load from `path`. `Ok(None)` when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map(Some)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = env::var(CONFIG_PATH_ENV)
        && !explicit.trim().is_empty()
    {
        return Some(PathBuf::from(explicit));
    }
    dirs::home_dir().map(|home| home.join(".nudge").join("config.toml"))
}
