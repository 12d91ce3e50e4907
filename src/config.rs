//! Client configuration parsing and validation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::process::SpawnConfig;
use crate::protocol::codec::MAX_LINE_BYTES;
use crate::{AppError, Result};

fn default_server_cmd() -> PathBuf {
    PathBuf::from("./mediafileinfo.py")
}

fn default_server_args() -> Vec<String> {
    vec!["--pipe".into()]
}

fn default_max_line_bytes() -> usize {
    MAX_LINE_BYTES
}

fn default_true() -> bool {
    true
}

fn default_env_allowlist() -> Vec<String> {
    ["PATH", "HOME", "LANG", "LC_ALL", "PYTHONIOENCODING", "RUST_LOG"]
        .iter()
        .map(|&key| key.to_owned())
        .collect()
}

/// Client configuration parsed from a TOML file.
///
/// Every field is optional; an empty file yields [`ClientConfig::default`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ClientConfig {
    /// Server executable.
    #[serde(default = "default_server_cmd")]
    pub server_cmd: PathBuf,
    /// Arguments passed to the server executable.
    #[serde(default = "default_server_args")]
    pub server_args: Vec<String>,
    /// Directory the server starts in; inherited when unset.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Maximum accepted response line length in bytes.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
    /// Pass the full client environment to the server.
    #[serde(default = "default_true")]
    pub inherit_env: bool,
    /// Variables passed through when `inherit_env` is `false`.
    #[serde(default = "default_env_allowlist")]
    pub env_allowlist: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_cmd: default_server_cmd(),
            server_args: default_server_args(),
            working_dir: None,
            max_line_bytes: default_max_line_bytes(),
            inherit_env: true,
            env_allowlist: default_env_allowlist(),
        }
    }
}

impl ClientConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Process launch settings derived from this configuration.
    #[must_use]
    pub fn spawn_config(&self) -> SpawnConfig {
        SpawnConfig {
            server_cmd: self.server_cmd.clone(),
            server_args: self.server_args.clone(),
            working_dir: self.working_dir.clone(),
            max_line_bytes: self.max_line_bytes,
            env_allowlist: if self.inherit_env {
                None
            } else {
                Some(self.env_allowlist.clone())
            },
        }
    }

    /// Check invariants that TOML types alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` on an empty `server_cmd`, a zero
    /// `max_line_bytes`, or a `working_dir` that does not resolve.
    pub fn validate(&mut self) -> Result<()> {
        if self.server_cmd.as_os_str().is_empty() {
            return Err(AppError::Config("server_cmd must not be empty".into()));
        }

        if self.max_line_bytes == 0 {
            return Err(AppError::Config(
                "max_line_bytes must be greater than zero".into(),
            ));
        }

        if let Some(dir) = &self.working_dir {
            let canonical = dir
                .canonicalize()
                .map_err(|err| AppError::Config(format!("working_dir invalid: {err}")))?;
            self.working_dir = Some(canonical);
        }

        Ok(())
    }
}
