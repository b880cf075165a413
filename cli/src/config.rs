//! Shim configuration file.
//!
//! Declares the wrapped binary and a set of named commands, each with its
//! literal subcommand path and options schema.
//!
//! # Example YAML
//!
//! ```yaml
//! binary:
//!   name: sentry-cli
//! timeout_ms: 30000
//! commands:
//!   new-release:
//!     command: [releases, new]
//!     schema:
//!       version: { param: --tag, type: string }
//!       finalize:
//!         - { param: --finalize, type: boolean }
//! ```
//!
//! A `.json` file with the same structure is read as JSON.

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use argv_shim_core::{OptionsSchema, ValidationError, validate_command, validate_schema};
use argv_shim_exec::{BinaryPath, ExecError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or querying a [`ShimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("config must set binary.name or binary.path")]
    MissingBinary,

    #[error(transparent)]
    Locate(#[from] ExecError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Where the wrapped executable lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryConfig {
    /// Binary name resolved relative to the install location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Explicit path; wins over `name`. Relative paths are taken from the
    /// directory holding the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// One named command: literal tokens plus the schema for its options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub schema: OptionsSchema,
}

/// Top-level shim configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShimConfig {
    #[serde(default)]
    pub binary: BinaryConfig,
    /// Optional bound on how long an invocation may run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub commands: BTreeMap<String, CommandConfig>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl ShimConfig {
    /// Loads configuration from a YAML file, or JSON for a `.json` path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Yaml`] / [`ConfigError::Json`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut config: Self = if is_json(path) {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Saves the configuration, as JSON for a `.json` path and YAML otherwise.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(std::fs::File::create(path)?);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_yaml::to_writer(writer, self)?;
        }
        Ok(())
    }

    /// Minimal config for `binary_name` with a single `version` command.
    pub fn starter(binary_name: &str) -> Self {
        let mut config = Self {
            binary: BinaryConfig {
                name: Some(binary_name.to_string()),
                path: None,
            },
            ..Self::default()
        };
        config.commands.insert(
            "version".to_string(),
            CommandConfig {
                command: vec!["--version".to_string()],
                schema: OptionsSchema::default(),
            },
        );
        config
    }

    /// Looks up a named command.
    pub fn command(&self, name: &str) -> Result<&CommandConfig> {
        self.commands
            .get(name)
            .ok_or_else(|| ConfigError::UnknownCommand(name.to_string()))
    }

    /// Resolves the configured binary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBinary`] if neither `name` nor `path`
    /// is set, or [`ConfigError::Locate`] if the install location is unknown.
    pub fn binary_path(&self) -> Result<BinaryPath> {
        if let Some(path) = &self.binary.path {
            let resolved = match &self.base_dir {
                Some(base) if path.is_relative() => base.join(path),
                _ => path.clone(),
            };
            return Ok(BinaryPath::new(resolved));
        }
        let name = self.binary.name.as_deref().ok_or(ConfigError::MissingBinary)?;
        Ok(BinaryPath::from_install_location(name)?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Validates every command; returns `(command name, error)` pairs.
    pub fn validate(&self) -> Vec<(String, ValidationError)> {
        self.commands
            .iter()
            .flat_map(|(name, command)| {
                validate_command(&command.command)
                    .into_iter()
                    .chain(validate_schema(&command.schema))
                    .map(move |error| (name.clone(), error))
            })
            .collect()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
