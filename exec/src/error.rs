//! Error types for locating and invoking the wrapped executable.
//!
//! Covers every failure of a single invocation: bad option values (raised
//! before anything is spawned), failures to resolve or start the binary,
//! non-zero exits in captured mode, and the optional wait timeout.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use argv_shim_core::SerializeError;
use thiserror::Error;

/// Errors that can occur while preparing or running an invocation.
#[derive(Debug, Error)]
pub enum ExecError {
    /// An option value did not match its schema; nothing was spawned.
    #[error("invalid option value: {0}")]
    InvalidOption(#[from] SerializeError),

    /// The install location used for the default binary path is unknown.
    #[error("cannot determine install location: {0}")]
    Locate(#[source] io::Error),

    /// The executable could not be started (missing, not executable, ...).
    #[error("failed to spawn {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The executable ran but exited unsuccessfully (captured mode only).
    ///
    /// `code` is `None` when the process was terminated by a signal.
    #[error("{} exited with {}: {}", path.display(), describe_code(*code), stderr.trim_end())]
    ProcessExecution {
        path: PathBuf,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The configured wait timeout elapsed; the child was killed.
    #[error("{} did not exit within {timeout:?}", path.display())]
    Timeout { path: PathBuf, timeout: Duration },

    /// Waiting on the child process failed.
    #[error("failed to wait on child process: {0}")]
    Wait(#[source] io::Error),
}

impl ExecError {
    /// Exit status code of a [`ProcessExecution`](Self::ProcessExecution)
    /// failure, if the process exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ProcessExecution { code, .. } => *code,
            _ => None,
        }
    }

    /// Captured standard error of a failed captured-mode invocation.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ProcessExecution { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Returns `true` if the executable could not be started at all.
    pub fn is_spawn_error(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Convenience alias for results with [`ExecError`].
pub type Result<T> = std::result::Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_execution_accessors() {
        let err = ExecError::ProcessExecution {
            path: PathBuf::from("/opt/tool"),
            code: Some(2),
            stdout: String::new(),
            stderr: "bad flag\n".to_string(),
        };
        assert_eq!(err.exit_code(), Some(2));
        assert_eq!(err.stderr(), Some("bad flag\n"));
        assert!(!err.is_spawn_error());
        assert_eq!(err.to_string(), "/opt/tool exited with status 2: bad flag");
    }

    #[test]
    fn test_signal_termination_has_no_code() {
        let err = ExecError::ProcessExecution {
            path: PathBuf::from("tool"),
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), None);
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_invalid_option_wraps_serialize_error() {
        let err: ExecError = SerializeError::InvalidOptionValue {
            option: "tags".to_string(),
            expected: "an array",
        }
        .into();
        assert_eq!(err.to_string(), "invalid option value: tags should be an array");
        assert_eq!(err.exit_code(), None);
    }
}
