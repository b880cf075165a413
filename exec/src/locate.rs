//! Executable location.
//!
//! The wrapped binary lives at a fixed position relative to the install
//! location: `..\bin\<name>.exe` on Windows and `../<name>` everywhere else.
//! A [`BinaryPath`] is resolved once and then handed to the
//! [`Invoker`](crate::Invoker) that uses it; tests swap it for a double with
//! [`BinaryPath::set_path`] or [`BinaryPath::new`].

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ExecError, Result};

/// Host operating system family, as far as binary layout is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    Unix,
}

impl OsFamily {
    /// Family of the host this crate was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    /// Executable suffix for this family (`.exe` or nothing).
    pub fn exe_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Unix => "",
        }
    }
}

/// Path of the executable every invocation targets.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use argv_shim_exec::{BinaryPath, OsFamily};
///
/// let resolved = BinaryPath::resolve_for(OsFamily::Unix, "tool", Path::new("/opt/pkg/lib"));
/// assert_eq!(resolved.path(), Path::new("/opt/pkg/tool"));
///
/// let mut binary = resolved;
/// binary.set_path("/tmp/fake-tool");
/// assert_eq!(binary.path(), Path::new("/tmp/fake-tool"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPath {
    path: PathBuf,
}

impl BinaryPath {
    /// Uses `path` as-is.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location of `name` relative to `install_dir` on this host.
    pub fn resolve(name: &str, install_dir: &Path) -> Self {
        Self::resolve_for(OsFamily::current(), name, install_dir)
    }

    /// Default location of `name` relative to `install_dir` for `family`.
    pub fn resolve_for(family: OsFamily, name: &str, install_dir: &Path) -> Self {
        let base = parent_dir(install_dir);
        let file_name = format!("{name}{}", family.exe_suffix());
        let path = match family {
            OsFamily::Windows => base.join("bin").join(file_name),
            OsFamily::Unix => base.join(file_name),
        };
        Self { path }
    }

    /// Default location of `name` relative to the running executable.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Locate`] if the current executable's path cannot
    /// be determined.
    pub fn from_install_location(name: &str) -> Result<Self> {
        let exe = std::env::current_exe().map_err(ExecError::Locate)?;
        let install_dir = exe.parent().unwrap_or_else(|| Path::new("."));
        let resolved = Self::resolve(name, install_dir);
        debug!(name, binary = %resolved.path.display(), "Resolved default binary path");
        Ok(resolved)
    }

    /// Currently active path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the active path; later invocations target the new one.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }
}

/// Lexical `..` of `dir`; falls back to a literal `..` component when `dir`
/// has no parent to strip.
fn parent_dir(dir: &Path) -> PathBuf {
    match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => dir.join(".."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_unix_layout() {
        let binary = BinaryPath::resolve_for(OsFamily::Unix, "tool", Path::new("/opt/pkg/js"));
        assert_eq!(binary.path(), Path::new("/opt/pkg/tool"));
    }

    #[test]
    fn test_resolve_windows_layout() {
        let binary =
            BinaryPath::resolve_for(OsFamily::Windows, "tool", Path::new("/opt/pkg/js"));
        assert_eq!(binary.path(), Path::new("/opt/pkg/bin/tool.exe"));
    }

    #[test]
    fn test_resolve_relative_dir_without_parent() {
        let binary = BinaryPath::resolve_for(OsFamily::Unix, "tool", Path::new("js"));
        assert_eq!(binary.path(), Path::new("js/../tool"));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let dir = Path::new("/srv/app/lib");
        assert_eq!(
            BinaryPath::resolve("tool", dir),
            BinaryPath::resolve("tool", dir)
        );
    }

    #[test]
    fn test_set_path_returns_latest_value() {
        let mut binary = BinaryPath::new("/first");
        binary.set_path("/second");
        binary.set_path("/third");
        assert_eq!(binary.path(), Path::new("/third"));
    }

    #[test]
    fn test_from_install_location_uses_current_exe() {
        let binary = BinaryPath::from_install_location("tool").unwrap();
        let exe = std::env::current_exe().unwrap();
        let expected = BinaryPath::resolve("tool", exe.parent().unwrap());
        assert_eq!(binary, expected);
    }
}
