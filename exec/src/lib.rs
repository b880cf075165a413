//! Locating and invoking a wrapped command-line executable.
//!
//! - [`BinaryPath`] resolves the executable's location (install-relative by
//!   default, replaceable for test doubles).
//! - [`Invoker`] runs it once per call in [`Mode::Captured`] or
//!   [`Mode::Live`].
//! - [`ExecError`] covers invalid options, spawn failures, non-zero exits
//!   and timeouts.
//!
//! Argument vectors come from [`argv_shim_core`], re-exported here as
//! [`schema`].
//!
//! # Quick start
//!
//! ```no_run
//! use argv_shim_exec::schema::{OptionRule, OptionsSchema};
//! use argv_shim_exec::{Invoker, Mode};
//! use serde_json::json;
//!
//! let invoker = Invoker::from_install_location("tool").unwrap();
//! let schema = OptionsSchema::new().with_rule("version", OptionRule::string("--tag"));
//! let options = json!({"version": "1.0"});
//!
//! let stdout = invoker
//!     .run(["releases", "new"], &schema, options.as_object().unwrap(), Mode::Captured)
//!     .unwrap();
//! println!("{}", stdout.trim());
//! ```

mod error;
mod invoke;
mod locate;

pub use argv_shim_core as schema;
pub use error::{ExecError, Result};
pub use invoke::{Invoker, Mode};
pub use locate::{BinaryPath, OsFamily};
