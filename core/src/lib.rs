//! Core option schema types and argument vector serialization.
//!
//! This crate turns a structured options object into the flat argument list
//! of a wrapped command-line executable:
//!
//! - [`OptionsSchema`] — ordered mapping from a logical option name to one or
//!   more [`OptionRule`]s.
//! - [`OptionRule`] — the literal flag (`param`) plus an [`OptionKind`]
//!   encoding (`array`, `boolean`, `inverted-boolean`, or passthrough).
//! - [`Options`] — the runtime values, a JSON object.
//!
//! [`serialize_options`] expands options into arguments and
//! [`prepare_command`] prepends the literal subcommand path. Validation
//! ([`validate_schema`]) catches malformed hand-written schemas.
//!
//! # Example
//!
//! ```
//! use argv_shim_core::*;
//! use serde_json::json;
//!
//! let schema = OptionsSchema::new()
//!     .with_rule("tags", OptionRule::array("--tag"))
//!     .with_rule("color", OptionRule::inverted_boolean("--no-color"));
//! assert!(validate_schema(&schema).is_empty());
//!
//! let options = json!({"tags": ["a", "b"], "color": false});
//! let args = serialize_options(&schema, options.as_object().unwrap()).unwrap();
//! assert_eq!(args, vec!["--tag", "a", "--tag", "b", "--no-color"]);
//! ```

mod serialize;
mod types;
mod validate;

pub use serialize::{SerializeError, prepare_command, serialize_options, value_to_arg};
pub use types::*;
pub use validate::{ValidationError, validate_command, validate_schema};
