//! Argument vector serialization.
//!
//! Turns an [`Options`] object into the flat argument list a command-line
//! executable expects, following an [`OptionsSchema`]. Serialization is pure:
//! equal inputs always produce equal output, and nothing is spawned.
//!
//! # Examples
//!
//! ```
//! use argv_shim_core::*;
//! use serde_json::json;
//!
//! let schema = OptionsSchema::new()
//!     .with_rule("version", OptionRule::string("--tag"))
//!     .with_rule("verbose", OptionRule::boolean("--verbose"));
//! let options = json!({"version": "1.0", "verbose": false});
//!
//! let argv = prepare_command(["releases", "new"], &schema, options.as_object().unwrap()).unwrap();
//! assert_eq!(argv, vec!["releases", "new", "--tag", "1.0"]);
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::{OptionKind, OptionRule, Options, OptionsSchema};

/// Option values that do not fit their schema-declared encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    /// The value for `option` has the wrong shape (e.g. a string where an
    /// array was declared).
    #[error("{option} should be {expected}")]
    InvalidOptionValue {
        option: String,
        expected: &'static str,
    },
}

impl SerializeError {
    /// Logical option name that failed to serialize.
    pub fn option(&self) -> &str {
        match self {
            Self::InvalidOptionValue { option, .. } => option,
        }
    }
}

fn invalid(option: &str, expected: &'static str) -> SerializeError {
    SerializeError::InvalidOptionValue {
        option: option.to_string(),
        expected,
    }
}

/// Serializes `options` into command-line arguments according to `schema`.
///
/// Entries are visited in schema order and each entry's rules in declared
/// order. Options missing from `options` (or set to `null`) emit nothing;
/// keys of `options` the schema does not name are ignored.
///
/// # Errors
///
/// Returns [`SerializeError::InvalidOptionValue`] naming the offending key
/// when a value does not match its rule: a non-array for `array`, a
/// non-bool for `boolean`/`inverted-boolean`, or an array/object for a
/// passthrough rule.
pub fn serialize_options(
    schema: &OptionsSchema,
    options: &Options,
) -> Result<Vec<String>, SerializeError> {
    let mut args = Vec::new();
    for (name, rules) in schema.iter() {
        let value = match options.get(name) {
            None | Some(Value::Null) => continue,
            Some(value) => value,
        };
        for rule in rules {
            encode_rule(name, rule, value, &mut args)?;
        }
    }
    Ok(args)
}

/// Prepends the literal `command` tokens to the serialized options.
///
/// Tokens are passed through verbatim. Pass [`OptionsSchema::default()`] and
/// an empty [`Options`] for a command without options.
///
/// # Errors
///
/// Propagates [`SerializeError`] from [`serialize_options`].
pub fn prepare_command<I, S>(
    command: I,
    schema: &OptionsSchema,
    options: &Options,
) -> Result<Vec<String>, SerializeError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args: Vec<String> = command.into_iter().map(Into::into).collect();
    args.extend(serialize_options(schema, options)?);
    Ok(args)
}

fn encode_rule(
    name: &str,
    rule: &OptionRule,
    value: &Value,
    args: &mut Vec<String>,
) -> Result<(), SerializeError> {
    match rule.kind {
        OptionKind::Array => {
            let items = value.as_array().ok_or_else(|| invalid(name, "an array"))?;
            for item in items {
                args.push(rule.param.clone());
                args.push(value_to_arg(item));
            }
        }
        OptionKind::Boolean => {
            let enabled = value.as_bool().ok_or_else(|| invalid(name, "a bool"))?;
            if enabled {
                args.push(rule.param.clone());
            }
        }
        OptionKind::InvertedBoolean => {
            let enabled = value.as_bool().ok_or_else(|| invalid(name, "a bool"))?;
            if !enabled {
                args.push(rule.param.clone());
            }
        }
        OptionKind::Passthrough => {
            if value.is_array() || value.is_object() {
                return Err(invalid(name, "a string"));
            }
            args.push(rule.param.clone());
            args.push(value_to_arg(value));
        }
    }
    Ok(())
}

/// Textual form of a single value.
///
/// Strings are passed verbatim. Numbers with no fractional part print as
/// integers (`1.0` becomes `1`), nested arrays are joined with `,` and
/// `null` elements inside them are empty. Objects fall back to JSON text.
pub fn value_to_arg(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number_to_arg(number),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => value_to_arg(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn number_to_arg(number: &serde_json::Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() && float == 0.0 => "0".to_string(),
        Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e15 => {
            format!("{float:.0}")
        }
        _ => number.to_string(),
    }
}
