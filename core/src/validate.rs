//! Schema validation.
//!
//! Catches structural mistakes in hand-written schemas (missing dashes,
//! empty names, rule-less options) before they turn into confusing argument
//! vectors. Serialization itself never requires a validated schema.
//!
//! # Examples
//!
//! ```
//! use argv_shim_core::*;
//!
//! let schema = OptionsSchema::new().with_rule("org", OptionRule::string("--org"));
//! assert!(validate_schema(&schema).is_empty());
//!
//! // Invalid: flag missing its leading dash
//! let bad = OptionsSchema::new().with_rule("org", OptionRule::string("org"));
//! assert!(!validate_schema(&bad).is_empty());
//! ```

use thiserror::Error;

use crate::OptionsSchema;

/// Schema validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Logical option name is empty or whitespace-only.
    #[error("option name cannot be empty")]
    EmptyOptionName,
    /// An option declares no encoding rules.
    #[error("option has no rules: {0}")]
    MissingRules(String),
    /// A rule has an empty `param`.
    #[error("empty param for option: {0}")]
    EmptyParam(String),
    /// A rule's `param` does not start with a dash.
    #[error("invalid param format for option {option}: {param}")]
    InvalidParam { option: String, param: String },
    /// A rule's `param` contains whitespace and would not parse as one flag.
    #[error("param contains whitespace for option {option}: {param:?}")]
    WhitespaceInParam { option: String, param: String },
    /// A command token is empty.
    #[error("command token at position {0} is empty")]
    EmptyCommandToken(usize),
}

/// Validates an options schema.
///
/// Every entry is checked; the returned list holds one error per problem
/// found, in schema order.
pub fn validate_schema(schema: &OptionsSchema) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (name, rules) in schema.iter() {
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyOptionName);
            continue;
        }
        if rules.is_empty() {
            errors.push(ValidationError::MissingRules(name.to_string()));
            continue;
        }

        for rule in rules {
            let param = rule.param.as_str();
            if param.is_empty() {
                errors.push(ValidationError::EmptyParam(name.to_string()));
            } else if !param.starts_with('-') || param.trim_start_matches('-').is_empty() {
                errors.push(ValidationError::InvalidParam {
                    option: name.to_string(),
                    param: param.to_string(),
                });
            } else if param.chars().any(char::is_whitespace) {
                errors.push(ValidationError::WhitespaceInParam {
                    option: name.to_string(),
                    param: param.to_string(),
                });
            }
        }
    }

    errors
}

/// Validates literal command tokens (the subcommand path).
///
/// An empty command is allowed; empty tokens within it are not.
pub fn validate_command<S: AsRef<str>>(command: &[S]) -> Vec<ValidationError> {
    command
        .iter()
        .enumerate()
        .filter(|(_, token)| token.as_ref().is_empty())
        .map(|(index, _)| ValidationError::EmptyCommandToken(index))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::OptionRule;

    use super::*;

    #[test]
    fn test_validate_schema_accepts_valid_schema() {
        let schema = OptionsSchema::new()
            .with_rule("tags", OptionRule::array("--tag"))
            .with_rule("verbose", OptionRule::boolean("-v"))
            .with_rule("color", OptionRule::inverted_boolean("--no-color"));

        assert!(validate_schema(&schema).is_empty());
    }

    #[test]
    fn test_validate_schema_rejects_bad_params() {
        let schema = OptionsSchema::new()
            .with_rule("org", OptionRule::string("org"))
            .with_rule("dashes", OptionRule::string("--"))
            .with_rule("blank", OptionRule::string(""))
            .with_rule("spaced", OptionRule::string("--two words"));

        let errors = validate_schema(&schema);
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidParam {
                    option: "org".to_string(),
                    param: "org".to_string(),
                },
                ValidationError::InvalidParam {
                    option: "dashes".to_string(),
                    param: "--".to_string(),
                },
                ValidationError::EmptyParam("blank".to_string()),
                ValidationError::WhitespaceInParam {
                    option: "spaced".to_string(),
                    param: "--two words".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_validate_schema_rejects_empty_names_and_rule_lists() {
        let schema: OptionsSchema = serde_json::from_str(r#"{" ": {"param": "--x"}, "none": []}"#)
            .expect("schema should parse");
        assert_eq!(schema.option_names(), vec![" ", "none"]);
        assert_eq!(schema.get("none"), Some(&[][..]));

        let errors = validate_schema(&schema);
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyOptionName,
                ValidationError::MissingRules("none".to_string()),
            ]
        );
    }

    #[test]
    fn test_validate_command_flags_empty_tokens() {
        assert!(validate_command(&["releases", "new"]).is_empty());
        assert!(validate_command::<&str>(&[]).is_empty());
        assert_eq!(
            validate_command(&["releases", ""]),
            vec![ValidationError::EmptyCommandToken(1)]
        );
    }
}
