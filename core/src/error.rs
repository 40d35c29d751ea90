//! Binding error types.
//!
//! Errors are collected per top-level parameter into the
//! [`BoundResult`](crate::BoundResult) instead of aborting the whole bind,
//! so one call can report every problem.

use serde::Serialize;
use thiserror::Error;

/// A failure to bind one parameter.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum BindError {
    /// A token (or configured value) was present but not convertible.
    #[error("invalid value {raw:?} for {field}: expected {expected} ({reason})")]
    Conversion {
        /// Dotted path of the field.
        field: String,
        /// The offending token or configured value.
        raw: String,
        /// Expected type description (e.g. `int`, `{fast, slow}`).
        expected: String,
        reason: String,
    },

    /// A required field had no token, default, or configured value.
    #[error("missing required argument: {field}")]
    MissingArgument { field: String },

    /// No candidate of a sum type bound.
    #[error("no variant of {expected} matched {field}")]
    NoMatchingVariant {
        field: String,
        expected: String,
        tried: Vec<VariantFailure>,
    },

    /// A positional value reached a parameter declared after one that was
    /// supplied by keyword.
    #[error(
        "positional value {token:?} for {field} follows {} supplied by keyword",
        after.join(", ")
    )]
    ArgumentOrder {
        field: String,
        token: String,
        /// Earlier parameters given as `--name`.
        after: Vec<String>,
    },
}

/// Why one sum variant was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantFailure {
    /// Type description of the variant.
    pub variant: String,
    pub error: BindError,
}

impl BindError {
    /// Dotted path of the field the error refers to.
    pub fn field(&self) -> &str {
        match self {
            BindError::Conversion { field, .. }
            | BindError::MissingArgument { field }
            | BindError::NoMatchingVariant { field, .. }
            | BindError::ArgumentOrder { field, .. } => field,
        }
    }

    /// Top-level parameter name the error belongs to.
    pub fn parameter(&self) -> &str {
        let field = self.field();
        field.split('.').next().unwrap_or(field)
    }

    pub(crate) fn conversion(
        field: impl Into<String>,
        raw: impl Into<String>,
        expected: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        BindError::Conversion {
            field: field.into(),
            raw: raw.into(),
            expected: expected.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        BindError::MissingArgument {
            field: field.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_is_first_path_segment() {
        let err = BindError::missing("user.tastes.wine");
        assert_eq!(err.parameter(), "user");
        assert_eq!(err.to_string(), "missing required argument: user.tastes.wine");
    }

    #[test]
    fn test_conversion_message() {
        let err = BindError::conversion("count", "ten", "int", "invalid digit");
        assert_eq!(
            err.to_string(),
            r#"invalid value "ten" for count: expected int (invalid digit)"#
        );
    }

    #[test]
    fn test_argument_order_message() {
        let err = BindError::ArgumentOrder {
            field: "b".into(),
            token: "1".into(),
            after: vec!["a".into()],
        };
        assert_eq!(err.to_string(), r#"positional value "1" for b follows a supplied by keyword"#);
    }
}
