//! Domain error types for build-timestamp.
//!
//! All business-logic errors are defined here using `thiserror`.
//! These errors are converted to user-friendly messages at the CLI boundary.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while validating or evaluating timestamp properties.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// The shift expression does not follow the `[sign]digits unit` grammar.
    #[error("invalid time shift expression '{expression}': {reason}")]
    MalformedShiftExpression {
        /// The expression that failed to parse.
        expression: String,
        /// Description of the parsing failure.
        reason: String,
    },

    /// Applying a shift produced a date outside the representable range.
    #[error("time shift expression '{expression}' moves the timestamp out of range")]
    ShiftOutOfRange {
        /// The expression being applied.
        expression: String,
    },

    /// The date pattern cannot be compiled.
    #[error("invalid pattern '{pattern}': {reason}")]
    MalformedPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// Description of the compilation failure.
        reason: String,
    },

    /// A property key is empty or contains non-word characters.
    #[error("invalid variable name '{key}': expected one or more word characters")]
    InvalidPropertyKey {
        /// The rejected key.
        key: String,
    },

    /// Two extra properties share the same key.
    #[error("duplicate property key '{key}'")]
    DuplicatePropertyKey {
        /// The repeated key.
        key: String,
    },

    /// The timezone id is not in the timezone database.
    #[error("unknown timezone '{timezone}'")]
    UnknownTimezone {
        /// The timezone id that was not found.
        timezone: String,
    },

    /// The configuration document has the wrong shape.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the structural problem.
        reason: String,
    },

    /// The base instant passed on the command line could not be parsed.
    #[error("invalid instant '{value}': expected RFC 3339 or Unix epoch seconds")]
    InvalidInstant {
        /// The rejected input.
        value: String,
    },

    /// Failed to read the configuration file.
    #[error("failed to read config file '{path}': {reason}")]
    ConfigFileError {
        /// Path to the config file.
        path: String,
        /// Description of the read failure.
        reason: String,
    },
}

/// A single semantic problem found while validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Where the problem is, e.g. `pattern` or `extraProperties[1].key`.
    pub field: String,
    /// The underlying error.
    pub error: TimestampError,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// All problems found by configuration validation.
///
/// Validation reports every issue at once rather than stopping at the
/// first, so a user can fix the whole form in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("configuration has {} problem(s): {}", .issues.len(), join_issues(&.issues))]
pub struct ConfigError {
    /// The individual problems, in document order.
    pub issues: Vec<ConfigIssue>,
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_shift_expression_display() {
        let err = TimestampError::MalformedShiftExpression {
            expression: "+7x".to_string(),
            reason: "unknown unit 'x'".to_string(),
        };
        assert!(err.to_string().contains("+7x"));
        assert!(err.to_string().contains("unknown unit 'x'"));
        assert!(err.to_string().starts_with("invalid time shift expression"));
    }

    #[test]
    fn test_shift_out_of_range_display() {
        let err = TimestampError::ShiftOutOfRange {
            expression: "+2147483647Y".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "time shift expression '+2147483647Y' moves the timestamp out of range"
        );
    }

    #[test]
    fn test_malformed_pattern_display() {
        let err = TimestampError::MalformedPattern {
            pattern: "yyyy-bb".to_string(),
            reason: "illegal pattern character 'b'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid pattern 'yyyy-bb': illegal pattern character 'b'"
        );
    }

    #[test]
    fn test_invalid_property_key_display() {
        let err = TimestampError::InvalidPropertyKey {
            key: "MY-KEY".to_string(),
        };
        assert!(err.to_string().starts_with("invalid variable name"));
        assert!(err.to_string().contains("MY-KEY"));
    }

    #[test]
    fn test_duplicate_property_key_display() {
        let err = TimestampError::DuplicatePropertyKey {
            key: "TAG".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate property key 'TAG'");
    }

    #[test]
    fn test_unknown_timezone_display() {
        let err = TimestampError::UnknownTimezone {
            timezone: "Mars/Olympus".to_string(),
        };
        assert_eq!(err.to_string(), "unknown timezone 'Mars/Olympus'");
    }

    #[test]
    fn test_invalid_instant_display() {
        let err = TimestampError::InvalidInstant {
            value: "yesterday".to_string(),
        };
        assert!(err.to_string().contains("yesterday"));
        assert!(err.to_string().contains("RFC 3339"));
    }

    #[test]
    fn test_config_file_error_display() {
        let err = TimestampError::ConfigFileError {
            path: "/tmp/config.json".to_string(),
            reason: "file not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to read config file '/tmp/config.json': file not found"
        );
    }

    #[test]
    fn test_config_error_lists_every_issue() {
        let err = ConfigError {
            issues: vec![
                ConfigIssue {
                    field: "extraProperties[0].key".to_string(),
                    error: TimestampError::InvalidPropertyKey {
                        key: "A B".to_string(),
                    },
                },
                ConfigIssue {
                    field: "pattern".to_string(),
                    error: TimestampError::MalformedPattern {
                        pattern: "'".to_string(),
                        reason: "unterminated quote".to_string(),
                    },
                },
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("configuration has 2 problem(s)"));
        assert!(message.contains("extraProperties[0].key: invalid variable name 'A B'"));
        assert!(message.contains("pattern: invalid pattern"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TimestampError>();
        assert_send_sync::<ConfigError>();
    }
}
