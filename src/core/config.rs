//! Build-timestamp configuration snapshots.
//!
//! The configuration store hands over a generic JSON document shaped like
//! the job configuration form:
//!
//! ```json
//! {
//!   "enableBuildTimestamp": {
//!     "timezone": "Europe/Berlin",
//!     "pattern": "yyyy-MM-dd HH:mm:ss z",
//!     "extraProperties": [
//!       { "key": "YESTERDAY", "value": "yyyy-MM-dd", "shiftExpression": "-1D" }
//!     ]
//!   }
//! }
//! ```
//!
//! [`TimestampConfig::from_value`] turns it into an immutable snapshot,
//! filling in defaults. [`TimestampConfig::validate`] performs the checks
//! that must pass before a configuration is accepted.

use std::collections::HashSet;

use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;

use crate::core::{formatter, shift};
use crate::error::{ConfigError, ConfigIssue, TimestampError};

/// Property that always carries the unshifted build timestamp.
pub const DEFAULT_PROPERTY: &str = "BUILD_TIMESTAMP";

/// Pattern used when the store leaves the pattern blank.
pub const DEFAULT_PATTERN: &str = "yyyy-MM-dd HH:mm:ss z";

/// Timezone used when the store leaves the timezone blank.
pub const DEFAULT_TIMEZONE: Tz = Tz::UTC;

/// A user-defined property: a key, its date pattern and a time shift.
///
/// Fields hold the raw strings from the store. A snapshot loaded from an
/// old or hand-edited store may carry invalid values; those are reported
/// per property when the snapshot is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtraProperty {
    pub key: String,
    pub pattern: String,
    pub shift_expression: String,
}

impl ExtraProperty {
    pub fn new(
        key: impl Into<String>,
        pattern: impl Into<String>,
        shift_expression: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            pattern: pattern.into(),
            shift_expression: shift_expression.into(),
        }
    }
}

/// Immutable configuration for one build invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampConfig {
    pub enabled: bool,
    /// Pattern for [`DEFAULT_PROPERTY`].
    pub pattern: String,
    pub timezone: Tz,
    pub extra_properties: Vec<ExtraProperty>,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pattern: DEFAULT_PATTERN.to_string(),
            timezone: DEFAULT_TIMEZONE,
            extra_properties: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    extra_properties: Option<OneOrMany>,
}

/// The form submits a lone object when only one row is filled in.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<RawExtraProperty>),
    One(RawExtraProperty),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExtraProperty {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    shift_expression: String,
}

impl From<RawExtraProperty> for ExtraProperty {
    fn from(raw: RawExtraProperty) -> Self {
        Self {
            key: raw.key,
            pattern: raw.value,
            shift_expression: raw.shift_expression,
        }
    }
}

impl TimestampConfig {
    /// A configuration that sets no properties.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Build a snapshot from a configuration document.
    ///
    /// A missing, `null` or empty `enableBuildTimestamp` section disables
    /// the feature. Blank `timezone` and `pattern` fall back to
    /// [`DEFAULT_TIMEZONE`] and [`DEFAULT_PATTERN`].
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::InvalidConfig`] if the document has the
    /// wrong shape, or [`TimestampError::UnknownTimezone`] if the timezone
    /// id is not in the timezone database.
    pub fn from_value(document: &Value) -> Result<Self, TimestampError> {
        if !document.is_object() {
            return Err(TimestampError::InvalidConfig {
                reason: "expected a JSON object at the top level".to_string(),
            });
        }

        let section = match document.get("enableBuildTimestamp") {
            None | Some(Value::Null) => return Ok(Self::disabled()),
            Some(Value::Object(map)) if map.is_empty() => return Ok(Self::disabled()),
            Some(section) => section,
        };

        let raw: RawSettings =
            serde_json::from_value(section.clone()).map_err(|e| TimestampError::InvalidConfig {
                reason: format!("enableBuildTimestamp: {e}"),
            })?;

        let timezone = match raw.timezone.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_TIMEZONE,
            Some(id) => parse_timezone(id)?,
        };

        let pattern = match raw.pattern {
            Some(pattern) if !pattern.trim().is_empty() => pattern,
            _ => DEFAULT_PATTERN.to_string(),
        };

        let extra_properties = match raw.extra_properties {
            None => Vec::new(),
            Some(OneOrMany::One(property)) => vec![property.into()],
            Some(OneOrMany::Many(properties)) => properties.into_iter().map(Into::into).collect(),
        };

        Ok(Self {
            enabled: true,
            pattern,
            timezone,
            extra_properties,
        })
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Same as [`TimestampConfig::from_value`], plus
    /// [`TimestampError::InvalidConfig`] for malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, TimestampError> {
        let document: Value = serde_json::from_str(json).map_err(|e| TimestampError::InvalidConfig {
            reason: e.to_string(),
        })?;
        Self::from_value(&document)
    }

    /// Check every key, pattern and shift expression.
    ///
    /// A disabled configuration is always valid. Two extra properties
    /// with the same key are rejected.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] listing every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }

        let mut issues = Vec::new();

        if let Err(error) = formatter::DatePattern::compile(&self.pattern) {
            issues.push(ConfigIssue {
                field: "pattern".to_string(),
                error,
            });
        }

        let mut seen = HashSet::new();
        for (index, property) in self.extra_properties.iter().enumerate() {
            let field = |name: &str| format!("extraProperties[{index}].{name}");

            if let Err(error) = check_property_key(&property.key) {
                issues.push(ConfigIssue {
                    field: field("key"),
                    error,
                });
            } else if !seen.insert(property.key.as_str()) {
                issues.push(ConfigIssue {
                    field: field("key"),
                    error: TimestampError::DuplicatePropertyKey {
                        key: property.key.clone(),
                    },
                });
            }

            if let Err(error) = formatter::DatePattern::compile(&property.pattern) {
                issues.push(ConfigIssue {
                    field: field("value"),
                    error,
                });
            }

            if let Err(error) = shift::ShiftExpression::parse(&property.shift_expression) {
                issues.push(ConfigIssue {
                    field: field("shiftExpression"),
                    error,
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { issues })
        }
    }
}

/// Check whether `key` can be used as an environment variable name.
///
/// A key must be non-empty and consist only of word characters
/// (`[A-Za-z0-9_]`).
pub fn is_valid_property_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Like [`is_valid_property_key`], but returns the error to report.
///
/// # Errors
///
/// Returns [`TimestampError::InvalidPropertyKey`] for an unusable key.
pub fn check_property_key(key: &str) -> Result<(), TimestampError> {
    if is_valid_property_key(key) {
        Ok(())
    } else {
        Err(TimestampError::InvalidPropertyKey {
            key: key.to_string(),
        })
    }
}

/// Resolve a timezone id against the bundled timezone database.
///
/// # Errors
///
/// Returns [`TimestampError::UnknownTimezone`] for unknown ids.
pub fn parse_timezone(id: &str) -> Result<Tz, TimestampError> {
    id.trim()
        .parse::<Tz>()
        .map_err(|_| TimestampError::UnknownTimezone {
            timezone: id.to_string(),
        })
}
