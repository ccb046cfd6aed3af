//! The build-time evaluation pass.
//!
//! Turns a configuration snapshot and a base instant into the property
//! mapping injected into the build environment. A bad extra property is
//! skipped and reported; it never takes the other properties down with it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::core::config::{DEFAULT_PROPERTY, ExtraProperty, TimestampConfig, check_property_key};
use crate::core::{formatter, shift};
use crate::error::TimestampError;

/// An extra property that could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFailure {
    pub key: String,
    pub error: TimestampError,
}

/// The outcome of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Property name to rendered timestamp, sorted by name.
    pub properties: BTreeMap<String, String>,
    /// Properties that were skipped, in configuration order.
    pub failures: Vec<PropertyFailure>,
}

impl Evaluation {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Render every configured property for the build started at `base`.
///
/// The default property carries `base` unshifted. Each extra property is
/// shifted and formatted independently in the configured timezone. A
/// property whose key, pattern or shift expression is invalid is logged,
/// recorded in [`Evaluation::failures`] and left out of the mapping. When
/// two extra properties share a key the later one wins.
pub fn evaluate_properties(config: &TimestampConfig, base: DateTime<Utc>) -> Evaluation {
    let mut evaluation = Evaluation::default();
    if !config.enabled {
        debug!("build timestamp disabled, no properties set");
        return evaluation;
    }

    match formatter::format(base, &config.pattern, config.timezone) {
        Ok(value) => {
            evaluation.properties.insert(DEFAULT_PROPERTY.to_string(), value);
        }
        Err(error) => {
            warn!(key = DEFAULT_PROPERTY, %error, "skipping build timestamp property");
            evaluation.failures.push(PropertyFailure {
                key: DEFAULT_PROPERTY.to_string(),
                error,
            });
        }
    }

    for property in &config.extra_properties {
        match render_extra_property(property, config, base) {
            Ok(value) => {
                debug!(key = %property.key, %value, "rendered extra property");
                if let Some(previous) = evaluation.properties.insert(property.key.clone(), value) {
                    warn!(key = %property.key, %previous, "property key set more than once, keeping the last value");
                }
            }
            Err(error) => {
                warn!(key = %property.key, %error, "skipping extra property");
                evaluation.failures.push(PropertyFailure {
                    key: property.key.clone(),
                    error,
                });
            }
        }
    }

    evaluation
}

fn render_extra_property(
    property: &ExtraProperty,
    config: &TimestampConfig,
    base: DateTime<Utc>,
) -> Result<String, TimestampError> {
    check_property_key(&property.key)?;
    let pattern = formatter::DatePattern::compile(&property.pattern)?;
    let shifted = shift::evaluate(base, &property.shift_expression, config.timezone)?;
    Ok(pattern.render(shifted, config.timezone))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono_tz::America::New_York;
    use chrono_tz::Tz;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn config(pattern: &str, timezone: Tz, extra: Vec<ExtraProperty>) -> TimestampConfig {
        TimestampConfig {
            enabled: true,
            pattern: pattern.to_string(),
            timezone,
            extra_properties: extra,
        }
    }

    #[test]
    fn test_disabled_config_sets_nothing() {
        let evaluation = evaluate_properties(&TimestampConfig::disabled(), utc("2024-03-01T00:00:00Z"));
        assert!(evaluation.properties.is_empty());
        assert!(evaluation.is_clean());
    }

    #[test]
    fn test_yesterday_across_leap_day() {
        let config = config(
            "yyyy-MM-dd",
            Tz::UTC,
            vec![ExtraProperty::new("YESTERDAY", "yyyy-MM-dd", "-1D")],
        );
        let evaluation = evaluate_properties(&config, utc("2024-03-01T00:00:00Z"));

        assert!(evaluation.is_clean());
        assert_eq!(evaluation.properties.len(), 2);
        assert_eq!(evaluation.properties["BUILD_TIMESTAMP"], "2024-03-01");
        assert_eq!(evaluation.properties["YESTERDAY"], "2024-02-29");
    }

    #[test]
    fn test_default_pattern_only() {
        let evaluation = evaluate_properties(&TimestampConfig::default(), utc("2024-07-04T18:30:00Z"));
        assert_eq!(
            evaluation.properties,
            BTreeMap::from([("BUILD_TIMESTAMP".to_string(), "2024-07-04 18:30:00 UTC".to_string())])
        );
    }

    #[test]
    fn test_extra_properties_use_configured_timezone() {
        let config = config(
            "yyyy-MM-dd HH:mm z",
            New_York,
            vec![
                ExtraProperty::new("TOMORROW", "yyyy-MM-dd HH:mm z", "+1D"),
                ExtraProperty::new("NOW_TIME", "HH:mm", ""),
            ],
        );
        // 2024-03-09 12:00 EST; the next civil day is already EDT.
        let evaluation = evaluate_properties(&config, utc("2024-03-09T17:00:00Z"));

        assert_eq!(evaluation.properties["BUILD_TIMESTAMP"], "2024-03-09 12:00 EST");
        assert_eq!(evaluation.properties["TOMORROW"], "2024-03-10 12:00 EDT");
        assert_eq!(evaluation.properties["NOW_TIME"], "12:00");
    }

    #[test]
    fn test_bad_shift_is_isolated() {
        let config = config(
            "yyyy",
            Tz::UTC,
            vec![
                ExtraProperty::new("BROKEN", "yyyy-MM-dd", "+1d"),
                ExtraProperty::new("LAST_MONTH", "yyyy-MM", "-1M"),
            ],
        );
        let evaluation = evaluate_properties(&config, utc("2024-03-31T00:00:00Z"));

        assert_eq!(evaluation.properties["BUILD_TIMESTAMP"], "2024");
        assert_eq!(evaluation.properties["LAST_MONTH"], "2024-02");
        assert!(!evaluation.properties.contains_key("BROKEN"));
        assert_eq!(evaluation.failures.len(), 1);
        assert_eq!(evaluation.failures[0].key, "BROKEN");
        assert!(matches!(
            evaluation.failures[0].error,
            TimestampError::MalformedShiftExpression { .. }
        ));
    }

    #[test]
    fn test_bad_pattern_and_key_are_isolated() {
        let config = config(
            "yyyy",
            Tz::UTC,
            vec![
                ExtraProperty::new("BAD PATTERN", "yyyy", ""),
                ExtraProperty::new("UNQUOTED", "yyyy 'x", ""),
                ExtraProperty::new("OK", "MM", "+1M"),
            ],
        );
        let evaluation = evaluate_properties(&config, utc("2024-01-15T00:00:00Z"));

        assert_eq!(evaluation.properties.len(), 2);
        assert_eq!(evaluation.properties["OK"], "02");
        let kinds: Vec<_> = evaluation.failures.iter().map(|f| &f.error).collect();
        assert!(matches!(kinds[0], TimestampError::InvalidPropertyKey { .. }));
        assert!(matches!(kinds[1], TimestampError::MalformedPattern { .. }));
    }

    #[test]
    fn test_bad_default_pattern_keeps_extra_properties() {
        let config = config(
            "yyyy-bb",
            Tz::UTC,
            vec![ExtraProperty::new("DAY", "dd", "")],
        );
        let evaluation = evaluate_properties(&config, utc("2024-01-15T00:00:00Z"));

        assert!(!evaluation.properties.contains_key(DEFAULT_PROPERTY));
        assert_eq!(evaluation.properties["DAY"], "15");
        assert_eq!(evaluation.failures[0].key, DEFAULT_PROPERTY);
    }

    #[test]
    fn test_out_of_range_shift_is_isolated() {
        let config = config(
            "yyyy",
            Tz::UTC,
            vec![ExtraProperty::new("FAR", "yyyy", "+2147483647Y")],
        );
        let evaluation = evaluate_properties(&config, utc("2024-01-15T00:00:00Z"));
        assert_eq!(evaluation.properties.len(), 1);
        assert!(matches!(
            evaluation.failures[0].error,
            TimestampError::ShiftOutOfRange { .. }
        ));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let config = config(
            "yyyy",
            Tz::UTC,
            vec![
                ExtraProperty::new("TAG", "yyyy", ""),
                ExtraProperty::new("TAG", "MM", ""),
            ],
        );
        let evaluation = evaluate_properties(&config, utc("2024-05-15T00:00:00Z"));
        assert_eq!(evaluation.properties["TAG"], "05");
        assert!(evaluation.is_clean());
    }

    #[test]
    fn test_extra_property_can_override_default() {
        let config = config(
            "yyyy",
            Tz::UTC,
            vec![ExtraProperty::new(DEFAULT_PROPERTY, "yyyyMMdd", "")],
        );
        let evaluation = evaluate_properties(&config, utc("2024-05-15T00:00:00Z"));
        assert_eq!(evaluation.properties[DEFAULT_PROPERTY], "20240515");
    }

    #[test]
    fn test_each_property_shifts_from_base() {
        let config = config(
            "dd",
            Tz::UTC,
            vec![
                ExtraProperty::new("PLUS_ONE", "dd", "+1D"),
                ExtraProperty::new("PLUS_TWO", "dd", "+2D"),
            ],
        );
        let evaluation = evaluate_properties(&config, utc("2024-05-15T00:00:00Z"));
        assert_eq!(evaluation.properties["BUILD_TIMESTAMP"], "15");
        assert_eq!(evaluation.properties["PLUS_ONE"], "16");
        assert_eq!(evaluation.properties["PLUS_TWO"], "17");
    }
}
