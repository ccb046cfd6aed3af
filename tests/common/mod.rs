//! Shared test fixtures and helper utilities.
//!
//! Provides configuration documents with known contents for use in
//! the CLI integration tests.
#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

/// 2024-03-01T00:00:00Z, the day after a leap day.
pub const MARCH_FIRST_2024: &str = "2024-03-01T00:00:00Z";

/// The same instant as [`MARCH_FIRST_2024`] in Unix epoch seconds.
pub const MARCH_FIRST_2024_EPOCH: &str = "1709251200";

/// UTC config with a `YESTERDAY` extra property.
pub const YESTERDAY_CONFIG: &str = r#"{
  "enableBuildTimestamp": {
    "timezone": "UTC",
    "pattern": "yyyy-MM-dd",
    "extraProperties": [
      { "key": "YESTERDAY", "value": "yyyy-MM-dd", "shiftExpression": "-1D" }
    ]
  }
}"#;

/// Config where one extra property carries a malformed shift expression.
pub const PARTIALLY_BROKEN_CONFIG: &str = r#"{
  "enableBuildTimestamp": {
    "timezone": "UTC",
    "pattern": "yyyy-MM-dd",
    "extraProperties": [
      { "key": "BROKEN", "value": "yyyy-MM-dd", "shiftExpression": "+1d" },
      { "key": "NEXT_MONTH", "value": "yyyy-MM", "shiftExpression": "+1M" }
    ]
  }
}"#;

/// Config with problems in several fields.
pub const INVALID_CONFIG: &str = r#"{
  "enableBuildTimestamp": {
    "pattern": "yyyy-MM-dd 'unterminated",
    "extraProperties": [
      { "key": "BAD KEY", "value": "yyyy", "shiftExpression": "" },
      { "key": "OK", "value": "yyyy", "shiftExpression": "5" }
    ]
  }
}"#;

/// Config that turns the feature off.
pub const DISABLED_CONFIG: &str = r#"{ "enableBuildTimestamp": null }"#;

/// Config whose timezone observes daylight saving time.
pub const NEW_YORK_CONFIG: &str = r#"{
  "enableBuildTimestamp": {
    "timezone": "America/New_York",
    "pattern": "yyyy-MM-dd HH:mm z",
    "extraProperties": {
      "key": "TOMORROW", "value": "yyyy-MM-dd HH:mm z", "shiftExpression": "+1D"
    }
  }
}"#;

/// Write `contents` to a temporary file that lives as long as the handle.
pub fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}
