//! Handler for the `render` subcommand.
//!
//! Loads a configuration snapshot, evaluates every property against the
//! build's base instant and prints the mapping. Properties that fail to
//! render are logged and left out; they do not fail the command.

use std::fs;
use std::path::Path;

use anyhow::Result;
use build_timestamp::core::config::TimestampConfig;
use build_timestamp::core::timestamp::evaluate_properties;
use build_timestamp::error::TimestampError;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cli::RenderArgs;
use crate::display::properties;

/// Execute the `render` subcommand with the given arguments.
pub fn execute(args: &RenderArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let base = match args.at.as_deref() {
        Some(value) => parse_instant(value)?,
        None => Utc::now(),
    };
    debug!(%base, timezone = %config.timezone, "evaluating build timestamp properties");

    let evaluation = evaluate_properties(&config, base);
    if !evaluation.is_clean() {
        info!(
            skipped = evaluation.failures.len(),
            rendered = evaluation.properties.len(),
            "some properties were skipped"
        );
    }

    if args.json {
        println!("{}", properties::to_json(&evaluation.properties));
    } else {
        print!("{}", properties::to_env_lines(&evaluation.properties));
    }
    Ok(())
}

/// Read and structurally load a configuration snapshot from disk.
pub fn load_config(path: &Path) -> Result<TimestampConfig, TimestampError> {
    let json = fs::read_to_string(path).map_err(|e| TimestampError::ConfigFileError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    TimestampConfig::from_json_str(&json)
}

/// Parse a base instant given as RFC 3339 or Unix epoch seconds.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = value.trim();
    let invalid = || TimestampError::InvalidInstant {
        value: value.to_string(),
    };

    if let Ok(seconds) = trimmed.parse::<i64>() {
        return DateTime::from_timestamp(seconds, 0).ok_or_else(invalid);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| invalid())
}
