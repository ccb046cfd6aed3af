//! Handler for the `check` subcommand.
//!
//! Fail-fast validation for configuration forms: each check prints a
//! short verdict and reports whether the value is acceptable.

use anyhow::Result;
use build_timestamp::core::config::{
    DEFAULT_PATTERN, DEFAULT_TIMEZONE, is_valid_property_key, parse_timezone,
};
use build_timestamp::core::formatter::DatePattern;
use build_timestamp::core::shift::ShiftExpression;
use chrono::Utc;

use crate::cli::{CheckCommand, ConfigCheckArgs, KeyCheckArgs, PatternCheckArgs, ShiftCheckArgs};
use crate::commands::render::load_config;

/// Execute the `check` subcommand.
///
/// Returns `true` if the checked value is valid. Only I/O and
/// configuration loading problems are returned as errors.
pub fn execute(command: &CheckCommand) -> Result<bool> {
    match command {
        CheckCommand::Shift(args) => Ok(check_shift(args)),
        CheckCommand::Key(args) => Ok(check_key(args)),
        CheckCommand::Pattern(args) => check_pattern(args),
        CheckCommand::Config(args) => check_config(args),
    }
}

fn check_shift(args: &ShiftCheckArgs) -> bool {
    match ShiftExpression::parse(&args.expression) {
        Ok(expression) if expression.is_identity() => {
            println!("OK: no shift");
            true
        }
        Ok(expression) => {
            println!("OK: {expression}");
            true
        }
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}

fn check_key(args: &KeyCheckArgs) -> bool {
    if is_valid_property_key(&args.name) {
        println!("OK");
        true
    } else {
        eprintln!("invalid variable name '{}'", args.name);
        false
    }
}

fn check_pattern(args: &PatternCheckArgs) -> Result<bool> {
    let timezone = match args.timezone.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_TIMEZONE,
        Some(id) => parse_timezone(id)?,
    };
    let pattern = match args.pattern.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_PATTERN,
        Some(pattern) => pattern,
    };

    match DatePattern::compile(pattern) {
        Ok(compiled) => {
            println!(
                "Using timezone: {}; Sample timestamp: {}",
                timezone.name(),
                compiled.render(Utc::now(), timezone)
            );
            Ok(true)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(false)
        }
    }
}

fn check_config(args: &ConfigCheckArgs) -> Result<bool> {
    let config = load_config(&args.file)?;
    match config.validate() {
        Ok(()) if !config.enabled => {
            println!("OK: build timestamp disabled");
            Ok(true)
        }
        Ok(()) => {
            println!(
                "OK: {} extra propert{}",
                config.extra_properties.len(),
                if config.extra_properties.len() == 1 { "y" } else { "ies" }
            );
            Ok(true)
        }
        Err(e) => {
            for issue in &e.issues {
                eprintln!("error: {issue}");
            }
            Ok(false)
        }
    }
}
