//! CLI argument definitions for build-timestamp.
//!
//! Uses `clap` derive macros to define the command-line interface.
//! Each subcommand has its own argument struct for type-safe parsing.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Expose build timestamps, and time-shifted variants of them, as
/// environment properties for a build job.
#[derive(Debug, Parser)]
#[command(name = "build-timestamp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace).
    ///
    /// `RUST_LOG` takes precedence when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render the timestamp properties for a build.
    Render(RenderArgs),

    /// Validate a single configuration value or a whole configuration file.
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Arguments for the `render` subcommand.
#[derive(Debug, clap::Args)]
pub struct RenderArgs {
    /// Path to the JSON configuration snapshot.
    #[arg(long, short, value_name = "FILE")]
    pub config: PathBuf,

    /// Base instant of the build, instead of the current time.
    ///
    /// Accepts RFC 3339 (e.g. "2024-03-01T00:00:00Z") or Unix epoch seconds.
    #[arg(long, value_name = "INSTANT", allow_hyphen_values = true)]
    pub at: Option<String>,

    /// Output a JSON object instead of KEY=VALUE lines.
    #[arg(long)]
    pub json: bool,
}

/// Validation targets for the `check` subcommand.
#[derive(Debug, Subcommand)]
pub enum CheckCommand {
    /// Check a time shift expression such as "+1D-2h".
    Shift(ShiftCheckArgs),

    /// Check an extra property name.
    Key(KeyCheckArgs),

    /// Check a date pattern and preview the current time with it.
    Pattern(PatternCheckArgs),

    /// Check every value in a configuration file.
    Config(ConfigCheckArgs),
}

/// Arguments for `check shift`.
#[derive(Debug, clap::Args)]
pub struct ShiftCheckArgs {
    /// The expression to check. Leading '-' is allowed.
    #[arg(allow_hyphen_values = true)]
    pub expression: String,
}

/// Arguments for `check key`.
#[derive(Debug, clap::Args)]
pub struct KeyCheckArgs {
    /// The property name to check.
    #[arg(allow_hyphen_values = true)]
    pub name: String,
}

/// Arguments for `check pattern`.
#[derive(Debug, clap::Args)]
pub struct PatternCheckArgs {
    /// The date pattern. Blank previews the default pattern.
    #[arg(allow_hyphen_values = true)]
    pub pattern: Option<String>,

    /// Timezone for the preview. Blank means UTC.
    #[arg(long, value_name = "TZ")]
    pub timezone: Option<String>,
}

/// Arguments for `check config`.
#[derive(Debug, clap::Args)]
pub struct ConfigCheckArgs {
    /// Path to the JSON configuration file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}
