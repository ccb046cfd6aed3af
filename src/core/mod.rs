//! Core business logic for build timestamp properties.
//!
//! This module contains the domain logic separated from CLI concerns.
//! All types and functions here are pure and testable without the CLI
//! layer; none of them read the clock.

pub mod config;
pub mod formatter;
pub mod shift;
pub mod timestamp;
