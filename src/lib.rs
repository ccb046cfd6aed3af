//! build-timestamp: build timestamps and time-shifted timestamp
//! properties for build environments.
//!
//! The library holds the pure core: shift-expression parsing and
//! evaluation, pattern-based formatting, configuration snapshots and the
//! evaluation pass that produces the property mapping. The binary wraps
//! it in a small CLI.

#![forbid(unsafe_code)]

pub mod core;
pub mod error;
