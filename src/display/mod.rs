//! Terminal output formatting.
//!
//! Turns rendered property mappings into env-file lines or JSON.

pub mod properties;
