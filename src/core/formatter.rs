//! Timestamp rendering with SimpleDateFormat-style patterns.
//!
//! Build configurations carry patterns such as `yyyy-MM-dd HH:mm:ss z`.
//! ASCII letters are field letters whose run length selects the width,
//! text in single quotes is copied verbatim (`''` is a literal quote),
//! and every other character is a literal.
//!
//! Week fields follow ISO 8601 rather than a US locale: `Y` is the ISO
//! week-based year, `w` the ISO week number, and `W` counts weeks of the
//! month starting on Monday. So 2024-12-30 renders as week 1 of 2025.
//! The `z` letter renders the zone abbreviation (`EST`, `CEST`) at every
//! width; `zzzz` does not spell out the long zone name.

use chrono::{DateTime, Datelike, Offset, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::TimestampError;

/// Letters the formatter knows how to render.
const FIELD_LETTERS: &str = "GyYMLwWDdFEuaHkKhmsSzZX";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Field { letter: char, width: usize },
}

/// A compiled date pattern, ready to render any number of instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    tokens: Vec<Token>,
}

impl DatePattern {
    /// Compile `pattern` into tokens.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::MalformedPattern`] if the pattern is blank,
    /// uses an unsupported letter, or leaves a quote unterminated.
    pub fn compile(pattern: &str) -> Result<Self, TimestampError> {
        let malformed = |reason: String| TimestampError::MalformedPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.trim().is_empty() {
            return Err(malformed("pattern is blank".to_string()));
        }

        let mut tokens = Vec::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.next_if_eq(&'\'').is_some() {
                    push_literal(&mut tokens, '\'');
                    continue;
                }
                loop {
                    match chars.next() {
                        None => return Err(malformed("unterminated quote".to_string())),
                        Some('\'') if chars.next_if_eq(&'\'').is_some() => {
                            push_literal(&mut tokens, '\'');
                        }
                        Some('\'') => break,
                        Some(quoted) => push_literal(&mut tokens, quoted),
                    }
                }
            } else if c.is_ascii_alphabetic() {
                if !FIELD_LETTERS.contains(c) {
                    return Err(malformed(format!("illegal pattern character '{c}'")));
                }
                let mut width = 1;
                while chars.next_if_eq(&c).is_some() {
                    width += 1;
                }
                if c == 'X' && width > 3 {
                    return Err(malformed("too many pattern letters: X".to_string()));
                }
                tokens.push(Token::Field { letter: c, width });
            } else {
                push_literal(&mut tokens, c);
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            tokens,
        })
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render `instant` as civil time in `timezone`.
    pub fn render(&self, instant: DateTime<Utc>, timezone: Tz) -> String {
        let local = instant.with_timezone(&timezone);
        let mut out = String::with_capacity(self.source.len() + 8);
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Field { letter, width } => render_field(&mut out, &local, *letter, *width),
            }
        }
        out
    }
}

fn push_literal(tokens: &mut Vec<Token>, c: char) {
    if let Some(Token::Literal(text)) = tokens.last_mut() {
        text.push(c);
    } else {
        tokens.push(Token::Literal(c.to_string()));
    }
}

fn render_field(out: &mut String, local: &DateTime<Tz>, letter: char, width: usize) {
    let text = match letter {
        'G' => (if local.year_ce().0 { "AD" } else { "BC" }).to_string(),
        'y' => year(local.year_ce().1, width),
        'Y' => year(local.iso_week().year().unsigned_abs(), width),
        'M' | 'L' => match width {
            1 | 2 => pad(local.month(), width),
            3 => local.format("%b").to_string(),
            _ => local.format("%B").to_string(),
        },
        'w' => pad(local.iso_week().week(), width),
        'W' => {
            let first_weekday = local
                .date_naive()
                .with_day(1)
                .map_or(0, |first| first.weekday().num_days_from_monday());
            pad((local.day() - 1 + first_weekday) / 7 + 1, width)
        }
        'D' => pad(local.ordinal(), width),
        'd' => pad(local.day(), width),
        'F' => pad((local.day() - 1) / 7 + 1, width),
        'E' => match width {
            1..=3 => local.format("%a").to_string(),
            _ => local.format("%A").to_string(),
        },
        'u' => pad(local.weekday().number_from_monday(), width),
        'a' => (if local.hour() < 12 { "AM" } else { "PM" }).to_string(),
        'H' => pad(local.hour(), width),
        'k' => pad(if local.hour() == 0 { 24 } else { local.hour() }, width),
        'K' => pad(local.hour() % 12, width),
        'h' => pad(local.hour12().1, width),
        'm' => pad(local.minute(), width),
        's' => pad(local.second(), width),
        'S' => pad(local.timestamp_subsec_millis() % 1000, width),
        'z' => local.format("%Z").to_string(),
        'Z' => offset(local.offset().fix().local_minus_utc(), false),
        'X' => iso_offset(local.offset().fix().local_minus_utc(), width),
        _ => unreachable!("letter '{letter}' rejected at compile time"),
    };
    out.push_str(&text);
}

fn pad(value: u32, width: usize) -> String {
    format!("{value:0width$}")
}

fn year(value: u32, width: usize) -> String {
    if width == 2 {
        pad(value % 100, 2)
    } else {
        pad(value, width)
    }
}

fn offset(seconds: i32, colon: bool) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    let separator = if colon { ":" } else { "" };
    format!("{sign}{:02}{separator}{:02}", minutes / 60, minutes % 60)
}

fn iso_offset(seconds: i32, width: usize) -> String {
    if seconds == 0 {
        return "Z".to_string();
    }
    match width {
        1 => {
            let sign = if seconds < 0 { '-' } else { '+' };
            format!("{sign}{:02}", seconds.unsigned_abs() / 3600)
        }
        2 => offset(seconds, false),
        _ => offset(seconds, true),
    }
}

/// Render `instant` in `timezone` with `pattern`.
///
/// # Errors
///
/// Returns [`TimestampError::MalformedPattern`] if the pattern cannot be
/// compiled. A blank pattern is rejected, not replaced with a default.
pub fn format(instant: DateTime<Utc>, pattern: &str, timezone: Tz) -> Result<String, TimestampError> {
    Ok(DatePattern::compile(pattern)?.render(instant, timezone))
}

/// Check whether `pattern` compiles.
pub fn validate_pattern(pattern: &str) -> bool {
    DatePattern::compile(pattern).is_ok()
}
