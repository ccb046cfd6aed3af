//! Time-shift expressions for derived timestamp properties.
//!
//! A shift expression is a run of signed terms such as `+1D-2h30m`, each
//! made of an optional sign, a decimal quantity and a single unit letter:
//!
//! | unit | meaning     | arithmetic                 |
//! |------|-------------|----------------------------|
//! | `Y`  | year        | calendar fields, clamped   |
//! | `M`  | month       | calendar fields, clamped   |
//! | `D`  | day         | calendar days, civil time  |
//! | `h`  | hour        | absolute duration          |
//! | `m`  | minute      | absolute duration          |
//! | `s`  | second      | absolute duration          |
//! | `S`  | millisecond | absolute duration          |
//!
//! Terms are applied left to right, each to the result of the previous one.

use std::fmt;
use std::str::FromStr;

use chrono::offset::LocalResult;
use chrono::{DateTime, Days, Duration, Months, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::TimestampError;

/// The calendar or clock unit a term shifts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl ShiftUnit {
    /// Map a unit letter to its unit. Letters are case-sensitive.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'Y' => Some(Self::Year),
            'M' => Some(Self::Month),
            'D' => Some(Self::Day),
            'h' => Some(Self::Hour),
            'm' => Some(Self::Minute),
            's' => Some(Self::Second),
            'S' => Some(Self::Millisecond),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::Year => 'Y',
            Self::Month => 'M',
            Self::Day => 'D',
            Self::Hour => 'h',
            Self::Minute => 'm',
            Self::Second => 's',
            Self::Millisecond => 'S',
        }
    }
}

/// One signed step of a shift expression, e.g. `-3h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShiftTerm {
    /// `true` for a `-` sign.
    pub negative: bool,
    /// The unsigned quantity; always fits in an `i32`.
    pub quantity: i32,
    pub unit: ShiftUnit,
}

impl ShiftTerm {
    /// The quantity with the sign applied.
    pub fn signed_quantity(&self) -> i64 {
        let quantity = i64::from(self.quantity);
        if self.negative { -quantity } else { quantity }
    }
}

impl fmt::Display for ShiftTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.negative { '-' } else { '+' };
        write!(f, "{sign}{}{}", self.quantity, self.unit.letter())
    }
}

/// A parsed shift expression: the raw input plus its ordered terms.
///
/// An empty expression has no terms and leaves an instant unchanged.
/// `Display` re-serializes the terms with explicit signs, which parses
/// back to the same term sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftExpression {
    raw: String,
    terms: Vec<ShiftTerm>,
}

impl ShiftExpression {
    /// Tokenize an expression in a single left-to-right scan.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::MalformedShiftExpression`] for any input
    /// outside the `([+-]?[0-9]+[YMDhmsS])*` grammar, or when a quantity
    /// does not fit in a 32-bit signed integer.
    pub fn parse(expression: &str) -> Result<Self, TimestampError> {
        let malformed = |reason: String| TimestampError::MalformedShiftExpression {
            expression: expression.to_string(),
            reason,
        };

        let mut terms = Vec::new();
        let mut chars = expression.char_indices().peekable();

        while let Some(&(start, first)) = chars.peek() {
            let negative = match first {
                '+' => {
                    chars.next();
                    false
                }
                '-' => {
                    chars.next();
                    true
                }
                _ => false,
            };

            let mut quantity: i32 = 0;
            let mut digits = 0usize;
            while let Some(&(_, c)) = chars.peek() {
                let Some(digit) = c.to_digit(10) else { break };
                chars.next();
                digits += 1;
                quantity = quantity
                    .checked_mul(10)
                    .and_then(|q| q.checked_add(digit as i32))
                    .ok_or_else(|| {
                        malformed(format!("quantity at position {start} overflows a 32-bit integer"))
                    })?;
            }

            let Some((position, letter)) = chars.next() else {
                return Err(malformed(if digits == 0 {
                    "expression ends with a dangling sign".to_string()
                } else {
                    "missing unit after quantity".to_string()
                }));
            };

            if digits == 0 {
                return Err(malformed(format!(
                    "expected digits at position {position}, found '{letter}'"
                )));
            }

            let unit = ShiftUnit::from_letter(letter).ok_or_else(|| {
                malformed(format!("unknown unit '{letter}' at position {position}"))
            })?;

            terms.push(ShiftTerm {
                negative,
                quantity,
                unit,
            });
        }

        Ok(Self {
            raw: expression.to_string(),
            terms,
        })
    }

    /// The expression exactly as the user wrote it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn terms(&self) -> &[ShiftTerm] {
        &self.terms
    }

    pub fn is_identity(&self) -> bool {
        self.terms.iter().all(|term| term.quantity == 0)
    }

    /// Apply every term, in order, to `base` as seen in `timezone`.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::ShiftOutOfRange`] if an intermediate or
    /// final result cannot be represented.
    pub fn apply(&self, base: DateTime<Utc>, timezone: Tz) -> Result<DateTime<Utc>, TimestampError> {
        let mut current = base.with_timezone(&timezone);
        for term in &self.terms {
            current = apply_term(current, term).ok_or_else(|| TimestampError::ShiftOutOfRange {
                expression: self.raw.clone(),
            })?;
        }
        Ok(current.with_timezone(&Utc))
    }
}

impl FromStr for ShiftExpression {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ShiftExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for term in &self.terms {
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

/// Check whether `expression` is a well-formed shift expression.
///
/// Never panics; any input yields a boolean. The empty string is valid.
pub fn is_valid(expression: &str) -> bool {
    ShiftExpression::parse(expression).is_ok()
}

/// Shift `base` by `expression`, doing calendar arithmetic in `timezone`.
///
/// # Errors
///
/// Returns [`TimestampError::MalformedShiftExpression`] if the expression
/// is not valid, or [`TimestampError::ShiftOutOfRange`] if the result is
/// not representable.
pub fn evaluate(
    base: DateTime<Utc>,
    expression: &str,
    timezone: Tz,
) -> Result<DateTime<Utc>, TimestampError> {
    ShiftExpression::parse(expression)?.apply(base, timezone)
}

fn apply_term(current: DateTime<Tz>, term: &ShiftTerm) -> Option<DateTime<Tz>> {
    if term.quantity == 0 {
        return Some(current);
    }
    let amount = term.signed_quantity();
    match term.unit {
        ShiftUnit::Year => shift_months(current, amount.checked_mul(12)?),
        ShiftUnit::Month => shift_months(current, amount),
        ShiftUnit::Day => shift_days(current, amount),
        ShiftUnit::Hour => current.checked_add_signed(Duration::try_hours(amount)?),
        ShiftUnit::Minute => current.checked_add_signed(Duration::try_minutes(amount)?),
        ShiftUnit::Second => current.checked_add_signed(Duration::try_seconds(amount)?),
        ShiftUnit::Millisecond => current.checked_add_signed(Duration::try_milliseconds(amount)?),
    }
}

/// Month arithmetic on the civil date; the day is clamped to the month length.
fn shift_months(current: DateTime<Tz>, months: i64) -> Option<DateTime<Tz>> {
    let local = current.naive_local();
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    let shifted = if months < 0 {
        local.checked_sub_months(magnitude)?
    } else {
        local.checked_add_months(magnitude)?
    };
    resolve_local(&current, shifted)
}

/// Day arithmetic on the civil date, keeping the wall-clock time.
fn shift_days(current: DateTime<Tz>, days: i64) -> Option<DateTime<Tz>> {
    let local = current.naive_local();
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days < 0 {
        local.checked_sub_days(magnitude)?
    } else {
        local.checked_add_days(magnitude)?
    };
    resolve_local(&current, shifted)
}

/// Map a civil date-time back to an instant in the timezone of `current`.
///
/// An ambiguous time (clocks falling back) keeps the offset of `current`
/// when one of the candidates has it, and otherwise resolves to the
/// earlier instant. A time inside a spring-forward gap is read with the
/// offset in force before the transition, which lands just past the gap.
fn resolve_local(current: &DateTime<Tz>, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    let timezone = current.timezone();
    let current_offset = current.offset().fix();
    match timezone.from_local_datetime(&local) {
        LocalResult::Single(resolved) => Some(resolved),
        LocalResult::Ambiguous(earliest, latest) => {
            if earliest.offset().fix() != current_offset && latest.offset().fix() == current_offset
            {
                Some(latest)
            } else {
                Some(earliest)
            }
        }
        LocalResult::None => {
            let before = local.checked_sub_days(Days::new(1))?;
            let offset = timezone.offset_from_utc_datetime(&before).fix();
            let utc = local.checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))?;
            Some(timezone.from_utc_datetime(&utc))
        }
    }
}
