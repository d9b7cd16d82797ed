#![forbid(unsafe_code)]

//! Calendar dates at the text boundary.
//!
//! Internally a due date is always a [`time::Date`]. Text is parsed here and
//! nowhere else: `YYYY-MM-DD` on input, an ISO date-time in stored records.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::parsing::Parsed;
use time::{Date, Month};

use crate::error::TodoError;

/// A due date as supplied by a caller: either already parsed, or picker text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueDateInput {
    Date(Date),
    Text(String),
}

impl DueDateInput {
    pub fn resolve(&self) -> Result<Date, TodoError> {
        match self {
            Self::Date(d) => Ok(*d),
            Self::Text(s) => parse_picker_date(s),
        }
    }
}

impl From<Date> for DueDateInput {
    fn from(d: Date) -> Self {
        Self::Date(d)
    }
}

impl From<&str> for DueDateInput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for DueDateInput {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Builds a date from components, rejecting anything that does not survive
/// reconstruction unchanged (Feb 30, day 31 in a 30-day month, month 13).
pub fn calendar_date(year: i32, month: u8, day: u8) -> Result<Date, TodoError> {
    let invalid = || {
        TodoError::validation(format!(
            "invalid due date: {year:04}-{month:02}-{day:02} is not a calendar date"
        ))
    };

    let m = Month::try_from(month).map_err(|_| invalid())?;
    let date = Date::from_calendar_date(year, m, day).map_err(|_| invalid())?;
    if date.year() != year || u8::from(date.month()) != month || date.day() != day {
        return Err(invalid());
    }
    Ok(date)
}

const ISO_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const LEGACY_DATE: &[BorrowedFormatItem<'_>] = format_description!("[month]/[day]/[year]");
const DISPLAY_DATE: &[BorrowedFormatItem<'_>] =
    format_description!("[month repr:short] [day], [year]");

/// Parses the canonical `YYYY-MM-DD` input form. Surrounding whitespace is
/// not accepted.
pub fn parse_picker_date(input: &str) -> Result<Date, TodoError> {
    let (year, month, day) = components(input, ISO_DATE).ok_or_else(|| {
        TodoError::validation(format!("invalid due date '{input}': use YYYY-MM-DD"))
    })?;
    calendar_date(year, month, day)
}

/// Parses the `MM/DD/YYYY` form written by older snapshots.
pub fn parse_legacy_date(input: &str) -> Result<Date, TodoError> {
    let input = input.trim();
    let (year, month, day) = components(input, LEGACY_DATE)
        .filter(|(year, _, _)| (1900..=2099).contains(year))
        .ok_or_else(|| {
            TodoError::validation(format!("invalid due date '{input}': use MM/DD/YYYY"))
        })?;
    calendar_date(year, month, day)
}

/// Accepts `YYYY-MM-DDT...` (time of day ignored), a bare ISO date, or the
/// legacy `MM/DD/YYYY` form.
pub fn parse_record_date(input: &str) -> Result<Date, TodoError> {
    let input = input.trim();
    if input.contains('/') {
        return parse_legacy_date(input);
    }
    let date_part = input.split_once('T').map_or(input, |(d, _)| d);
    parse_picker_date(date_part)
}

/// UTC midnight of `date` in the `toJSON` shape used by stored records.
#[must_use]
pub fn format_record_date(date: Date) -> String {
    format!("{}T00:00:00.000Z", format_iso_date(date))
}

#[must_use]
pub fn format_iso_date(date: Date) -> String {
    date.format(ISO_DATE).unwrap_or_else(|_| "unknown".to_owned())
}

/// `Nov 10, 2025`
#[must_use]
pub fn format_display_date(date: Date) -> String {
    date.format(DISPLAY_DATE).unwrap_or_else(|_| "unknown".to_owned())
}

/// Runs `format` over the whole input and returns the raw components. Day
/// and month are range-checked only individually here; [`calendar_date`]
/// checks that they form a real date.
fn components(input: &str, format: &[BorrowedFormatItem<'_>]) -> Option<(i32, u8, u8)> {
    let mut parsed = Parsed::new();
    let rest = parsed.parse_items(input.as_bytes(), format).ok()?;
    if !rest.is_empty() {
        return None;
    }
    Some((
        parsed.year()?,
        u8::from(parsed.month()?),
        parsed.day()?.get(),
    ))
}
