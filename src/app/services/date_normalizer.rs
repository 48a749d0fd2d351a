//! Vendor date notation normalization
//!
//! Converts the date notations found in PMS exports into canonical
//! `YYYY-MM-DD` calendar dates. Recognized forms, tried in order:
//!
//! 1. `YYYY-MM-DD` (already canonical)
//! 2. `DD-MON-YY` / `DD-MON-YYYY` with a case-insensitive English month
//! 3. Compact `DDMMYY` / `DDMMYYYY`
//! 4. `DD/MM/YYYY` or `DD-MM-YYYY`
//!
//! Every parsed day/month/year is reconstructed into a calendar date and must
//! survive the round trip unchanged, so "31 February" is rejected instead of
//! rolling into March. There is no best-guess fallback.

use crate::app::models::CanonicalDate;
use crate::constants::{MONTH_ABBREVIATIONS, TWO_DIGIT_YEAR_BASE};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static CANONICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("canonical date pattern"));

static MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2})-([A-Za-z]{3})-([0-9]{2}|[0-9]{4})$").expect("month name date pattern")
});

static COMPACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})([0-9]{2})([0-9]{2}|[0-9]{4})$").expect("compact date pattern"));

static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2})[/-]([0-9]{1,2})[/-]([0-9]{4})$").expect("day first date pattern")
});

/// Why a token could not be normalized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("unrecognized date notation '{0}'")]
    Unrecognized(String),

    #[error("'{token}' is not a calendar date (day {day}, month {month}, year {year})")]
    NotACalendarDate {
        token: String,
        day: u32,
        month: u32,
        year: i32,
    },
}

/// Normalize a vendor date token to a canonical calendar date
pub fn normalize(token: &str) -> Result<CanonicalDate, DateError> {
    let token = token.trim();

    if let Some(caps) = CANONICAL.captures(token) {
        return reconstruct(token, &caps[3], &caps[2], &caps[1]);
    }

    if let Some(caps) = MONTH_NAME.captures(token) {
        let month = month_number(&caps[2]).ok_or_else(|| DateError::Unrecognized(token.into()))?;
        let year = expand_year(token, &caps[3])?;
        return reconstruct_parts(token, parse_part(token, &caps[1])?, month, year);
    }

    if let Some(caps) = COMPACT.captures(token) {
        let year = expand_year(token, &caps[3])?;
        return reconstruct_parts(
            token,
            parse_part(token, &caps[1])?,
            parse_part(token, &caps[2])?,
            year,
        );
    }

    if let Some(caps) = DAY_FIRST.captures(token) {
        return reconstruct(token, &caps[1], &caps[2], &caps[3]);
    }

    Err(DateError::Unrecognized(token.to_string()))
}

/// Normalize a token, returning `None` on failure
pub fn try_normalize(token: &str) -> Option<CanonicalDate> {
    normalize(token).ok()
}

fn reconstruct(token: &str, day: &str, month: &str, year: &str) -> Result<CanonicalDate, DateError> {
    reconstruct_parts(
        token,
        parse_part(token, day)?,
        parse_part(token, month)?,
        parse_part(token, year)?,
    )
}

/// Build a calendar date and require it to reproduce the parsed parts exactly
fn reconstruct_parts(
    token: &str,
    day: u32,
    month: u32,
    year: i32,
) -> Result<CanonicalDate, DateError> {
    let invalid = || DateError::NotACalendarDate {
        token: token.to_string(),
        day,
        month,
        year,
    };

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
    if date.day() != day || date.month() != month || date.year() != year {
        return Err(invalid());
    }

    Ok(CanonicalDate::new(date))
}

/// Patterns only capture ASCII digit runs of at most four characters
fn parse_part<T: FromStr>(token: &str, digits: &str) -> Result<T, DateError> {
    digits
        .parse()
        .map_err(|_| DateError::Unrecognized(token.to_string()))
}

/// Two-digit years land in the 2000s
fn expand_year(token: &str, digits: &str) -> Result<i32, DateError> {
    let year: i32 = parse_part(token, digits)?;
    if digits.len() == 2 {
        Ok(TWO_DIGIT_YEAR_BASE + year)
    } else {
        Ok(year)
    }
}

fn month_number(abbreviation: &str) -> Option<u32> {
    MONTH_ABBREVIATIONS
        .iter()
        .position(|month| month.eq_ignore_ascii_case(abbreviation))
        .map(|index| index as u32 + 1)
}
