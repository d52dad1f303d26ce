//! Date and time-of-day normalization for extracted spreadsheet cells.
//!
//! Turnstile exports are inconsistent about how they encode dates: some cells
//! hold ISO strings, some `DD/MM/YYYY`, and some the raw spreadsheet serial
//! number. Everything here is lenient: unparseable input returns `None` and the
//! caller drops the row.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate, NaiveTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static DAY_FIRST_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap());

static SERIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").unwrap());

/// Largest serial a spreadsheet will produce (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A cell value as handed over by the spreadsheet extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Number(f64),
    Text(String),
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Day zero of the spreadsheet serial calendar.
///
/// Serials count from 1900-01-01 but the format treats 1900 as a leap year
/// and starts at 1, so the effective origin sits two days earlier.
fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Converts a spreadsheet serial day number to a calendar date.
///
/// Any fractional part (time of day) is discarded.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "range checked above"
    )]
    let days = serial.floor() as u64;
    serial_epoch().checked_add_days(Days::new(days))
}

/// Canonicalizes a date cell.
///
/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY` and spreadsheet serial numbers (as a
/// number or a numeric string).
pub fn normalize_date(raw: &RawCell) -> Option<NaiveDate> {
    match raw {
        RawCell::Number(serial) => date_from_serial(*serial),
        RawCell::Text(text) => normalize_date_text(text.trim()),
    }
}

fn normalize_date_text(text: &str) -> Option<NaiveDate> {
    if ISO_DATE_RE.is_match(text) {
        return NaiveDate::parse_from_str(text, "%Y-%m-%d").ok();
    }

    if let Some(caps) = DAY_FIRST_DATE_RE.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if SERIAL_RE.is_match(text) {
        return date_from_serial(text.parse().ok()?);
    }

    None
}

/// Canonicalizes a time-of-day cell.
///
/// Text is expected as `HH:MM:SS`; `HH:MM` is read with zero seconds. Numbers
/// are spreadsheet day fractions (0.5 is noon).
pub fn normalize_time(raw: &RawCell) -> Option<NaiveTime> {
    match raw {
        RawCell::Number(fraction) => time_from_day_fraction(*fraction),
        RawCell::Text(text) => {
            let text = text.trim();
            ["%H:%M:%S", "%H:%M"]
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
        }
    }
}

fn time_from_day_fraction(fraction: f64) -> Option<NaiveTime> {
    if !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
        return None;
    }
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "fraction is in [0, 1) so seconds fit in u32"
    )]
    let seconds = (fraction * SECONDS_PER_DAY).round() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds.min(86_399), 0)
}

/// Time of day as fractional minutes since midnight.
pub fn minutes_of_day(time: NaiveTime) -> f64 {
    f64::from(time.num_seconds_from_midnight()) / 60.0
}
