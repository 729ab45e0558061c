use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::date::ExpiryDate;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Patterns run against normalized (upper-case, space-free) text. The month run may hold
// zeros because the cleaner rewrites every `O`.
re!(re_month_name_year, r"([A-Z0]*[A-Z][A-Z0]*)\s*(\d{4})");
re!(re_month_year, r"(\d{2})/(\d{4})");
re!(re_day_month_year, r"(\d{2})/(\d{2})/(\d{4})");

const MONTH_NAMES: [&str; 12] = [
    "JANUARY", "FEBRUARY", "MARCH", "APRIL", "MAY", "JUNE",
    "JULY", "AUGUST", "SEPTEMBER", "OCTOBER", "NOVEMBER", "DECEMBER",
];

// ── Types ────────────────────────────────────────────────────────────────────

/// The printed date shapes we understand, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `DEC2024`, `DECEMBER 2024`. Valid through the end of the month.
    MonthNameYear,
    /// `12/2024`, `12-2024`. Valid through the end of the month.
    MonthYear,
    /// `31/12/2024`, day first.
    DayMonthYear,
}

pub const DATE_FORMATS: [DateFormat; 3] = [
    DateFormat::MonthNameYear,
    DateFormat::MonthYear,
    DateFormat::DayMonthYear,
];

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFormat::MonthNameYear => write!(f, "MON/YYYY"),
            DateFormat::MonthYear => write!(f, "MM/YYYY"),
            DateFormat::DayMonthYear => write!(f, "DD/MM/YYYY"),
        }
    }
}

/// A successful extraction along with what produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateMatch {
    pub date: ExpiryDate,
    pub format: DateFormat,
    /// The slice of normalized text the format matched.
    pub matched: String,
}

/// Why no date came out of a piece of text. None of these are faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionMiss {
    #[error("no text detected")]
    NoTextDetected,
    #[error("no recognised date pattern")]
    NoPatternMatch,
    #[error("'{matched}' looks like {format} but is not a calendar date")]
    InvalidCalendarDate { format: DateFormat, matched: String },
}

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct DateExtractor;

impl DateExtractor {
    /// Extract an expiry date from cleaned OCR text.
    pub fn extract(text: &str) -> Option<ExpiryDate> {
        Self::try_extract(text).ok().map(|m| m.date)
    }

    /// Like [`DateExtractor::extract`] but says which format matched, or why none did.
    pub fn try_extract(text: &str) -> Result<DateMatch, ExtractionMiss> {
        if text.trim().is_empty() {
            tracing::warn!("No text detected by OCR");
            return Err(ExtractionMiss::NoTextDetected);
        }

        let normalized = normalize(text);
        tracing::debug!(text = %normalized, "normalized OCR text for date extraction");

        let found = DATE_FORMATS
            .into_iter()
            .find_map(|format| format.find(&normalized))
            .or_else(|| find_glued_month(&normalized));
        if let Some(result) = found {
            match &result {
                Ok(m) => tracing::debug!(format = %m.format, date = %m.date, matched = %m.matched, "expiry date matched"),
                Err(e) => tracing::warn!("{e}"),
            }
            return result;
        }

        tracing::warn!(text = %normalized, "No valid expiry date found");
        Err(ExtractionMiss::NoPatternMatch)
    }
}

/// Single-line, upper-case, no spaces, hyphens turned into slashes.
/// Line breaks become single spaces between the non-empty lines.
pub fn normalize(text: &str) -> String {
    let squeezed: String = text
        .chars()
        .filter(|c| is_line_break(*c) || !c.is_whitespace())
        .map(|c| if c == '-' { '/' } else { c })
        .collect::<String>()
        .to_uppercase();

    squeezed
        .split(is_line_break)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\x0b' | '\x0c' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

// ── Format matchers ───────────────────────────────────────────────────────────

impl DateFormat {
    fn pattern(self) -> &'static Regex {
        match self {
            DateFormat::MonthNameYear => re_month_name_year(),
            DateFormat::MonthYear => re_month_year(),
            DateFormat::DayMonthYear => re_day_month_year(),
        }
    }

    /// `None` when this format does not occur in `text`, so the next one gets a turn.
    fn find(self, text: &str) -> Option<Result<DateMatch, ExtractionMiss>> {
        let mut candidates = self.pattern().captures_iter(text);
        match self {
            // A letter run that is not a month is not a match; keep looking.
            DateFormat::MonthNameYear => candidates.find_map(|c| {
                let month = month_from_name(c.get(1)?.as_str())?;
                let year: i32 = c.get(2)?.as_str().parse().ok()?;
                Some(self.resolve(&c, ExpiryDate::end_of_month(year, month)))
            }),
            DateFormat::MonthYear => candidates
                .find(|c| !is_day_month_tail(text, c))
                .map(|c| {
                    let date = parse_num::<u32>(&c, 1)
                        .zip(parse_num::<i32>(&c, 2))
                        .and_then(|(month, year)| ExpiryDate::end_of_month(year, month));
                    self.resolve(&c, date)
                }),
            DateFormat::DayMonthYear => candidates.next().map(|c| {
                let date = match (parse_num(&c, 1), parse_num(&c, 2), parse_num(&c, 3)) {
                    (Some(day), Some(month), Some(year)) => ExpiryDate::new(year, month, day),
                    _ => None,
                };
                self.resolve(&c, date)
            }),
        }
    }

    fn resolve(self, caps: &Captures, date: Option<ExpiryDate>) -> Result<DateMatch, ExtractionMiss> {
        let matched = caps.get(0).map_or("", |m| m.as_str()).to_string();
        match date {
            Some(date) => Ok(DateMatch { date, format: self, matched }),
            None => Err(ExtractionMiss::InvalidCalendarDate { format: self, matched }),
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_num<T: std::str::FromStr>(caps: &Captures, group: usize) -> Option<T> {
    caps.get(group)?.as_str().parse().ok()
}

/// True when an `MM/YYYY` hit is really the `MM/YYYY` half of `DD/MM/YYYY`,
/// i.e. it sits right behind two digits and a slash.
fn is_day_month_tail(text: &str, caps: &Captures) -> bool {
    let Some(m) = caps.get(0) else { return false };
    let Some(before) = text[..m.start()].strip_suffix('/') else { return false };
    let bytes = before.as_bytes();
    bytes.len() >= 2 && bytes[bytes.len() - 2..].iter().all(u8::is_ascii_digit)
}

/// Last resort once no format matched: a letter run that ends in a month name, since
/// stripping spaces glues label words onto the month (`BESTBEFOREDEC2024`).
fn find_glued_month(text: &str) -> Option<Result<DateMatch, ExtractionMiss>> {
    re_month_name_year().captures_iter(text).find_map(|c| {
        let month = month_from_suffix(c.get(1)?.as_str())?;
        let year: i32 = c.get(2)?.as_str().parse().ok()?;
        Some(DateFormat::MonthNameYear.resolve(&c, ExpiryDate::end_of_month(year, month)))
    })
}

/// Full name or three-letter abbreviation to a month number (1–12). Zeros are read as `O`.
fn month_from_name(token: &str) -> Option<u32> {
    let token = token.replace('0', "O");
    MONTH_NAMES
        .iter()
        .position(|name| token == *name || token == name[..3])
        .map(|i| i as u32 + 1)
}

/// Month whose full name, or failing that abbreviation, ends the run.
fn month_from_suffix(token: &str) -> Option<u32> {
    let token = token.replace('0', "O");
    MONTH_NAMES
        .iter()
        .position(|name| token.ends_with(*name))
        .or_else(|| MONTH_NAMES.iter().position(|name| token.ends_with(&name[..3])))
        .map(|i| i as u32 + 1)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
