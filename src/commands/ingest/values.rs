use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

pub const EXAM_DATE_FORMAT: &str = "%d.%m.%Y";

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// `%d.%m.%Y` is tried before the month-first slash form so exported dates
// re-ingest unchanged.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%d-%B-%Y",
    "%B %d, %Y",
    "%B %d %Y",
];

// 1900 date system: serial 1 is 1900-01-01 and serial 60 is the phantom
// 1900-02-29, so serials from 61 on count from one day earlier.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 31);
const PHANTOM_LEAP_DAY: i64 = 60;
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn render(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => {
                if value.fract() == 0.0 && *value >= i64::MIN as f64 && *value < i64::MAX as f64
                {
                    (*value as i64).to_string()
                } else {
                    value.to_string()
                }
            }
            Self::Bool(value) => value.to_string(),
            Self::DateTime(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError {
    pub value: String,
}

impl fmt::Display for DateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to parse date '{}'", self.value)
    }
}

impl std::error::Error for DateParseError {}

pub fn parse_exam_date(cell: &Cell) -> Result<NaiveDate, DateParseError> {
    let parsed = match cell {
        Cell::DateTime(value) => Some(value.date()),
        Cell::Text(value) => parse_date_text(value.trim()),
        Cell::Int(value) => serial_to_date(*value as f64),
        Cell::Float(value) => serial_to_date(*value),
        Cell::Bool(_) => None,
    };

    parsed.ok_or_else(|| DateParseError {
        value: cell.render(),
    })
}

pub fn format_exam_date(date: NaiveDate) -> String {
    date.format(EXAM_DATE_FORMAT).to_string()
}

fn parse_date_text(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|parsed| parsed.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        })
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL_DAY {
        return None;
    }

    let days = serial.trunc() as i64;
    let offset = match days.cmp(&PHANTOM_LEAP_DAY) {
        Ordering::Less => days,
        Ordering::Equal => return None,
        Ordering::Greater => days - 1,
    };

    let (year, month, day) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)?;
    epoch.checked_add_signed(Duration::days(offset))
}
