//! Lenient cell parsing shared by every loader.
//!
//! Exports are hand-edited spreadsheets, so numeric cells are read the way a
//! browser's `parseInt`/`parseFloat` would read them: the longest numeric
//! prefix wins and anything unparseable is `None`, never zero.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// Anything that can hand out a cell by column name
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<&str>;

    /// Non-empty trimmed text
    fn text(&self, name: &str) -> Option<String> {
        self.field(name)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn int(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(parse_int)
    }

    fn float(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(parse_float)
    }

    fn date(&self, name: &str) -> Option<NaiveDate> {
        self.field(name).and_then(parse_date)
    }
}

impl FieldSource for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Column-name lookup for a CSV header row
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(headers: &csv::StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_string(), i))
            .collect();
        Self { positions }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn row<'a>(&'a self, record: &'a csv::StringRecord) -> IndexedRow<'a> {
        IndexedRow {
            index: self,
            record,
        }
    }
}

pub struct IndexedRow<'a> {
    index: &'a HeaderIndex,
    record: &'a csv::StringRecord,
}

impl FieldSource for IndexedRow<'_> {
    fn field(&self, name: &str) -> Option<&str> {
        self.index
            .positions
            .get(name)
            .and_then(|&i| self.record.get(i))
    }
}

/// `parseInt`-style: optional sign followed by at least one digit
pub fn parse_int(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    digits[..end].parse::<i64>().ok().map(|v| sign * v)
}

/// `parseFloat`-style: longest prefix that reads as a finite number
pub fn parse_float(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let candidate_len = trimmed
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(trimmed.len());

    (1..=candidate_len)
        .rev()
        .filter_map(|len| trimmed[..len].parse::<f64>().ok())
        .find(|v| v.is_finite())
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Accepts ISO dates, ISO timestamps (date part kept) and US-style dates
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let iso_prefix = trimmed.get(..10).unwrap_or(trimmed);
    if let Ok(date) = NaiveDate::parse_from_str(iso_prefix, "%Y-%m-%d") {
        return Some(date);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    let without_zone = trimmed.trim_end_matches('Z');

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(without_zone, fmt).ok())
        .or_else(|| parse_date(trimmed).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Decode file bytes, falling back to Windows-1252 for spreadsheet exports
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
