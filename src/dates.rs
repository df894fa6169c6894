//! Date, time and season parsing for heterogeneous spreadsheet cells.
//!
//! Federation exports mix real date-time cells, Excel serial numbers and
//! Danish text formats in the same column, depending on how the sheet was
//! produced. Every parser here is total: unparseable cells yield `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::row::CellValue;

/// Days between the Excel date epoch (1899-12-30) and the Unix epoch.
const EXCEL_UNIX_OFFSET_DAYS: f64 = 25569.0;

/// A parsed time-of-day plus its canonical `hh:mm` rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTime {
    pub time: NaiveTime,
    pub text: String,
}

impl ParsedTime {
    fn from_hm(hh: u32, mm: u32) -> Option<Self> {
        let time = NaiveTime::from_hms_opt(hh, mm, 0)?;
        Some(Self {
            time,
            text: format!("{:02}:{:02}", hh, mm),
        })
    }
}

/// Convert an Excel serial date (days since 1899-12-30) to a calendar date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let ms = ((serial - EXCEL_UNIX_OFFSET_DAYS) * 86_400_000.0).round();
    if !ms.is_finite() || ms.abs() > 9e15 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(ms as i64).map(|dt| dt.date_naive())
}

/// Parse a date from text: ISO-ish formats first, then Danish
/// `dd-mm-yyyy` / `dd/mm/yyyy` / `dd.mm.yyyy`. Two-digit years map to
/// `2000+yy`.
pub fn parse_date_from_text(value: &str) -> Option<NaiveDate> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(v, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    parse_danish_date(v)
}

fn parse_danish_date(v: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = v.split(['-', '/', '.']).map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }

    let day = parse_digits(parts[0], 1, 2)?;
    let month = parse_digits(parts[1], 1, 2)?;
    let mut year = parse_digits(parts[2], 2, 4)?;
    if year < 100 {
        year += 2000;
    }
    if day == 0 || month == 0 || year == 0 {
        return None;
    }

    NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
}

fn parse_digits(s: &str, min_len: usize, max_len: usize) -> Option<u64> {
    if s.len() < min_len || s.len() > max_len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Interpret a spreadsheet cell as a calendar date.
pub fn parse_excel_date_cell(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Number(n) => excel_serial_to_date(*n),
        CellValue::Text(s) => parse_date_from_text(s),
        CellValue::Empty => None,
    }
}

/// Parse a time from text: `h:mm`, `hh:mm`, `hh.mm`, optionally with a
/// seconds part and spaces around the separators.
pub fn parse_time_from_text(value: &str) -> Option<ParsedTime> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }

    let parts: Vec<&str> = v.split([':', '.']).map(str::trim).collect();
    if parts.len() != 2 && parts.len() != 3 {
        return None;
    }

    let hh = parse_digits(parts[0], 1, 2)?;
    let mm = parse_digits(parts[1], 2, 2)?;
    if parts.len() == 3 {
        parse_digits(parts[2], 2, 2)?;
    }
    if hh > 23 || mm > 59 {
        return None;
    }

    ParsedTime::from_hm(hh as u32, mm as u32)
}

/// Interpret a spreadsheet cell as a time of day. Numeric cells hold the
/// Excel fraction-of-day representation, rounded to the nearest minute.
pub fn parse_excel_time_cell(cell: &CellValue) -> Option<ParsedTime> {
    match cell {
        CellValue::DateTime(dt) => {
            use chrono::Timelike;
            ParsedTime::from_hm(dt.time().hour(), dt.time().minute())
        }
        CellValue::Number(n) => {
            if !n.is_finite() || *n < 0.0 {
                return None;
            }
            let total_minutes = (n * 24.0 * 60.0).round() as i64;
            let hh = ((total_minutes / 60) % 24) as u32;
            let mm = (total_minutes % 60) as u32;
            ParsedTime::from_hm(hh, mm)
        }
        CellValue::Text(s) => parse_time_from_text(s),
        CellValue::Empty => None,
    }
}

/// Extract a season's start year from free text like "2024-2025" or
/// "Sæson 2024/25": the first run of four digits, bounded to a sane range.
pub fn parse_season_start_year(value: &str) -> Option<i32> {
    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }

    let chars: Vec<char> = raw.chars().collect();
    for i in 0..chars.len().saturating_sub(3) {
        if chars[i..i + 4].iter().all(|c| c.is_ascii_digit()) {
            let year: i32 = chars[i..i + 4].iter().collect::<String>().parse().ok()?;
            if !(1900..=3000).contains(&year) {
                return None;
            }
            return Some(year);
        }
    }
    None
}

/// Render a date as Danish `dd-mm-yyyy`, or the empty string for `None`.
pub fn format_date_da(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d-%m-%Y").to_string(),
        None => String::new(),
    }
}
