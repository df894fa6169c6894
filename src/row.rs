//! Loosely-typed spreadsheet rows with resilient header lookup.
//!
//! Import rows arrive as mappings from arbitrary column headers to cell
//! values, exactly as the upload layer parsed them. Header names vary
//! between federation exports ("Hold", "Holdnavn", "Hold navn", ...), so
//! every field lookup is two-tier: exact case-insensitive alias match
//! first, substring-contains over all headers second. Column order is
//! preserved so that contains-lookups are deterministic.

use chrono::NaiveDateTime;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single spreadsheet cell.
///
/// Dates show up as real date-time values when the upload layer parsed
/// them, as serial numbers when it did not, and as text when the export
/// was CSV. All three survive here untouched; interpretation happens in
/// [`crate::dates`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Render the cell as trimmed text, the way every string field lookup
    /// consumes it. Numbers render without a trailing `.0`; date-times
    /// render as ISO-8601.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 9e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    pub fn is_empty_text(&self) -> bool {
        self.as_text().is_empty()
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_unit(),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::DateTime(dt) => {
                serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CellVisitor;

        impl<'de> Visitor<'de> for CellVisitor {
            type Value = CellValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number, boolean or null cell value")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<CellValue, E> {
                Ok(CellValue::Text(v.to_string()))
            }

            fn visit_string<E: serde::de::Error>(self, v: String) -> Result<CellValue, E> {
                Ok(CellValue::Text(v))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<CellValue, E> {
                Ok(CellValue::Number(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<CellValue, E> {
                Ok(CellValue::Number(v as f64))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<CellValue, E> {
                Ok(CellValue::Number(v as f64))
            }

            fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<CellValue, E> {
                Ok(CellValue::Text(v.to_string()))
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<CellValue, E> {
                Ok(CellValue::Empty)
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<CellValue, E> {
                Ok(CellValue::Empty)
            }
        }

        deserializer.deserialize_any(CellVisitor)
    }
}

/// One import row: ordered `(header, cell)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(cells: Vec<(String, CellValue)>) -> Self {
        Self { cells }
    }

    /// Append a cell, keeping column order.
    pub fn push(&mut self, header: impl Into<String>, value: CellValue) {
        self.cells.push((header.into(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[(String, CellValue)] {
        &self.cells
    }

    /// First non-empty text value under any of the exact aliases, compared
    /// case-insensitively on trimmed header names. Aliases are tried in
    /// order, so more specific names win.
    pub fn first_exact(&self, aliases: &[&str]) -> String {
        for alias in aliases {
            let want = alias.trim().to_lowercase();
            for (header, value) in &self.cells {
                if header.trim().to_lowercase() != want {
                    continue;
                }
                let s = value.as_text();
                if !s.is_empty() {
                    return s;
                }
            }
        }
        String::new()
    }

    /// First non-empty text value under any header containing `needle`
    /// (case-insensitive).
    pub fn first_contains(&self, needle: &str) -> String {
        let n = needle.to_lowercase();
        for (header, value) in &self.cells {
            if !header.to_lowercase().contains(&n) {
                continue;
            }
            let s = value.as_text();
            if !s.is_empty() {
                return s;
            }
        }
        String::new()
    }

    /// First non-empty text value under a header whose lowercased name
    /// satisfies `predicate`. Used for compound header shapes like
    /// "Dommer 1 Navn" vs "Dommer1_ID".
    pub fn first_matching(&self, predicate: impl Fn(&str) -> bool) -> String {
        for (header, value) in &self.cells {
            if !predicate(&header.to_lowercase()) {
                continue;
            }
            let s = value.as_text();
            if !s.is_empty() {
                return s;
            }
        }
        String::new()
    }

    /// Two-tier field lookup: exact aliases first, then contains-needles.
    pub fn lookup(&self, aliases: &[&str], contains: &[&str]) -> String {
        let exact = self.first_exact(aliases);
        if !exact.is_empty() {
            return exact;
        }
        for needle in contains {
            let s = self.first_contains(needle);
            if !s.is_empty() {
                return s;
            }
        }
        String::new()
    }

    /// Raw cell lookup for date/time columns: first header matching an
    /// exact alias, then first header containing a needle. Unlike the text
    /// lookups this returns the first matching cell even when it is empty,
    /// since the parsers decide what an empty cell means.
    pub fn cell_for(&self, aliases: &[&str], contains: &[&str]) -> Option<&CellValue> {
        for alias in aliases {
            let want = alias.trim().to_lowercase();
            if let Some((_, value)) = self
                .cells
                .iter()
                .find(|(header, _)| header.trim().to_lowercase() == want)
            {
                return Some(value);
            }
        }
        for needle in contains {
            let n = needle.to_lowercase();
            if let Some((_, value)) = self
                .cells
                .iter()
                .find(|(header, _)| header.to_lowercase().contains(&n))
            {
                return Some(value);
            }
        }
        None
    }

    /// Drop empty headers and trim header names and text cells, the way
    /// the upload layer sanitizes sheet rows before staging them.
    pub fn sanitized(self) -> Row {
        let cells = self
            .cells
            .into_iter()
            .filter_map(|(header, value)| {
                let header = header.trim().to_string();
                if header.is_empty() {
                    return None;
                }
                let value = match value {
                    CellValue::Text(s) => CellValue::Text(s.trim().to_string()),
                    other => other,
                };
                Some((header, value))
            })
            .collect();
        Row { cells }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (header, value) in &self.cells {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column headers to cell values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut cells = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((header, value)) = access.next_entry::<String, CellValue>()? {
                    cells.push((header, value));
                }
                Ok(Row { cells })
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// Parse a JSON array of row objects (the stored import payload shape),
/// sanitizing each row and dropping rows with no remaining cells.
/// Column order follows the JSON document.
pub fn rows_from_json_str(json: &str) -> serde_json::Result<Vec<Row>> {
    let rows: Vec<Row> = serde_json::from_str(json)?;
    Ok(rows
        .into_iter()
        .map(Row::sanitized)
        .filter(|r| !r.is_empty())
        .collect())
}
