use anyhow::{Result, anyhow};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// A single cell. `None` is the explicit null placeholder; empty CSV fields
/// read as `None` and `None` writes back as an empty field.
pub type Cell = Option<String>;

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M",
];

/// Smallest serial day number accepted. Bare numbers up to four digits are
/// years or garbage, never serials.
const MIN_SERIAL_DAY: f64 = 10_000.0;

/// Largest serial day number a spreadsheet accepts (9999-12-31).
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

/// Row-oriented table with named columns and nullable cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Builds a dataset, padding short rows with nulls and truncating long
    /// ones to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Appends a column holding `None` in every row.
    pub fn push_null_column(&mut self, name: &str) {
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(None);
        }
    }

    pub(crate) fn set_header(&mut self, idx: usize, name: String) {
        self.headers[idx] = name;
    }

    pub(crate) fn remove_column(&mut self, idx: usize) {
        self.headers.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
    }

    pub(crate) fn column_cells_mut(&mut self, idx: usize) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().filter_map(move |row| row.get_mut(idx))
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    if let Ok(parsed) = parse_naive_datetime(trimmed) {
        return Ok(parsed.date());
    }
    if let Some(parsed) = parse_bare_year(trimmed).or_else(|| parse_serial_date(trimmed)) {
        return Ok(parsed);
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// A bare four-digit year (`2019`) is read as January 1st of that year.
pub fn parse_bare_year(value: &str) -> Option<NaiveDate> {
    if value.len() != 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = value.parse().ok()?;
    if year < 1000 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// Interprets a spreadsheet serial day number (1900 date system, epoch
/// 1899-12-30). Only plain digits with an optional fractional part between
/// 10000 and 2958465 qualify; smaller numbers yield `None`.
pub fn parse_serial_date(value: &str) -> Option<NaiveDate> {
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) {
        return None;
    }
    let serial: f64 = value.parse().ok()?;
    if !(MIN_SERIAL_DAY..=MAX_SERIAL_DAY).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Best-effort date coercion: `None` for nulls and unparseable values.
pub fn coerce_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    parse_naive_date(value).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Normalizes a date typed by a user to `YYYY-MM-DD`, trying day-first
/// `DD/MM/YYYY` before the other accepted formats. Input that cannot be
/// parsed is returned unchanged.
pub fn parse_input_date(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, "%d/%m/%Y") {
        return format_date(parsed);
    }
    match parse_naive_date(trimmed) {
        Ok(parsed) => format_date(parsed),
        Err(_) => trimmed.to_string(),
    }
}
