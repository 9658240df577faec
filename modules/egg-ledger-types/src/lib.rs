//! Shared types for the egg ledger: day records, the sheet row boundary
//! parser, and the Google Sheets v4 values wire format.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Canonical date format of the `Date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const DATE_HEADER: &str = "Date";
pub const COUNT_HEADER: &str = "Count";

// =====================================================
// Domain Types
// =====================================================

/// One ledger row: a date and that day's cumulative egg count.
///
/// `date` is the cell text exactly as stored. Rows whose text is not a
/// canonical `YYYY-MM-DD` date are kept here and skipped by readers via
/// [`DayRecord::calendar_date`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: String,
    pub count: u32,
}

impl DayRecord {
    pub fn new(date: NaiveDate, count: u32) -> Self {
        Self {
            date: format_date(date),
            count,
        }
    }

    /// The calendar date of this row, or `None` when the cell is not a
    /// canonical `YYYY-MM-DD` string (`2024-6-1` is rejected).
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        let raw = self.date.trim();
        let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()?;
        (format_date(date) == raw).then_some(date)
    }

    pub fn is_on(&self, day: NaiveDate) -> bool {
        self.calendar_date() == Some(day)
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// =====================================================
// Sheet Rows
// =====================================================

/// Zero-based positions of the ledger columns within a sheet row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date: usize,
    pub count: usize,
}

impl ColumnLayout {
    /// Layout written to a sheet that has no header yet: `Date, Count`.
    pub const DEFAULT: ColumnLayout = ColumnLayout { date: 0, count: 1 };

    pub fn from_header(header: &[Value]) -> Result<Self, SchemaError> {
        let find = |name: &'static str| {
            header
                .iter()
                .position(|cell| cell_text(Some(cell)).trim() == name)
                .ok_or(SchemaError::MissingColumn(name))
        };
        Ok(Self {
            date: find(DATE_HEADER)?,
            count: find(COUNT_HEADER)?,
        })
    }

    /// Number of cells needed to hold both columns.
    pub fn width(&self) -> usize {
        self.date.max(self.count) + 1
    }

    pub fn header_row(&self) -> Vec<Value> {
        let mut cells = vec![Value::String(String::new()); self.width()];
        cells[self.date] = Value::String(DATE_HEADER.to_string());
        cells[self.count] = Value::String(COUNT_HEADER.to_string());
        cells
    }

    /// Lay a record out as a sheet row. The count is written as a number.
    pub fn row_values(&self, record: &DayRecord) -> Vec<Value> {
        let mut cells = vec![Value::String(String::new()); self.width()];
        cells[self.date] = Value::String(record.date.clone());
        cells[self.count] = Value::from(record.count);
        cells
    }
}

/// How a `Count` cell was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountCell {
    Value(u32),
    Blank,
    Unreadable,
}

impl CountCell {
    /// Blank and unreadable cells count as zero.
    pub fn value(self) -> u32 {
        match self {
            CountCell::Value(n) => n,
            CountCell::Blank | CountCell::Unreadable => 0,
        }
    }
}

pub fn parse_count_cell(cell: Option<&Value>) -> CountCell {
    let parsed = match cell {
        None | Some(Value::Null) => return CountCell::Blank,
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| n.as_f64().and_then(integral_u32)),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return CountCell::Blank;
            }
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_u32))
        }
        Some(_) => None,
    };
    parsed.map_or(CountCell::Unreadable, CountCell::Value)
}

fn integral_u32(v: f64) -> Option<u32> {
    (v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64).then_some(v as u32)
}

/// Render a cell as the text a user would see in the sheet.
pub fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// A data row together with its 1-based row number in the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub row_number: usize,
    pub record: DayRecord,
    pub count_cell: CountCell,
}

/// Everything read from the ledger tab in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSnapshot {
    pub layout: ColumnLayout,
    /// False only for a completely empty tab.
    pub has_header: bool,
    pub rows: Vec<SheetRow>,
}

impl SheetSnapshot {
    pub fn records(&self) -> Vec<DayRecord> {
        self.rows.iter().map(|row| row.record.clone()).collect()
    }
}

/// Convert the raw `values` grid (header first) into typed rows.
///
/// Entirely blank rows are dropped; row numbers still refer to the sheet.
pub fn parse_rows(values: &[Vec<Value>]) -> Result<SheetSnapshot, SchemaError> {
    let Some((header, data)) = values.split_first() else {
        return Ok(SheetSnapshot {
            layout: ColumnLayout::DEFAULT,
            has_header: false,
            rows: Vec::new(),
        });
    };

    let layout = ColumnLayout::from_header(header)?;
    let rows = data
        .iter()
        .enumerate()
        .filter(|(_, cells)| !is_blank_row(cells))
        .map(|(i, cells)| {
            let count_cell = parse_count_cell(cells.get(layout.count));
            SheetRow {
                row_number: i + 2,
                record: DayRecord {
                    date: cell_text(cells.get(layout.date)),
                    count: count_cell.value(),
                },
                count_cell,
            }
        })
        .collect();

    Ok(SheetSnapshot {
        layout,
        has_header: true,
        rows,
    })
}

fn is_blank_row(cells: &[Value]) -> bool {
    cells.iter().all(|cell| cell_text(Some(cell)).trim().is_empty())
}

/// A1-notation column letters for a zero-based column index (0 -> `A`, 26 -> `AA`).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    MissingColumn(&'static str),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::MissingColumn(name) => {
                write!(f, "header row has no '{}' column", name)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

// =====================================================
// Google Sheets v4 Wire Types
// =====================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    /// Omitted by the API when the range is empty.
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    pub fn rows(range: impl Into<String>, values: Vec<Vec<Value>>) -> Self {
        Self {
            range: Some(range.into()),
            major_dimension: Some("ROWS".to_string()),
            values,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub updated_range: Option<String>,
    #[serde(default)]
    pub updated_rows: Option<u32>,
    #[serde(default)]
    pub updated_cells: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub table_range: Option<String>,
    #[serde(default)]
    pub updates: Option<UpdateValuesResponse>,
}
