// 📋 Table Boundary - loosely typed rows as read from spreadsheets/rosters
//
// Readers (parser.rs) produce Tables; every stage resolves the columns it
// needs ONCE (Table::column → MissingField) and converts rows into typed
// records (model.rs). Nothing downstream touches a Cell.

use crate::error::{PipelineError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

// ============================================================================
// CELL
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
}

static EMPTY_CELL: Cell = Cell::Empty;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Empty cell or blank text
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// String form used for codes and output fields.
    ///
    /// Integral floats lose the ".0" (spreadsheets store codes as numbers),
    /// dates render as YYYY/MM/DD.
    pub fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", *f as i64)
                } else {
                    f.to_string()
                }
            }
            Cell::Date(d) => d.format("%Y/%m/%d").to_string(),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => parse_date(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Int(i) => Some(Decimal::from(*i)),
            Cell::Float(f) => Decimal::from_f64(*f),
            Cell::Text(s) => {
                let trimmed = s.trim();
                Decimal::from_str(trimmed)
                    .or_else(|_| Decimal::from_scientific(trimmed))
                    .ok()
            }
            Cell::Empty | Cell::Date(_) => None,
        }
    }

    /// Integer view, truncating fractional values
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(i) => Some(*i),
            Cell::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Cell::Text(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| self.as_decimal().and_then(|d| i64::try_from(d.trunc()).ok())),
            _ => None,
        }
    }

    /// Amount view for required numeric fields: blank is zero, anything
    /// else must parse
    pub fn as_amount(&self) -> Option<Decimal> {
        if self.is_blank() {
            return Some(Decimal::ZERO);
        }
        self.as_decimal()
    }

    /// Count view, same blank rule as `as_amount`
    pub fn as_count(&self) -> Option<i64> {
        if self.is_blank() {
            return Some(0);
        }
        self.as_i64()
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(d);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }

    None
}

// ============================================================================
// ROW / TABLE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Row { cells }
    }

    /// Cell at a column index; short rows read as Empty
    pub fn get(&self, idx: usize) -> &Cell {
        self.cells.get(idx).unwrap_or(&EMPTY_CELL)
    }

    /// Rendered + trimmed text at a column index
    pub fn text(&self, idx: usize) -> String {
        self.get(idx).render().trim().to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(name: &str, headers: Vec<String>) -> Self {
        Table {
            name: name.to_string(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Convenience constructor (mostly for tests and static catalogues)
    pub fn from_rows(name: &str, headers: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Table::new(name, headers.iter().map(|h| h.to_string()).collect());
        for cells in rows {
            table.push(cells);
        }
        table
    }

    pub fn push(&mut self, cells: Vec<Cell>) {
        self.rows.push(Row::new(cells));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find_column(&self, field: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == field)
    }

    /// Resolve a required column, failing with MissingField
    pub fn column(&self, field: &str) -> Result<usize> {
        self.find_column(field)
            .ok_or_else(|| PipelineError::missing_field(&self.name, field))
    }

    /// Copy of this table keeping only rows matching the predicate
    pub fn filter<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&Row) -> bool,
    {
        Table {
            name: self.name.clone(),
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
