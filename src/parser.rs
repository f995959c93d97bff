// 🏗️ Reader Framework - one TableReader per source format
// Workbooks (xlsx/xls) via calamine, legacy "{" rosters via csv + encoding_rs

use crate::error::{PipelineError, Result};
use crate::table::{Cell, Table};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use encoding_rs::WINDOWS_1252;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Field separator of every legacy roster and every output extract
pub const BRACE_DELIMITER: u8 = b'{';

/// Stray quote characters wrapping client roster lines
const LINE_QUOTES: [char; 5] = ['"', '“', '”', '\'', '`'];

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceFormat - de qué tipo de archivo viene la tabla
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    Workbook,
    BraceDelimited,
}

impl SourceFormat {
    pub fn name(&self) -> &str {
        match self {
            SourceFormat::Workbook => "workbook",
            SourceFormat::BraceDelimited => "brace-delimited roster",
        }
    }
}

/// TableReader - Core trait
///
/// Every reference source (sales workbook, rosters, catalogs) is loaded
/// through this interface; stages only ever see a `Table`.
pub trait TableReader {
    /// Read the whole source into memory
    fn read(&self, path: &Path) -> Result<Table>;

    fn format(&self) -> SourceFormat;
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Detect the source format from the file extension
///
/// ```text
/// detect_format("ventas.xlsx")      → Workbook
/// detect_format("interasesor.txt")  → BraceDelimited
/// ```
pub fn detect_format(path: &Path) -> SourceFormat {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => SourceFormat::Workbook,
        _ => SourceFormat::BraceDelimited,
    }
}

/// Fail with ReferenceNotFound when a required source is absent
pub fn ensure_exists(name: &str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::ReferenceNotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        })
    }
}

/// Read one sheet of a workbook (first row = header)
pub fn read_sheet(name: &str, path: &Path, sheet: &str) -> Result<Table> {
    ensure_exists(name, path)?;
    WorkbookReader::new(name, Some(sheet)).read(path)
}

/// Reader for a roster path: a workbook export is read from its first sheet
/// (own header row), anything else as a headerless "{" roster
pub fn roster_reader(
    name: &str,
    path: &Path,
    columns: &[&str],
    strip_line_quotes: bool,
) -> Box<dyn TableReader> {
    match detect_format(path) {
        SourceFormat::Workbook => Box::new(WorkbookReader::new(name, None)),
        SourceFormat::BraceDelimited => Box::new(
            BraceDelimitedReader::new(name, columns).with_line_quote_stripping(strip_line_quotes),
        ),
    }
}

/// Read a roster with the given column names
pub fn read_roster(
    name: &str,
    path: &Path,
    columns: &[&str],
    strip_line_quotes: bool,
) -> Result<Table> {
    ensure_exists(name, path)?;
    let reader = roster_reader(name, path, columns, strip_line_quotes);
    tracing::debug!(
        roster = name,
        path = %path.display(),
        format = reader.format().name(),
        "reading roster"
    );
    reader.read(path)
}

// ============================================================================
// WORKBOOK READER
// ============================================================================

pub struct WorkbookReader {
    name: String,
    sheet: Option<String>,
}

impl WorkbookReader {
    /// `sheet = None` reads the first sheet
    pub fn new(name: &str, sheet: Option<&str>) -> Self {
        WorkbookReader {
            name: name.to_string(),
            sheet: sheet.map(|s| s.to_string()),
        }
    }
}

impl TableReader for WorkbookReader {
    fn read(&self, path: &Path) -> Result<Table> {
        let mut workbook: Sheets<_> =
            open_workbook_auto(path).map_err(|e| PipelineError::read(path, e))?;

        let sheet_name = match &self.sheet {
            Some(sheet) => sheet.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| PipelineError::read(path, "workbook has no sheets"))?,
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| PipelineError::read(path, format!("sheet '{}': {}", sheet_name, e)))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|c| convert_cell(c).render().trim().to_string())
                .collect(),
            None => Vec::new(),
        };

        let mut table = Table::new(&self.name, headers);
        for row in rows {
            let cells: Vec<Cell> = row.iter().map(convert_cell).collect();
            if cells.iter().all(Cell::is_blank) {
                continue;
            }
            table.push(cells);
        }

        tracing::debug!(
            table = %self.name,
            sheet = %sheet_name,
            rows = table.len(),
            "workbook sheet loaded"
        );

        Ok(table)
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Workbook
    }
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match serial_to_date(dt.as_f64()) {
            Some(date) => Cell::Date(date),
            None => Cell::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// 9999-12-31, the last date Excel can store
const MAX_DATE_SERIAL: f64 = 2_958_465.0;

/// Excel 1900 date system (serial 1 = 1900-01-01, with the leap-year bug)
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_DATE_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

// ============================================================================
// BRACE-DELIMITED READER
// ============================================================================

/// Legacy ERP exports: headerless, "{"-separated, Windows-1252/Latin-1
pub struct BraceDelimitedReader {
    name: String,
    columns: Vec<String>,
    strip_line_quotes: bool,
}

impl BraceDelimitedReader {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        BraceDelimitedReader {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            strip_line_quotes: false,
        }
    }

    pub fn with_line_quote_stripping(mut self, enabled: bool) -> Self {
        self.strip_line_quotes = enabled;
        self
    }

    /// Parse already-decoded roster text
    pub fn parse_text(&self, text: &str) -> Result<Table> {
        let cleaned: String;
        let content = if self.strip_line_quotes {
            cleaned = text
                .lines()
                .map(|line| line.trim().trim_matches(&LINE_QUOTES[..]).trim())
                .collect::<Vec<_>>()
                .join("\n");
            cleaned.as_str()
        } else {
            text
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(BRACE_DELIMITER)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(content.as_bytes());

        let mut table = Table::new(&self.name, self.columns.clone());
        for (line_num, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                PipelineError::read(&self.name, format!("line {}: {}", line_num + 1, e))
            })?;

            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            let cells = record
                .iter()
                .take(self.columns.len())
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::text(field)
                    }
                })
                .collect();
            table.push(cells);
        }

        Ok(table)
    }
}

impl TableReader for BraceDelimitedReader {
    fn read(&self, path: &Path) -> Result<Table> {
        let bytes = std::fs::read(path).map_err(|e| PipelineError::read(path, e))?;
        let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
        if had_errors {
            tracing::warn!(
                table = %self.name,
                path = %path.display(),
                "roster contains undecodable bytes"
            );
        }

        let table = self.parse_text(&decoded)?;
        tracing::debug!(table = %self.name, rows = table.len(), "roster loaded");
        Ok(table)
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::BraceDelimited
    }
}

// ============================================================================
// TESTS
// ============================================================================
