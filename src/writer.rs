// 📝 Extract Writer - brace-delimited text files + run manifest
//
// Layout of every extract:
//   header fields joined by '{' + "\n"
//   one line per row, fields joined by '{', each terminated by "\n"
// No quoting, no escaping.

use crate::error::{PipelineError, Result};
use crate::model::{ExtractTable, Period};
use crate::reconciliation::InconsistencyReport;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const OUTPUT_DELIMITER: char = '{';
pub const MANIFEST_FILE: &str = "manifest.json";
pub const INCONSISTENCIES_FILE: &str = "inconsistencias.json";

/// Render an extract as the platform's delimited text
pub fn render(extract: &ExtractTable) -> String {
    let delimiter = OUTPUT_DELIMITER.to_string();
    let mut out = extract.header.join(&delimiter);
    out.push('\n');
    for row in &extract.rows {
        out.push_str(&row.join(&delimiter));
        out.push('\n');
    }
    out
}

// ============================================================================
// ARCHIVE NAME
// ============================================================================

/// `{code}_{year}6{month:02}{day:02}.zip`
///
/// Day comes from the latest sale; when that date is outside the selected
/// month the last calendar day of the month is used.
pub fn archive_name(code: &str, period: &Period) -> String {
    let in_month =
        period.last_date.month() == period.month && period.last_date.year() == period.year;
    let day = if in_month {
        period.last_date.day()
    } else {
        last_day_of_month(period.year, period.month)
    };
    format!("{}_{}6{:02}{:02}.zip", code, period.year, period.month, day)
}

pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

// ============================================================================
// WRITER
// ============================================================================

/// One written extract, as listed in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrittenExtract {
    pub name: String,
    pub file: String,
    pub rows: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub company: String,
    pub month: u32,
    pub year: i32,
    pub as_of: NaiveDate,
    pub archive: String,
    pub generated_at: DateTime<Utc>,
    pub extracts: Vec<WrittenExtract>,
    pub inconsistencies: usize,
}

pub struct ExtractWriter {
    folder: PathBuf,
}

impl ExtractWriter {
    /// Output folder is created if absent
    pub fn create(folder: &Path) -> Result<Self> {
        std::fs::create_dir_all(folder)?;
        Ok(ExtractWriter {
            folder: folder.to_path_buf(),
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn write(&self, extract: &ExtractTable) -> Result<WrittenExtract> {
        let content = render(extract);
        let file = format!("{}.txt", extract.name);
        std::fs::write(self.folder.join(&file), content.as_bytes())?;

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());

        tracing::debug!(file = %file, rows = extract.len(), "extract written");
        Ok(WrittenExtract {
            name: extract.name.clone(),
            file,
            rows: extract.len(),
            sha256: format!("{:x}", hasher.finalize()),
        })
    }

    /// Only written when there is something to report; a report left by an
    /// earlier run is removed otherwise
    pub fn write_inconsistencies(&self, report: &InconsistencyReport) -> Result<Option<PathBuf>> {
        if report.is_clean() {
            self.remove_stale(INCONSISTENCIES_FILE)?;
            return Ok(None);
        }
        let path = self.folder.join(INCONSISTENCIES_FILE);
        write_json(&path, report)?;
        Ok(Some(path))
    }

    /// Drop the file of an optional extract this run does not produce
    pub fn discard(&self, extract_name: &str) -> Result<()> {
        self.remove_stale(&format!("{}.txt", extract_name))
    }

    fn remove_stale(&self, file: &str) -> Result<()> {
        let path = self.folder.join(file);
        if path.is_file() {
            std::fs::remove_file(&path)?;
            tracing::debug!(file = %file, "stale output removed");
        }
        Ok(())
    }

    pub fn write_manifest(&self, manifest: &RunManifest) -> Result<PathBuf> {
        let path = self.folder.join(MANIFEST_FILE);
        write_json(&path, manifest)?;
        Ok(path)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::read(path, e))?;
    std::fs::write(path, json)?;
    Ok(())
}

impl RunManifest {
    pub fn new(company: &str, period: &Period, as_of: NaiveDate, archive: String) -> Self {
        RunManifest {
            run_id: Uuid::new_v4(),
            company: company.to_string(),
            month: period.month,
            year: period.year,
            as_of,
            archive,
            generated_at: Utc::now(),
            extracts: Vec::new(),
            inconsistencies: 0,
        }
    }
}
