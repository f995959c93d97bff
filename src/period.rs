// 📅 Period Selector - reporting month = month of the latest transaction
//
// Rows are kept only for that (month, year) and, when supplier fragments are
// configured, only for suppliers matching any fragment.

use crate::error::{PipelineError, Result};
use crate::model::Period;
use crate::table::Table;
use chrono::Datelike;

// ============================================================================
// SUPPLIER FILTER
// ============================================================================

/// Case-insensitive OR of literal substrings
#[derive(Debug, Clone, Default)]
pub struct SupplierFilter {
    fragments: Vec<String>,
}

impl SupplierFilter {
    pub fn new(fragments: &[String]) -> Self {
        SupplierFilter {
            fragments: fragments
                .iter()
                .map(|f| f.trim().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// An empty filter matches everything
    pub fn matches(&self, supplier: &str) -> bool {
        if self.fragments.is_empty() {
            return true;
        }
        let supplier = supplier.to_lowercase();
        self.fragments.iter().any(|f| supplier.contains(f.as_str()))
    }

    /// Keep rows whose `field` matches; missing column is an error only
    /// when there is something to filter on
    pub fn apply(&self, table: &Table, field: &str) -> Result<Table> {
        if self.is_empty() {
            return Ok(table.clone());
        }
        let idx = table.column(field)?;
        Ok(table.filter(|row| self.matches(&row.text(idx))))
    }
}

// ============================================================================
// PERIOD SELECTION
// ============================================================================

/// Determine the reporting period and filter the sales rows to it
pub fn select_period(
    sales: &Table,
    date_field: &str,
    supplier_field: &str,
    suppliers: &SupplierFilter,
) -> Result<(Period, Table)> {
    if sales.is_empty() {
        return Err(PipelineError::EmptyDataset(format!(
            "'{}' has no rows",
            sales.name()
        )));
    }

    let date_idx = sales.find_column(date_field).ok_or_else(|| {
        PipelineError::EmptyDataset(format!(
            "'{}' has no '{}' column",
            sales.name(),
            date_field
        ))
    })?;

    let last_date = sales
        .rows()
        .iter()
        .filter_map(|row| row.get(date_idx).as_date())
        .max()
        .ok_or_else(|| {
            PipelineError::EmptyDataset(format!(
                "'{}' has no parseable dates in '{}'",
                sales.name(),
                date_field
            ))
        })?;

    let period = Period {
        month: last_date.month(),
        year: last_date.year(),
        last_date,
    };

    let in_period = sales.filter(|row| {
        row.get(date_idx)
            .as_date()
            .map(|d| d.month() == period.month && d.year() == period.year)
            .unwrap_or(false)
    });

    tracing::info!(
        month = period.month,
        year = period.year,
        last_date = %last_date,
        rows = in_period.len(),
        "reporting period selected"
    );

    if suppliers.is_empty() {
        tracing::warn!("no supplier fragments configured, keeping every supplier");
    }

    let filtered = suppliers.apply(&in_period, supplier_field)?;
    tracing::info!(
        fragments = suppliers.len(),
        rows = filtered.len(),
        "sales filtered by supplier"
    );

    Ok((period, filtered))
}

// ============================================================================
// TESTS
// ============================================================================
