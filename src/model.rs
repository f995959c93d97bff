// 📦 Record Types - one typed record per output entity
//
// Stages convert `Table` rows into these records at the boundary and only
// pass records forward. ExtractTable is the rendered form handed to the writer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// SALES
// ============================================================================

/// Transaction-type flag whose negative measures get sign-corrected
pub const RETURN_FLAG: &str = "1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub client: String,
    pub seller: String,
    pub product: String,
    pub date: NaiveDate,
    pub document: String,
    pub quantity: i64,
    pub value: Decimal,
    /// Transaction type flag ("1" = devolución)
    pub kind: String,
    pub cost: Decimal,
    pub unit: String,
    pub order: String,
    pub warehouse: Option<String>,
}

impl SalesRecord {
    pub fn is_return_flagged(&self) -> bool {
        self.kind == RETURN_FLAG
    }
}

/// Selected reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub month: u32,
    pub year: i32,
    /// Maximum transaction date in the source
    pub last_date: NaiveDate,
}

// ============================================================================
// AGGREGATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub client: String,
    pub seller: String,
    pub date: NaiveDate,
    pub document: String,
    pub total_value: Decimal,
    /// Same sum as total_value; the platform expects both columns
    pub supplier_billed_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlTotal {
    pub descriptor: String,
    pub value: Decimal,
}

// ============================================================================
// REFERENCE ENTITIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub code: String,
    pub name: String,
    pub address: String,
    pub document: String,
    pub supervisor: String,
    pub branch_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supervisor {
    pub code: String,
    pub name: String,
    pub branch_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessType {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    pub code: String,
    pub name: String,
    pub reference_type: String,
    pub unit_type: String,
    pub barcode: String,
    pub category_code: String,
    pub category_name: String,
    pub subcategory_code: String,
    pub subcategory_name: String,
    pub conversion_factor: Decimal,
    pub weight_factor: Decimal,
    pub supplier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub code: String,
    pub name: String,
    pub joined: String,
    pub nit: String,
    pub address: String,
    pub phone: String,
    pub legal_representative: String,
    pub municipality: String,
    pub business_type: String,
    pub stratum: String,
    pub neighborhood: String,
}

/// Grouping key of the inventory summary
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InventoryKey {
    pub date: NaiveDate,
    pub product: String,
    pub unit: String,
    /// (warehouse, branch code, branch name) when branch fields are enabled
    pub location: Option<(String, String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub key: InventoryKey,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Neighborhood {
    pub municipality: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub seller: String,
    pub client: String,
    pub month: u32,
    pub weekday: u8,
    pub frequency: u8,
}

// ============================================================================
// RENDERED EXTRACT
// ============================================================================

/// Header + stringified rows of one output file
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExtractTable {
    pub fn new(name: &str, header: &[&str]) -> Self {
        ExtractTable {
            name: name.to_string(),
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append optional trailing columns to the header
    pub fn extend_header(&mut self, extra: &[&str]) {
        self.header.extend(extra.iter().map(|h| h.to_string()));
    }

    pub fn push(&mut self, fields: Vec<String>) {
        self.rows.push(fields);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Date format used by every extract
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

/// Monetary field of the Sales extract: 2 decimals, comma separator
pub fn format_sales_amount(value: Decimal) -> String {
    format!("{:.2}", crate::aggregation::round_money(value)).replace('.', ",")
}
