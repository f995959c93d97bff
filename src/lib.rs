// Planos TSOL - Core Library
// Monthly sales extract → reconciled, normalized TSOL flat files.
// Exposes all modules for use in the CLI and tests

pub mod error;
pub mod normalize;      // Key Normalizer
pub mod table;          // Table boundary (Cell/Row/Table)
pub mod parser;         // Workbook + brace-delimited roster readers
pub mod config;         // AppConfig + per-company profiles
pub mod model;          // Typed records per output entity
pub mod period;         // Period Selector + supplier filter
pub mod sales;          // Sales Transformer
pub mod rules;          // Business-Type Classifier
pub mod entities;       // Reference Joiners
pub mod aggregation;    // Invoices, control totals, inventory
pub mod reconciliation; // Inconsistency Validator
pub mod writer;         // Extract files + manifest
pub mod pipeline;       // Stage orchestration

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use error::{PipelineError, Result};
pub use normalize::{normalize_key, KeySet, HYPHEN_SENTINEL};
pub use table::{Cell, Row, Table};
pub use parser::{
    detect_format, BraceDelimitedReader, SourceFormat, TableReader, WorkbookReader,
};
pub use config::{AppConfig, BusinessTypePolicy, CompanyProfile};
pub use model::{
    Client, ControlTotal, ExtractTable, InventoryRecord, InvoiceSummary, Period, SalesRecord,
    Seller, Sku, Supervisor,
};
pub use period::{select_period, SupplierFilter};
pub use sales::{transform, SalesTables};
pub use rules::{BusinessTypeClassifier, ClassificationPolicy, Tier};
pub use aggregation::{aggregate_control_totals, aggregate_invoices, aggregate_inventory};
pub use reconciliation::{Discrepancy, InconsistencyReport, InconsistencyValidator};
pub use writer::{archive_name, render, ExtractWriter, RunManifest};
pub use pipeline::{
    load_inputs, process, run_company, write_outputs, RunInputs, RunOutcome, RunSummary,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
