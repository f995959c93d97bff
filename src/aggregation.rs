// ➕ Aggregators - invoices, control totals, inventory
//
// Money is summed at full precision and rounded once, half-up, to 2 places.

use crate::model::{
    format_date, ControlTotal, ExtractTable, InventoryKey, InventoryRecord, InvoiceSummary,
    SalesRecord,
};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

pub const INVOICES_EXTRACT: &str = "Listado de Facturas";
pub const CONTROL_TOTALS_EXTRACT: &str = "Totales de Control";
pub const CONTROL_TOTAL_DESCRIPTOR: &str = "TotalValorVenta";

/// Half-up to 2 decimal places
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ============================================================================
// INVOICES
// ============================================================================

/// Group by (client, seller, date, document) and sum sale values.
///
/// Groups come out ordered by key.
pub fn aggregate_invoices(clean: &[SalesRecord]) -> Vec<InvoiceSummary> {
    let mut groups: BTreeMap<(String, String, NaiveDate, String), Decimal> = BTreeMap::new();

    for r in clean {
        *groups
            .entry((r.client.clone(), r.seller.clone(), r.date, r.document.clone()))
            .or_insert(Decimal::ZERO) += r.value;
    }

    groups
        .into_iter()
        .map(|((client, seller, date, document), sum)| {
            let total = round_money(sum);
            InvoiceSummary {
                client,
                seller,
                date,
                document,
                total_value: total,
                supplier_billed_value: total,
            }
        })
        .collect()
}

pub fn invoices_extract(invoices: &[InvoiceSummary]) -> ExtractTable {
    let mut extract = ExtractTable::new(
        INVOICES_EXTRACT,
        &[
            "Código Cliente",
            "Código Vendedor",
            "Fecha",
            "Numero Documento",
            "Valor_Total_Factura",
            "Valor_Facturado_Casa_Comercial",
        ],
    );

    for inv in invoices {
        extract.push(vec![
            inv.client.clone(),
            inv.seller.clone(),
            format_date(inv.date),
            inv.document.clone(),
            inv.total_value.to_string(),
            inv.supplier_billed_value.to_string(),
        ]);
    }

    extract
}

// ============================================================================
// CONTROL TOTALS
// ============================================================================

pub fn aggregate_control_totals(clean: &[SalesRecord]) -> ControlTotal {
    let sum: Decimal = clean.iter().map(|r| r.value).sum();
    ControlTotal {
        descriptor: CONTROL_TOTAL_DESCRIPTOR.to_string(),
        value: round_money(sum),
    }
}

pub fn control_totals_extract(total: &ControlTotal) -> ExtractTable {
    let mut extract = ExtractTable::new(CONTROL_TOTALS_EXTRACT, &["Descriptor Total", "Valor"]);
    extract.push(vec![total.descriptor.clone(), total.value.to_string()]);
    extract
}

// ============================================================================
// INVENTORY
// ============================================================================

/// Sum quantities per (date, product, unit[, location]).
/// Output keys are unique and ordered.
pub fn aggregate_inventory(rows: Vec<InventoryRecord>) -> Vec<InventoryRecord> {
    let mut groups: BTreeMap<InventoryKey, Decimal> = BTreeMap::new();

    for row in rows {
        *groups.entry(row.key).or_insert(Decimal::ZERO) += row.quantity;
    }

    groups
        .into_iter()
        .map(|(key, quantity)| InventoryRecord {
            key,
            quantity: quantity.normalize(),
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
