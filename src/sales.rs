// 🧾 Sales Transformer - filtered source rows → canonical SalesRecords
//
// Two views come out of one pass:
// - raw:   what the Sales extract prints (client hyphens masked only)
// - clean: fully normalized keys, used by every join and aggregate

use crate::config::{SalesColumns, TrailingColumn};
use crate::error::{PipelineError, Result};
use crate::model::{format_date, format_sales_amount, ExtractTable, SalesRecord};
use crate::normalize::{mask_hyphens, normalize_key};
use crate::table::Table;

pub const SALES_EXTRACT: &str = "ventas";

#[derive(Debug, Clone, Default)]
pub struct SalesTables {
    pub raw: Vec<SalesRecord>,
    pub clean: Vec<SalesRecord>,
}

/// Column indices resolved once per run
struct SalesLayout {
    client: usize,
    seller: usize,
    product: usize,
    date: usize,
    document: usize,
    quantity: usize,
    value: usize,
    kind: usize,
    cost: usize,
    unit: usize,
    order: usize,
    warehouse: Option<usize>,
}

impl SalesLayout {
    fn resolve(table: &Table, columns: &SalesColumns, trailing: TrailingColumn) -> Result<Self> {
        let warehouse = match trailing {
            TrailingColumn::Warehouse => Some(table.column(&columns.warehouse)?),
            TrailingColumn::OrderNumber => table.find_column(&columns.warehouse),
        };

        Ok(SalesLayout {
            client: table.column(&columns.client)?,
            seller: table.column(&columns.seller)?,
            product: table.column(&columns.product)?,
            date: table.column(&columns.date)?,
            document: table.column(&columns.document)?,
            quantity: table.column(&columns.quantity)?,
            value: table.column(&columns.value)?,
            kind: table.column(&columns.kind)?,
            cost: table.column(&columns.cost)?,
            unit: table.column(&columns.unit)?,
            order: table.column(&columns.order)?,
            warehouse,
        })
    }
}

// ============================================================================
// TRANSFORM
// ============================================================================

/// Rename/retype the period-filtered rows into both sales views
pub fn transform(
    filtered: &Table,
    columns: &SalesColumns,
    trailing: TrailingColumn,
) -> Result<SalesTables> {
    let layout = SalesLayout::resolve(filtered, columns, trailing)?;
    let mut tables = SalesTables::default();

    for (idx, row) in filtered.rows().iter().enumerate() {
        let date = row.get(layout.date).as_date().ok_or_else(|| {
            PipelineError::read(
                filtered.name(),
                format!("row {}: invalid date '{}'", idx + 2, row.text(layout.date)),
            )
        })?;

        let invalid = |field: &str, col: usize| {
            PipelineError::read(
                filtered.name(),
                format!("row {}: invalid {} '{}'", idx + 2, field, row.text(col)),
            )
        };
        let quantity = row
            .get(layout.quantity)
            .as_count()
            .ok_or_else(|| invalid(columns.quantity.as_str(), layout.quantity))?;
        let value = row
            .get(layout.value)
            .as_amount()
            .ok_or_else(|| invalid(columns.value.as_str(), layout.value))?;
        let cost = row
            .get(layout.cost)
            .as_amount()
            .ok_or_else(|| invalid(columns.cost.as_str(), layout.cost))?;

        let raw = SalesRecord {
            client: mask_hyphens(&row.get(layout.client).render()),
            seller: row.text(layout.seller),
            product: row.text(layout.product).to_uppercase(),
            date,
            document: row.text(layout.document),
            quantity,
            value,
            kind: row.text(layout.kind),
            cost,
            unit: row.text(layout.unit),
            order: row.text(layout.order),
            warehouse: layout.warehouse.map(|w| row.text(w)),
        };

        let clean = SalesRecord {
            client: normalize_key(&raw.client),
            product: normalize_key(&raw.product),
            ..raw.clone()
        };

        tables.raw.push(raw);
        tables.clean.push(clean);
    }

    apply_sign_correction(&mut tables.raw);
    apply_sign_correction(&mut tables.clean);

    tracing::info!(rows = tables.raw.len(), "sales transformed");
    Ok(tables)
}

/// Flip negative quantity/value/cost on return-flagged rows.
/// Other flags are untouched; positive values stay positive.
pub fn apply_sign_correction(records: &mut [SalesRecord]) {
    let mut corrected = 0usize;

    for record in records.iter_mut().filter(|r| r.is_return_flagged()) {
        let before = (record.quantity, record.value, record.cost);

        record.quantity = record.quantity.abs();
        record.value = record.value.abs();
        record.cost = record.cost.abs();

        if before != (record.quantity, record.value, record.cost) {
            corrected += 1;
        }
    }

    if corrected > 0 {
        tracing::debug!(corrected, "sign correction applied");
    }
}

// ============================================================================
// EXTRACT
// ============================================================================

pub fn sales_extract(raw: &[SalesRecord], trailing: TrailingColumn) -> ExtractTable {
    let mut extract = ExtractTable::new(
        SALES_EXTRACT,
        &[
            "Código Cliente",
            "Código Vendedor",
            "Código Producto (Sku)",
            "Fecha",
            "Numero Documento",
            "Cantidad",
            "Valor Total Item Vendido",
            "Tipo",
            "Costo",
            "Unidad de Medida",
        ],
    );
    extract.extend_header(&[match trailing {
        TrailingColumn::OrderNumber => "Numero Único de Pedido",
        TrailingColumn::Warehouse => "Codigo bodega",
    }]);

    for r in raw {
        let trailing_value = match trailing {
            TrailingColumn::OrderNumber => r.order.clone(),
            TrailingColumn::Warehouse => r.warehouse.clone().unwrap_or_default(),
        };

        extract.push(vec![
            r.client.clone(),
            r.seller.clone(),
            r.product.clone(),
            format_date(r.date),
            r.document.clone(),
            r.quantity.to_string(),
            format_sales_amount(r.value),
            r.kind.clone(),
            format_sales_amount(r.cost),
            r.unit.clone(),
            trailing_value,
        ]);
    }

    extract
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const HEADERS: [&str; 13] = [
        "Cod. cliente",
        "Cod. vendedor",
        "Cod. productto",
        "Fecha",
        "Fac. numero",
        "Cantidad",
        "Vta neta",
        "Tipo",
        "Costo",
        "Unidad",
        "Pedido",
        "Proveedor",
        "Codigo bodega",
    ];

    fn create_test_row(
        client: &str,
        product: &str,
        kind: &str,
        qty: f64,
        value: f64,
        cost: f64,
    ) -> Vec<Cell> {
        vec![
            Cell::text(client),
            Cell::Float(12.0),
            Cell::text(product),
            Cell::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
            Cell::Float(100.0),
            Cell::Float(qty),
            Cell::Float(value),
            Cell::Float(kind.parse().unwrap()),
            Cell::Float(cost),
            Cell::text("UND"),
            Cell::text("P-1"),
            Cell::text("ACME"),
            Cell::text("01"),
        ]
    }

    fn create_test_table(rows: Vec<Vec<Cell>>) -> Table {
        Table::from_rows("infoventas", &HEADERS, rows)
    }

    #[test]
    fn test_transform_builds_raw_and_clean_views() {
        let table =
            create_test_table(vec![create_test_row(" '-15' ", " ab-1 ", "0", 3.7, 10.5, 4.25)]);
        let tables =
            transform(&table, &SalesColumns::default(), TrailingColumn::OrderNumber).unwrap();

        let raw = &tables.raw[0];
        assert_eq!(raw.client, " '99915' ");
        assert_eq!(raw.seller, "12");
        assert_eq!(raw.product, "AB-1");
        assert_eq!(raw.document, "100");
        assert_eq!(raw.quantity, 3);
        assert_eq!(raw.kind, "0");
        assert_eq!(raw.value, dec!(10.5));

        let clean = &tables.clean[0];
        assert_eq!(clean.client, "99915");
        assert_eq!(clean.product, "AB9991");
        assert_eq!(clean.value, raw.value);
    }

    #[test]
    fn test_sign_correction_only_for_return_flag() {
        let table = create_test_table(vec![
            create_test_row("1", "P", "1", -5.0, -20.0, 8.0),
            create_test_row("2", "P", "2", -5.0, -20.0, -8.0),
        ]);
        let tables =
            transform(&table, &SalesColumns::default(), TrailingColumn::OrderNumber).unwrap();

        let flagged = &tables.clean[0];
        assert_eq!(flagged.quantity, 5);
        assert_eq!(flagged.value, dec!(20));
        assert_eq!(flagged.cost, dec!(8));

        let other = &tables.clean[1];
        assert_eq!(other.quantity, -5);
        assert_eq!(other.value, dec!(-20));
        assert_eq!(other.cost, dec!(-8));

        // raw view is corrected too
        assert_eq!(tables.raw[0].quantity, 5);
    }

    #[test]
    fn test_sign_correction_is_idempotent() {
        let table = create_test_table(vec![create_test_row("1", "P", "1", -5.0, 20.0, -8.0)]);
        let mut tables =
            transform(&table, &SalesColumns::default(), TrailingColumn::OrderNumber).unwrap();
        let once = tables.clean.clone();
        apply_sign_correction(&mut tables.clean);
        assert_eq!(tables.clean, once);
    }

    #[test]
    fn test_unparseable_amount_is_read_error() {
        let mut row = create_test_row("1", "P", "0", 1.0, 10.0, 1.0);
        row[5] = Cell::text("tres");
        let table = create_test_table(vec![row]);

        match transform(&table, &SalesColumns::default(), TrailingColumn::OrderNumber) {
            Err(PipelineError::Read { message, .. }) => {
                assert_eq!(message, "row 2: invalid Cantidad 'tres'")
            }
            other => panic!("expected Read error, got {:?}", other),
        }

        let mut row = create_test_row("1", "P", "0", 1.0, 10.0, 1.0);
        row[6] = Cell::text("N/A");
        let table = create_test_table(vec![row]);
        assert!(matches!(
            transform(&table, &SalesColumns::default(), TrailingColumn::OrderNumber),
            Err(PipelineError::Read { .. })
        ));
    }

    #[test]
    fn test_blank_amounts_read_as_zero() {
        let mut row = create_test_row("1", "P", "0", 1.0, 10.0, 1.0);
        row[5] = Cell::Empty;
        row[8] = Cell::text("  ");
        let table = create_test_table(vec![row]);

        let tables =
            transform(&table, &SalesColumns::default(), TrailingColumn::OrderNumber).unwrap();
        assert_eq!(tables.clean[0].quantity, 0);
        assert_eq!(tables.clean[0].cost, dec!(0));
        assert_eq!(tables.clean[0].value, dec!(10));
    }

    #[test]
    fn test_missing_required_field() {
        let table = Table::from_rows("infoventas", &["Cod. cliente", "Fecha"], vec![]);
        match transform(&table, &SalesColumns::default(), TrailingColumn::OrderNumber) {
            Err(PipelineError::MissingField { field, .. }) => assert_eq!(field, "Cod. vendedor"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_warehouse_required_for_warehouse_trailing() {
        let headers: Vec<&str> = HEADERS[..12].to_vec();
        let table = Table::from_rows("infoventas", &headers, vec![]);
        assert!(transform(&table, &SalesColumns::default(), TrailingColumn::OrderNumber).is_ok());
        assert!(matches!(
            transform(&table, &SalesColumns::default(), TrailingColumn::Warehouse),
            Err(PipelineError::MissingField { .. })
        ));
    }

    #[test]
    fn test_sales_extract_formats_amounts() {
        let table = create_test_table(vec![create_test_row("-7", "x", "0", 2.0, 1234.5, 0.333)]);
        let tables =
            transform(&table, &SalesColumns::default(), TrailingColumn::Warehouse).unwrap();
        let extract = sales_extract(&tables.raw, TrailingColumn::Warehouse);

        assert_eq!(extract.header.last().map(String::as_str), Some("Codigo bodega"));
        assert_eq!(
            extract.rows[0],
            vec!["9997", "12", "X", "2024/05/01", "100", "2", "1234,50", "0", "0,33", "UND", "01"]
        );
    }
}
