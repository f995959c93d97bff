// 📦 Inventory - stock snapshot of the company's suppliers, summed per SKU

use crate::aggregation::aggregate_inventory;
use crate::config::CompanyProfile;
use crate::error::{PipelineError, Result};
use crate::model::{format_date, ExtractTable, InventoryKey, InventoryRecord, Sku};
use crate::normalize::{key_set, normalize_key, strip_decimal_suffix};
use crate::period::SupplierFilter;
use crate::table::Table;
use chrono::NaiveDate;

pub const INVENTORY_EXTRACT: &str = "Inventario";

pub const INVENTORY_SUPPLIER_COLUMN: &str = "Proveedor";
pub const INVENTORY_PRODUCT_COLUMN: &str = "Codigo articulo";
pub const INVENTORY_QUANTITY_COLUMN: &str = "Unidades";

const UNIT: &str = "UND";

/// Snapshot rows of the configured suppliers whose product is in the SKU
/// master, dated `as_of` and aggregated
pub fn build_inventory(
    snapshot: &Table,
    suppliers: &SupplierFilter,
    skus: &[Sku],
    as_of: NaiveDate,
    profile: &CompanyProfile,
) -> Result<Vec<InventoryRecord>> {
    if suppliers.is_empty() {
        return Err(PipelineError::Configuration(format!(
            "company {} has no supplier fragments, inventory cannot be filtered",
            profile.code
        )));
    }

    let rows = suppliers.apply(snapshot, INVENTORY_SUPPLIER_COLUMN)?;
    let product = rows.column(INVENTORY_PRODUCT_COLUMN)?;
    let quantity = rows.column(INVENTORY_QUANTITY_COLUMN)?;

    let master = key_set(skus.iter().map(|s| s.code.as_str()));
    let location = profile.branch_fields.then(|| {
        (
            profile.branch.warehouse.clone(),
            profile.branch.code.clone(),
            profile.branch.name.clone(),
        )
    });

    let mut dropped = 0usize;
    let mut records = Vec::with_capacity(rows.len());
    for (idx, row) in rows.rows().iter().enumerate() {
        let code = strip_decimal_suffix(&row.get(product).render());
        if !master.contains(&normalize_key(&code)) {
            dropped += 1;
            continue;
        }
        let units = row.get(quantity).as_amount().ok_or_else(|| {
            PipelineError::read(
                rows.name(),
                format!(
                    "row {}: invalid {} '{}'",
                    idx + 2,
                    INVENTORY_QUANTITY_COLUMN,
                    row.text(quantity)
                ),
            )
        })?;
        records.push(InventoryRecord {
            key: InventoryKey {
                date: as_of,
                product: code,
                unit: UNIT.to_string(),
                location: location.clone(),
            },
            quantity: units,
        });
    }

    let summary = aggregate_inventory(records);
    tracing::info!(
        rows = summary.len(),
        dropped_outside_master = dropped,
        as_of = %as_of,
        "inventory aggregated"
    );
    Ok(summary)
}

pub fn inventory_extract(inventory: &[InventoryRecord], profile: &CompanyProfile) -> ExtractTable {
    let mut extract = ExtractTable::new(
        INVENTORY_EXTRACT,
        &["Fecha", "Código Producto", "Cantidad", "Unidad de Medida"],
    );
    if profile.branch_fields {
        extract.extend_header(&["Código de bodega", "Código Sede", "Nombre Sede"]);
    }

    for record in inventory {
        let key = &record.key;
        let mut fields = vec![
            format_date(key.date),
            key.product.clone(),
            record.quantity.to_string(),
            key.unit.clone(),
        ];
        if let Some((warehouse, code, name)) = &key.location {
            fields.extend([warehouse.clone(), code.clone(), name.clone()]);
        }
        extract.push(fields);
    }

    extract
}
