// 📦 SKU Master - product catalogue filtered to the company's suppliers

use crate::config::{AppConfig, CatalogSkuColumns, CompanyProfile, PrefixSkuSource, SkuSource};
use crate::error::Result;
use crate::model::{ExtractTable, Sku};
use crate::normalize::strip_decimal_suffix;
use crate::parser::read_sheet;
use crate::period::SupplierFilter;
use crate::table::Table;
use rust_decimal::Decimal;

pub const SKU_EXTRACT: &str = "SKU (Productos)";

/// Private-label supplier whose real supplier sits in the second column
pub const PRIVATE_LABEL_SUPPLIER: &str = "TM - LO NUESTRO";

const REFERENCE_TYPE: &str = "RG";
const UNIT_TYPE: &str = "UND";
const DEFAULT_CATEGORY_CODE: &str = "001";
const DEFAULT_CATEGORY_NAME: &str = "GENERAL";

// ============================================================================
// LOADING
// ============================================================================

pub fn load_skus(
    config: &AppConfig,
    profile: &CompanyProfile,
    suppliers: &SupplierFilter,
) -> Result<Vec<Sku>> {
    let skus = match &profile.skus {
        SkuSource::Catalog(cols) => {
            let table = read_sheet("sku_catalog", config.catalog()?, &cols.sheet)?;
            catalog_skus(&table, cols, suppliers)?
        }
        SkuSource::Prefix(src) => {
            let table = read_sheet("sku_products", &src.workbook, &src.sheet)?;
            prefix_skus(&table, src)?
        }
    };

    tracing::info!(count = skus.len(), "sku master loaded");
    Ok(skus)
}

/// Catalog rows of the configured suppliers, with platform defaults filled in
pub fn catalog_skus(
    table: &Table,
    cols: &CatalogSkuColumns,
    suppliers: &SupplierFilter,
) -> Result<Vec<Sku>> {
    let rows = suppliers.apply(table, &cols.supplier)?;

    let code = rows.column(&cols.code)?;
    let name = rows.column(&cols.name)?;
    let barcode = rows.column(&cols.barcode)?;
    let supplier = rows.column(&cols.supplier)?;
    let second_supplier = rows.find_column(&cols.second_supplier);
    let category = rows.find_column(&cols.category);
    let product_type = rows.find_column(&cols.product_type);
    let content = rows.find_column(&cols.content);

    let skus = rows
        .rows()
        .iter()
        .map(|row| {
            let (category_code, category_name) = match category {
                Some(idx) => (row.text(idx), row.text(idx)),
                None => (DEFAULT_CATEGORY_CODE.to_string(), DEFAULT_CATEGORY_NAME.to_string()),
            };
            let (subcategory_code, subcategory_name) = match product_type {
                Some(idx) => (row.text(idx), row.text(idx)),
                None => (DEFAULT_CATEGORY_CODE.to_string(), DEFAULT_CATEGORY_NAME.to_string()),
            };

            let primary = row.text(supplier);
            let supplier = match second_supplier {
                Some(idx) if primary == PRIVATE_LABEL_SUPPLIER => row.text(idx),
                _ => primary,
            };

            Sku {
                code: strip_decimal_suffix(&row.get(code).render()),
                name: row.text(name),
                reference_type: REFERENCE_TYPE.to_string(),
                unit_type: UNIT_TYPE.to_string(),
                barcode: row.text(barcode),
                category_code,
                category_name,
                subcategory_code,
                subcategory_name,
                conversion_factor: content
                    .and_then(|idx| row.get(idx).as_decimal())
                    .map(|d| d.normalize())
                    .unwrap_or(Decimal::ONE),
                weight_factor: Decimal::ONE,
                supplier,
            }
        })
        .collect();

    Ok(skus)
}

/// Supplier product list: short codes with the company prefix
pub fn prefix_skus(table: &Table, src: &PrefixSkuSource) -> Result<Vec<Sku>> {
    let code = table.column(&src.code_column)?;
    let name = table.column(&src.name_column)?;
    let barcode = table.column(&src.barcode_column)?;

    let skus = table
        .rows()
        .iter()
        .filter_map(|row| {
            let sku_code = strip_decimal_suffix(&row.get(code).render());
            let keep =
                sku_code.chars().count() <= src.max_code_len && sku_code.starts_with(&src.prefix);
            keep.then(|| Sku {
                code: sku_code,
                name: row.text(name),
                reference_type: REFERENCE_TYPE.to_string(),
                unit_type: UNIT_TYPE.to_string(),
                barcode: row.text(barcode),
                category_code: DEFAULT_CATEGORY_CODE.to_string(),
                category_name: DEFAULT_CATEGORY_NAME.to_string(),
                subcategory_code: DEFAULT_CATEGORY_CODE.to_string(),
                subcategory_name: DEFAULT_CATEGORY_NAME.to_string(),
                conversion_factor: Decimal::ONE,
                weight_factor: Decimal::ONE,
                supplier: String::new(),
            })
        })
        .collect();

    Ok(skus)
}

// ============================================================================
// EXTRACT
// ============================================================================

pub fn skus_extract(skus: &[Sku], profile: &CompanyProfile) -> ExtractTable {
    match profile.skus {
        SkuSource::Catalog(_) => {
            let mut extract = ExtractTable::new(
                SKU_EXTRACT,
                &[
                    "Código",
                    "Nombre",
                    "Tipo Referencia",
                    "Tipo De Unidad",
                    "Código De Barras",
                    "Código Categoría",
                    "Nombre Categoría",
                    "Código SubCategoría",
                    "Nombre SubCategoría",
                    "Factor Conversion Unidad",
                    "Factor Peso",
                    "Código Sede",
                    "Nombre Sede",
                    "Proveedor",
                ],
            );
            for s in skus {
                extract.push(vec![
                    s.code.clone(),
                    s.name.clone(),
                    s.reference_type.clone(),
                    s.unit_type.clone(),
                    s.barcode.clone(),
                    s.category_code.clone(),
                    s.category_name.clone(),
                    s.subcategory_code.clone(),
                    s.subcategory_name.clone(),
                    s.conversion_factor.to_string(),
                    s.weight_factor.to_string(),
                    profile.branch.code.clone(),
                    profile.branch.name.clone(),
                    s.supplier.clone(),
                ]);
            }
            extract
        }
        SkuSource::Prefix(_) => {
            let mut extract = ExtractTable::new(
                SKU_EXTRACT,
                &[
                    "Código",
                    "Nombre",
                    "Tipo Referencia",
                    "Tipo De Unidad",
                    "Código De Barras",
                    "Compañía",
                ],
            );
            for s in skus {
                extract.push(vec![
                    s.code.clone(),
                    s.name.clone(),
                    s.reference_type.clone(),
                    s.unit_type.clone(),
                    s.barcode.clone(),
                    s.barcode.clone(),
                ]);
            }
            extract
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use crate::testing::create_test_profile;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn create_test_catalog() -> Table {
        Table::from_rows(
            "PRODUCTO",
            &["Codigo SAP", "Nombre", "Codigo de barras", "Proveedor", "PROVEE 2", "Contenido"],
            vec![
                vec![
                    Cell::Float(1001.0),
                    Cell::text("JABON"),
                    Cell::Float(7702010.0),
                    Cell::text("ACME SAS"),
                    Cell::Empty,
                    Cell::Float(12.0),
                ],
                vec![
                    Cell::text("1002.0"),
                    Cell::text("CREMA"),
                    Cell::text(" 7702011 "),
                    Cell::text("TM - LO NUESTRO"),
                    Cell::text("ACME FOODS"),
                    Cell::text("n/a"),
                ],
                vec![
                    Cell::text("2001"),
                    Cell::text("OTRO"),
                    Cell::text("1"),
                    Cell::text("OTRO PROVEEDOR"),
                    Cell::Empty,
                    Cell::Empty,
                ],
            ],
        )
    }

    #[test]
    fn test_catalog_skus_filtered_and_defaulted() {
        let filter = SupplierFilter::new(&["acme".to_string(), "lo nuestro".to_string()]);
        let skus =
            catalog_skus(&create_test_catalog(), &CatalogSkuColumns::default(), &filter).unwrap();

        assert_eq!(skus.len(), 2);
        assert_eq!(skus[0].code, "1001");
        assert_eq!(skus[0].barcode, "7702010");
        assert_eq!(skus[0].conversion_factor, dec!(12));
        assert_eq!(skus[0].category_code, "001");
        assert_eq!(skus[0].subcategory_name, "GENERAL");
        assert_eq!(skus[0].supplier, "ACME SAS");

        assert_eq!(skus[1].code, "1002");
        // private label resolved through PROVEE 2
        assert_eq!(skus[1].supplier, "ACME FOODS");
        assert_eq!(skus[1].conversion_factor, Decimal::ONE);
    }

    #[test]
    fn test_prefix_skus() {
        let table = Table::from_rows(
            "Productos EQ",
            &["Pro_Cod", "Producto", "ALTERNO"],
            vec![
                vec![Cell::Float(23001.0), Cell::text("CREMA DENTAL"), Cell::text("770")],
                vec![Cell::text("230011"), Cell::text("LARGO"), Cell::text("771")],
                vec![Cell::text("24001"), Cell::text("OTRO PREFIJO"), Cell::text("772")],
                vec![Cell::text("2301.0"), Cell::text("CORTO"), Cell::text("773")],
            ],
        );
        let src = PrefixSkuSource {
            workbook: PathBuf::from("colgate.xlsx"),
            sheet: "Productos EQ".to_string(),
            code_column: "Pro_Cod".to_string(),
            name_column: "Producto".to_string(),
            barcode_column: "ALTERNO".to_string(),
            prefix: "23".to_string(),
            max_code_len: 5,
        };

        let skus = prefix_skus(&table, &src).unwrap();
        let codes: Vec<&str> = skus.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["23001", "2301"]);

        let mut profile = create_test_profile();
        profile.skus = SkuSource::Prefix(src);
        let extract = skus_extract(&skus, &profile);
        assert_eq!(extract.header.last().map(String::as_str), Some("Compañía"));
        assert_eq!(extract.rows[0], vec!["23001", "CREMA DENTAL", "RG", "UND", "770", "770"]);
    }

    #[test]
    fn test_catalog_extract_carries_branch() {
        let skus = catalog_skus(
            &create_test_catalog(),
            &CatalogSkuColumns::default(),
            &SupplierFilter::default(),
        )
        .unwrap();
        let extract = skus_extract(&skus, &create_test_profile());

        assert_eq!(extract.len(), 3);
        assert_eq!(extract.header.len(), 14);
        assert_eq!(extract.rows[0][9], "12");
        assert_eq!(extract.rows[0][11], "01");
        assert_eq!(extract.rows[0][12], "PALMIRA/CALI");
    }
}
