// End-to-end batch run over in-memory sales and on-disk rosters

use chrono::NaiveDate;
use planos_tsol::config::CatalogSkuColumns;
use planos_tsol::entities::business_types::static_catalogue;
use planos_tsol::entities::geography::MUNICIPALITY_ROSTER_COLUMNS;
use planos_tsol::entities::products::catalog_skus;
use planos_tsol::entities::sellers::{SELLER_ROSTER_COLUMNS, SUPERVISOR_ROSTER_COLUMNS};
use planos_tsol::entities::CLIENT_ROSTER_COLUMNS;
use planos_tsol::{
    process, write_outputs, AppConfig, BraceDelimitedReader, Cell, ClassificationPolicy,
    RunInputs, SupplierFilter, Table, TableReader,
};
use rust_decimal_macros::dec;
use std::path::Path;

const CONFIG: &str = r#"{
    "output_folder": "salida",
    "files": {
        "sales": "ventas.xlsx",
        "inventory": "inventario.xlsx",
        "routes": "rutero.xlsx"
    },
    "companies": {
        "distrijass": {
            "code": "2001",
            "output_subfolder": "distrijass",
            "rosters": {
                "sellers": "interasesor.txt",
                "supervisors": "intersupervisor.txt",
                "clients": "intercliente.txt",
                "municipalities": "interciudad.txt"
            },
            "suppliers": ["Acme"],
            "skus": { "source": "catalog" }
        }
    }
}"#;

fn create_test_roster(
    dir: &Path,
    file: &str,
    name: &str,
    columns: &[&str],
    content: &str,
) -> Table {
    let path = dir.join(file);
    std::fs::write(&path, content).unwrap();
    BraceDelimitedReader::new(name, columns)
        .with_line_quote_stripping(name == "intercliente")
        .read(&path)
        .unwrap()
}

fn create_test_sales() -> Table {
    let headers = [
        "Cod. cliente", "Cod. vendedor", "Cod. productto", "Fecha", "Fac. numero", "Cantidad",
        "Vta neta", "Tipo", "Costo", "Unidad", "Pedido", "Proveedor",
    ];
    let row = |client: &str, date: NaiveDate, doc: i64, value: f64, kind: &str| {
        vec![
            Cell::text(client),
            Cell::Float(12.0),
            Cell::text(" sku-1 "),
            Cell::Date(date),
            Cell::Int(doc),
            Cell::Float(if kind == "1" { -2.0 } else { 2.0 }),
            Cell::Float(value),
            Cell::text(kind),
            Cell::Float(1.0),
            Cell::text("UND"),
            Cell::text(format!("PED-{}", doc)),
            Cell::text("ACME SAS"),
        ]
    };

    Table::from_rows(
        "infoventas",
        &headers,
        vec![
            row("100", NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(), 500, 10.5, "0"),
            row("-7", NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(), 501, -4.25, "1"),
            row("100", NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(), 499, 99.0, "0"),
        ],
    )
}

#[test]
fn test_monthly_batch_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::from_json(CONFIG).unwrap();
    let profile = config.company("distrijass").unwrap();
    let suppliers = SupplierFilter::new(&config.supplier_fragments(profile).unwrap());

    let catalog = Table::from_rows(
        "PRODUCTO",
        &["Codigo SAP", "Nombre", "Codigo de barras", "Proveedor"],
        vec![
            vec![Cell::text("SKU"), Cell::text("JABON"), Cell::text("770"), Cell::text("ACME SAS")],
            vec![
                Cell::text("1001"),
                Cell::text("CREMA"),
                Cell::text("771"),
                Cell::text("ACME SAS"),
            ],
        ],
    );

    let inputs = RunInputs {
        sales: create_test_sales(),
        sellers: create_test_roster(
            dir.path(),
            "interasesor.txt",
            "interasesor",
            &SELLER_ROSTER_COLUMNS,
            "12{1010{ANA{RUIZ{555{CALLE 1{VENDEDOR{P1{Activado{500{01\n",
        ),
        supervisors: create_test_roster(
            dir.path(),
            "intersupervisor.txt",
            "intersupervisor",
            &SUPERVISOR_ROSTER_COLUMNS,
            "500{1{MARTA{G{5{D{SUP{P{Activado{01\n",
        ),
        clients: create_test_roster(
            dir.path(),
            "intercliente.txt",
            "intercliente",
            &CLIENT_ROSTER_COLUMNS,
            "\"100{TIENDA UNO{2020-01-01{900{CRA 1{555{ANA{76001{N{DROGUERIA{3{CENTRO\"\n",
        ),
        municipalities: create_test_roster(
            dir.path(),
            "interciudad.txt",
            "interciudad",
            &MUNICIPALITY_ROSTER_COLUMNS,
            "76001{CALI\n76109{BUENAVENTURA\n",
        ),
        routes: Table::from_rows(
            "rutero",
            &["Codigo", "Cod. Asesor"],
            vec![vec![Cell::Float(100.0), Cell::Float(12.0)]],
        ),
        inventory: Table::from_rows(
            "Informe",
            &["Proveedor", "Codigo articulo", "Unidades"],
            vec![
                vec![Cell::text("ACME SAS"), Cell::text("1001.0"), Cell::Float(6.0)],
                vec![Cell::text("ACME SAS"), Cell::text("1001"), Cell::Float(4.0)],
            ],
        ),
        skus: catalog_skus(&catalog, &CatalogSkuColumns::default(), &suppliers).unwrap(),
        business_types: static_catalogue(),
        policy: ClassificationPolicy::CopyField,
    };

    let as_of = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    let outcome = process(inputs, profile, &suppliers, as_of).unwrap();

    // only the two May rows survive
    assert_eq!(outcome.period.month, 5);
    assert_eq!(outcome.period.year, 2024);
    assert_eq!(outcome.sales.raw.len(), 2);
    assert_eq!(outcome.control_total.value, dec!(14.75));

    // return row sign-corrected
    let returned = &outcome.sales.clean[1];
    assert_eq!(returned.client, "9997");
    assert_eq!(returned.quantity, 2);
    assert_eq!(returned.value, dec!(4.25));

    assert_eq!(outcome.sellers.len(), 1);
    assert_eq!(outcome.supervisors.len(), 1);
    assert_eq!(outcome.clients.len(), 1);
    assert_eq!(outcome.clients[0].business_type, "DROGUERIA");
    assert_eq!(outcome.municipalities.len(), 1);
    assert_eq!(outcome.routes.len(), 1);
    assert_eq!(outcome.inventory.len(), 1);
    assert_eq!(outcome.inventory[0].quantity, dec!(10));

    // client -7 has sales but no roster row
    assert!(!outcome.report.is_clean());
    assert_eq!(outcome.report.discrepancies.len(), 1);
    assert_eq!(outcome.report.missing_for("Clientes").unwrap(), &["9997".to_string()]);

    let summary = write_outputs(&outcome, profile, dir.path().join("salida")).unwrap();
    assert_eq!(summary.archive, "2001_202460520.zip");
    assert_eq!(summary.extracts.len(), 12);
    assert!(summary.inconsistencies.is_some());

    let ventas = std::fs::read_to_string(summary.folder.join("ventas.txt")).unwrap();
    let lines: Vec<&str> = ventas.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Código Cliente{Código Vendedor{Código Producto (Sku)"));
    assert_eq!(lines[1], "100{12{SKU-1{2024/05/02{500{2{10,50{0{1,00{UND{PED-500");
    assert_eq!(lines[2], "9997{12{SKU-1{2024/05/20{501{2{4,25{1{1,00{UND{PED-501");

    let totals = std::fs::read_to_string(summary.folder.join("Totales de Control.txt")).unwrap();
    assert_eq!(totals, "Descriptor Total{Valor\nTotalValorVenta{14.75\n");
}

#[test]
fn test_missing_roster_is_reference_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::from_json(CONFIG).unwrap();
    config.files.sales = dir.path().join("no-existe.xlsx");
    config.output_folder = dir.path().join("salida");

    let as_of = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    let result = planos_tsol::run_company(&config, "distrijass", as_of);

    assert!(matches!(result, Err(planos_tsol::PipelineError::ReferenceNotFound { .. })));
    // fail fast: nothing written
    assert!(!dir.path().join("salida").exists());
}
