// 🔄 Pipeline - one batch run for one company
//
//   load_inputs  → every external table for the profile (all file I/O)
//   process      → period → sales → sellers → supervisors → clients
//                  → inventory → geography/routes → aggregates → validation
//   write_outputs → extracts, inconsistencies, manifest (last)
//
// Each stage reads only what earlier stages produced; the RunOutcome carries
// every result table. Any error aborts the run before anything is written.

use crate::aggregation::{
    aggregate_control_totals, aggregate_invoices, control_totals_extract, invoices_extract,
};
use crate::config::{AppConfig, CompanyProfile};
use crate::entities::geography::{MUNICIPALITY_ROSTER_COLUMNS, NEIGHBORHOODS_EXTRACT};
use crate::entities::sellers::{SELLER_ROSTER_COLUMNS, SUPERVISOR_ROSTER_COLUMNS};
use crate::entities::{
    build_inventory, build_policy, business_types_extract, clients_extract, inventory_extract,
    join_clients, join_municipalities, join_routes, join_sellers, join_supervisors, load_catalogue,
    load_skus, municipalities_extract, neighborhoods, neighborhoods_extract, routes_extract,
    sellers_extract, skus_extract, supervisors_extract, CLIENT_ROSTER_COLUMNS,
};
use crate::error::Result;
use crate::model::{
    BusinessType, Client, ControlTotal, ExtractTable, InventoryRecord, InvoiceSummary,
    Municipality, Neighborhood, Period, Route, Seller, Sku, Supervisor,
};
use crate::parser::{read_roster, read_sheet};
use crate::period::{select_period, SupplierFilter};
use crate::reconciliation::{InconsistencyReport, InconsistencyValidator};
use crate::rules::ClassificationPolicy;
use crate::sales::{sales_extract, transform, SalesTables};
use crate::table::Table;
use crate::writer::{archive_name, ExtractWriter, RunManifest, WrittenExtract};
use chrono::NaiveDate;
use std::path::PathBuf;

// ============================================================================
// INPUTS
// ============================================================================

/// Everything a run reads from disk, already parsed
#[derive(Debug)]
pub struct RunInputs {
    pub sales: Table,
    pub sellers: Table,
    pub supervisors: Table,
    pub clients: Table,
    pub municipalities: Table,
    pub routes: Table,
    pub inventory: Table,
    pub skus: Vec<Sku>,
    pub business_types: Vec<BusinessType>,
    pub policy: ClassificationPolicy,
}

/// Load every source the profile needs; a missing file fails the run
pub fn load_inputs(
    config: &AppConfig,
    profile: &CompanyProfile,
    suppliers: &SupplierFilter,
) -> Result<RunInputs> {
    let files = &config.files;
    let rosters = &profile.rosters;

    let inputs = RunInputs {
        sales: read_sheet("sales", &files.sales, &files.sales_sheet)?,
        sellers: read_roster("interasesor", &rosters.sellers, &SELLER_ROSTER_COLUMNS, false)?,
        supervisors: read_roster(
            "intersupervisor",
            &rosters.supervisors,
            &SUPERVISOR_ROSTER_COLUMNS,
            false,
        )?,
        clients: read_roster("intercliente", &rosters.clients, &CLIENT_ROSTER_COLUMNS, true)?,
        municipalities: read_roster(
            "interciudad",
            &rosters.municipalities,
            &MUNICIPALITY_ROSTER_COLUMNS,
            false,
        )?,
        routes: read_sheet("rutero", &files.routes, &files.routes_sheet)?,
        inventory: read_sheet("inventory", &files.inventory, &files.inventory_sheet)?,
        skus: load_skus(config, profile, suppliers)?,
        business_types: load_catalogue(config, profile)?,
        policy: build_policy(config, profile)?,
    };

    tracing::info!(
        company = %profile.code,
        sales_rows = inputs.sales.len(),
        "inputs loaded"
    );
    Ok(inputs)
}

// ============================================================================
// PROCESSING
// ============================================================================

/// Result tables of one run, in production order
#[derive(Debug)]
pub struct RunOutcome {
    pub period: Period,
    pub as_of: NaiveDate,
    pub sales: SalesTables,
    pub invoices: Vec<InvoiceSummary>,
    pub control_total: ControlTotal,
    pub sellers: Vec<Seller>,
    pub supervisors: Vec<Supervisor>,
    pub business_types: Vec<BusinessType>,
    pub skus: Vec<Sku>,
    pub clients: Vec<Client>,
    pub inventory: Vec<InventoryRecord>,
    pub municipalities: Vec<Municipality>,
    pub neighborhoods: Option<Vec<Neighborhood>>,
    pub routes: Vec<Route>,
    pub report: InconsistencyReport,
}

/// Run every stage in dependency order over already-loaded inputs
pub fn process(
    inputs: RunInputs,
    profile: &CompanyProfile,
    suppliers: &SupplierFilter,
    as_of: NaiveDate,
) -> Result<RunOutcome> {
    let columns = &profile.sales_columns;

    let (period, filtered) =
        select_period(&inputs.sales, &columns.date, &columns.supplier, suppliers)?;
    let sales = transform(&filtered, columns, profile.sales_trailing)?;

    let sellers = join_sellers(&inputs.sellers, &sales.clean)?;
    let supervisors = join_supervisors(&inputs.supervisors, &sellers)?;

    let clients = join_clients(&inputs.clients, &sales.clean, &inputs.policy, profile)?;
    let inventory = build_inventory(&inputs.inventory, suppliers, &inputs.skus, as_of, profile)?;

    let municipalities = join_municipalities(&inputs.municipalities, &clients)?;
    let neighborhoods = profile.neighborhoods.then(|| neighborhoods(&clients));
    let routes = join_routes(&inputs.routes, &sales.clean, &clients, &period)?;

    let invoices = aggregate_invoices(&sales.clean);
    let control_total = aggregate_control_totals(&sales.clean);

    let report =
        InconsistencyValidator::new().validate(&sales.clean, &clients, &inventory, &inputs.skus);
    tracing::info!(report = %report.summary(), "inconsistency check done");

    Ok(RunOutcome {
        period,
        as_of,
        sales,
        invoices,
        control_total,
        sellers,
        supervisors,
        business_types: inputs.business_types,
        skus: inputs.skus,
        clients,
        inventory,
        municipalities,
        neighborhoods,
        routes,
        report,
    })
}

impl RunOutcome {
    /// Rendered extracts in output order
    pub fn extracts(&self, profile: &CompanyProfile) -> Vec<ExtractTable> {
        let mut extracts = vec![
            sales_extract(&self.sales.raw, profile.sales_trailing),
            invoices_extract(&self.invoices),
            control_totals_extract(&self.control_total),
            sellers_extract(&self.sellers, profile),
            supervisors_extract(&self.supervisors, profile),
            business_types_extract(&self.business_types),
            skus_extract(&self.skus, profile),
            clients_extract(&self.clients, profile),
            inventory_extract(&self.inventory, profile),
            municipalities_extract(&self.municipalities),
        ];
        if let Some(barrios) = &self.neighborhoods {
            extracts.push(neighborhoods_extract(barrios));
        }
        extracts.push(routes_extract(&self.routes, profile));
        extracts
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub company: String,
    pub period: Period,
    pub folder: PathBuf,
    pub archive: String,
    pub extracts: Vec<WrittenExtract>,
    pub inconsistencies: Option<PathBuf>,
    pub manifest: PathBuf,
}

/// Write every extract, the inconsistency report, then the manifest
pub fn write_outputs(
    outcome: &RunOutcome,
    profile: &CompanyProfile,
    folder: PathBuf,
) -> Result<RunSummary> {
    let writer = ExtractWriter::create(&folder)?;
    let archive = archive_name(&profile.code, &outcome.period);
    let mut manifest =
        RunManifest::new(&profile.code, &outcome.period, outcome.as_of, archive.clone());

    for extract in outcome.extracts(profile) {
        manifest.extracts.push(writer.write(&extract)?);
    }
    if outcome.neighborhoods.is_none() {
        writer.discard(NEIGHBORHOODS_EXTRACT)?;
    }

    let inconsistencies = writer.write_inconsistencies(&outcome.report)?;
    manifest.inconsistencies = outcome
        .report
        .discrepancies
        .iter()
        .map(|d| d.missing_codes.len())
        .sum();

    let manifest_path = writer.write_manifest(&manifest)?;
    tracing::info!(
        folder = %writer.folder().display(),
        extracts = manifest.extracts.len(),
        archive = %archive,
        run_id = %manifest.run_id,
        "outputs written"
    );

    Ok(RunSummary {
        company: profile.code.clone(),
        period: outcome.period,
        folder,
        archive,
        extracts: manifest.extracts,
        inconsistencies,
        manifest: manifest_path,
    })
}

/// Full batch run for one configured company
pub fn run_company(config: &AppConfig, key: &str, as_of: NaiveDate) -> Result<RunSummary> {
    let profile = config.company(key)?;
    let span = tracing::info_span!("run", company = %key);
    let _guard = span.enter();

    let suppliers = SupplierFilter::new(&config.supplier_fragments(profile)?);
    let inputs = load_inputs(config, profile, &suppliers)?;
    let outcome = process(inputs, profile, &suppliers, as_of)?;
    write_outputs(&outcome, profile, profile.output_folder(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::BraceDelimitedReader;
    use crate::table::Cell;
    use crate::testing::create_test_profile;

    fn roster(name: &str, columns: &[&str], text: &str) -> Table {
        BraceDelimitedReader::new(name, columns).parse_text(text).unwrap()
    }

    fn create_test_inputs(sales: Table) -> RunInputs {
        RunInputs {
            sales,
            sellers: roster(
                "interasesor",
                &SELLER_ROSTER_COLUMNS,
                "9{1{ANA{R{5{CALLE{V{P{Activado{50{01\n",
            ),
            supervisors: roster(
                "intersupervisor",
                &SUPERVISOR_ROSTER_COLUMNS,
                "50{2{SUP{S{5{D{S{P{Activado{01\n",
            ),
            clients: roster(
                "intercliente",
                &CLIENT_ROSTER_COLUMNS,
                "1{UNO{2020-01-01{900{CRA{555{ANA{76001{N{Tienda{2{CENTRO\n",
            ),
            municipalities: roster("interciudad", &MUNICIPALITY_ROSTER_COLUMNS, "76001{CALI\n"),
            routes: Table::from_rows(
                "rutero",
                &["Codigo", "Cod. Asesor"],
                vec![vec![Cell::Int(1), Cell::Int(9)]],
            ),
            inventory: Table::from_rows(
                "Informe",
                &["Proveedor", "Codigo articulo", "Unidades"],
                vec![vec![Cell::text("ACME"), Cell::text("P1"), Cell::Int(4)]],
            ),
            skus: Vec::new(),
            business_types: crate::entities::business_types::static_catalogue(),
            policy: ClassificationPolicy::CopyField,
        }
    }

    fn create_test_sales(rows: Vec<(&str, &str, &str)>) -> Table {
        let headers = [
            "Cod. cliente", "Cod. vendedor", "Cod. productto", "Fecha", "Fac. numero", "Cantidad",
            "Vta neta", "Tipo", "Costo", "Unidad", "Pedido", "Proveedor",
        ];
        let rows = rows
            .into_iter()
            .map(|(client, date, value)| {
                vec![
                    Cell::text(client),
                    Cell::Int(9),
                    Cell::text("p1"),
                    Cell::text(date),
                    Cell::Int(100),
                    Cell::Int(1),
                    Cell::text(value),
                    Cell::text("0"),
                    Cell::Int(0),
                    Cell::text("UND"),
                    Cell::text("A1"),
                    Cell::text("ACME SAS"),
                ]
            })
            .collect();
        Table::from_rows("infoventas", &headers, rows)
    }

    #[test]
    fn test_process_threads_stages() {
        let sales = create_test_sales(vec![
            ("1", "2024-05-02", "10.50"),
            ("2", "2024-05-03", "4.50"),
        ]);
        let profile = create_test_profile();
        let suppliers = SupplierFilter::new(&profile.suppliers);
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let outcome = process(create_test_inputs(sales), &profile, &suppliers, as_of).unwrap();

        assert_eq!(outcome.period.month, 5);
        assert_eq!(outcome.sellers.len(), 1);
        assert_eq!(outcome.supervisors.len(), 1);
        assert_eq!(outcome.clients.len(), 1);
        assert_eq!(outcome.municipalities.len(), 1);
        assert_eq!(outcome.routes.len(), 1);
        // no SKU master rows: inventory is empty, client 2 is missing
        assert!(outcome.inventory.is_empty());
        assert_eq!(outcome.report.missing_for("Clientes"), Some(&["2".to_string()][..]));

        let names: Vec<String> = outcome.extracts(&profile).into_iter().map(|e| e.name).collect();
        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "ventas");
        assert_eq!(names[11], "Rutas");
    }

    #[test]
    fn test_write_outputs_manifest_last() {
        let sales = create_test_sales(vec![("1", "2024-05-02", "10.50")]);
        let mut profile = create_test_profile();
        profile.neighborhoods = false;
        let suppliers = SupplierFilter::new(&profile.suppliers);
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let outcome = process(create_test_inputs(sales), &profile, &suppliers, as_of).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("test");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("Barrios.txt"), "Código{Nombre{Código Municipio\n").unwrap();
        std::fs::write(folder.join("inconsistencias.json"), "{}").unwrap();

        let summary = write_outputs(&outcome, &profile, folder).unwrap();

        // leftovers of an earlier run into the same folder are gone
        assert!(!summary.folder.join("Barrios.txt").exists());
        assert!(!summary.folder.join("inconsistencias.json").exists());

        assert_eq!(summary.archive, "2001_202460502.zip");
        assert_eq!(summary.extracts.len(), 11);
        assert!(summary.inconsistencies.is_none());
        assert!(summary.manifest.is_file());

        let manifest: RunManifest =
            serde_json::from_str(&std::fs::read_to_string(&summary.manifest).unwrap()).unwrap();
        assert_eq!(manifest.archive, summary.archive);
        assert_eq!(manifest.extracts[0].file, "ventas.txt");

        let totals =
            std::fs::read_to_string(summary.folder.join("Totales de Control.txt")).unwrap();
        assert_eq!(totals, "Descriptor Total{Valor\nTotalValorVenta{10.50\n");
    }
}
