// ⚙️ Configuration - one shared pipeline, one declarative profile per company
//
// The three business units differ only in paths, column names, branch
// constants and a few policy switches; all of it lives here.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ============================================================================
// CORE TYPES
// ============================================================================

/// AppConfig - contenido completo del archivo JSON de configuración
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,

    pub files: SharedFiles,

    /// Profiles keyed by company id ("distrijass", "eje_cafetero", ...)
    pub companies: BTreeMap<String, CompanyProfile>,
}

/// Sources shared by every company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedFiles {
    pub sales: PathBuf,
    #[serde(default = "default_sales_sheet")]
    pub sales_sheet: String,

    pub inventory: PathBuf,
    #[serde(default = "default_report_sheet")]
    pub inventory_sheet: String,

    pub routes: PathBuf,
    #[serde(default = "default_report_sheet")]
    pub routes_sheet: String,

    /// Main product/typology catalog workbook
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    /// Plain-text supplier list, one fragment per line
    #[serde(default)]
    pub providers: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Archive prefix (e.g. "2001")
    pub code: String,
    pub output_subfolder: String,
    pub rosters: Rosters,

    #[serde(default)]
    pub suppliers: Vec<String>,
    /// Prefer the shared providers file over `suppliers` when it exists
    #[serde(default)]
    pub use_providers_file: bool,

    #[serde(default)]
    pub sales_columns: SalesColumns,
    #[serde(default)]
    pub sales_trailing: TrailingColumn,

    #[serde(default)]
    pub branch: BranchDefaults,
    #[serde(default = "default_branch_names")]
    pub branch_names: BTreeMap<String, String>,
    /// Sellers, supervisors, routes and inventory carry branch fields
    #[serde(default)]
    pub branch_fields: bool,

    #[serde(default)]
    pub client_layout: ClientLayout,
    #[serde(default)]
    pub business_types: BusinessTypePolicy,
    #[serde(default)]
    pub business_type_catalogue: CatalogueSource,
    #[serde(default)]
    pub typology: TypologySheet,
    pub skus: SkuSource,

    #[serde(default = "default_true")]
    pub neighborhoods: bool,
}

/// Legacy "{" rosters exported by the ERP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rosters {
    pub sellers: PathBuf,
    pub supervisors: PathBuf,
    pub clients: PathBuf,
    pub municipalities: PathBuf,
}

/// Column names of the sales workbook (per-company overrides)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesColumns {
    pub client: String,
    pub seller: String,
    pub product: String,
    pub date: String,
    pub document: String,
    pub quantity: String,
    pub value: String,
    pub kind: String,
    pub cost: String,
    pub unit: String,
    pub order: String,
    pub supplier: String,
    pub warehouse: String,
}

impl Default for SalesColumns {
    fn default() -> Self {
        SalesColumns {
            client: "Cod. cliente".into(),
            seller: "Cod. vendedor".into(),
            product: "Cod. productto".into(),
            date: "Fecha".into(),
            document: "Fac. numero".into(),
            quantity: "Cantidad".into(),
            value: "Vta neta".into(),
            kind: "Tipo".into(),
            cost: "Costo".into(),
            unit: "Unidad".into(),
            order: "Pedido".into(),
            supplier: "Proveedor".into(),
            warehouse: "Codigo bodega".into(),
        }
    }
}

/// Last column of the Sales extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingColumn {
    #[default]
    OrderNumber,
    Warehouse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchDefaults {
    pub code: String,
    pub name: String,
    pub warehouse: String,
    pub sucursal_id: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl Default for BranchDefaults {
    fn default() -> Self {
        BranchDefaults {
            code: "01".into(),
            name: "PALMIRA/CALI".into(),
            warehouse: "001".into(),
            sucursal_id: "001".into(),
            longitude: -76.3,
            latitude: 3.45,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientLayout {
    /// DANE sector / sales zone columns (left empty)
    #[default]
    Standard,
    /// Branch + coordinates columns from BranchDefaults
    Geo,
}

/// Business-type classification variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BusinessTypePolicy {
    /// MM > SN > TE > default, from auxiliary workbooks
    PriorityTiers(PriorityTierSources),
    /// Copy a roster field verbatim (trimmed)
    CopyField {
        #[serde(default = "default_copy_field")]
        field: String,
    },
    /// Accent-fold a roster field and look it up in the typology catalogue
    TypologyLookup {
        #[serde(default = "default_lookup_field")]
        field: String,
    },
}

impl Default for BusinessTypePolicy {
    fn default() -> Self {
        BusinessTypePolicy::CopyField {
            field: default_copy_field(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityTierSources {
    /// Special-market workbook (MM/SN); skipped when absent on disk
    #[serde(default)]
    pub special_market: Option<PathBuf>,
    #[serde(default = "default_special_market_client_column")]
    pub special_market_client_column: String,

    /// Legacy specialised-store workbook (TE)
    pub legacy: PathBuf,
    #[serde(default = "default_legacy_sheet")]
    pub legacy_sheet: String,
    #[serde(default = "default_legacy_column")]
    pub legacy_column: String,

    #[serde(default = "default_business_type")]
    pub default_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogueSource {
    /// TE / TT / MM / SN
    #[default]
    Static,
    /// Typology sheet of the main catalog
    Typology,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypologySheet {
    pub sheet: String,
    pub code_column: String,
    pub name_column: String,
}

impl Default for TypologySheet {
    fn default() -> Self {
        TypologySheet {
            sheet: "TIPOLOGIA".into(),
            code_column: "Cod. necesidad".into(),
            name_column: "Nom. necesidad".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SkuSource {
    /// PRODUCTO sheet of the main catalog, filtered by supplier
    Catalog(CatalogSkuColumns),
    /// Supplier product list, filtered by code prefix/length
    Prefix(PrefixSkuSource),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSkuColumns {
    pub sheet: String,
    pub code: String,
    pub name: String,
    pub barcode: String,
    pub supplier: String,
    pub second_supplier: String,
    pub category: String,
    pub product_type: String,
    pub content: String,
}

impl Default for CatalogSkuColumns {
    fn default() -> Self {
        CatalogSkuColumns {
            sheet: "PRODUCTO".into(),
            code: "Codigo SAP".into(),
            name: "Nombre".into(),
            barcode: "Codigo de barras".into(),
            supplier: "Proveedor".into(),
            second_supplier: "PROVEE 2".into(),
            category: "Categoría".into(),
            product_type: "Tipo Prod".into(),
            content: "Contenido".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixSkuSource {
    pub workbook: PathBuf,
    #[serde(default = "default_prefix_sheet")]
    pub sheet: String,
    #[serde(default = "default_prefix_code_column")]
    pub code_column: String,
    #[serde(default = "default_prefix_name_column")]
    pub name_column: String,
    #[serde(default = "default_prefix_barcode_column")]
    pub barcode_column: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_max_code_len")]
    pub max_code_len: usize,
}

// ============================================================================
// DEFAULTS
// ============================================================================

fn default_output_folder() -> PathBuf {
    PathBuf::from("output_files")
}

fn default_sales_sheet() -> String {
    "infoventas".into()
}

fn default_report_sheet() -> String {
    "Informe".into()
}

fn default_true() -> bool {
    true
}

fn default_branch_names() -> BTreeMap<String, String> {
    [
        ("01", "PALMIRA/CALI"),
        ("02", "TULUA"),
        ("04", "POPAYAN"),
        ("05", "BUENAVENTURA"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_copy_field() -> String {
    "Tipo Negocio".into()
}

fn default_lookup_field() -> String {
    "Codigo Negocio".into()
}

fn default_special_market_client_column() -> String {
    "Cod. cliente".into()
}

fn default_legacy_sheet() -> String {
    "TE Viejos".into()
}

fn default_legacy_column() -> String {
    "CLIENTES".into()
}

fn default_business_type() -> String {
    "TT".into()
}

fn default_prefix_sheet() -> String {
    "Productos EQ".into()
}

fn default_prefix_code_column() -> String {
    "Pro_Cod".into()
}

fn default_prefix_name_column() -> String {
    "Producto".into()
}

fn default_prefix_barcode_column() -> String {
    "ALTERNO".into()
}

fn default_prefix() -> String {
    "23".into()
}

fn default_max_code_len() -> usize {
    5
}

// ============================================================================
// LOADING
// ============================================================================

impl AppConfig {
    /// Load and parse the JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;

        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(raw)
            .map_err(|e| PipelineError::Configuration(format!("invalid config: {}", e)))?;

        if config.companies.is_empty() {
            return Err(PipelineError::Configuration(
                "no companies configured".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn company(&self, key: &str) -> Result<&CompanyProfile> {
        self.companies.get(key).ok_or_else(|| {
            PipelineError::Configuration(format!(
                "unknown company '{}' (configured: {})",
                key,
                self.company_keys().join(", ")
            ))
        })
    }

    pub fn company_keys(&self) -> Vec<String> {
        self.companies.keys().cloned().collect()
    }

    /// Catalog workbook, required by the catalog SKU source and typology
    pub fn catalog(&self) -> Result<&Path> {
        self.files.catalog.as_deref().ok_or_else(|| {
            PipelineError::Configuration("files.catalog is required by this profile".to_string())
        })
    }

    /// Supplier fragments for a profile
    ///
    /// Providers file wins when the profile opts in and the file exists;
    /// otherwise the inline list is used.
    pub fn supplier_fragments(&self, profile: &CompanyProfile) -> Result<Vec<String>> {
        if profile.use_providers_file {
            if let Some(path) = self.files.providers.as_deref() {
                if path.is_file() {
                    let fragments = load_providers(path)?;
                    tracing::info!(
                        path = %path.display(),
                        count = fragments.len(),
                        "suppliers loaded from providers file"
                    );
                    return Ok(fragments);
                }
                tracing::warn!(
                    path = %path.display(),
                    "providers file not found, using profile suppliers"
                );
            }
        }

        Ok(profile
            .suppliers
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

impl CompanyProfile {
    /// Branch name for a branch code, falling back to the code itself
    pub fn branch_name(&self, code: &str) -> String {
        self.branch_names
            .get(code.trim())
            .cloned()
            .unwrap_or_else(|| code.trim().to_string())
    }

    pub fn output_folder(&self, config: &AppConfig) -> PathBuf {
        config.output_folder.join(&self.output_subfolder)
    }
}

/// One fragment per line, blank lines ignored
pub fn load_providers(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::read(path, e))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

// ============================================================================
// TESTS
// ============================================================================
