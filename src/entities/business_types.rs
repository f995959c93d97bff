// 🏬 Business Types - catalogue extract + classification policy per company

use crate::config::{
    AppConfig, BusinessTypePolicy, CatalogueSource, CompanyProfile, PriorityTierSources,
    TypologySheet,
};
use crate::error::Result;
use crate::model::{BusinessType, ExtractTable};
use crate::normalize::{fold_accents, key_set, normalize_key, KeySet};
use crate::parser::{ensure_exists, read_sheet, TableReader, WorkbookReader};
use crate::rules::{BusinessTypeClassifier, ClassificationPolicy, Tier};
use crate::table::Table;
use std::collections::BTreeMap;
use std::path::Path;

pub const BUSINESS_TYPES_EXTRACT: &str = "Tipos De Negocio";

/// Built-in catalogue for the tier policy
pub const STATIC_CATALOGUE: [(&str, &str); 4] = [
    ("TE", "Tienda Especializada"),
    ("TT", "Tienda a Tienda"),
    ("MM", "Minimercado"),
    ("SN", "Sin Tipología"),
];

/// Accepted headers for the MM/SN column of the special-market workbook
const TYPOLOGY_COLUMN_CANDIDATES: [&str; 6] = [
    "tipologia",
    "tipología",
    "tipo",
    "tipo_negocio",
    "tipologia mm/sn",
    "mm_sn",
];

const MM_PRIORITY: i32 = 30;
const SN_PRIORITY: i32 = 20;
const TE_PRIORITY: i32 = 10;

// ============================================================================
// CATALOGUE
// ============================================================================

pub fn static_catalogue() -> Vec<BusinessType> {
    STATIC_CATALOGUE
        .iter()
        .map(|(code, name)| BusinessType {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// Typology rows with accent-folded codes
pub fn typology_from_table(table: &Table, sheet: &TypologySheet) -> Result<Vec<BusinessType>> {
    let code = table.column(&sheet.code_column)?;
    let name = table.column(&sheet.name_column)?;

    Ok(table
        .rows()
        .iter()
        .filter(|row| !row.get(code).is_blank())
        .map(|row| BusinessType {
            code: fold_accents(&row.text(code)),
            name: row.text(name),
        })
        .collect())
}

pub fn load_typology(config: &AppConfig, profile: &CompanyProfile) -> Result<Vec<BusinessType>> {
    let table = read_sheet("typology", config.catalog()?, &profile.typology.sheet)?;
    let typology = typology_from_table(&table, &profile.typology)?;
    tracing::info!(count = typology.len(), sheet = %profile.typology.sheet, "typology loaded");
    Ok(typology)
}

/// Catalogue written to the business-types extract
pub fn load_catalogue(config: &AppConfig, profile: &CompanyProfile) -> Result<Vec<BusinessType>> {
    match profile.business_type_catalogue {
        CatalogueSource::Static => Ok(static_catalogue()),
        CatalogueSource::Typology => load_typology(config, profile),
    }
}

pub fn business_types_extract(types: &[BusinessType]) -> ExtractTable {
    let mut extract = ExtractTable::new(BUSINESS_TYPES_EXTRACT, &["Código", "Nombre"]);
    for t in types {
        extract.push(vec![t.code.clone(), t.name.clone()]);
    }
    extract
}

// ============================================================================
// POLICY
// ============================================================================

/// Build the classification policy configured for a company
pub fn build_policy(config: &AppConfig, profile: &CompanyProfile) -> Result<ClassificationPolicy> {
    let policy = match &profile.business_types {
        BusinessTypePolicy::PriorityTiers(sources) => {
            let special = match &sources.special_market {
                Some(path) if path.is_file() => Some(read_first_sheet("special_market", path)?),
                Some(path) => {
                    tracing::warn!(
                        path = %path.display(),
                        "special-market workbook not found, MM/SN tiers empty"
                    );
                    None
                }
                None => None,
            };
            let legacy =
                read_sheet("legacy_business_types", &sources.legacy, &sources.legacy_sheet)?;
            let classifier = tiers_from_tables(special.as_ref(), &legacy, sources)?;
            ClassificationPolicy::PriorityTiers(classifier)
        }
        BusinessTypePolicy::CopyField { .. } => ClassificationPolicy::CopyField,
        BusinessTypePolicy::TypologyLookup { .. } => {
            let typology = load_typology(config, profile)?;
            ClassificationPolicy::TypologyLookup(typology_map(&typology))
        }
    };

    tracing::info!(policy = policy.name(), "business-type policy ready");
    Ok(policy)
}

fn read_first_sheet(name: &str, path: &Path) -> Result<Table> {
    ensure_exists(name, path)?;
    WorkbookReader::new(name, None).read(path)
}

/// folded code → catalogue code
pub fn typology_map(typology: &[BusinessType]) -> BTreeMap<String, String> {
    typology
        .iter()
        .map(|t| (t.code.clone(), t.code.clone()))
        .collect()
}

/// MM > SN > TE > default
pub fn tiers_from_tables(
    special_market: Option<&Table>,
    legacy: &Table,
    sources: &PriorityTierSources,
) -> Result<BusinessTypeClassifier> {
    let mut classifier = BusinessTypeClassifier::new(&sources.default_label);

    if let Some(table) = special_market {
        let (mm, sn) = special_market_tiers(table, &sources.special_market_client_column)?;
        tracing::info!(mm = mm.len(), sn = sn.len(), "special-market tiers loaded");
        classifier.add_tier(Tier::new("MM", mm, MM_PRIORITY));
        classifier.add_tier(Tier::new("SN", sn, SN_PRIORITY));
    }

    let legacy_idx = legacy.column(&sources.legacy_column)?;
    let codes: Vec<String> = legacy.rows().iter().map(|row| row.text(legacy_idx)).collect();
    let te = key_set(codes.iter().map(String::as_str));
    tracing::info!(te = te.len(), "legacy tier loaded");
    classifier.add_tier(Tier::new("TE", te, TE_PRIORITY));

    Ok(classifier)
}

/// Without a typology column every listed client is MM
fn special_market_tiers(table: &Table, client_column: &str) -> Result<(KeySet, KeySet)> {
    let client = table.column(client_column)?;
    let typology = table.headers().iter().position(|h| {
        TYPOLOGY_COLUMN_CANDIDATES.contains(&h.trim().to_lowercase().as_str())
    });

    let mut mm = KeySet::new();
    let mut sn = KeySet::new();

    for row in table.rows() {
        let code = normalize_key(&row.get(client).render());
        if code.is_empty() {
            continue;
        }
        match typology.map(|idx| row.text(idx).to_uppercase()) {
            None => {
                mm.insert(code);
            }
            Some(label) if label == "MM" => {
                mm.insert(code);
            }
            Some(label) if label == "SN" => {
                sn.insert(code);
            }
            Some(_) => {}
        }
    }

    Ok((mm, sn))
}

// ============================================================================
// TESTS
// ============================================================================
