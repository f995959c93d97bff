// 🧑‍💼 Sellers & Supervisors - active roster rows with sales in the period
//
// Supervisors are drawn from the resolved sellers, so sellers go first.

use super::{join, StatusFilter};
use crate::config::CompanyProfile;
use crate::error::Result;
use crate::model::{ExtractTable, SalesRecord, Seller, Supervisor};
use crate::normalize::{compare_codes, key_set};
use crate::table::Table;

pub const SELLERS_EXTRACT: &str = "Vendedores";
pub const SUPERVISORS_EXTRACT: &str = "Supervisores";

pub const SELLER_ROSTER_COLUMNS: [&str; 11] = [
    "Codigo",
    "Documento",
    "Nombre",
    "Apellido",
    "Telefono",
    "Direccion",
    "Cargo",
    "Portafolio",
    "Estado",
    "Codigo supervisor",
    "Codigo bodega",
];

pub const SUPERVISOR_ROSTER_COLUMNS: [&str; 10] = [
    "Codigo",
    "Documento",
    "Nombre",
    "Apellido",
    "Telefono",
    "Direccion",
    "Cargo",
    "Portafolio",
    "Estado",
    "Codigo bodega",
];

const BRANCH_HEADER: [&str; 2] = ["Código Sede", "Nombre Sede"];

// ============================================================================
// SELLERS
// ============================================================================

/// Active sellers that appear in the clean sales, sorted by code
pub fn join_sellers(roster: &Table, sales_clean: &[SalesRecord]) -> Result<Vec<Seller>> {
    let with_sales = key_set(sales_clean.iter().map(|s| s.seller.as_str()));
    let joined = join(roster, "Codigo", &with_sales, Some(&StatusFilter::active("Estado")))?;

    let code = joined.column("Codigo")?;
    let document = joined.column("Documento")?;
    let name = joined.column("Nombre")?;
    let address = joined.column("Direccion")?;
    let supervisor = joined.column("Codigo supervisor")?;
    let branch = joined.column("Codigo bodega")?;

    let mut sellers: Vec<Seller> = joined
        .rows()
        .iter()
        .map(|row| Seller {
            code: row.text(code),
            name: row.text(name),
            address: row.text(address),
            document: row.text(document),
            supervisor: row.text(supervisor),
            branch_code: row.text(branch),
        })
        .collect();

    sellers.sort_by(|a, b| compare_codes(&a.code, &b.code));
    tracing::info!(count = sellers.len(), "sellers resolved");
    Ok(sellers)
}

pub fn sellers_extract(sellers: &[Seller], profile: &CompanyProfile) -> ExtractTable {
    let mut extract = ExtractTable::new(
        SELLERS_EXTRACT,
        &["Código", "Nombre", "Ubicación", "Cédula", "Código Supervisor"],
    );
    if profile.branch_fields {
        extract.extend_header(&BRANCH_HEADER);
    }

    for s in sellers {
        let mut fields = vec![
            s.code.clone(),
            s.name.clone(),
            s.address.clone(),
            s.document.clone(),
            s.supervisor.clone(),
        ];
        if profile.branch_fields {
            fields.push(s.branch_code.clone());
            fields.push(profile.branch_name(&s.branch_code));
        }
        extract.push(fields);
    }

    extract
}

// ============================================================================
// SUPERVISORS
// ============================================================================

/// Active supervisors referenced by the resolved sellers, sorted by code
pub fn join_supervisors(roster: &Table, sellers: &[Seller]) -> Result<Vec<Supervisor>> {
    let referenced = key_set(sellers.iter().map(|s| s.supervisor.as_str()));
    let joined = join(roster, "Codigo", &referenced, Some(&StatusFilter::active("Estado")))?;

    let code = joined.column("Codigo")?;
    let name = joined.column("Nombre")?;
    let branch = joined.column("Codigo bodega")?;

    let mut supervisors: Vec<Supervisor> = joined
        .rows()
        .iter()
        .map(|row| Supervisor {
            code: row.text(code),
            name: row.text(name),
            branch_code: row.text(branch),
        })
        .collect();

    supervisors.sort_by(|a, b| compare_codes(&a.code, &b.code));
    tracing::info!(count = supervisors.len(), "supervisors resolved");
    Ok(supervisors)
}

pub fn supervisors_extract(supervisors: &[Supervisor], profile: &CompanyProfile) -> ExtractTable {
    let mut extract = ExtractTable::new(SUPERVISORS_EXTRACT, &["Código", "Nombre"]);
    if profile.branch_fields {
        extract.extend_header(&BRANCH_HEADER);
    }

    for s in supervisors {
        let mut fields = vec![s.code.clone(), s.name.clone()];
        if profile.branch_fields {
            fields.push(s.branch_code.clone());
            fields.push(profile.branch_name(&s.branch_code));
        }
        extract.push(fields);
    }

    extract
}

// ============================================================================
// TESTS
// ============================================================================
