// 🗺️ Geography - municipalities and neighbourhoods derived from resolved clients

use super::join;
use crate::error::Result;
use crate::model::{Client, ExtractTable, Municipality, Neighborhood};
use crate::normalize::key_set;
use crate::table::Table;
use std::collections::BTreeSet;

pub const MUNICIPALITIES_EXTRACT: &str = "Municipios";
pub const NEIGHBORHOODS_EXTRACT: &str = "Barrios";

pub const MUNICIPALITY_ROSTER_COLUMNS: [&str; 2] = ["Código", "Nombre"];

// ============================================================================
// MUNICIPALITIES
// ============================================================================

/// Municipalities referenced by at least one client, duplicates dropped
pub fn join_municipalities(roster: &Table, clients: &[Client]) -> Result<Vec<Municipality>> {
    let referenced = key_set(clients.iter().map(|c| c.municipality.as_str()));
    let joined = join(roster, "Código", &referenced, None)?;

    let code = joined.column("Código")?;
    let name = joined.column("Nombre")?;

    let mut seen = BTreeSet::new();
    let municipalities: Vec<Municipality> = joined
        .rows()
        .iter()
        .map(|row| Municipality {
            code: row.text(code),
            name: row.text(name),
        })
        .filter(|m| seen.insert((m.code.clone(), m.name.clone())))
        .collect();

    tracing::info!(
        count = municipalities.len(),
        referenced = referenced.len(),
        "municipalities resolved"
    );
    Ok(municipalities)
}

pub fn municipalities_extract(municipalities: &[Municipality]) -> ExtractTable {
    let mut extract = ExtractTable::new(MUNICIPALITIES_EXTRACT, &["Código", "Nombre"]);
    for m in municipalities {
        extract.push(vec![m.code.clone(), m.name.clone()]);
    }
    extract
}

// ============================================================================
// NEIGHBORHOODS
// ============================================================================

/// Distinct (municipality, barrio) pairs of the clients, ordered
pub fn neighborhoods(clients: &[Client]) -> Vec<Neighborhood> {
    let distinct: BTreeSet<Neighborhood> = clients
        .iter()
        .filter(|c| !c.neighborhood.is_empty())
        .map(|c| Neighborhood {
            municipality: c.municipality.clone(),
            name: c.neighborhood.clone(),
        })
        .collect();

    tracing::info!(count = distinct.len(), "neighborhoods derived");
    distinct.into_iter().collect()
}

/// El barrio no tiene código propio: se usa el nombre
pub fn neighborhoods_extract(neighborhoods: &[Neighborhood]) -> ExtractTable {
    let mut extract = ExtractTable::new(
        NEIGHBORHOODS_EXTRACT,
        &["Código", "Nombre", "Código Municipio"],
    );
    for n in neighborhoods {
        extract.push(vec![n.name.clone(), n.name.clone(), n.municipality.clone()]);
    }
    extract
}
