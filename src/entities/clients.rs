// 🏪 Clients - roster rows of clients with sales, plus their business type

use super::join;
use crate::config::{BusinessTypePolicy, ClientLayout, CompanyProfile};
use crate::error::Result;
use crate::model::{Client, ExtractTable, SalesRecord};
use crate::normalize::{key_set, normalize_key};
use crate::rules::ClassificationPolicy;
use crate::table::Table;

pub const CLIENTS_EXTRACT: &str = "Clientes";

pub const CLIENT_ROSTER_COLUMNS: [&str; 12] = [
    "Cod. Cliente",
    "Nom. Cliente",
    "Fecha Ingreso",
    "Nit",
    "Direccion",
    "Telefono",
    "Representante Legal",
    "Codigo Municipio",
    "Codigo Negocio",
    "Tipo Negocio",
    "Estracto",
    "Barrio",
];

const KEY_FIELD: &str = "Cod. Cliente";

/// Roster field consulted by the copy/lookup policies
fn policy_field(profile: &CompanyProfile) -> Option<&str> {
    match &profile.business_types {
        BusinessTypePolicy::PriorityTiers(_) => None,
        BusinessTypePolicy::CopyField { field } | BusinessTypePolicy::TypologyLookup { field } => {
            Some(field.as_str())
        }
    }
}

// ============================================================================
// JOIN
// ============================================================================

/// Clients appearing in the clean sales, classified with `policy`
pub fn join_clients(
    roster: &Table,
    sales_clean: &[SalesRecord],
    policy: &ClassificationPolicy,
    profile: &CompanyProfile,
) -> Result<Vec<Client>> {
    let with_sales = key_set(sales_clean.iter().map(|s| s.client.as_str()));
    let joined = join(roster, KEY_FIELD, &with_sales, None)?;

    let code = joined.column(KEY_FIELD)?;
    let name = joined.column("Nom. Cliente")?;
    let joined_on = joined.column("Fecha Ingreso")?;
    let nit = joined.column("Nit")?;
    let address = joined.column("Direccion")?;
    let phone = joined.column("Telefono")?;
    let legal = joined.column("Representante Legal")?;
    let municipality = joined.column("Codigo Municipio")?;
    let stratum = joined.column("Estracto")?;
    let neighborhood = joined.column("Barrio")?;
    let policy_idx = match policy_field(profile) {
        Some(field) => Some(joined.column(field)?),
        None => None,
    };

    let clients: Vec<Client> = joined
        .rows()
        .iter()
        .map(|row| {
            let client_code = normalize_key(&row.get(code).render());
            let roster_value = policy_idx.map(|idx| row.text(idx)).unwrap_or_default();
            let business_type = policy.resolve(&client_code, &roster_value);

            Client {
                code: client_code,
                name: row.text(name),
                joined: row.text(joined_on),
                nit: row.text(nit),
                address: row.text(address),
                phone: row.text(phone),
                legal_representative: row.text(legal),
                municipality: row.text(municipality),
                business_type,
                stratum: row.text(stratum),
                neighborhood: row.text(neighborhood),
            }
        })
        .collect();

    tracing::info!(
        count = clients.len(),
        with_sales = with_sales.len(),
        policy = policy.name(),
        "clients resolved"
    );
    Ok(clients)
}

// ============================================================================
// EXTRACT
// ============================================================================

pub fn clients_extract(clients: &[Client], profile: &CompanyProfile) -> ExtractTable {
    let mut extract = ExtractTable::new(
        CLIENTS_EXTRACT,
        &[
            "Código",
            "Nombre",
            "Fecha Ingreso",
            "Nit",
            "Dirección",
            "Teléfono",
            "Representante Legal",
            "Código Municipio",
            "Código Tipo Negocio",
            "Estrato",
        ],
    );

    match profile.client_layout {
        ClientLayout::Standard => extract.extend_header(&[
            "Barrio",
            "Código Sector DANE",
            "Nombre Sector DANE",
            "Código Zona Venta",
        ]),
        ClientLayout::Geo => extract.extend_header(&[
            "Código Sede",
            "Nombre Sede",
            "Ubicación longitud",
            "Ubicación latitud",
            "Identificador de sucursal",
        ]),
    }

    for c in clients {
        let mut fields = vec![
            c.code.clone(),
            c.name.clone(),
            c.joined.clone(),
            c.nit.clone(),
            c.address.clone(),
            c.phone.clone(),
            c.legal_representative.clone(),
            c.municipality.clone(),
            c.business_type.clone(),
            c.stratum.clone(),
        ];

        match profile.client_layout {
            ClientLayout::Standard => {
                fields.push(c.neighborhood.clone());
                fields.extend([String::new(), String::new(), String::new()]);
            }
            ClientLayout::Geo => {
                let branch = &profile.branch;
                fields.extend([
                    branch.code.clone(),
                    branch.name.clone(),
                    branch.longitude.to_string(),
                    branch.latitude.to_string(),
                    branch.sucursal_id.clone(),
                ]);
            }
        }

        extract.push(fields);
    }

    extract
}

// ============================================================================
// TESTS
// ============================================================================
