// 🛣️ Routes - rutero visits that match a (client, seller) pair in the sales

use crate::config::CompanyProfile;
use crate::error::Result;
use crate::model::{Client, ExtractTable, Period, Route, SalesRecord};
use crate::normalize::{key_set, normalize_key};
use crate::table::Table;
use std::collections::BTreeSet;

pub const ROUTES_EXTRACT: &str = "Rutas";

pub const ROUTE_CLIENT_COLUMN: &str = "Codigo";
pub const ROUTE_SELLER_COLUMN: &str = "Cod. Asesor";

/// Every route is a weekly visit on the first weekday
const WEEKDAY: u8 = 1;
const FREQUENCY: u8 = 4;

/// Inner join of the rutero with the distinct sales pairs, limited to
/// clients present in the client master
pub fn join_routes(
    rutero: &Table,
    sales_clean: &[SalesRecord],
    clients: &[Client],
    period: &Period,
) -> Result<Vec<Route>> {
    let client_idx = rutero.column(ROUTE_CLIENT_COLUMN)?;
    let seller_idx = rutero.column(ROUTE_SELLER_COLUMN)?;

    let known_clients = key_set(clients.iter().map(|c| c.code.as_str()));
    let sold: BTreeSet<(String, String)> = sales_clean
        .iter()
        .map(|s| (normalize_key(&s.client), normalize_key(&s.seller)))
        .filter(|(client, _)| known_clients.contains(client))
        .collect();

    let planned: BTreeSet<(String, String)> = rutero
        .rows()
        .iter()
        .map(|row| {
            (
                normalize_key(&row.get(client_idx).render()),
                normalize_key(&row.get(seller_idx).render()),
            )
        })
        .collect();

    let routes: Vec<Route> = planned
        .intersection(&sold)
        .map(|(client, seller)| Route {
            seller: seller.clone(),
            client: client.clone(),
            month: period.month,
            weekday: WEEKDAY,
            frequency: FREQUENCY,
        })
        .collect();

    tracing::info!(
        count = routes.len(),
        rutero_pairs = planned.len(),
        sales_pairs = sold.len(),
        "routes resolved"
    );
    Ok(routes)
}

pub fn routes_extract(routes: &[Route], profile: &CompanyProfile) -> ExtractTable {
    let mut extract = ExtractTable::new(
        ROUTES_EXTRACT,
        &["Código Vendedor", "Código Cliente", "Mes", "Dia Semana", "Frecuencia"],
    );
    if profile.branch_fields {
        extract.extend_header(&["Código Sede", "Nombre Sede", "Identificador de sucursal"]);
    }

    for r in routes {
        let mut fields = vec![
            r.seller.clone(),
            r.client.clone(),
            r.month.to_string(),
            r.weekday.to_string(),
            r.frequency.to_string(),
        ];
        if profile.branch_fields {
            fields.push(profile.branch.code.clone());
            fields.push(profile.branch.name.clone());
            fields.push(profile.branch.sucursal_id.clone());
        }
        extract.push(fields);
    }

    extract
}
