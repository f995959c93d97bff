// Reference Joiners - one module per master entity
//
// Each joiner loads its reference table, keeps active rows whose key is in a
// key set derived from sales (or from an already-joined entity), and emits
// typed records plus the rendered extract.
//
// Order: sellers → supervisors, clients → municipalities/neighborhoods/routes.

pub mod business_types;
pub mod clients;
pub mod geography;
pub mod inventory;
pub mod products;
pub mod routes;
pub mod sellers;

pub use business_types::{business_types_extract, build_policy, load_catalogue, load_typology};
pub use clients::{clients_extract, join_clients, CLIENT_ROSTER_COLUMNS};
pub use geography::{
    join_municipalities, municipalities_extract, neighborhoods, neighborhoods_extract,
};
pub use inventory::{build_inventory, inventory_extract};
pub use products::{load_skus, skus_extract};
pub use routes::{join_routes, routes_extract};
pub use sellers::{join_sellers, join_supervisors, sellers_extract, supervisors_extract};

use crate::error::Result;
use crate::normalize::{normalize_key, KeySet};
use crate::table::Table;

/// Status value marking an active roster row
pub const ACTIVE_STATUS: &str = "Activado";

/// Keep rows whose `field` contains `needle` (exact, case-sensitive)
#[derive(Debug, Clone)]
pub struct StatusFilter {
    pub field: String,
    pub needle: String,
}

impl StatusFilter {
    pub fn active(field: &str) -> Self {
        StatusFilter {
            field: field.to_string(),
            needle: ACTIVE_STATUS.to_string(),
        }
    }
}

/// Generic reference join: status filter, then key-set membership.
///
/// Field values are returned untouched; only `key_field` is normalized for
/// the comparison.
pub fn join(
    reference: &Table,
    key_field: &str,
    keys: &KeySet,
    status: Option<&StatusFilter>,
) -> Result<Table> {
    let key_idx = reference.column(key_field)?;
    let status_idx = match status {
        Some(filter) => Some((reference.column(&filter.field)?, filter.needle.as_str())),
        None => None,
    };

    let joined = reference.filter(|row| {
        let active = status_idx
            .map(|(idx, needle)| row.text(idx).contains(needle))
            .unwrap_or(true);
        active && keys.contains(&normalize_key(&row.get(key_idx).render()))
    });

    tracing::debug!(
        table = %reference.name(),
        reference_rows = reference.len(),
        keys = keys.len(),
        joined = joined.len(),
        "reference joined"
    );

    Ok(joined)
}
