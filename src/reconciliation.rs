// ⚖️ Inconsistency Validator - keys used by transactions must exist in masters
//
//   set(sales.client)      - set(clients.code) → missing clients
//   set(inventory.product) - set(skus.code)    → missing products
//
// Findings are informational: they never fail a run.

use crate::model::{Client, InventoryRecord, SalesRecord, Sku};
use crate::normalize::{compare_codes, normalize_key, KeySet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CLIENTS_MASTER: &str = "Clientes";
pub const SKU_MASTER: &str = "SKU";

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Master table the codes are missing from
    pub master: String,
    pub missing_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InconsistencyReport {
    pub discrepancies: Vec<Discrepancy>,
    pub checked_at: DateTime<Utc>,
}

impl InconsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }

    pub fn missing_for(&self, master: &str) -> Option<&[String]> {
        self.discrepancies
            .iter()
            .find(|d| d.master == master)
            .map(|d| d.missing_codes.as_slice())
    }

    pub fn summary(&self) -> String {
        if self.is_clean() {
            return "no inconsistencies".to_string();
        }
        self.discrepancies
            .iter()
            .map(|d| format!("{}: {} missing", d.master, d.missing_codes.len()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

pub struct InconsistencyValidator;

impl InconsistencyValidator {
    pub fn new() -> Self {
        InconsistencyValidator
    }

    /// Pure cross-check, nothing is mutated
    pub fn validate(
        &self,
        sales_clean: &[SalesRecord],
        clients: &[Client],
        inventory: &[InventoryRecord],
        skus: &[Sku],
    ) -> InconsistencyReport {
        let mut discrepancies = Vec::new();

        let sales_clients = keys(sales_clean.iter().map(|s| s.client.as_str()));
        let client_master = keys(clients.iter().map(|c| c.code.as_str()));
        if let Some(d) = discrepancy(CLIENTS_MASTER, &sales_clients, &client_master) {
            discrepancies.push(d);
        }

        let stocked = keys(inventory.iter().map(|i| i.key.product.as_str()));
        let sku_master = keys(skus.iter().map(|s| s.code.as_str()));
        if let Some(d) = discrepancy(SKU_MASTER, &stocked, &sku_master) {
            discrepancies.push(d);
        }

        for d in &discrepancies {
            tracing::warn!(
                master = %d.master,
                missing = d.missing_codes.len(),
                codes = ?d.missing_codes,
                "codes missing from master"
            );
        }

        InconsistencyReport {
            discrepancies,
            checked_at: Utc::now(),
        }
    }
}

impl Default for InconsistencyValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn keys<'a>(codes: impl Iterator<Item = &'a str>) -> KeySet {
    codes
        .map(normalize_key)
        .filter(|c| !c.is_empty())
        .collect()
}

/// `observed - master`, None when empty
fn discrepancy(master: &str, observed: &KeySet, master_keys: &KeySet) -> Option<Discrepancy> {
    let mut missing: Vec<String> = observed.difference(master_keys).cloned().collect();
    if missing.is_empty() {
        return None;
    }
    missing.sort_by(|a, b| compare_codes(a, b));

    Some(Discrepancy {
        master: master.to_string(),
        missing_codes: missing,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InventoryKey;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn create_test_sale(client: &str) -> SalesRecord {
        SalesRecord {
            client: client.to_string(),
            seller: "9".to_string(),
            product: "P".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            document: "1".to_string(),
            quantity: 1,
            value: Decimal::ONE,
            kind: "0".to_string(),
            cost: Decimal::ZERO,
            unit: "UND".to_string(),
            order: String::new(),
            warehouse: None,
        }
    }

    fn create_test_client(code: &str) -> Client {
        Client {
            code: code.to_string(),
            name: format!("Cliente {}", code),
            joined: String::new(),
            nit: String::new(),
            address: String::new(),
            phone: String::new(),
            legal_representative: String::new(),
            municipality: "76001".to_string(),
            business_type: "TT".to_string(),
            stratum: String::new(),
            neighborhood: String::new(),
        }
    }

    fn create_test_stock(product: &str) -> InventoryRecord {
        InventoryRecord {
            key: InventoryKey {
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                product: product.to_string(),
                unit: "UND".to_string(),
                location: None,
            },
            quantity: Decimal::TEN,
        }
    }

    fn create_test_sku(code: &str) -> Sku {
        Sku {
            code: code.to_string(),
            name: String::new(),
            reference_type: "RG".to_string(),
            unit_type: "UND".to_string(),
            barcode: String::new(),
            category_code: String::new(),
            category_name: String::new(),
            subcategory_code: String::new(),
            subcategory_name: String::new(),
            conversion_factor: Decimal::ONE,
            weight_factor: Decimal::ONE,
            supplier: String::new(),
        }
    }

    #[test]
    fn test_clean_report_when_masters_complete() {
        let report = InconsistencyValidator::new().validate(
            &[create_test_sale("1"), create_test_sale("2")],
            &[create_test_client("1"), create_test_client("2"), create_test_client("3")],
            &[create_test_stock("A")],
            &[create_test_sku("A"), create_test_sku("B")],
        );

        assert!(report.is_clean());
        assert_eq!(report.summary(), "no inconsistencies");
    }

    #[test]
    fn test_missing_client_and_product_reported() {
        let report = InconsistencyValidator::new().validate(
            &[create_test_sale("10"), create_test_sale("2"), create_test_sale("-3")],
            &[create_test_client("2")],
            &[create_test_stock("A"), create_test_stock("Z")],
            &[create_test_sku("A")],
        );

        assert!(!report.is_clean());
        assert_eq!(report.discrepancies.len(), 2);
        // numeric-aware ordering, hyphen masked
        assert_eq!(
            report.missing_for(CLIENTS_MASTER).unwrap(),
            &["10".to_string(), "9993".to_string()]
        );
        assert_eq!(report.missing_for(SKU_MASTER).unwrap(), &["Z".to_string()]);
    }

    #[test]
    fn test_only_non_empty_differences_emitted() {
        let report = InconsistencyValidator::new().validate(
            &[create_test_sale("1")],
            &[create_test_client("1")],
            &[create_test_stock("Z")],
            &[],
        );

        assert_eq!(report.discrepancies.len(), 1);
        assert_eq!(report.discrepancies[0].master, SKU_MASTER);
        assert!(report.missing_for(CLIENTS_MASTER).is_none());
    }
}
