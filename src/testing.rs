// Shared fixtures for in-crate unit tests

use crate::config::{
    BranchDefaults, BusinessTypePolicy, CatalogSkuColumns, CatalogueSource, ClientLayout,
    CompanyProfile, Rosters, SalesColumns, SkuSource, TrailingColumn, TypologySheet,
};
use crate::model::SalesRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;

pub fn create_test_profile() -> CompanyProfile {
    CompanyProfile {
        code: "2001".to_string(),
        output_subfolder: "test".to_string(),
        rosters: Rosters {
            sellers: PathBuf::from("interasesor.txt"),
            supervisors: PathBuf::from("intersupervisor.txt"),
            clients: PathBuf::from("intercliente.txt"),
            municipalities: PathBuf::from("interciudad.txt"),
        },
        suppliers: vec!["Acme".to_string()],
        use_providers_file: false,
        sales_columns: SalesColumns::default(),
        sales_trailing: TrailingColumn::OrderNumber,
        branch: BranchDefaults::default(),
        branch_names: [("01", "PALMIRA/CALI"), ("02", "TULUA")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        branch_fields: false,
        client_layout: ClientLayout::Standard,
        business_types: BusinessTypePolicy::default(),
        business_type_catalogue: CatalogueSource::Static,
        typology: TypologySheet::default(),
        skus: SkuSource::Catalog(CatalogSkuColumns::default()),
        neighborhoods: true,
    }
}

pub fn create_test_sale(client: &str, seller: &str) -> SalesRecord {
    SalesRecord {
        client: client.to_string(),
        seller: seller.to_string(),
        product: "P1".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        document: "100".to_string(),
        quantity: 1,
        value: Decimal::ONE,
        kind: "0".to_string(),
        cost: Decimal::ZERO,
        unit: "UND".to_string(),
        order: String::new(),
        warehouse: None,
    }
}
