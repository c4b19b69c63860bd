//! Offline unit tests for leadfarm-db pool configuration, row types, and
//! import planning. These tests do not require a live database connection.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use leadfarm_core::{normalize_phone, AppConfig, CanonicalCompany, RawLead, Resolver};
use leadfarm_db::{plan_import, LeadRow, NewLead, PoolConfig};

fn test_app_config() -> AppConfig {
    AppConfig {
        database_url: Some("postgres://example".to_string()),
        source_base_url: Some("https://catalog.example.com".to_string()),
        source_tag: "directory".to_string(),
        data_dir: PathBuf::from("./data"),
        regions_path: PathBuf::from("./config/regions.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        request_timeout_secs: 30,
        user_agent: "ua".to_string(),
        page_size: 20,
        max_retries: 3,
        retry_backoff_base_secs: 2,
        inter_request_delay_ms: 250,
        stall_threshold: 10,
        max_iterations: 500,
        checkpoint_every: 20,
        import_batch_size: 500,
        max_concurrent_sessions: 1,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&test_app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`LeadRow`] has all expected fields
/// with the correct types. No database required.
#[test]
fn lead_row_has_expected_fields() {
    let row = LeadRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        identity_key: "https://catalog.example.com/firm/1".to_string(),
        name: "Ремонт Юг".to_string(),
        phones: "+79991234567".to_string(),
        social: Some("VK".to_string()),
        source_url: Some("https://catalog.example.com/firm/1".to_string()),
        city: Some("krasnodar".to_string()),
        status: "waiting".to_string(),
        source: "directory".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.id, 1);
    assert_eq!(row.status, "waiting");
    assert_eq!(row.source, "directory");
}

#[test]
fn new_lead_from_company_joins_phones_and_social() {
    let mut social_labels = BTreeSet::new();
    social_labels.insert("VK".to_string());
    social_labels.insert("Telegram".to_string());
    let company = CanonicalCompany {
        identity_key: "https://catalog.example.com/firm/5".to_string(),
        display_name: "Мастерская".to_string(),
        phones: vec![
            normalize_phone("+7 999 111 00 01").unwrap(),
            normalize_phone("8 861 222 00 02").unwrap(),
        ],
        social_labels,
        source_url: Some("https://catalog.example.com/firm/5".to_string()),
        city: Some("sochi".to_string()),
    };

    let lead = NewLead::from_company(&company, "directory");

    assert_eq!(lead.identity_key, "https://catalog.example.com/firm/5");
    assert_eq!(lead.name, "Мастерская");
    assert_eq!(lead.phones, "+79991110001,+78612220002");
    assert_eq!(lead.social.as_deref(), Some("Telegram,VK"));
    assert_eq!(lead.city.as_deref(), Some("sochi"));
    assert_eq!(lead.source, "directory");
}

#[test]
fn new_lead_from_company_without_social_stores_null() {
    let company = CanonicalCompany {
        identity_key: "+79991110001".to_string(),
        display_name: "Без соцсетей".to_string(),
        phones: vec![normalize_phone("+79991110001").unwrap()],
        social_labels: BTreeSet::new(),
        source_url: None,
        city: None,
    };

    let lead = NewLead::from_company(&company, "directory");
    assert_eq!(lead.social, None);
    assert_eq!(lead.source_url, None);
}

/// End-to-end dry run of the acquisition tail: raw leads through the
/// resolver, then the merged companies through the import planner against a
/// pre-populated key/phone snapshot.
#[test]
fn resolver_output_plans_cleanly_against_stored_state() {
    fn raw(name: &str, url: Option<&str>, phones: &[&str]) -> RawLead {
        RawLead {
            display_name: name.to_string(),
            phones: phones.iter().map(|p| normalize_phone(p).unwrap()).collect(),
            social_labels: BTreeSet::new(),
            source_url: url.map(String::from),
            city: Some("krasnodar".to_string()),
            has_external_website: false,
            extracted_at: Utc::now(),
        }
    }

    let mut resolver = Resolver::new();
    resolver.absorb_all([
        raw("Alpha", Some("https://d/firm/1"), &["+79990000001"]),
        // Second sighting of firm/1 under the same key.
        raw("Alpha LLC", Some("https://d/firm/1"), &["+79990000002"]),
        raw("Beta", Some("https://d/firm/2"), &["+79990000003"]),
        raw("Gamma", Some("https://d/firm/3"), &["+79990000004"]),
    ]);
    let (companies, summary) = resolver.finish();
    assert_eq!(summary.companies_out, 3);

    // Beta is already stored under its key; Gamma's phone is already claimed
    // by some stored lead. Only Alpha should be staged.
    let keys: HashSet<String> = ["https://d/firm/2".to_owned()].into();
    let phones: HashSet<String> = ["+79990000004".to_owned()].into();

    let plan = plan_import(&companies, keys, phones, "directory");

    assert_eq!(plan.to_insert.len(), 1);
    assert_eq!(plan.skipped_existing, 2);
    assert_eq!(plan.to_insert[0].name, "Alpha");
    assert_eq!(plan.to_insert[0].phones, "+79990000001,+79990000002");
}
