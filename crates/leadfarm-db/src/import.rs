//! Batch import of canonical companies into the `leads` table.
//!
//! The planner works against in-memory snapshots of what the table already
//! holds (identity keys and phones), so the decision for every candidate is
//! made without a per-lead round-trip. The database's unique constraint on
//! `identity_key` remains the final arbiter for anything written between
//! snapshot and insert.

use std::collections::HashSet;

use sqlx::PgPool;

use leadfarm_core::CanonicalCompany;

use crate::leads::{existing_identity_keys, existing_phones, insert_leads, NewLead};
use crate::DbError;

/// The staged outcome of matching candidates against the stored lead set.
#[derive(Debug)]
pub struct ImportPlan {
    pub to_insert: Vec<NewLead>,
    pub skipped_existing: u64,
}

/// Counters from one import run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportSummary {
    pub inserted: u64,
    pub skipped_existing: u64,
}

/// Decide which candidates are new.
///
/// A candidate is skipped when its identity key is already claimed or when
/// any of its phones belongs to a stored lead; the same business often
/// surfaces under several listings with distinct keys but a shared phone.
/// Staged candidates claim their key and phones immediately so that a second
/// copy later in the same run is skipped too. Running the same input twice
/// therefore stages nothing the second time.
#[must_use]
pub fn plan_import(
    companies: &[CanonicalCompany],
    mut existing_keys: HashSet<String>,
    mut existing_phones: HashSet<String>,
    source_tag: &str,
) -> ImportPlan {
    let mut to_insert = Vec::new();
    let mut skipped_existing = 0u64;

    for company in companies {
        let key_claimed = existing_keys.contains(&company.identity_key);
        let phone_claimed = company
            .phones
            .iter()
            .any(|p| existing_phones.contains(p.as_str()));
        if key_claimed || phone_claimed {
            skipped_existing += 1;
            continue;
        }

        existing_keys.insert(company.identity_key.clone());
        for phone in &company.phones {
            existing_phones.insert(phone.as_str().to_owned());
        }
        to_insert.push(NewLead::from_company(company, source_tag));
    }

    ImportPlan {
        to_insert,
        skipped_existing,
    }
}

/// Import companies into the `leads` table in batches.
///
/// Snapshots the stored keys and phones once, plans the whole input against
/// them, then inserts the staged leads `batch_size` rows at a time. Each
/// batch is a single statement, so a failure partway through the run loses
/// at most the batches not yet sent, never half a batch. Rows the database
/// rejects on its unique constraint count as skipped, not inserted.
///
/// # Errors
///
/// Returns [`DbError`] if any query fails.
pub async fn import_companies(
    pool: &PgPool,
    companies: &[CanonicalCompany],
    batch_size: usize,
    source_tag: &str,
) -> Result<ImportSummary, DbError> {
    let keys = existing_identity_keys(pool).await?;
    let phones = existing_phones(pool).await?;
    let plan = plan_import(companies, keys, phones, source_tag);

    let mut summary = ImportSummary {
        inserted: 0,
        skipped_existing: plan.skipped_existing,
    };

    let batch_size = batch_size.max(1);
    for batch in plan.to_insert.chunks(batch_size) {
        let inserted = insert_leads(pool, batch).await?;
        summary.inserted += inserted;
        // Conflicts swallowed by ON CONFLICT DO NOTHING show up as the
        // shortfall between the batch and its insert count.
        summary.skipped_existing += batch.len() as u64 - inserted;
    }

    Ok(summary)
}
