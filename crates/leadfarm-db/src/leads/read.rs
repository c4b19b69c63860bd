//! Read operations for the `leads` table.

use std::collections::HashSet;

use sqlx::PgPool;

/// Return every `identity_key` already present in the table.
///
/// Call this **before** [`crate::insert_leads`] to plan a batch: candidates
/// whose key is in the returned set are already known and can be skipped
/// without a round-trip per lead.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn existing_identity_keys(pool: &PgPool) -> Result<HashSet<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT identity_key FROM leads")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(k,)| k).collect())
}

/// Return every normalized phone already attached to a stored lead.
///
/// Phones are stored comma-joined per row; the set contains the individual
/// numbers. A candidate sharing any phone with a stored lead is the same
/// business under a different listing and must not be inserted again.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn existing_phones(pool: &PgPool) -> Result<HashSet<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT phones FROM leads")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .flat_map(|(joined,)| {
            joined
                .split(',')
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .collect())
}

/// Count stored leads, optionally restricted to one source tag.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn count_leads(pool: &PgPool, source: Option<&str>) -> Result<i64, sqlx::Error> {
    if let Some(source) = source {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leads WHERE source = $1")
            .bind(source)
            .fetch_one(pool)
            .await
    } else {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leads")
            .fetch_one(pool)
            .await
    }
}
