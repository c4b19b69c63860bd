//! Write operations for the `leads` table.

use sqlx::PgPool;

use super::types::NewLead;

/// Insert a batch of leads, skipping any whose `identity_key` already exists.
///
/// Returns the number of rows actually inserted. Uses a single
/// `INSERT … SELECT * FROM UNNEST(…) ON CONFLICT DO NOTHING` so the whole
/// batch lands in one round-trip and one statement: either every new row of
/// the batch is committed or none is.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn insert_leads(pool: &PgPool, leads: &[NewLead]) -> Result<u64, sqlx::Error> {
    if leads.is_empty() {
        return Ok(0);
    }

    // Collect each column into a parallel Vec for UNNEST binding.
    let mut identity_keys: Vec<String> = Vec::with_capacity(leads.len());
    let mut names: Vec<String> = Vec::with_capacity(leads.len());
    let mut phones: Vec<String> = Vec::with_capacity(leads.len());
    let mut socials: Vec<Option<String>> = Vec::with_capacity(leads.len());
    let mut source_urls: Vec<Option<String>> = Vec::with_capacity(leads.len());
    let mut cities: Vec<Option<String>> = Vec::with_capacity(leads.len());
    let mut sources: Vec<String> = Vec::with_capacity(leads.len());

    for lead in leads {
        identity_keys.push(lead.identity_key.clone());
        names.push(lead.name.clone());
        phones.push(lead.phones.clone());
        socials.push(lead.social.clone());
        source_urls.push(lead.source_url.clone());
        cities.push(lead.city.clone());
        sources.push(lead.source.clone());
    }

    let inserted = sqlx::query(
        "INSERT INTO leads \
             (identity_key, name, phones, social, source_url, city, source) \
         SELECT * FROM UNNEST(\
              $1::text[], $2::text[], $3::text[], $4::text[], $5::text[], \
              $6::text[], $7::text[]) \
         ON CONFLICT (identity_key) DO NOTHING",
    )
    .bind(&identity_keys)
    .bind(&names)
    .bind(&phones)
    .bind(&socials)
    .bind(&source_urls)
    .bind(&cities)
    .bind(&sources)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(inserted)
}
