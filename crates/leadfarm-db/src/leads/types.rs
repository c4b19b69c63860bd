//! Row types for the `leads` table.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use leadfarm_core::CanonicalCompany;

/// Input record for inserting a lead.
///
/// Phones and social labels are stored comma-joined, mirroring how the call
/// queue consumes them.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub identity_key: String,
    pub name: String,
    pub phones: String,
    pub social: Option<String>,
    pub source_url: Option<String>,
    pub city: Option<String>,
    pub source: String,
}

impl NewLead {
    /// Flatten a canonical company into its storable row form.
    #[must_use]
    pub fn from_company(company: &CanonicalCompany, source_tag: &str) -> Self {
        let phones = company
            .phones
            .iter()
            .map(|p| p.as_str().to_owned())
            .collect::<Vec<_>>()
            .join(",");
        let social = if company.social_labels.is_empty() {
            None
        } else {
            Some(
                company
                    .social_labels
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(","),
            )
        };

        Self {
            identity_key: company.identity_key.clone(),
            name: company.display_name.clone(),
            phones,
            social,
            source_url: company.source_url.clone(),
            city: company.city.clone(),
            source: source_tag.to_owned(),
        }
    }
}

/// A row from the `leads` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeadRow {
    pub id: i64,
    pub public_id: Uuid,
    pub identity_key: String,
    pub name: String,
    pub phones: String,
    pub social: Option<String>,
    pub source_url: Option<String>,
    pub city: Option<String>,
    pub status: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
