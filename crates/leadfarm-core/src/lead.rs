use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phone::NormalizedPhone;

/// What kind of contact a listing exposed for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Phone,
    Link,
}

/// One accepted listing, ready for the interchange file.
///
/// Phones are unique and keep first-seen order; social labels collapse into
/// a sorted set so repeated profiles of the same network count once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLead {
    pub display_name: String,
    pub phones: Vec<NormalizedPhone>,
    pub social_labels: BTreeSet<String>,
    pub source_url: Option<String>,
    pub city: Option<String>,
    /// Set when the listing advertised its own external site, which makes
    /// the lead out of scope for this pipeline.
    pub has_external_website: bool,
    pub extracted_at: DateTime<Utc>,
}

impl RawLead {
    /// The stable key used for merging and import dedup.
    ///
    /// Listings with a directory URL are keyed by it; without one we fall
    /// back to the lexicographically smallest phone so the same business
    /// found twice still collapses. Returns `None` when neither exists.
    #[must_use]
    pub fn identity_key(&self) -> Option<String> {
        if let Some(url) = &self.source_url {
            if !url.trim().is_empty() {
                return Some(url.clone());
            }
        }
        self.phones
            .iter()
            .min()
            .map(|p| p.as_str().to_string())
    }
}

/// A merged business record, one per identity key, as written to the final
/// interchange file and handed to the importer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalCompany {
    pub identity_key: String,
    pub display_name: String,
    pub phones: Vec<NormalizedPhone>,
    pub social_labels: BTreeSet<String>,
    pub source_url: Option<String>,
    pub city: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phone::normalize_phone;

    fn lead(source_url: Option<&str>, phones: &[&str]) -> RawLead {
        RawLead {
            display_name: "Test Co".to_string(),
            phones: phones
                .iter()
                .map(|p| normalize_phone(p).unwrap())
                .collect(),
            social_labels: BTreeSet::new(),
            source_url: source_url.map(String::from),
            city: None,
            has_external_website: false,
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn identity_key_prefers_source_url() {
        let lead = lead(Some("https://2gis.ru/firm/123"), &["+79991234567"]);
        assert_eq!(lead.identity_key().as_deref(), Some("https://2gis.ru/firm/123"));
    }

    #[test]
    fn identity_key_falls_back_to_smallest_phone() {
        let lead = lead(None, &["+79995554433", "+79991234567"]);
        assert_eq!(lead.identity_key().as_deref(), Some("+79991234567"));
    }

    #[test]
    fn blank_source_url_is_ignored() {
        let lead = lead(Some("  "), &["+79991234567"]);
        assert_eq!(lead.identity_key().as_deref(), Some("+79991234567"));
    }

    #[test]
    fn identity_key_is_none_without_url_or_phones() {
        let lead = lead(None, &[]);
        assert_eq!(lead.identity_key(), None);
    }
}
