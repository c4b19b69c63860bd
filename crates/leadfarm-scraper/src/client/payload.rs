//! Serde payload types for the directory API, plus contact extraction.
//!
//! Contact extraction tries strategies in priority order (typed contact
//! groups, flat contact list, phone-shaped strings swept from free text) and
//! returns the first non-empty result.

use serde::Deserialize;

use crate::source::ContactEntry;
use crate::text::phone_candidates;

/// Top-level payload from `GET /search`.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchPayload {
    #[serde(default)]
    pub items: Vec<SearchItemPayload>,
    /// Number of the next page; absent on the last page and in scroll mode.
    #[serde(default)]
    pub next_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItemPayload {
    pub id: String,
}

/// Top-level payload from `GET /items/<id>`.
#[derive(Debug, Deserialize)]
pub(crate) struct DetailPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub contact_groups: Vec<ContactGroupPayload>,
    /// Flat contact list some payload variants serve instead of groups.
    #[serde(default)]
    pub contacts: Vec<ContactPayload>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContactGroupPayload {
    #[serde(default)]
    pub contacts: Vec<ContactPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContactPayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Directory contact types that identify a social or messenger profile, with
/// the host used to synthesize a link when the payload carries no explicit URL.
const SOCIAL_TYPE_HOSTS: &[(&str, &str)] = &[
    ("vkontakte", "vk.com"),
    ("instagram", "instagram.com"),
    ("telegram", "t.me"),
    ("whatsapp", "wa.me"),
    ("viber", "viber.com"),
    ("facebook", "facebook.com"),
    ("youtube", "youtube.com"),
    ("odnoklassniki", "ok.ru"),
    ("tiktok", "tiktok.com"),
];

/// Extract contact entries from a detail payload.
///
/// Strategies are tried in priority order and the first non-empty result
/// wins. Returns an empty vec when the listing exposes no usable contact
/// shape at all.
pub(crate) fn contact_entries(detail: &DetailPayload) -> Vec<ContactEntry> {
    // Strategy 1: typed contact groups
    let grouped: Vec<ContactEntry> = detail
        .contact_groups
        .iter()
        .flat_map(|group| group.contacts.iter())
        .filter_map(contact_entry)
        .collect();
    if !grouped.is_empty() {
        tracing::debug!(count = grouped.len(), "extracted contacts from typed groups");
        return grouped;
    }

    // Strategy 2: flat top-level contact list
    let flat: Vec<ContactEntry> = detail.contacts.iter().filter_map(contact_entry).collect();
    if !flat.is_empty() {
        tracing::debug!(count = flat.len(), "extracted contacts from flat list");
        return flat;
    }

    // Strategy 3: phone-shaped strings swept from free text
    if let Some(text) = &detail.description {
        let swept: Vec<ContactEntry> = phone_candidates(text)
            .into_iter()
            .map(ContactEntry::phone)
            .collect();
        if !swept.is_empty() {
            tracing::debug!(count = swept.len(), "extracted contacts from description");
            return swept;
        }
    }

    Vec::new()
}

fn contact_entry(contact: &ContactPayload) -> Option<ContactEntry> {
    let value = contact.value.trim();
    match contact.kind.as_str() {
        "phone" => {
            if value.is_empty() {
                None
            } else {
                Some(ContactEntry::phone(value))
            }
        }
        "website" | "link" => {
            let target = contact
                .url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .unwrap_or(value);
            if target.is_empty() {
                None
            } else {
                Some(ContactEntry::link(target))
            }
        }
        kind => {
            let (_, host) = SOCIAL_TYPE_HOSTS.iter().find(|(t, _)| *t == kind)?;
            let target = contact
                .url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map_or_else(|| format!("{host}/{value}"), str::to_owned);
            Some(ContactEntry::link(target))
        }
    }
}
