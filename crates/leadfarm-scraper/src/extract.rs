//! Listing-detail to raw-lead distillation.

use std::collections::BTreeSet;

use chrono::Utc;

use leadfarm_core::{
    classify_link, normalize_phone, ContactKind, LinkClass, NormalizedPhone, RawLead,
};

use crate::source::ListingDetail;

/// Why one listing failed to become a lead.
///
/// Rejections are classification outcomes, not errors: the orchestrator
/// counts them per kind and moves on to the next listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The listing exposed no usable display name.
    EmptyName,
    /// At least one link classified as the business's own website.
    ExternalWebsite,
    /// No phone survived normalization.
    NoUsablePhone,
}

/// Distill a listing detail record into a raw lead.
///
/// Checks run in a fixed order: blank name, then links (any external website
/// rejects the listing outright), then phones. Social labels are collected
/// from social links; noise links are ignored. Phones are normalized and
/// deduplicated preserving first-seen order.
///
/// # Errors
///
/// Returns the [`Rejection`] describing why the listing cannot become a lead.
pub fn extract_lead(detail: &ListingDetail, city: Option<&str>) -> Result<RawLead, Rejection> {
    let display_name = detail.name.trim();
    if display_name.is_empty() {
        return Err(Rejection::EmptyName);
    }

    let mut social_labels = BTreeSet::new();
    for contact in detail
        .contacts
        .iter()
        .filter(|c| c.kind == ContactKind::Link)
    {
        match classify_link(&contact.value) {
            LinkClass::Website => return Err(Rejection::ExternalWebsite),
            LinkClass::Social(label) => {
                social_labels.insert(label.to_owned());
            }
            LinkClass::Noise => {}
        }
    }

    let mut phones: Vec<NormalizedPhone> = Vec::new();
    for contact in detail
        .contacts
        .iter()
        .filter(|c| c.kind == ContactKind::Phone)
    {
        if let Some(phone) = normalize_phone(&contact.value) {
            if !phones.contains(&phone) {
                phones.push(phone);
            }
        }
    }
    if phones.is_empty() {
        return Err(Rejection::NoUsablePhone);
    }

    Ok(RawLead {
        display_name: display_name.to_owned(),
        phones,
        social_labels,
        source_url: detail
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_owned),
        city: city.map(str::to_owned),
        has_external_website: false,
        extracted_at: Utc::now(),
    })
}
