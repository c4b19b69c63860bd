//! Folds raw leads into one canonical company per identity key.
//!
//! The resolver is a pure in-memory accumulator: feed it leads in any
//! order, then call [`Resolver::finish`] for the merged companies plus the
//! counters describing what happened along the way.

use std::collections::HashMap;

use crate::lead::{CanonicalCompany, RawLead};
use crate::phone::NormalizedPhone;

/// What a merge pass did, printed at the end of `merge` and `import` runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub records_in: u64,
    pub companies_out: u64,
    /// Phones that were already claimed by a different company and were
    /// therefore left with their first owner.
    pub phone_collisions: u64,
    /// Leads dropped before merging: external-website leads and leads with
    /// no identity key at all.
    pub skipped_leads: u64,
}

#[derive(Debug, Default)]
pub struct Resolver {
    companies: Vec<CanonicalCompany>,
    by_key: HashMap<String, usize>,
    claimed_phones: HashMap<NormalizedPhone, usize>,
    records_in: u64,
    phone_collisions: u64,
    skipped_leads: u64,
}

impl Resolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one lead into the accumulator.
    ///
    /// A lead lands on an existing company when its identity key is already
    /// known, or when any of its phones is claimed by one. Otherwise it
    /// starts a new company. Either way the lead's key is remembered, so
    /// later leads with the same key reach the same company.
    pub fn absorb(&mut self, lead: RawLead) {
        self.records_in += 1;

        if lead.has_external_website {
            self.skipped_leads += 1;
            return;
        }
        let Some(key) = lead.identity_key() else {
            self.skipped_leads += 1;
            return;
        };

        let existing = self.by_key.get(&key).copied().or_else(|| {
            lead.phones
                .iter()
                .find_map(|p| self.claimed_phones.get(p))
                .copied()
        });

        let idx = match existing {
            Some(idx) => {
                self.by_key.entry(key).or_insert(idx);
                idx
            }
            None => {
                let idx = self.companies.len();
                self.companies.push(CanonicalCompany {
                    identity_key: key.clone(),
                    display_name: String::new(),
                    phones: Vec::new(),
                    social_labels: std::collections::BTreeSet::new(),
                    source_url: None,
                    city: None,
                });
                self.by_key.insert(key, idx);
                idx
            }
        };

        self.fold_into(idx, lead);
    }

    pub fn absorb_all<I>(&mut self, leads: I)
    where
        I: IntoIterator<Item = RawLead>,
    {
        for lead in leads {
            self.absorb(lead);
        }
    }

    fn fold_into(&mut self, idx: usize, lead: RawLead) {
        for phone in lead.phones {
            match self.claimed_phones.get(&phone) {
                Some(&owner) if owner != idx => {
                    // The first claimant keeps the phone.
                    self.phone_collisions += 1;
                }
                Some(_) => {}
                None => {
                    self.claimed_phones.insert(phone.clone(), idx);
                    self.companies[idx].phones.push(phone);
                }
            }
        }

        let company = &mut self.companies[idx];
        if company.display_name.is_empty() && !lead.display_name.trim().is_empty() {
            company.display_name = lead.display_name;
        }
        if company.source_url.is_none() {
            company.source_url = lead.source_url.filter(|u| !u.trim().is_empty());
        }
        if company.city.is_none() {
            company.city = lead.city.filter(|c| !c.trim().is_empty());
        }
        company.social_labels.extend(lead.social_labels);
    }

    /// Consume the accumulator, returning companies in first-seen order.
    #[must_use]
    pub fn finish(self) -> (Vec<CanonicalCompany>, MergeSummary) {
        let summary = MergeSummary {
            records_in: self.records_in,
            companies_out: self.companies.len() as u64,
            phone_collisions: self.phone_collisions,
            skipped_leads: self.skipped_leads,
        };
        (self.companies, summary)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use super::*;
    use crate::phone::normalize_phone;

    fn phone(raw: &str) -> NormalizedPhone {
        normalize_phone(raw).unwrap()
    }

    fn lead(name: &str, url: Option<&str>, phones: &[&str]) -> RawLead {
        RawLead {
            display_name: name.to_string(),
            phones: phones.iter().map(|p| phone(p)).collect(),
            social_labels: BTreeSet::new(),
            source_url: url.map(String::from),
            city: None,
            has_external_website: false,
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn same_source_url_merges_into_one_company() {
        let mut resolver = Resolver::new();
        resolver.absorb(lead("Alpha", Some("https://d/firm/1"), &["+79990000001"]));
        resolver.absorb(lead("Alpha LLC", Some("https://d/firm/1"), &["+79990000002"]));

        let (companies, summary) = resolver.finish();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].display_name, "Alpha");
        let phones: Vec<&str> = companies[0].phones.iter().map(AsRef::as_ref).collect();
        assert_eq!(phones, vec!["+79990000001", "+79990000002"]);
        assert_eq!(summary.records_in, 2);
        assert_eq!(summary.companies_out, 1);
        assert_eq!(summary.phone_collisions, 0);
    }

    #[test]
    fn shared_phone_joins_keyless_records() {
        // A and B have no directory URL and different fallback keys, but
        // share one phone, so they must land on the same company.
        let mut resolver = Resolver::new();
        resolver.absorb(lead("A", None, &["+79990000001", "+79990000002"]));
        resolver.absorb(lead("B", None, &["+79990000002", "+79990000003"]));

        let (companies, summary) = resolver.finish();
        assert_eq!(companies.len(), 1, "shared phone must merge: {companies:?}");
        let phones: Vec<&str> = companies[0].phones.iter().map(AsRef::as_ref).collect();
        assert_eq!(
            phones,
            vec!["+79990000001", "+79990000002", "+79990000003"]
        );
        assert_eq!(companies[0].display_name, "A");
        assert_eq!(summary.companies_out, 1);
    }

    #[test]
    fn aliased_key_reaches_the_merged_company() {
        // Once B merges into A via a shared phone, a third record bearing
        // B's fallback key must land on the same company too.
        let mut resolver = Resolver::new();
        resolver.absorb(lead("A", None, &["+79990000001"]));
        resolver.absorb(lead("B", None, &["+79990000001", "+79990000005"]));
        resolver.absorb(lead("C", None, &["+79990000005"]));

        let (companies, _) = resolver.finish();
        assert_eq!(companies.len(), 1);
    }

    #[test]
    fn phone_claimed_elsewhere_is_counted_not_moved() {
        let mut resolver = Resolver::new();
        resolver.absorb(lead("First", Some("https://d/firm/1"), &["+79990000001"]));
        resolver.absorb(lead("Second", Some("https://d/firm/2"), &["+79990000002"]));
        // Key-hit on firm/2, but the first phone already belongs to firm/1.
        resolver.absorb(lead(
            "Second again",
            Some("https://d/firm/2"),
            &["+79990000001", "+79990000003"],
        ));

        let (companies, summary) = resolver.finish();
        assert_eq!(companies.len(), 2);
        let first: Vec<&str> = companies[0].phones.iter().map(AsRef::as_ref).collect();
        let second: Vec<&str> = companies[1].phones.iter().map(AsRef::as_ref).collect();
        assert_eq!(first, vec!["+79990000001"]);
        assert_eq!(second, vec!["+79990000002", "+79990000003"]);
        assert_eq!(summary.phone_collisions, 1);
    }

    #[test]
    fn website_leads_are_skipped() {
        let mut resolver = Resolver::new();
        let mut skipped = lead("Has site", Some("https://d/firm/9"), &["+79990000009"]);
        skipped.has_external_website = true;
        resolver.absorb(skipped);

        let (companies, summary) = resolver.finish();
        assert!(companies.is_empty());
        assert_eq!(summary.records_in, 1);
        assert_eq!(summary.skipped_leads, 1);
    }

    #[test]
    fn leads_without_any_key_are_skipped() {
        let mut resolver = Resolver::new();
        resolver.absorb(lead("No contacts", None, &[]));

        let (companies, summary) = resolver.finish();
        assert!(companies.is_empty());
        assert_eq!(summary.skipped_leads, 1);
    }

    #[test]
    fn social_labels_union_across_records() {
        let mut a = lead("Alpha", Some("https://d/firm/1"), &["+79990000001"]);
        a.social_labels.insert("VK".to_string());
        let mut b = lead("Alpha", Some("https://d/firm/1"), &["+79990000001"]);
        b.social_labels.insert("Telegram".to_string());
        b.social_labels.insert("VK".to_string());

        let mut resolver = Resolver::new();
        resolver.absorb_all([a, b]);

        let (companies, _) = resolver.finish();
        let labels: Vec<&str> = companies[0].social_labels.iter().map(String::as_str).collect();
        assert_eq!(labels, vec!["Telegram", "VK"]);
    }

    #[test]
    fn output_preserves_first_seen_order() {
        let mut resolver = Resolver::new();
        resolver.absorb(lead("Zeta", Some("https://d/firm/3"), &["+79990000003"]));
        resolver.absorb(lead("Alpha", Some("https://d/firm/1"), &["+79990000001"]));
        resolver.absorb(lead("Mid", Some("https://d/firm/2"), &["+79990000002"]));

        let (companies, _) = resolver.finish();
        let names: Vec<&str> = companies.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }
}
