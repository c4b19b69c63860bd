//! Free-text fallback: turn a pasted directory page dump into listing
//! detail records that feed the normal extraction path.

use regex::Regex;

use leadfarm_core::ContactKind;

use crate::source::{ContactEntry, ListingDetail};

/// Lines containing any of these are never treated as listing names —
/// they are page chrome (ratings, open hours, ads, addresses).
const NAME_STOP_WORDS: &[&str] = &[
    "отзыв",
    "оценк",
    "рейтинг",
    "реклама",
    "открыто",
    "закрыто",
    "закроется",
    "показать",
    "фильтр",
    "сортиров",
    "улица",
    "ул.",
    "просп",
    "пер.",
    "проезд",
    "шоссе",
    "мкр",
];

/// Phone-shaped substrings found in `text`, in order of appearance.
///
/// Matches numbers written with `+7` or a leading `8` and any mix of spaces,
/// dashes, and parentheses. Values are raw matches; callers normalize them
/// via [`leadfarm_core::normalize_phone`].
#[must_use]
pub fn phone_candidates(text: &str) -> Vec<String> {
    let re = Regex::new(r"(?:\+7|8)[\s()-]*\d{3}[\s()-]*\d{3}[\s()-]*\d{2}[\s()-]*\d{2}")
        .expect("valid regex");
    re.find_iter(text).map(|m| m.as_str().to_owned()).collect()
}

/// Parse a pasted directory results page into listing detail records.
///
/// Works line by line: phone-shaped lines and link-shaped lines attach to the
/// current block; the first plausible name line opens a block; the next name
/// line after a block has gathered at least one phone closes it. Blocks that
/// never gather a phone are dropped.
#[must_use]
pub fn parse_text_dump(text: &str) -> Vec<ListingDetail> {
    let mut details = Vec::new();
    let mut current_name: Option<String> = None;
    let mut contacts: Vec<ContactEntry> = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let phones = phone_candidates(line);
        if !phones.is_empty() {
            contacts.extend(phones.into_iter().map(ContactEntry::phone));
            continue;
        }

        if let Some(link) = link_in(line) {
            contacts.push(ContactEntry::link(link));
            continue;
        }

        if is_plausible_name(line) {
            if current_name.is_some() && has_phone(&contacts) {
                details.push(ListingDetail {
                    name: current_name.take().unwrap_or_default(),
                    contacts: std::mem::take(&mut contacts),
                    url: None,
                });
            }
            if current_name.is_none() {
                current_name = Some(line.to_owned());
                // Contacts gathered before any name are page chrome.
                contacts.clear();
            }
        }
    }

    if current_name.is_some() && has_phone(&contacts) {
        details.push(ListingDetail {
            name: current_name.take().unwrap_or_default(),
            contacts,
            url: None,
        });
    }

    details
}

fn has_phone(contacts: &[ContactEntry]) -> bool {
    contacts.iter().any(|c| c.kind == ContactKind::Phone)
}

fn link_in(line: &str) -> Option<String> {
    let re = Regex::new(
        r"(?i)(?:https?://|www\.)[^\s,]+|[0-9a-zа-яё][0-9a-zа-яё-]*\.(?:ru|su|com|net|org|рф|info|biz|online|site|pro)(?:/[^\s,]*)?",
    )
    .expect("valid regex");
    re.find(line)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_owned())
}

fn is_plausible_name(line: &str) -> bool {
    let char_count = line.chars().count();
    if !(4..=99).contains(&char_count) {
        return false;
    }
    if line.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    // Three or more digits means an address or hours line, not a name.
    if line.chars().filter(|c| c.is_ascii_digit()).count() >= 3 {
        return false;
    }
    let lower = line.to_lowercase();
    if NAME_STOP_WORDS.iter().any(|w| lower.contains(w)) {
        return false;
    }
    if lower.contains("http") || lower.contains("www.") {
        return false;
    }
    true
}
