/// Outcome of classifying one link-ish contact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClass {
    /// A known social or messenger profile; the label is what we store.
    Social(&'static str),
    /// Looks like the company's own site outside the directory.
    Website,
    /// Directory/self links, map services, or garbage we ignore.
    Noise,
}

/// Substrings that mark a link as a social or messenger profile, checked in
/// order. More specific hosts (wa.me, youtu.be) sit next to their long forms
/// so either spelling maps to the same label.
const SOCIAL_DOMAINS: &[(&str, &str)] = &[
    ("vk.com", "VK"),
    ("instagram", "Instagram"),
    ("t.me", "Telegram"),
    ("telegram", "Telegram"),
    ("wa.me", "WhatsApp"),
    ("whatsapp", "WhatsApp"),
    ("facebook", "Facebook"),
    ("youtube", "YouTube"),
    ("youtu.be", "YouTube"),
    ("ok.ru", "OK"),
    ("viber", "Viber"),
    ("taplink", "Taplink"),
    ("linktr", "Linktree"),
    ("tiktok", "TikTok"),
    ("rutube", "Rutube"),
];

/// Substrings that mark a link as the directory itself, a map service, or a
/// search engine. Those never identify the company.
const NOISE_DOMAINS: &[&str] = &["2gis.", "go.2gis", "google.", "yandex.", "maps."];

/// Classify a raw link value from a listing's contact block.
///
/// Social profiles win over everything else, then known noise sources, and
/// only a value whose host still looks like a standalone domain counts as an
/// external website.
#[must_use]
pub fn classify_link(raw: &str) -> LinkClass {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return LinkClass::Noise;
    }

    for (needle, label) in SOCIAL_DOMAINS {
        if value.contains(needle) {
            return LinkClass::Social(label);
        }
    }

    for needle in NOISE_DOMAINS {
        if value.contains(needle) {
            return LinkClass::Noise;
        }
    }

    if host_of(&value).is_some_and(looks_like_domain) {
        return LinkClass::Website;
    }

    LinkClass::Noise
}

/// Pull the host out of a URL-ish string, tolerating missing schemes.
fn host_of(value: &str) -> Option<&str> {
    let without_scheme = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .unwrap_or(value);

    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Whether a host string is shaped like `label.label[.label]` with a
/// plausible alphabetic TLD. Cyrillic hosts are common in this directory's
/// listings, so both scripts are accepted.
fn looks_like_domain(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let tld = labels[labels.len() - 1];
    if tld.chars().count() < 2 || !tld.chars().all(is_domain_alpha) {
        return false;
    }

    labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_digit() || c == '-' || is_domain_alpha(c))
    })
}

fn is_domain_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || ('а'..='я').contains(&c) || c == 'ё'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn social_hosts_map_to_labels() {
        assert_eq!(classify_link("https://vk.com/remont123"), LinkClass::Social("VK"));
        assert_eq!(classify_link("t.me/masterok"), LinkClass::Social("Telegram"));
        assert_eq!(
            classify_link("https://wa.me/79991234567"),
            LinkClass::Social("WhatsApp")
        );
        assert_eq!(
            classify_link("WWW.INSTAGRAM.COM/someshop"),
            LinkClass::Social("Instagram")
        );
    }

    #[test]
    fn directory_and_map_links_are_noise() {
        assert_eq!(classify_link("https://2gis.ru/firm/123"), LinkClass::Noise);
        assert_eq!(
            classify_link("https://go.2gis.com/abcdef"),
            LinkClass::Noise
        );
        assert_eq!(
            classify_link("https://yandex.ru/maps/org/12345"),
            LinkClass::Noise
        );
        assert_eq!(
            classify_link("https://maps.app.goo.gl/xyz"),
            LinkClass::Noise
        );
    }

    #[test]
    fn standalone_domains_are_websites() {
        assert_eq!(
            classify_link("https://remont-krasnodar.ru"),
            LinkClass::Website
        );
        assert_eq!(classify_link("remont-krasnodar.ru"), LinkClass::Website);
        assert_eq!(
            classify_link("http://shop.example.com/catalog?page=2"),
            LinkClass::Website
        );
    }

    #[test]
    fn cyrillic_domains_are_websites() {
        assert_eq!(classify_link("ремонт-юг.рф"), LinkClass::Website);
    }

    #[test]
    fn non_domain_values_are_noise() {
        assert_eq!(classify_link(""), LinkClass::Noise);
        assert_eq!(classify_link("   "), LinkClass::Noise);
        assert_eq!(classify_link("/firm/123/reviews"), LinkClass::Noise);
        assert_eq!(classify_link("mailto:info@"), LinkClass::Noise);
        assert_eq!(classify_link("call us"), LinkClass::Noise);
        assert_eq!(classify_link("remont"), LinkClass::Noise);
    }

    #[test]
    fn malformed_hosts_are_noise() {
        assert_eq!(classify_link("https://-bad-.ru"), LinkClass::Noise);
        assert_eq!(classify_link("https://x.1"), LinkClass::Noise);
        assert_eq!(classify_link("https://.ru"), LinkClass::Noise);
    }
}
