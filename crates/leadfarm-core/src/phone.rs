use std::fmt;

use serde::{Deserialize, Serialize};

/// A phone number reduced to canonical `+<digits>` form.
///
/// Construction goes through [`normalize_phone`]; two raw strings that
/// describe the same line always produce the same `NormalizedPhone`, so the
/// type is safe to use as a dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedPhone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalize a raw phone string, or return `None` when it cannot be a
/// dialable number.
///
/// Formatting characters (spaces, parentheses, dashes) are dropped, a single
/// leading `+` is kept, and Russian local numbers written with a leading `8`
/// are rewritten to their `+7` international form. Anything shorter than
/// 11 digits is rejected: those are extension-style fragments, not leads.
#[must_use]
pub fn normalize_phone(raw: &str) -> Option<NormalizedPhone> {
    let mut cleaned = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() {
            cleaned.push(c);
        } else if c == '+' && cleaned.is_empty() {
            cleaned.push(c);
        }
    }

    let has_plus = cleaned.starts_with('+');
    let digits = if has_plus { &cleaned[1..] } else { &cleaned[..] };

    if digits.len() < 11 {
        return None;
    }

    if !has_plus && digits.len() == 11 && digits.starts_with('8') {
        return Some(NormalizedPhone(format!("+7{}", &digits[1..])));
    }

    Some(NormalizedPhone(format!("+{digits}")))
}
