//! Normalization helpers for carrier payloads
//!
//! Both carriers are picky about recipient fields: phones must be digits
//! only, names must be split into first/last, and territory names arrive
//! in whatever spelling the customer typed.

/// Strip a phone number down to digits. Leading "+213" style prefixes are
/// kept as digits; separators and spaces are dropped.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Split a free-text recipient name into (first, last). A single word
/// becomes the first name with an empty last name; everything after the
/// first word is the last name.
pub fn split_recipient_name(raw: &str) -> (String, String) {
    let mut parts = raw.split_whitespace();
    let first = parts.next().unwrap_or("").to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Normalize a wilaya/commune name for cache keys and provider search:
/// lowercase, trimmed, separators collapsed to single spaces, common
/// French diacritics folded to ASCII.
pub fn normalize_territory_name(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
            'à' | 'â' | 'ä' | 'À' | 'Â' | 'Ä' => 'a',
            'î' | 'ï' | 'Î' | 'Ï' => 'i',
            'ô' | 'ö' | 'Ô' | 'Ö' => 'o',
            'û' | 'ü' | 'ù' | 'Û' | 'Ü' | 'Ù' => 'u',
            'ç' | 'Ç' => 'c',
            '-' | '_' | '\'' => ' ',
            other => other,
        })
        .collect();
    folded
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the product summary line carriers print on the label,
/// e.g. "2x Veste lin noir, 1x Ceinture cuir".
pub fn product_summary(lines: &[(String, i32)]) -> String {
    lines
        .iter()
        .map(|(name, qty)| format!("{}x {}", qty, name))
        .collect::<Vec<_>>()
        .join(", ")
}
