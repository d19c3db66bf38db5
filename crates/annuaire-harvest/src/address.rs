//! Parsing of the free-text values shown on profile pages.

use regex::Regex;
use std::sync::OnceLock;

fn postal_city_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{5})\s+([\p{Lu}\s'-]+)").expect("valid regex"))
}

/// Postal code and city from an address line such as `"12 rue X 33000 Bordeaux Cedex"`.
///
/// The text is upper-cased before matching and a trailing `CEDEX` is dropped
/// from the city.
#[must_use]
pub fn postal_code_and_city(text: &str) -> Option<(String, String)> {
    let upper = text.trim().to_uppercase();
    let caps = postal_city_regex().captures(&upper)?;

    let postal_code = caps[1].to_string();
    let mut city = caps[2].trim();
    if let Some(stripped) = city.strip_suffix("CEDEX") {
        city = stripped.trim_end();
    }
    if city.is_empty() {
        return None;
    }

    Some((postal_code, city.to_string()))
}

/// Value half of a `"Label : value"` text. `None` without a colon or value.
#[must_use]
pub fn label_value(text: &str) -> Option<String> {
    let (_, value) = text.split_once(':')?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
