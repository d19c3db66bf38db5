//! Canonical registry identifiers.
//!
//! The directory shows company numbers with spaces, slashes or as a full
//! SIRET. Lookups only ever see the digit form produced here.

use std::fmt;

/// Length of a SIREN (company) number.
pub const SIREN_LEN: usize = 9;

/// Length of a SIRET (establishment) number.
pub const SIRET_LEN: usize = 14;

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// First 9 digits of `raw`, or `None` when fewer than 9 digits are present.
///
/// ```
/// use annuaire_registry::normalize;
///
/// assert_eq!(normalize("123 456 789 00012").as_deref(), Some("123456789"));
/// assert_eq!(normalize("12AB"), None);
/// ```
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    let digits = digits(raw);
    (digits.len() >= SIREN_LEN).then(|| digits[..SIREN_LEN].to_string())
}

/// First 14 digits of `raw`, or `None` when fewer than 14 digits are present.
#[must_use]
pub fn normalize_siret(raw: &str) -> Option<String> {
    let digits = digits(raw);
    (digits.len() >= SIRET_LEN).then(|| digits[..SIRET_LEN].to_string())
}

/// A normalized company identifier, keeping the SIRET when one was given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompanyId {
    /// 9-digit company number
    pub siren: String,
    /// 14-digit establishment number, when the raw value carried one
    pub siret: Option<String>,
}

impl CompanyId {
    /// Normalize a raw identifier. `None` means enrichment is skipped.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Some(Self {
            siren: normalize(raw)?,
            siret: normalize_siret(raw),
        })
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.siret {
            Some(siret) => write!(f, "{siret}"),
            None => write!(f, "{}", self.siren),
        }
    }
}
