//! Shared types used across the harvester.
//!
//! This module defines the identity newtypes and the search scope that
//! every output file is keyed on.

use crate::error::CoreError;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for RPPS numbers, the stable professional identifier.
///
/// RPPS numbers are plain digit strings (11 digits for RPPS, 9 for legacy
/// ADELI numbers still shown by the directory).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RppsNumber(String);

impl RppsNumber {
    /// Create a new `RppsNumber`, trimming surrounding whitespace.
    ///
    /// # Errors
    /// Returns error if the value is not 8-14 ASCII digits.
    pub fn new(id: impl AsRef<str>) -> Result<Self, CoreError> {
        let id = id.as_ref().trim();
        Self::validate(id)?;
        Ok(Self(id.to_string()))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), CoreError> {
        static RPPS_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = RPPS_REGEX.get_or_init(|| Regex::new(r"^\d{8,14}$").expect("valid regex"));

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(CoreError::InvalidRpps(id.to_string()))
        }
    }
}

impl fmt::Display for RppsNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A (keyword, location) pair defining one independent run and its files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchScope {
    /// Profession or free-text keyword typed into the search form
    pub keyword: String,
    /// City or area typed into the location field
    pub location: String,
}

impl SearchScope {
    /// Create a new scope.
    ///
    /// # Errors
    /// Returns error if the keyword is blank.
    pub fn new(keyword: impl Into<String>, location: impl Into<String>) -> Result<Self, CoreError> {
        let keyword = keyword.into().trim().to_string();
        let location = location.into().trim().to_string();

        if keyword.is_empty() {
            return Err(CoreError::EmptyKeyword);
        }

        Ok(Self { keyword, location })
    }

    /// File stem shared by every file of this scope: `{keyword}_{location}`.
    ///
    /// Path separators and other characters that are unsafe in file names are
    /// replaced with `_`; accented letters are kept.
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.keyword, self.location)
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.keyword, self.location)
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parse a timestamp from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, CoreError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| CoreError::InvalidTimestamp(e.to_string()))
    }

    /// Format as RFC3339 with second precision, e.g. `2026-10-19T08:30:00+00:00`.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
