//! Field descriptors and the two record shapes written by the harvester.
//!
//! Every attribute of a profile is described once in [`Field`]. The extractor
//! walks [`Field::ALL`] to decide what to read, and both the flat
//! [`ProfileRecord`] and the nested [`StructuredRecord`] are rendered from the
//! same [`FieldValues`], so adding a field here updates every output.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Sub-object of a [`StructuredRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Who the professional is and which company backs them
    Identification,
    /// Phone and fax
    Contact,
    /// Postal address
    Address,
    /// Provenance of the record
    Meta,
}

impl Section {
    /// All sections, in output order.
    pub const ALL: [Section; 4] = [
        Section::Identification,
        Section::Contact,
        Section::Address,
        Section::Meta,
    ];

    /// JSON key of the section.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Identification => "identification",
            Self::Contact => "contact",
            Self::Address => "address",
            Self::Meta => "meta",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where the value of a field comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrigin {
    /// Read directly from the profile page
    Page,
    /// Computed from another page read (postal code and city)
    Derived,
    /// Returned by a company registry
    Enrichment,
    /// Stamped by the harvester itself
    Meta,
}

/// One attribute of a harvested profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Full name as displayed
    Name,
    /// RPPS number, the identity key
    RppsNumber,
    /// Medical specialty
    Specialty,
    /// FINESS establishment identifier
    FinessId,
    /// Company registry number (9 digits)
    Siren,
    /// Establishment registry number (14 digits)
    Siret,
    /// NAF/APE activity code
    NafApeCode,
    /// Company creation date
    DateCreation,
    /// Phone number
    Phone,
    /// Fax number
    Fax,
    /// Address line as displayed
    AddressRaw,
    /// Five-digit postal code
    PostalCode,
    /// City name
    City,
    /// Administrative region
    Region,
    /// Profile page URL
    SourceUrl,
    /// UTC time the profile was harvested
    ScrapedAt,
}

impl Field {
    /// Number of fields.
    pub const COUNT: usize = 16;

    /// All fields, in the fixed output order used by every serializer.
    pub const ALL: [Field; Field::COUNT] = [
        Field::Name,
        Field::RppsNumber,
        Field::Specialty,
        Field::FinessId,
        Field::Siren,
        Field::Siret,
        Field::NafApeCode,
        Field::DateCreation,
        Field::Phone,
        Field::Fax,
        Field::AddressRaw,
        Field::PostalCode,
        Field::City,
        Field::Region,
        Field::SourceUrl,
        Field::ScrapedAt,
    ];

    /// Key in the flat record and CSV header.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::RppsNumber => "rpps_number",
            Self::Specialty => "specialty",
            Self::FinessId => "finess_id",
            Self::Siren => "siren",
            Self::Siret => "siret",
            Self::NafApeCode => "naf_ape_code",
            Self::DateCreation => "date_creation",
            Self::Phone => "phone",
            Self::Fax => "fax",
            Self::AddressRaw => "address_raw",
            Self::PostalCode => "postal_code",
            Self::City => "city",
            Self::Region => "region",
            Self::SourceUrl => "source_url",
            Self::ScrapedAt => "scraped_at",
        }
    }

    /// Section of the structured record holding this field.
    #[must_use]
    pub fn section(self) -> Section {
        match self {
            Self::Name
            | Self::RppsNumber
            | Self::Specialty
            | Self::FinessId
            | Self::Siren
            | Self::Siret
            | Self::NafApeCode
            | Self::DateCreation => Section::Identification,
            Self::Phone | Self::Fax => Section::Contact,
            Self::AddressRaw | Self::PostalCode | Self::City | Self::Region => Section::Address,
            Self::SourceUrl | Self::ScrapedAt => Section::Meta,
        }
    }

    /// Key inside the section object. Only the raw address differs from [`Field::key`].
    #[must_use]
    pub fn nested_key(self) -> &'static str {
        match self {
            Self::AddressRaw => "raw",
            other => other.key(),
        }
    }

    /// Where the value is obtained.
    #[must_use]
    pub fn origin(self) -> FieldOrigin {
        match self {
            Self::Name
            | Self::RppsNumber
            | Self::Specialty
            | Self::FinessId
            | Self::Phone
            | Self::Fax
            | Self::AddressRaw
            | Self::Region => FieldOrigin::Page,
            Self::PostalCode | Self::City => FieldOrigin::Derived,
            Self::Siren | Self::Siret | Self::NafApeCode | Self::DateCreation => {
                FieldOrigin::Enrichment
            }
            Self::SourceUrl | Self::ScrapedAt => FieldOrigin::Meta,
        }
    }

    /// Look up a field by its position inside a section.
    #[must_use]
    pub fn from_nested(section: Section, nested_key: &str) -> Option<Field> {
        Self::ALL
            .into_iter()
            .find(|f| f.section() == section && f.nested_key() == nested_key)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Extracted and enriched values of one profile, keyed by [`Field`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    values: [Option<String>; Field::COUNT],
}

impl FieldValues {
    /// Create an empty set of values (every field null).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. Surrounding whitespace is trimmed and blank values become null.
    pub fn set(&mut self, field: Field, value: Option<String>) {
        self.values[field.index()] = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
    }

    /// Set a field only if it is currently null.
    pub fn set_if_absent(&mut self, field: Field, value: Option<String>) {
        if self.get(field).is_none() {
            self.set(field, value);
        }
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values[field.index()].as_deref()
    }

    /// Iterate over every field in output order, including nulls.
    pub fn iter(&self) -> impl Iterator<Item = (Field, Option<&str>)> + '_ {
        Field::ALL.into_iter().map(move |f| (f, self.get(f)))
    }
}

fn to_json(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| Value::String(v.to_string()))
}

/// Flat record: one key per field, string or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileRecord(Map<String, Value>);

impl ProfileRecord {
    /// Render the flat shape from field values.
    #[must_use]
    pub fn from_values(values: &FieldValues) -> Self {
        Self(
            values
                .iter()
                .map(|(field, value)| (field.key().to_string(), to_json(value)))
                .collect(),
        )
    }

    /// Get a non-null value by flat key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether the key is present (even if null).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Nested record grouped into `identification`, `contact`, `address` and `meta`.
///
/// Absent fields are always present as explicit nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredRecord(Map<String, Value>);

impl StructuredRecord {
    /// Render the structured shape from field values.
    #[must_use]
    pub fn from_values(values: &FieldValues) -> Self {
        let mut root = Map::new();
        for section in Section::ALL {
            let object: Map<String, Value> = values
                .iter()
                .filter(|(field, _)| field.section() == section)
                .map(|(field, value)| (field.nested_key().to_string(), to_json(value)))
                .collect();
            root.insert(section.key().to_string(), Value::Object(object));
        }
        Self(root)
    }

    /// Parse one line of the record store.
    ///
    /// # Errors
    /// Returns `CoreError::MalformedRecord` if the line is not JSON or lacks
    /// one of the four section objects.
    pub fn from_json_line(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| CoreError::MalformedRecord(format!("invalid JSON: {e}")))?;

        let Value::Object(root) = value else {
            return Err(CoreError::MalformedRecord(
                "expected a JSON object".to_string(),
            ));
        };

        for section in Section::ALL {
            match root.get(section.key()) {
                Some(Value::Object(_)) => {}
                Some(_) => {
                    return Err(CoreError::MalformedRecord(format!(
                        "section '{section}' is not an object"
                    )))
                }
                None => {
                    return Err(CoreError::MalformedRecord(format!(
                        "missing section '{section}'"
                    )))
                }
            }
        }

        Ok(Self(root))
    }

    /// Get a non-null field value.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0
            .get(field.section().key())
            .and_then(|section| section.get(field.nested_key()))
            .and_then(Value::as_str)
    }

    /// Identity key of the record, if known.
    #[must_use]
    pub fn rpps_number(&self) -> Option<&str> {
        self.get(Field::RppsNumber)
    }

    /// Flatten into the tabular shape.
    ///
    /// Known nested keys map to their [`Field::key`]; keys written by a newer
    /// field list are kept as `{section}_{key}` so no data is dropped.
    #[must_use]
    pub fn to_flat(&self) -> ProfileRecord {
        let mut flat = Map::new();
        for section in Section::ALL {
            let Some(Value::Object(object)) = self.0.get(section.key()) else {
                continue;
            };
            for (nested, value) in object {
                let key = Field::from_nested(section, nested).map_or_else(
                    || format!("{section}_{nested}"),
                    |field| field.key().to_string(),
                );
                let value = match value {
                    Value::Null | Value::String(_) => value.clone(),
                    other => Value::String(other.to_string()),
                };
                flat.insert(key, value);
            }
        }
        ProfileRecord(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_values() -> FieldValues {
        let mut values = FieldValues::new();
        values.set(Field::Name, Some("Dr Jeanne MARTIN".to_string()));
        values.set(Field::RppsNumber, Some("10101234567".to_string()));
        values.set(Field::AddressRaw, Some("12 rue Sainte-Catherine".to_string()));
        values.set(Field::PostalCode, Some("33000".to_string()));
        values.set(Field::SourceUrl, Some("https://annuaire.sante.fr/x".to_string()));
        values
    }

    #[test]
    fn test_field_order_matches_index() {
        for (i, field) in Field::ALL.into_iter().enumerate() {
            assert_eq!(field.index(), i, "{field} out of order");
        }
    }

    #[test]
    fn test_from_nested_roundtrips_every_field() {
        for field in Field::ALL {
            assert_eq!(
                Field::from_nested(field.section(), field.nested_key()),
                Some(field)
            );
        }
        assert_eq!(Field::from_nested(Section::Contact, "email"), None);
    }

    #[test]
    fn test_set_trims_and_nulls_blank() {
        let mut values = FieldValues::new();
        values.set(Field::Phone, Some("  05 56 00 00 00 ".to_string()));
        values.set(Field::Fax, Some("   ".to_string()));
        assert_eq!(values.get(Field::Phone), Some("05 56 00 00 00"));
        assert_eq!(values.get(Field::Fax), None);

        values.set_if_absent(Field::Phone, Some("other".to_string()));
        assert_eq!(values.get(Field::Phone), Some("05 56 00 00 00"));
    }

    #[test]
    fn test_structured_has_explicit_nulls() {
        let record = StructuredRecord::from_values(&FieldValues::new());
        let json = serde_json::to_value(&record).unwrap();

        for field in Field::ALL {
            let value = &json[field.section().key()][field.nested_key()];
            assert!(value.is_null(), "{field} should be an explicit null");
            assert!(json[field.section().key()]
                .as_object()
                .unwrap()
                .contains_key(field.nested_key()));
        }
    }

    #[test]
    fn test_structured_section_layout() {
        let record = StructuredRecord::from_values(&sample_values());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["identification"]["name"], "Dr Jeanne MARTIN");
        assert_eq!(json["address"]["raw"], "12 rue Sainte-Catherine");
        assert_eq!(json["meta"]["source_url"], "https://annuaire.sante.fr/x");

        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["identification", "contact", "address", "meta"]);
    }

    #[test]
    fn test_flat_and_structured_agree() {
        let values = sample_values();
        let structured = StructuredRecord::from_values(&values);
        let flat = ProfileRecord::from_values(&values);

        for field in Field::ALL {
            if let Some(v) = structured.get(field) {
                assert_eq!(flat.get(field.key()), Some(v), "{field} diverged");
            }
        }
        assert_eq!(structured.to_flat(), flat);
    }

    #[test]
    fn test_flat_key_order_is_fixed() {
        let flat = ProfileRecord::from_values(&sample_values());
        let keys: Vec<_> = flat.keys().collect();
        let expected: Vec<_> = Field::ALL.iter().map(|f| f.key()).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_parse_line_roundtrip() {
        let record = StructuredRecord::from_values(&sample_values());
        let line = serde_json::to_string(&record).unwrap();
        let parsed = StructuredRecord::from_json_line(&line).expect("valid line");
        assert_eq!(parsed, record);
        assert_eq!(parsed.rpps_number(), Some("10101234567"));
    }

    #[test]
    fn test_parse_line_rejects_malformed() {
        assert!(StructuredRecord::from_json_line("{not json").is_err());
        assert!(StructuredRecord::from_json_line("[1, 2]").is_err());
        assert!(StructuredRecord::from_json_line(r#"{"identification": {}}"#).is_err());
        assert!(StructuredRecord::from_json_line(
            r#"{"identification": {}, "contact": [], "address": {}, "meta": {}}"#
        )
        .is_err());
    }

    #[test]
    fn test_flatten_keeps_unknown_keys() {
        let line = r#"{"identification": {"rpps_number": "10101234567", "age": 42},
                       "contact": {"email": "a@b.fr"}, "address": {}, "meta": {}}"#;
        let flat = StructuredRecord::from_json_line(line).unwrap().to_flat();
        assert_eq!(flat.get("rpps_number"), Some("10101234567"));
        assert_eq!(flat.get("identification_age"), Some("42"));
        assert_eq!(flat.get("contact_email"), Some("a@b.fr"));
    }
}
