//! Core types for CEP lookups

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::CepError;

/// Number of digits in a CEP
pub const CEP_LENGTH: usize = 8;

/// Strip every character that is not an ASCII decimal digit, keeping digit order.
pub fn normalize_cep(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Check that an already-normalized CEP has exactly 8 ASCII digits
pub fn is_valid_cep(normalized: &str) -> bool {
    normalized.len() == CEP_LENGTH && normalized.bytes().all(|b| b.is_ascii_digit())
}

/// A normalized, validated CEP (8 ASCII digits)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cep(String);

impl Cep {
    /// Normalize and validate a raw CEP.
    ///
    /// Validation runs only on the normalized form, so `"01310-100"` and
    /// `"cep 01310100"` are both accepted. No checksum or regional checks are made.
    pub fn parse(raw: &str) -> Result<Self, CepError> {
        let normalized = normalize_cep(raw);
        if !is_valid_cep(&normalized) {
            return Err(CepError::InvalidFormat);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address returned by the upstream API.
///
/// Every field may be blank; absent, `null` and empty values all decode to `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cep: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub neighborhood: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub street: String,
    /// Provider the upstream API resolved the CEP with; not displayed
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl AddressRecord {
    /// Displayed fields in output order, paired with their labels
    fn labeled_fields(&self) -> [(&'static str, &str); 5] {
        [
            ("Street", self.street.as_str()),
            ("Neighborhood", self.neighborhood.as_str()),
            ("City", self.city.as_str()),
            ("State", self.state.as_str()),
            ("CEP", self.cep.as_str()),
        ]
    }
}

/// Render an address as `Label: value` lines, skipping blank fields.
///
/// An address with no displayable fields renders as the empty string.
pub fn format_address(address: &AddressRecord) -> String {
    address
        .labeled_fields()
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| format!("{}: {}", label, value))
        .collect::<Vec<_>>()
        .join("\n")
}
