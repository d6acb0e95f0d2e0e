//! Id & time primitives (C1).
//!
//! `Saml2Id` is deliberately a thin newtype over `String`: SAML IDs are just
//! XML `ID`-typed attribute values (NCNames) and nothing about them needs to
//! be parsed beyond that lexical constraint.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::RngCore;

use crate::error::XmlError;

/// An opaque SAML identifier: an XML `ID` (NCName). Equality is string
/// equality; there is no further internal structure to compare on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Saml2Id(String);

impl Saml2Id {
    /// Generate a fresh id: a non-digit prefix (`_`) followed by 128 bits of
    /// random hex, matching the convention most IdPs and SPs use so that the
    /// value is always a valid NCName regardless of how the random bits
    /// happen to land.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Saml2Id(format!("_{}", hex::encode(bytes)))
    }

    /// Parse an existing id read off the wire, validating the NCName lexical
    /// constraint: starts with a letter or `_`, and contains only
    /// NCName-legal characters afterwards. SAML IDs are free-form strings in
    /// practice, so this is intentionally permissive about anything beyond
    /// "doesn't start with a digit or punctuation that would make it an
    /// invalid XML ID".
    pub fn parse(value: impl Into<String>) -> Result<Self, XmlError> {
        let value = value.into();
        let mut chars = value.chars();
        match chars.next() {
            Some(c) if c == '_' || c.is_alphabetic() => {}
            _ => {
                return Err(XmlError::InvalidAttributeValue {
                    attribute: "ID".into(),
                    expected: "NCName".into(),
                    value,
                })
            }
        }
        if value.chars().any(|c| c.is_whitespace()) {
            return Err(XmlError::InvalidAttributeValue {
                attribute: "ID".into(),
                expected: "NCName".into(),
                value,
            });
        }
        Ok(Saml2Id(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Saml2Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Saml2Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Render a UTC instant as the `xsd:dateTime` form SAML wants on the wire:
/// `YYYY-MM-DDTHH:MM:SSZ`, no fractional seconds, always `Z`.
pub fn format_issue_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an `xsd:dateTime` value as found on `IssueInstant`, `NotBefore`,
/// `NotOnOrAfter`, etc. Accepts fractional seconds even though this core
/// never emits them, since several IdPs do.
pub fn parse_issue_instant(value: &str) -> Result<DateTime<Utc>, XmlError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| XmlError::InvalidAttributeValue {
            attribute: "IssueInstant".into(),
            expected: "xsd:dateTime".into(),
            value: value.to_string(),
        })
}
