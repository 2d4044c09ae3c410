//! Address value types: postal code (CEP) and region (UF) code.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static POSTAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}-\d{3}$").expect("Invalid regex"));

/// Errors that can occur when parsing a [`PostalCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostalCodeError {
    /// The input is not in `XXXXX-XXX` form.
    #[error("postal code must be in the format XXXXX-XXX")]
    InvalidFormat,
    /// The lookup input does not reduce to 8 digits.
    #[error("postal code must have 8 numeric digits")]
    InvalidDigits,
}

/// A Brazilian postal code (CEP) stored as `XXXXX-XXX`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PostalCode(String);

impl PostalCode {
    /// Parse a `PostalCode` in canonical `XXXXX-XXX` form.
    ///
    /// # Errors
    ///
    /// Returns [`PostalCodeError::InvalidFormat`] for anything else.
    pub fn parse(s: &str) -> Result<Self, PostalCodeError> {
        let s = s.trim();
        if !POSTAL_CODE_RE.is_match(s) {
            return Err(PostalCodeError::InvalidFormat);
        }
        Ok(Self(s.to_owned()))
    }

    /// Reduce free-form lookup input to its 8 digits.
    ///
    /// Only `-` and `.` are accepted as separators, so `01001-000` and
    /// `01.001-000` both become `01001000`.
    ///
    /// # Errors
    ///
    /// Returns [`PostalCodeError::InvalidDigits`] unless exactly 8 ASCII digits remain.
    pub fn lookup_digits(raw: &str) -> Result<String, PostalCodeError> {
        let digits: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '.')
            .collect();
        if digits.len() == 8 && digits.chars().all(|c| c.is_ascii_digit()) {
            Ok(digits)
        } else {
            Err(PostalCodeError::InvalidDigits)
        }
    }

    /// Returns the postal code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl_pg_text!(PostalCode);

/// Errors that can occur when parsing a [`RegionCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionCodeError {
    /// The input is not two ASCII letters.
    #[error("state must be a two-letter code")]
    InvalidFormat,
}

/// Two-letter federative unit code (e.g. `SP`), stored upper-case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RegionCode(String);

impl RegionCode {
    /// Parse a `RegionCode`, normalizing to upper case.
    ///
    /// # Errors
    ///
    /// Returns [`RegionCodeError::InvalidFormat`] unless the input is two ASCII letters.
    pub fn parse(s: &str) -> Result<Self, RegionCodeError> {
        let s = s.trim();
        if s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(s.to_ascii_uppercase()))
        } else {
            Err(RegionCodeError::InvalidFormat)
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl_pg_text!(RegionCode);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_postal_code_parse() {
        assert!(PostalCode::parse("01001-000").is_ok());
        assert_eq!(
            PostalCode::parse("01001000"),
            Err(PostalCodeError::InvalidFormat)
        );
        assert_eq!(
            PostalCode::parse("0100-1000"),
            Err(PostalCodeError::InvalidFormat)
        );
    }

    #[test]
    fn test_lookup_digits() {
        assert_eq!(PostalCode::lookup_digits("01001-000").unwrap(), "01001000");
        assert_eq!(PostalCode::lookup_digits("01.001-000").unwrap(), "01001000");
        assert_eq!(PostalCode::lookup_digits("01001000").unwrap(), "01001000");
        assert!(PostalCode::lookup_digits("0100100").is_err());
        assert!(PostalCode::lookup_digits("01001 000").is_err());
        assert!(PostalCode::lookup_digits("0100A-000").is_err());
        assert!(PostalCode::lookup_digits("").is_err());
    }

    #[test]
    fn test_region_code() {
        assert_eq!(RegionCode::parse("sp").unwrap().as_str(), "SP");
        assert!(RegionCode::parse("SPO").is_err());
        assert!(RegionCode::parse("S1").is_err());
    }
}
