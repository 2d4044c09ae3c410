//! Brazilian individual tax identifier (CPF).
//!
//! A CPF is 11 digits: nine base digits followed by two check digits. Both check
//! digits come from a weighted sum modulo 11. Sequences of one repeated digit
//! satisfy the arithmetic but are never issued, so they are rejected explicitly.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Number of digits in a CPF.
const DIGITS: usize = 11;

/// Canonical display format: `XXX.XXX.XXX-XX`.
static FORMAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}\.\d{3}\.\d{3}-\d{2}$").expect("Invalid regex"));

/// Errors that can occur when validating a [`TaxId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxIdError {
    /// The input is not in `XXX.XXX.XXX-XX` form.
    #[error("tax id must be in the format XXX.XXX.XXX-XX")]
    InvalidFormat,
    /// The input does not contain exactly 11 digits.
    #[error("tax id must have 11 digits (found {found})")]
    WrongLength {
        /// Number of digits found after stripping separators.
        found: usize,
    },
    /// All 11 digits are the same.
    #[error("tax id cannot be a single repeated digit")]
    RepeatedDigits,
    /// The check digits do not match.
    #[error("invalid tax id")]
    InvalidChecksum,
}

/// A checksum-valid CPF in canonical `XXX.XXX.XXX-XX` form.
///
/// ## Examples
///
/// ```
/// use perim_core::TaxId;
///
/// assert!(TaxId::parse("111.444.777-35").is_ok());
///
/// assert!(TaxId::parse("11144477735").is_err());    // not formatted
/// assert!(TaxId::parse("111.111.111-11").is_err()); // repeated digits
/// assert!(TaxId::parse("123.456.789-00").is_err()); // bad checksum
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TaxId(String);

impl TaxId {
    /// Parse a `TaxId` from its formatted representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not formatted as `XXX.XXX.XXX-XX` or if
    /// its digits fail [`check`].
    pub fn parse(s: &str) -> Result<Self, TaxIdError> {
        let s = s.trim();
        if !FORMAT_RE.is_match(s) {
            return Err(TaxIdError::InvalidFormat);
        }
        check(s)?;
        Ok(Self(s.to_owned()))
    }

    /// Returns the tax id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns only the 11 digits, without separators.
    #[must_use]
    pub fn digits(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }
}

/// Validate the digits of a CPF, ignoring any non-digit characters.
///
/// # Errors
///
/// - [`TaxIdError::WrongLength`] unless exactly 11 digits remain
/// - [`TaxIdError::RepeatedDigits`] if all digits are identical
/// - [`TaxIdError::InvalidChecksum`] if either check digit is wrong
pub fn check(raw: &str) -> Result<(), TaxIdError> {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != DIGITS {
        return Err(TaxIdError::WrongLength {
            found: digits.len(),
        });
    }

    if digits.iter().all(|d| Some(d) == digits.first()) {
        return Err(TaxIdError::RepeatedDigits);
    }

    let (Some(base), Some(base_and_first), Some(tail)) =
        (digits.get(..9), digits.get(..10), digits.get(9..))
    else {
        return Err(TaxIdError::WrongLength {
            found: digits.len(),
        });
    };

    let expected = [check_digit(base), check_digit(base_and_first)];
    if tail == expected {
        Ok(())
    } else {
        Err(TaxIdError::InvalidChecksum)
    }
}

/// Returns `true` if `raw` holds a checksum-valid CPF, with or without separators.
///
/// ```
/// use perim_core::is_valid_tax_id;
///
/// assert!(is_valid_tax_id("111.444.777-35"));
/// assert!(is_valid_tax_id("11144477735"));
/// assert!(!is_valid_tax_id("12345"));
/// ```
#[must_use]
pub fn is_valid(raw: &str) -> bool {
    check(raw).is_ok()
}

/// Weighted check digit: weights run from `len + 1` down to 2.
fn check_digit(digits: &[u32]) -> u32 {
    let sum: u32 = digits
        .iter()
        .rev()
        .zip(2..)
        .map(|(digit, weight)| digit * weight)
        .sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaxId {
    type Err = TaxIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for TaxId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl_pg_text!(TaxId);
