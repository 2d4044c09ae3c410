//! Customer phone number.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `(XX) XXXX-XXXX` for landlines, `(XX) XXXXX-XXXX` for mobiles.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{2}\)\s\d{4,5}-\d{4}$").expect("Invalid regex"));

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone cannot be empty")]
    Empty,
    /// The input is not in `(XX) XXXXX-XXXX` form.
    #[error("phone must be in the format (XX) XXXXX-XXXX")]
    InvalidFormat,
}

/// A phone number with area code, e.g. `(11) 98888-7777`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Maximum stored length.
    pub const MAX_LENGTH: usize = 15;

    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or not in `(XX) XXXX-XXXX` /
    /// `(XX) XXXXX-XXXX` form.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }
        if !PHONE_RE.is_match(s) {
            return Err(PhoneError::InvalidFormat);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl_pg_text!(Phone);
